use glam::{Mat4, Vec3, Vec4};

/// Projection mode of a [`Camera`]. The most recent setter wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Orthogonal {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
    /// `fovy` is the vertical field of view in radians.
    Perspective { fovy: f32, aspect: f32 },
}

/// Camera with lazily recomputed projection and view matrices.
///
/// Every setter marks the matching matrix dirty, even when the new value is
/// equal to the old one. Dirty flags are cleared exactly when the matrix is
/// recomputed.
///
/// Consumers that forward matrices to other objects (shader programs) should
/// use [`take_projection_update`](Self::take_projection_update) and
/// [`take_view_update`](Self::take_view_update), which report and clear a
/// pending change in one call. [`peek_projection`](Self::peek_projection) and
/// [`peek_view`](Self::peek_view) give the current matrices without consuming
/// the pending change.
#[derive(Debug, Clone)]
pub struct Camera {
    mode: Projection,
    z_near: f32,
    z_far: f32,
    position: Vec3,
    center: Vec3,
    up: Vec3,
    projection: Mat4,
    view: Mat4,
    projection_changed: bool,
    view_changed: bool,
}

impl Default for Camera {
    /// Orthogonal camera looking along +z from `(0, 0, -1)` with y growing
    /// downwards on screen: near 0.1, far 1000, bounds `(0, -100, 100, 0)`.
    fn default() -> Self {
        Self {
            mode: Projection::Orthogonal {
                left: 0.0,
                right: -100.0,
                bottom: 100.0,
                top: 0.0,
            },
            z_near: 0.1,
            z_far: 1000.0,
            position: Vec3::new(0.0, 0.0, -1.0),
            center: Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection_changed: true,
            view_changed: true,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_perspective(&mut self, fovy: f32, aspect: f32) {
        self.mode = Projection::Perspective { fovy, aspect };
        self.projection_changed = true;
    }

    pub fn set_orthogonal(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.mode = Projection::Orthogonal {
            left,
            right,
            bottom,
            top,
        };
        self.projection_changed = true;
    }

    pub fn projection_mode(&self) -> Projection {
        self.mode
    }

    pub fn set_z_near(&mut self, z_near: f32) {
        self.z_near = z_near;
        self.projection_changed = true;
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn set_z_far(&mut self, z_far: f32) {
        self.z_far = z_far;
        self.projection_changed = true;
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view_changed = true;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Set the point the camera looks at.
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
        self.view_changed = true;
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.view_changed = true;
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Whether the projection matrix will be recomputed on next access.
    pub fn projection_changed(&self) -> bool {
        self.projection_changed
    }

    /// Whether the view matrix will be recomputed on next access.
    pub fn view_changed(&self) -> bool {
        self.view_changed
    }

    /// Cached projection matrix; recomputes and clears the flag if dirty.
    pub fn projection(&mut self) -> Mat4 {
        if self.projection_changed {
            self.projection = self.compute_projection();
            self.projection_changed = false;
        }
        self.projection
    }

    /// Cached view matrix; recomputes and clears the flag if dirty.
    pub fn view(&mut self) -> Mat4 {
        if self.view_changed {
            self.view = self.compute_view();
            self.view_changed = false;
        }
        self.view
    }

    /// Mark both matrices dirty so consumers receive them again.
    pub fn invalidate(&mut self) {
        self.projection_changed = true;
        self.view_changed = true;
    }

    /// Recompute and return the projection if it changed since the last
    /// recompute. `None` means consumers already hold the current matrix.
    pub fn take_projection_update(&mut self) -> Option<Mat4> {
        self.projection_changed.then(|| self.projection())
    }

    /// View counterpart of [`take_projection_update`](Self::take_projection_update).
    pub fn take_view_update(&mut self) -> Option<Mat4> {
        self.view_changed.then(|| self.view())
    }

    /// Current projection without touching the cache or the dirty flag.
    pub fn peek_projection(&self) -> Mat4 {
        if self.projection_changed {
            self.compute_projection()
        } else {
            self.projection
        }
    }

    /// Current view without touching the cache or the dirty flag.
    pub fn peek_view(&self) -> Mat4 {
        if self.view_changed {
            self.compute_view()
        } else {
            self.view
        }
    }

    /// Plane through the camera position facing the view direction, as
    /// `(normal, d)` with `normal = center - position` (not normalized).
    ///
    /// `plane.dot(p.extend(1.0))` is the signed camera distance of `p`,
    /// scaled by the length of the normal.
    pub fn view_plane(&self) -> Vec4 {
        let normal = self.center - self.position;
        normal.extend(-normal.dot(self.position))
    }

    fn compute_projection(&self) -> Mat4 {
        match self.mode {
            Projection::Orthogonal {
                left,
                right,
                bottom,
                top,
            } => Mat4::orthographic_rh_gl(left, right, bottom, top, self.z_near, self.z_far),
            Projection::Perspective { fovy, aspect } => {
                Mat4::perspective_rh_gl(fovy, aspect, self.z_near, self.z_far)
            }
        }
    }

    fn compute_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.center, self.up)
    }
}
