use std::rc::Rc;

use glam::Vec3;
use hum_common::Transform;
use hum_render::{Color, Drawable, SharedProgram};

use crate::context::{GlContext, Mesh, POSITION_ATTRIBUTE, ProgramKind, ShapeKind};
use crate::error::GlError;

/// Uniform receiving the rectangle color.
pub const COLOR_UNIFORM: &str = "color";

/// Flat-colored unit square, sized and placed through its transform.
///
/// All rectangles share one quad mesh and, unless replaced, one flat-color
/// program. A replacement program must declare a `position` attribute and a
/// `vec4 color` uniform; the shared mesh is rebound to its `position`.
pub struct Rectangle {
    context: Rc<GlContext>,
    mesh: Rc<Mesh>,
    program: Option<SharedProgram>,
    transform: Transform,
    origin: Vec3,
    color: Color,
}

impl Rectangle {
    pub fn new(context: &Rc<GlContext>, color: Color) -> Result<Self, GlError> {
        let program = context.acquire_program(ProgramKind::Plain)?;
        let mesh = match context.acquire_mesh(ShapeKind::Quad, &program) {
            Ok(mesh) => mesh,
            Err(err) => {
                context.release_program(ProgramKind::Plain);
                return Err(err);
            }
        };
        let program: SharedProgram = program;
        Ok(Self {
            context: Rc::clone(context),
            mesh,
            program: Some(program),
            transform: Transform::default(),
            origin: Vec3::ZERO,
            color,
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Pivot in unit-square coordinates; `(0.5, 0.5, 0)` is the center.
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
    }
}

impl Drawable for Rectangle {
    fn draw(&self) {
        if let Some(program) = &self.program {
            program.set_uniform_vec4(COLOR_UNIFORM, self.color.to_vec4());
        }
        self.mesh.draw();
    }

    fn shader_program(&self) -> Option<&SharedProgram> {
        self.program.as_ref()
    }

    fn set_shader_program(&mut self, program: Option<SharedProgram>) {
        match position_location(program.as_ref()) {
            Some(location) => self.mesh.bind_position(location),
            None if program.is_some() => {
                tracing::warn!("replacement program has no position attribute");
            }
            None => {}
        }
        self.program = program;
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn origin(&self) -> Vec3 {
        self.origin
    }
}

fn position_location(program: Option<&SharedProgram>) -> Option<u32> {
    program?.attribute_location(POSITION_ATTRIBUTE)
}

impl Drop for Rectangle {
    fn drop(&mut self) {
        self.context.release_mesh(ShapeKind::Quad);
        self.context.release_program(ProgramKind::Plain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hum_render::headless::RecordingProgram;

    #[test]
    fn replacement_programs_are_located_by_name() {
        let moved: SharedProgram =
            Rc::new(RecordingProgram::new("tinted").with_attributes(["uv", POSITION_ATTRIBUTE]));
        assert_eq!(position_location(Some(&moved)), Some(1));

        let bare: SharedProgram = Rc::new(RecordingProgram::new("bare"));
        assert_eq!(position_location(Some(&bare)), None);
        assert_eq!(position_location(None), None);
    }
}
