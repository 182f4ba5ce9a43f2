use glam::Vec3;
use hum_common::Transform;
use serde::{Deserialize, Serialize};

use crate::shader::SharedProgram;

/// Handle to a drawable owned by a [`DrawableRegistry`](crate::DrawableRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrawableId(pub u64);

/// Something the render plugin can draw.
///
/// The transform is relative to the owning entity. The shader program is
/// shared and outlives the drawable's registration.
pub trait Drawable {
    /// Issue the draw calls.
    ///
    /// By the time this runs the drawable's program is in use and its
    /// `model`, `view` and `projection` uniforms are set.
    fn draw(&self);

    fn shader_program(&self) -> Option<&SharedProgram>;

    /// Replace the program. Go through
    /// [`DrawableRegistry::set_shader_program`](crate::DrawableRegistry::set_shader_program)
    /// while the drawable is active so usage counts stay balanced.
    fn set_shader_program(&mut self, program: Option<SharedProgram>);

    fn transform(&self) -> &Transform;

    fn transform_mut(&mut self) -> &mut Transform;

    /// Pivot subtracted from local coordinates before scale and rotation.
    fn origin(&self) -> Vec3 {
        Vec3::ZERO
    }
}
