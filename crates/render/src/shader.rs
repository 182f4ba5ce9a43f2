use glam::{Mat4, Vec2, Vec3, Vec4};
use std::rc::Rc;

/// Uniform receiving the camera projection matrix.
pub const PROJECTION_UNIFORM: &str = "projection";
/// Uniform receiving the camera view matrix.
pub const VIEW_UNIFORM: &str = "view";
/// Uniform receiving each drawable's model matrix.
pub const MODEL_UNIFORM: &str = "model";

/// A compiled and linked GPU program, as seen by the render plugin.
///
/// Setting a uniform the program does not declare is silently ignored.
/// Implementations own no plugin state; the plugin only ever holds shared
/// references handed to it by drawables.
pub trait ShaderProgram {
    /// Make this program the active one.
    fn use_program(&self);

    fn set_uniform_mat4(&self, name: &str, value: &Mat4);

    fn set_uniform_vec2(&self, name: &str, value: Vec2);

    fn set_uniform_vec3(&self, name: &str, value: Vec3);

    fn set_uniform_vec4(&self, name: &str, value: Vec4);

    /// Location of the vertex attribute `name`, if the program reads it.
    fn attribute_location(&self, _name: &str) -> Option<u32> {
        None
    }
}

/// Shared handle to a shader program.
pub type SharedProgram = Rc<dyn ShaderProgram>;

/// Identity of a shared program, derived from its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramKey(usize);

impl ProgramKey {
    pub fn of(program: &SharedProgram) -> Self {
        Self(Rc::as_ptr(program) as *const () as usize)
    }
}
