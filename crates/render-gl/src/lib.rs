//! OpenGL backend for the render plugin.
//!
//! Provides a glutin/winit window implementing [`hum_render::RenderSurface`],
//! GLSL shader and program objects implementing
//! [`hum_render::ShaderProgram`], and a [`Rectangle`] drawable.
//!
//! # Invariants
//! - Every GL object is deleted by the drop of its Rust owner.
//! - Shared meshes and programs live until their last user is dropped.
//! - Compile and link failures are reported, never panicked on.

mod context;
mod error;
mod program;
mod rectangle;
mod shaders;
mod window;

pub use context::{GlContext, Mesh, ProgramKind, ShapeKind};
pub use error::GlError;
pub use program::{GlProgram, GlShader, ShaderKind};
pub use rectangle::{COLOR_UNIFORM, Rectangle};
pub use shaders::{PLAIN_FRAG, PLAIN_VERT};
pub use window::{GlWindow, WindowConfig};
