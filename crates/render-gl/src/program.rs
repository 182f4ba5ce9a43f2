use std::path::Path;
use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;
use hum_render::ShaderProgram;

use crate::error::GlError;

/// Shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl From<ShaderKind> for u32 {
    fn from(val: ShaderKind) -> Self {
        match val {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

/// A compiled (or failed) GLSL shader object.
///
/// Deleted on drop; a program it was attached to and linked with keeps
/// working.
pub struct GlShader {
    gl: Rc<glow::Context>,
    shader: glow::Shader,
    compiled: bool,
    log: String,
}

impl GlShader {
    /// Compile `source`. Only the failure to create the shader object is an
    /// error; check [`is_compiled`](Self::is_compiled) for the result.
    pub fn from_source(gl: &Rc<glow::Context>, kind: ShaderKind, source: &str) -> Result<Self, GlError> {
        let shader =
            unsafe { gl.create_shader(kind.into()) }.map_err(|e| GlError::shader_creation_failed(&e))?;

        let (compiled, log) = unsafe {
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            (gl.get_shader_compile_status(shader), gl.get_shader_info_log(shader))
        };
        if !compiled {
            tracing::warn!(?kind, %log, "shader failed to compile");
        }

        Ok(Self {
            gl: Rc::clone(gl),
            shader,
            compiled,
            log,
        })
    }

    /// Read and compile a shader source file.
    pub fn from_file(
        gl: &Rc<glow::Context>,
        kind: ShaderKind,
        path: impl AsRef<Path>,
    ) -> Result<Self, GlError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "shader source loaded");
        Self::from_source(gl, kind, &source)
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Compiler output of the last compilation.
    pub fn log(&self) -> &str {
        &self.log
    }
}

impl Drop for GlShader {
    fn drop(&mut self) {
        unsafe { self.gl.delete_shader(self.shader) };
    }
}

/// A GLSL program object.
///
/// Built with [`attach`](Self::attach), [`bind_fragment_output`](Self::bind_fragment_output)
/// and [`link`](Self::link), then shared as a [`hum_render::SharedProgram`].
/// Uniforms the program does not declare are ignored.
pub struct GlProgram {
    gl: Rc<glow::Context>,
    program: glow::Program,
    linked: bool,
    log: String,
}

impl GlProgram {
    pub fn new(gl: &Rc<glow::Context>) -> Result<Self, GlError> {
        let program =
            unsafe { gl.create_program() }.map_err(|e| GlError::program_creation_failed(&e))?;
        Ok(Self {
            gl: Rc::clone(gl),
            program,
            linked: false,
            log: String::new(),
        })
    }

    /// Compile both stages, bind `out_color` as fragment output and link.
    ///
    /// Unlike the step-by-step API this turns compile and link failures into
    /// errors carrying the driver log.
    pub fn from_sources(
        gl: &Rc<glow::Context>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GlError> {
        let vertex = GlShader::from_source(gl, ShaderKind::Vertex, vertex_source)?;
        if !vertex.is_compiled() {
            return Err(GlError::shader_compile_failed("vertex shader", vertex.log()));
        }
        let fragment = GlShader::from_source(gl, ShaderKind::Fragment, fragment_source)?;
        if !fragment.is_compiled() {
            return Err(GlError::shader_compile_failed("fragment shader", fragment.log()));
        }

        let mut program = Self::new(gl)?;
        program
            .attach(&vertex)
            .attach(&fragment)
            .bind_fragment_output("out_color")
            .link();
        if !program.is_linked() {
            return Err(GlError::shader_link_failed(program.log()));
        }
        Ok(program)
    }

    pub fn attach(&mut self, shader: &GlShader) -> &mut Self {
        unsafe { self.gl.attach_shader(self.program, shader.shader) };
        self
    }

    /// Bind fragment output `name` to color number 0. Takes effect at the
    /// next [`link`](Self::link).
    pub fn bind_fragment_output(&mut self, name: &str) -> &mut Self {
        unsafe { self.gl.bind_frag_data_location(self.program, 0, name) };
        self
    }

    pub fn link(&mut self) -> &mut Self {
        unsafe {
            self.gl.link_program(self.program);
            self.linked = self.gl.get_program_link_status(self.program);
            self.log = self.gl.get_program_info_log(self.program);
        }
        if self.linked {
            tracing::debug!("shader program linked");
        } else {
            tracing::warn!(log = %self.log, "shader program failed to link");
        }
        self
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Linker output of the last link.
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Point float attribute `name` at the currently bound array buffer.
    ///
    /// `stride` and `offset` are in bytes. Returns the attribute location,
    /// or `None` when the program has no such attribute.
    pub fn bind_vertex_attribute(&self, name: &str, size: i32, stride: i32, offset: i32) -> Option<u32> {
        let location = unsafe { self.gl.get_attrib_location(self.program, name) }?;
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, stride, offset);
        }
        Some(location)
    }

    fn uniform_location(&self, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(self.program, name) }
    }
}

impl ShaderProgram for GlProgram {
    fn use_program(&self) {
        unsafe { self.gl.use_program(Some(self.program)) };
    }

    fn set_uniform_mat4(&self, name: &str, value: &Mat4) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&location), false, &value.to_cols_array());
            }
        }
    }

    fn set_uniform_vec2(&self, name: &str, value: Vec2) {
        if let Some(location) = self.uniform_location(name) {
            unsafe { self.gl.uniform_2_f32(Some(&location), value.x, value.y) };
        }
    }

    fn set_uniform_vec3(&self, name: &str, value: Vec3) {
        if let Some(location) = self.uniform_location(name) {
            unsafe { self.gl.uniform_3_f32(Some(&location), value.x, value.y, value.z) };
        }
    }

    fn set_uniform_vec4(&self, name: &str, value: Vec4) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_4_f32(Some(&location), value.x, value.y, value.z, value.w)
            };
        }
    }

    fn attribute_location(&self, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(self.program, name) }
    }
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.program) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_kinds_map_to_gl_enums() {
        assert_eq!(u32::from(ShaderKind::Vertex), glow::VERTEX_SHADER);
        assert_eq!(u32::from(ShaderKind::Fragment), glow::FRAGMENT_SHADER);
    }
}
