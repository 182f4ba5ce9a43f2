use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glow::HasContext;
use hum_render::SharedResources;

use crate::error::GlError;
use crate::program::GlProgram;
use crate::shaders;

/// Vertex attribute every shape program reads its positions from.
pub(crate) const POSITION_ATTRIBUTE: &str = "position";

/// Built-in programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Flat color, see [`shaders::PLAIN_VERT`].
    Plain,
}

/// Built-in meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Unit square from `(0, 0)` to `(1, 1)` as two triangles.
    Quad,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
}

#[rustfmt::skip]
const QUAD_VERTICES: [Vertex; 6] = [
    Vertex { position: [0.0, 0.0] },
    Vertex { position: [1.0, 0.0] },
    Vertex { position: [1.0, 1.0] },
    Vertex { position: [0.0, 0.0] },
    Vertex { position: [1.0, 1.0] },
    Vertex { position: [0.0, 1.0] },
];

/// Vertex array plus buffer for one shape. Deleted on drop.
pub struct Mesh {
    gl: Rc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

impl Mesh {
    fn quad(gl: &Rc<glow::Context>, program: &GlProgram) -> Result<Self, GlError> {
        let vertices: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|e| GlError::vertex_array_creation_failed(&e))?;
            let vbo = gl
                .create_buffer()
                .map_err(|e| GlError::buffer_creation_failed(&e))?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STATIC_DRAW);
            let stride = size_of::<Vertex>() as i32;
            match program.bind_vertex_attribute(POSITION_ATTRIBUTE, 2, stride, 0) {
                Some(location) => gl.enable_vertex_attrib_array(location),
                None => tracing::warn!("plain program has no position attribute"),
            }
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);

            Ok(Self {
                gl: Rc::clone(gl),
                vao,
                vbo,
                vertex_count: QUAD_VERTICES.len() as i32,
            })
        }
    }

    /// Point the vertex array's positions at attribute `location`.
    ///
    /// The mesh is shared, so this rebinds it for every shape using it.
    pub fn bind_position(&self, location: u32) {
        let stride = size_of::<Vertex>() as i32;
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl
                .vertex_attrib_pointer_f32(location, 2, glow::FLOAT, false, stride, 0);
            self.gl.enable_vertex_attrib_array(location);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_vertex_array(None);
        }
    }

    /// Bind and draw as a triangle list.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_arrays(glow::TRIANGLES, 0, self.vertex_count);
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_vertex_array(self.vao);
        }
        tracing::debug!("mesh deleted");
    }
}

/// GL context plus the resources shared by every shape instance.
///
/// Programs and meshes are created on first use and deleted when the last
/// shape holding them is dropped.
pub struct GlContext {
    gl: Rc<glow::Context>,
    programs: RefCell<SharedResources<ProgramKind, GlProgram>>,
    meshes: RefCell<SharedResources<ShapeKind, Mesh>>,
}

impl GlContext {
    pub fn new(gl: Rc<glow::Context>) -> Rc<Self> {
        Rc::new(Self {
            gl,
            programs: RefCell::new(SharedResources::new()),
            meshes: RefCell::new(SharedResources::new()),
        })
    }

    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    pub fn acquire_program(&self, kind: ProgramKind) -> Result<Rc<GlProgram>, GlError> {
        self.programs.borrow_mut().acquire(kind, || match kind {
            ProgramKind::Plain => {
                GlProgram::from_sources(&self.gl, shaders::PLAIN_VERT, shaders::PLAIN_FRAG)
            }
        })
    }

    pub fn release_program(&self, kind: ProgramKind) {
        if self.programs.borrow_mut().release(&kind).is_some() {
            tracing::debug!(?kind, "last user of program released");
        }
    }

    /// Shared mesh for `kind`; `program` supplies the attribute layout on
    /// first creation.
    pub fn acquire_mesh(&self, kind: ShapeKind, program: &GlProgram) -> Result<Rc<Mesh>, GlError> {
        self.meshes.borrow_mut().acquire(kind, || match kind {
            ShapeKind::Quad => Mesh::quad(&self.gl, program),
        })
    }

    pub fn release_mesh(&self, kind: ShapeKind) {
        if self.meshes.borrow_mut().release(&kind).is_some() {
            tracing::debug!(?kind, "last user of mesh released");
        }
    }
}
