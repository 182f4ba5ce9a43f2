/// Errors raised while creating GL objects or the window.
///
/// Compile and link failures of otherwise valid objects are not errors:
/// they are reported through `is_compiled`/`is_linked` and `log`.
#[derive(thiserror::Error, Debug)]
pub enum GlError {
    /// Shader or program object creation errors.
    #[error("Shader error: {0}")]
    Shader(String),

    /// Buffer and vertex array errors.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Shader source file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Window, display or context creation errors.
    #[error("Window error: {0}")]
    Window(String),
}

impl GlError {
    pub(crate) fn shader_creation_failed(detail: &str) -> Self {
        Self::Shader(format!("Shader creation failed: {detail}"))
    }

    pub(crate) fn program_creation_failed(detail: &str) -> Self {
        Self::Shader(format!("Shader program creation failed: {detail}"))
    }

    pub(crate) fn shader_compile_failed(name: &str, log: &str) -> Self {
        Self::Shader(format!("Error compiling {name}: {log}"))
    }

    pub(crate) fn shader_link_failed(log: &str) -> Self {
        Self::Shader(format!("Shader linking failed: {log}"))
    }

    pub(crate) fn buffer_creation_failed(detail: &str) -> Self {
        Self::Resource(format!("Failed to create vertex buffer: {detail}"))
    }

    pub(crate) fn vertex_array_creation_failed(detail: &str) -> Self {
        Self::Resource(format!("Failed to create vertex array object: {detail}"))
    }

    pub(crate) fn window(detail: impl std::fmt::Display) -> Self {
        Self::Window(detail.to_string())
    }
}
