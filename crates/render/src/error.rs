use hum_kernel::KernelError;

/// Errors surfaced by the render plugin.
///
/// Only fatal conditions end up here. Expected absences (an entity without a
/// kinematic body) are handled as `Option` and never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A collaborator the plugin cannot run without was not registered.
    #[error("required plugin missing: {0}")]
    MissingPlugin(#[from] KernelError),

    /// A frame was requested before `game_start` succeeded.
    #[error("render plugin used before game start")]
    NotStarted,

    /// The window surface failed to present or configure.
    #[error("surface error: {0}")]
    Surface(String),
}
