use crate::color::Color;
use crate::error::RenderError;

/// Window or offscreen target the render plugin draws into.
///
/// The plugin takes ownership of its surface at game start, prepares it once
/// and then clears and presents it every frame.
pub trait RenderSurface {
    /// One-time pipeline state: depth test, blending.
    fn prepare(&mut self) -> Result<(), RenderError>;

    fn set_clear_color(&mut self, color: Color);

    /// Clear color and depth.
    fn clear(&mut self);

    /// Show the finished frame. May block on vsync.
    fn present(&mut self) -> Result<(), RenderError>;
}
