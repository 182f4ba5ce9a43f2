//! GLSL 3.30 sources compiled into the crate.

/// Vertex stage of the flat-color program. Takes a 2D `position` attribute
/// and the `projection`, `view` and `model` matrices.
pub const PLAIN_VERT: &str = include_str!("../shaders/plain.vert");

/// Fragment stage of the flat-color program. Writes uniform `color` to
/// `out_color`.
pub const PLAIN_FRAG: &str = include_str!("../shaders/plain.frag");
