//! Render plugin core: camera, draw ordering and shader usage tracking.
//!
//! Backend agnostic. GPU work goes through the [`RenderSurface`],
//! [`ShaderProgram`] and [`Drawable`] traits; `hum-render-gl` implements them
//! on OpenGL and [`headless`] implements them without a GPU.
//!
//! # Invariants
//! - The renderer never mutates world state. Transforms are read from the
//!   `World` and extrapolated, never written back.
//! - Drawables are drawn farthest from the camera plane first.
//! - A shader program receives the camera matrices once when it enters use
//!   and afterwards only when the camera changes, however many drawables
//!   share it.

pub mod camera;
pub mod color;
pub mod composer;
pub mod drawable;
pub mod error;
pub mod headless;
pub mod plugin;
pub mod registry;
pub mod resources;
pub mod scheduler;
pub mod shader;
pub mod surface;
pub mod tracker;

pub use camera::{Camera, Projection};
pub use color::Color;
pub use composer::{FrameContext, SpaceMapping, TransformComposer};
pub use drawable::{Drawable, DrawableId};
pub use error::RenderError;
pub use plugin::{RenderConfig, RenderPlugin};
pub use registry::{ActiveDrawable, DrawableRegistry};
pub use resources::SharedResources;
pub use scheduler::{DrawOrder, DrawOrderScheduler, FrameStats};
pub use shader::{MODEL_UNIFORM, PROJECTION_UNIFORM, ProgramKey, SharedProgram, ShaderProgram, VIEW_UNIFORM};
pub use surface::RenderSurface;
pub use tracker::{CameraPush, ShaderUsageTracker};
