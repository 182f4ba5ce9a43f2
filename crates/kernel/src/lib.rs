//! World Kernel: authoritative entity transforms, fixed-step timing and the
//! plugin registry the rest of the engine hangs off.
//!
//! # Invariants
//! - Entity transforms in `World` are the authoritative (simulation) ones.
//! - The fixed-step lag fraction is always in `[0, 1)`.
//! - Plugins are looked up by concrete type; a missing plugin is an error,
//!   never a panic.

pub mod clock;
pub mod plugin;
pub mod world;

pub use clock::FixedTimestep;
pub use plugin::{KernelError, Plugins};
pub use world::{EntityData, World};
