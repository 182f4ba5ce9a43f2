//! Shared types used across the hummingbird crates.

mod types;

pub use types::{EntityId, Transform};
