//! Core primitives.
//!
//! World geometry and the spawn RNG. Nothing here knows about players or
//! connections.

pub mod bounds;
pub mod rng;

// Re-export core types
pub use bounds::{LethalBoundary, Rect, ARENA, EDGE_MARGIN, SPAWN_AREA};
pub use rng::SpawnRng;
