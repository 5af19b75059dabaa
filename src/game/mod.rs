//! Game Logic Module
//!
//! Player records and the rules applied to them. Nothing here knows about
//! sockets.
//!
//! ## Module Structure
//!
//! - `player`: Player record, id and color
//! - `registry`: The set of live players
//! - `edge`: Edge penalty arithmetic
//! - `tick`: Broadcast tick run state and per-pass mutation

pub mod edge;
pub mod player;
pub mod registry;
pub mod tick;

// Re-export key types
pub use edge::{EdgePenalty, PenaltyOutcome};
pub use player::{Color, Player, PlayerId, MAX_HEALTH};
pub use registry::{PlayerRegistry, Snapshot};
pub use tick::{BroadcastScheduler, ColorCadence, TickConfig, TickResult, TickStopPolicy};
