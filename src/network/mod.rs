//! Network Layer
//!
//! WebSocket transport, admission and the shared world that client events
//! are applied to. Game rules live in `game/`; this layer decides who is in
//! the world and who hears about what.

pub mod fanout;
pub mod gate;
pub mod protocol;
pub mod server;
pub mod validation;
pub mod world;

pub use fanout::{ConnectionHub, ConnectionId, Fanout};
pub use gate::{Admission, ConnectionGate, GateConfig, GateRejection};
pub use protocol::{ClientMessage, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
pub use validation::{ValidationConfig, ValidationError};
pub use world::{World, WorldCommand, WorldConfig};
