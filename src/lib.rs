//! # Presence Server
//!
//! Authoritative real-time presence server: one shared world, many
//! WebSocket clients, every position and health change decided here.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PRESENCE SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── bounds.rs   - Spawn area, arena and lethal margin       │
//! │  └── rng.rs      - Spawn position RNG                        │
//! │                                                              │
//! │  game/           - Rules (no I/O)                            │
//! │  ├── player.rs   - Player record, id, color                  │
//! │  ├── registry.rs - Live players keyed by id                  │
//! │  ├── edge.rs     - Edge penalty                              │
//! │  └── tick.rs     - Broadcast tick state and mutation         │
//! │                                                              │
//! │  network/        - Transport and shared world                │
//! │  ├── protocol.rs - JSON message types                        │
//! │  ├── gate.rs     - Handshake admission                       │
//! │  ├── validation.rs - Coordinate hardening                    │
//! │  ├── fanout.rs   - Unicast / broadcast delivery              │
//! │  ├── world.rs    - Single owner of all game state            │
//! │  └── server.rs   - WebSocket server and world task           │
//! │                                                              │
//! │  config.rs       - Environment parsing                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//!
//! Connection tasks never touch game state. They decode client messages and
//! queue commands for the world task, which applies commands and broadcast
//! ticks one at a time. Every client therefore observes events in the order
//! the world applied them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::player::{Color, Player, PlayerId};
pub use network::protocol::{ClientMessage, ServerMessage};
pub use network::server::{GameServer, GameServerError, ServerConfig};
pub use network::world::{World, WorldConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
