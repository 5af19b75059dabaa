//! Fanout
//!
//! The three send patterns the world needs: to one connection, to everyone
//! but one, and to everyone. Delivery is best effort: a full or closed outbox
//! loses that message for that client only and nobody waits on it.

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use crate::network::protocol::ServerMessage;

/// Transport-level connection identifier, assigned at accept time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Send patterns used by the world.
///
/// Only attached connections receive anything; a connection is attached on
/// admission and detached when it leaves.
pub trait Fanout {
    /// Per-connection handle the transport writes into.
    type Outbox;

    /// Start delivering to `conn`.
    fn attach(&mut self, conn: ConnectionId, outbox: Self::Outbox);

    /// Stop delivering to `conn`. Returns false if it was not attached.
    fn detach(&mut self, conn: ConnectionId) -> bool;

    /// Send to a single connection.
    fn send_to(&self, conn: ConnectionId, message: ServerMessage);

    /// Send to every attached connection except `except`.
    fn broadcast_except(&self, except: ConnectionId, message: ServerMessage);

    /// Send to every attached connection.
    fn broadcast(&self, message: ServerMessage);

    /// Number of attached connections.
    fn attached(&self) -> usize;
}

/// Outbox of one websocket connection: pre-encoded JSON text frames.
pub type Outbox = mpsc::Sender<String>;

/// Fanout over per-connection mpsc outboxes.
///
/// Each message is encoded once and the text is cloned per recipient.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    outboxes: BTreeMap<ConnectionId, Outbox>,
}

impl ConnectionHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(message: &ServerMessage) -> Option<String> {
        match message.to_json() {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to serialize {} message: {}", message.kind(), e);
                None
            }
        }
    }

    fn deliver(conn: ConnectionId, outbox: &Outbox, text: String) {
        match outbox.try_send(text) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Outbox full for {}, dropping message", conn);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Outbox closed for {}, dropping message", conn);
            }
        }
    }
}

impl Fanout for ConnectionHub {
    type Outbox = Outbox;

    fn attach(&mut self, conn: ConnectionId, outbox: Outbox) {
        self.outboxes.insert(conn, outbox);
    }

    fn detach(&mut self, conn: ConnectionId) -> bool {
        self.outboxes.remove(&conn).is_some()
    }

    fn send_to(&self, conn: ConnectionId, message: ServerMessage) {
        let Some(outbox) = self.outboxes.get(&conn) else {
            return;
        };
        if let Some(text) = Self::encode(&message) {
            Self::deliver(conn, outbox, text);
        }
    }

    fn broadcast_except(&self, except: ConnectionId, message: ServerMessage) {
        let Some(text) = Self::encode(&message) else {
            return;
        };
        for (conn, outbox) in self.outboxes.iter().filter(|(conn, _)| **conn != except) {
            Self::deliver(*conn, outbox, text.clone());
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        let Some(text) = Self::encode(&message) else {
            return;
        };
        for (conn, outbox) in &self.outboxes {
            Self::deliver(*conn, outbox, text.clone());
        }
    }

    fn attached(&self) -> usize {
        self.outboxes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerId;

    fn leave() -> ServerMessage {
        ServerMessage::Leave {
            id: PlayerId::generate(),
        }
    }

    #[tokio::test]
    async fn test_send_patterns() {
        let mut hub = ConnectionHub::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        hub.attach(ConnectionId(1), tx1);
        hub.attach(ConnectionId(2), tx2);

        hub.send_to(ConnectionId(1), leave());
        hub.broadcast_except(ConnectionId(1), leave());
        hub.broadcast(leave());

        drop(hub);

        let mut got1 = Vec::new();
        while let Some(text) = rx1.recv().await {
            got1.push(text);
        }
        let mut got2 = Vec::new();
        while let Some(text) = rx2.recv().await {
            got2.push(text);
        }

        assert_eq!(got1.len(), 2);
        assert_eq!(got2.len(), 2);
        assert!(got1[0].contains(r#""type":"leave""#));
    }

    #[tokio::test]
    async fn test_detached_connection_receives_nothing() {
        let mut hub = ConnectionHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.attach(ConnectionId(7), tx);

        assert!(hub.detach(ConnectionId(7)));
        assert!(!hub.detach(ConnectionId(7)));
        hub.broadcast(leave());
        hub.send_to(ConnectionId(7), leave());

        assert_eq!(hub.attached(), 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_full_outbox_drops_without_blocking() {
        let mut hub = ConnectionHub::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        hub.attach(ConnectionId(1), slow_tx);
        hub.attach(ConnectionId(2), fast_tx);

        for _ in 0..3 {
            hub.broadcast(leave());
        }

        assert!(slow_rx.try_recv().is_ok());
        assert!(slow_rx.try_recv().is_err());
        for _ in 0..3 {
            assert!(fast_rx.try_recv().is_ok());
        }
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(42).to_string(), "conn-42");
    }
}
