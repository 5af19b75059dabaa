//! WebSocket Presence Server
//!
//! Accepts WebSocket connections, forwards decoded client events to the
//! world task and writes whatever the world sends back. The world task is
//! the only place game state changes: connection tasks and the broadcast
//! tick all feed the same command queue.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{env_lookup, parse_var, ConfigError};
use crate::network::fanout::{ConnectionHub, ConnectionId, Outbox};
use crate::network::protocol::ClientMessage;
use crate::network::world::{World, WorldCommand, WorldConfig};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3003;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Pending outbound frames per connection before messages are dropped.
    pub outbox_capacity: usize,
    /// Pending commands queued for the world task.
    pub command_capacity: usize,
    /// Game rules.
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            outbox_capacity: 64,
            command_capacity: 1024,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "PRESENCE_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(max) = parse_var(&lookup, "PRESENCE_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        config.world = WorldConfig::from_lookup(&lookup)?;

        Ok(config)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

type Command = WorldCommand<Outbox>;

/// The presence server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Open connections.
    connections: Arc<AtomicUsize>,
    /// Next connection id.
    next_conn: AtomicU64,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            connections: Arc::new(AtomicUsize::new(0)),
            next_conn: AtomicU64::new(1),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Presence server listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_capacity);
        let world = World::new(self.config.world.clone(), ConnectionHub::new());
        let world_handle = tokio::spawn(Self::run_world(
            world,
            command_rx,
            self.shutdown_tx.subscribe(),
        ));

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::SeqCst) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            let conn = ConnectionId(self.next_conn.fetch_add(1, Ordering::SeqCst));
                            info!("New connection {} from {}", conn, addr);
                            self.handle_connection(stream, addr, conn, command_tx.clone());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(command_tx);
        if let Err(e) = world_handle.await {
            error!("World task failed: {}", e);
        }

        Ok(())
    }

    /// The single mutation timeline: client commands and ticks, in order.
    async fn run_world(
        mut world: World<ConnectionHub>,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker: Option<Interval> = None;

        loop {
            match (world.tick_running(), ticker.is_some()) {
                (true, false) => {
                    let period = world.tick_interval();
                    let mut interval = interval_at(Instant::now() + period, period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker = Some(interval);
                }
                (false, true) => ticker = None,
                _ => {}
            }

            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => world.apply(command),
                        None => break,
                    }
                }
                _ = next_tick(&mut ticker) => {
                    world.on_tick();
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!("World task stopped with {} players", world.registry().len());
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        conn: ConnectionId,
        commands: mpsc::Sender<Command>,
    ) {
        let connections = self.connections.clone();
        let outbox_capacity = self.config.outbox_capacity;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        connections.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (out_tx, mut out_rx) = mpsc::channel::<String>(outbox_capacity);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(text) = out_rx.recv().await {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handed to the world on the first handshake
            let mut pending_outbox = Some(out_tx);

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", conn, e);
                                        continue;
                                    }
                                };

                                let Some(command) = to_command(conn, client_msg, &mut pending_outbox) else {
                                    continue;
                                };
                                if commands.send(command).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", conn);
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                debug!("WebSocket error from {}: {}", conn, e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            let _ = commands.send(WorldCommand::Disconnect { conn }).await;
            drop(pending_outbox);
            sender_task.abort();
            connections.fetch_sub(1, Ordering::SeqCst);

            info!("Connection {} from {} closed", conn, addr);
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Translate a decoded client message. Repeat handshakes yield nothing.
fn to_command(
    conn: ConnectionId,
    message: ClientMessage,
    pending_outbox: &mut Option<Outbox>,
) -> Option<Command> {
    match message {
        ClientMessage::Handshake { token } => match pending_outbox.take() {
            Some(outbox) => Some(WorldCommand::Admit { conn, token, outbox }),
            None => {
                debug!("Repeat handshake from {} ignored", conn);
                None
            }
        },
        ClientMessage::Move { x, y } => Some(WorldCommand::Move { conn, x, y }),
        ClientMessage::HitEdge => Some(WorldCommand::HitEdge { conn }),
        ClientMessage::Jump { xy } => Some(WorldCommand::Jump { conn, xy }),
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
