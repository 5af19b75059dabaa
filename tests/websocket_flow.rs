//! End-to-end flows over real WebSocket connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use presence::{GameServer, ServerConfig};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(3);

async fn start(config: ServerConfig) -> (Arc<GameServer>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    let server = Arc::new(GameServer::new(config));
    let running = server.clone();
    tokio::spawn(async move { running.serve(listener).await });

    (server, format!("ws://{}", addr))
}

fn quiet_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.world.tick.interval = Duration::from_secs(3600);
    config
}

async fn connect(url: &str) -> Client {
    let (ws, _) = timeout(WAIT, connect_async(url)).await.unwrap().unwrap();
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn recv_type(ws: &mut Client, kind: &str) -> Value {
    loop {
        let value = recv(ws).await;
        if value["type"] == kind {
            return value;
        }
    }
}

async fn join(url: &str, name: &str) -> (Client, String) {
    let mut ws = connect(url).await;
    send(&mut ws, json!({"type": "handshake", "token": name})).await;
    let init = recv_type(&mut ws, "init").await;
    let id = init["id"].as_str().unwrap().to_string();
    (ws, id)
}

#[tokio::test]
async fn test_join_move_leave() {
    let (server, url) = start(quiet_config()).await;

    let mut alice = connect(&url).await;
    send(&mut alice, json!({"type": "handshake", "token": "alice"})).await;
    let init = recv(&mut alice).await;
    assert_eq!(init["type"], "init");
    let alice_id = init["id"].as_str().unwrap().to_string();
    assert_eq!(init["players"].as_object().unwrap().len(), 1);
    assert_eq!(init["players"][&alice_id]["health"], 100.0);
    assert_eq!(init["players"][&alice_id]["alive"], true);

    let (mut bob, bob_id) = join(&url, "bob").await;

    let joined = recv(&mut alice).await;
    assert_eq!(joined["type"], "join");
    assert_eq!(joined["id"], bob_id.as_str());
    assert_eq!(joined["name"], "bob");

    send(&mut alice, json!({"type": "move", "x": 400.0, "y": 300.0})).await;
    for ws in [&mut alice, &mut bob] {
        let moved = recv_type(ws, "move").await;
        assert_eq!(moved["id"], alice_id.as_str());
        assert_eq!(moved["x"], 400.0);
        assert_eq!(moved["y"], 300.0);
    }

    bob.close(None).await.unwrap();
    let left = recv_type(&mut alice, "leave").await;
    assert_eq!(left["id"], bob_id.as_str());

    server.shutdown();
}

#[tokio::test]
async fn test_sentinel_token_receives_nothing() {
    let (server, url) = start(quiet_config()).await;

    let mut guest = connect(&url).await;
    send(&mut guest, json!({"type": "handshake", "token": "_"})).await;

    let (mut alice, _) = join(&url, "alice").await;
    send(&mut alice, json!({"type": "move", "x": 100.0, "y": 100.0})).await;
    recv_type(&mut alice, "move").await;

    // Moves from a non-admitted connection are dropped too
    send(&mut guest, json!({"type": "move", "x": 1.0, "y": 1.0})).await;

    assert!(timeout(Duration::from_millis(300), guest.next()).await.is_err());

    server.shutdown();
}

#[tokio::test]
async fn test_tick_sends_snapshots() {
    let mut config = ServerConfig::default();
    config.world.tick.interval = Duration::from_millis(50);
    let (server, url) = start(config).await;

    let (mut alice, alice_id) = join(&url, "alice").await;
    send(&mut alice, json!({"type": "hitEdge"})).await;

    // hitEdge is only visible through the next snapshot
    let mut health = 100.0;
    for _ in 0..10 {
        let update = recv_type(&mut alice, "update").await;
        health = update["players"][&alice_id]["health"].as_f64().unwrap();
        if health < 100.0 {
            break;
        }
    }
    assert!((health - 80.0).abs() < 1e-9);

    server.shutdown();
}

#[tokio::test]
async fn test_malformed_messages_ignored() {
    let (server, url) = start(quiet_config()).await;

    let (mut alice, alice_id) = join(&url, "alice").await;
    send(&mut alice, json!({"type": "teleport"})).await;
    send(&mut alice, json!({"type": "move", "x": "far"})).await;
    alice.send(Message::Text("not json".into())).await.unwrap();
    send(&mut alice, json!({"type": "move", "x": 10.0, "y": 20.0})).await;

    let moved = recv_type(&mut alice, "move").await;
    assert_eq!(moved["id"], alice_id.as_str());
    assert_eq!(moved["x"], 10.0);

    server.shutdown();
}
