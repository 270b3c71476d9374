// Shared helpers for booting a real server and driving it with websocket clients.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Ticks fast enough to finish a game in well under a second, slow enough to steer.
pub const TEST_TICK: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

// Each test gets its own server so the shared waiting pool never pairs clients across tests.
pub async fn spawn_server() -> String {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");

    tokio::spawn(async move {
        snake_server::serve(listener, TEST_TICK)
            .await
            .expect("server failed");
    });

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_ok() {
            return format!("ws://{addr}/ws");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not become ready in time");
}

pub async fn connect(url: &str) -> Client {
    let (client, _response) = connect_async(url).await.expect("websocket connect");
    client
}

// Next JSON message, skipping control frames.
pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(READ_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("json"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected a text message, got {other:?}"),
        }
    }
}

// Reads until a message of the given type shows up, returning it and everything before it.
pub async fn read_until(client: &mut Client, kind: &str) -> (Value, Vec<Value>) {
    let mut seen = Vec::new();
    loop {
        let msg = next_json(client).await;
        if msg["type"] == kind {
            return (msg, seen);
        }
        seen.push(msg);
    }
}

// Waits for the server's close frame.
pub async fn expect_close(client: &mut Client) -> Option<CloseFrame> {
    loop {
        let next = tokio::time::timeout(READ_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => return frame,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
            Some(Err(_)) | None => return None,
        }
    }
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.into()))
        .await
        .expect("send text");
}

pub async fn send_binary(client: &mut Client, bytes: &[u8]) {
    client
        .send(Message::Binary(bytes.to_vec().into()))
        .await
        .expect("send binary");
}
