//! Mock platform for integration tests
//!
//! A tiny Socket.IO server on localhost that speaks just enough of the
//! Engine.IO v4 handshake for a `ChannelSession` to reach `connected`, then
//! lets the test push events and inspect what the client sent.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Route all log levels to the test writer so every log argument is
/// evaluated, as it is under the production subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

const OPEN_PACKET: &str =
    r#"0{"sid":"mock-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

pub struct MockPlatform {
    listener: TcpListener,
}

impl MockPlatform {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock platform");
        Self { listener }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().expect("local addr").port()
    }

    /// Control channel URL as the endpoint registry builds it.
    pub fn url(&self) -> String {
        format!(
            "ws://127.0.0.1:{}/socket.io/?EIO=4&transport=websocket",
            self.port()
        )
    }

    /// Accept one client and complete the open + namespace connect handshake.
    pub async fn accept(&self) -> PlatformConn {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("client never connected")
            .expect("accept");
        let ws = accept_async(stream).await.expect("websocket handshake");
        let mut conn = PlatformConn { ws };

        conn.send_raw(OPEN_PACKET).await;
        let connect = conn.next_text().await.expect("namespace connect");
        assert_eq!(connect, "40");
        conn.send_raw(r#"40{"sid":"mock-ns"}"#).await;
        conn
    }
}

/// One accepted client connection.
pub struct PlatformConn {
    ws: WebSocketStream<TcpStream>,
}

impl PlatformConn {
    pub async fn send_raw(&mut self, frame: &str) {
        self.ws
            .send(WsMessage::Text(frame.to_string().into()))
            .await
            .expect("send frame");
    }

    /// Push a Socket.IO event to the client.
    pub async fn send_event(&mut self, name: &str, data: Value) {
        let body = serde_json::to_string(&serde_json::json!([name, data])).expect("encode");
        self.send_raw(&format!("42{body}")).await;
    }

    /// Next text frame, or `None` once the client has gone away.
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            let frame = timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for a client frame");
            match frame {
                Some(Ok(WsMessage::Text(text))) => return Some(text.as_str().to_string()),
                Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Next Socket.IO event from the client as `(name, data)`.
    pub async fn next_event(&mut self) -> (String, Value) {
        loop {
            let text = self.next_text().await.expect("client closed the channel");
            let Some(body) = text.strip_prefix("42") else {
                continue;
            };
            let mut items: Vec<Value> = serde_json::from_str(body).expect("event body");
            let data = if items.len() > 1 {
                items.remove(1)
            } else {
                Value::Null
            };
            let name = items[0].as_str().expect("event name").to_string();
            return (name, data);
        }
    }

    /// Drop the connection without a Socket.IO goodbye.
    pub async fn drop_connection(mut self) {
        let _ = self.ws.close(None).await;
    }
}
