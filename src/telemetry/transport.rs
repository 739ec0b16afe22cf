use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::error::TelemetryError;

/// An open text-frame connection.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), TelemetryError>;

    /// Next text frame. `None` once the peer has closed.
    async fn recv(&mut self) -> Option<Result<String, TelemetryError>>;

    async fn close(&mut self);
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TelemetryError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TelemetryError> {
        let (stream, response) =
            connect_async(url)
                .await
                .map_err(|e| TelemetryError::Connect {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
        log::debug!("websocket handshake with {}: {}", url, response.status());
        Ok(Box::new(WebSocketTransport { stream }))
    }
}

pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<(), TelemetryError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TelemetryError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TelemetryError::Transport(e.to_string()))),
            };
            match message {
                Message::Text(text) => return Some(Ok(text.as_str().to_owned())),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => log::warn!("ignoring non-utf8 binary frame ({} bytes)", bytes.len()),
                },
                Message::Close(_) => return None,
                // Control frames are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            log::debug!("websocket close: {}", e);
        }
    }
}
