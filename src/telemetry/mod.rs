mod backoff;
mod client;
mod error;
mod history;
mod session;
mod transport;
mod types;

pub use backoff::{Backoff, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF};
pub use client::TelemetryClient;
pub use error::TelemetryError;
pub use history::{TopicHistory, DEFAULT_HISTORY_CAPACITY};
pub use session::{
    Effect, Event, Session, SessionSettings, DEFAULT_PING_INTERVAL, DEFAULT_STALE_AFTER,
};
pub use transport::{Connector, Transport, WebSocketConnector, WebSocketTransport};
pub use types::{ClientMessage, ConnectionState, Frame, TelemetryRecord, PONG_TOPIC, STATUS_TOPIC};
