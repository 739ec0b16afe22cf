use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("connect to {url} failed: {message}")]
    Connect { url: String, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid telemetry frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),
    #[error("telemetry frame has no topic")]
    MissingTopic,
    #[error("telemetry client stopped")]
    Stopped,
}
