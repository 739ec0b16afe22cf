use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TelemetryError;

pub const PONG_TOPIC: &str = "pong";
pub const STATUS_TOPIC: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

/// Client to server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topic: String, filter: Value },
    Unsubscribe { topic: String },
    Ping,
}

/// One buffered record of a telemetry topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Pong,
    Status(Value),
    Record(TelemetryRecord),
}

impl Frame {
    /// Classifies a server text frame by its `topic` (or, failing that, `type`).
    pub fn parse(text: &str) -> Result<Frame, TelemetryError> {
        let value: Value = serde_json::from_str(text)?;
        let topic = value
            .get("topic")
            .and_then(Value::as_str)
            .or_else(|| value.get("type").and_then(Value::as_str))
            .ok_or(TelemetryError::MissingTopic)?
            .to_string();

        match topic.as_str() {
            PONG_TOPIC => Ok(Frame::Pong),
            STATUS_TOPIC => Ok(Frame::Status(
                value.get("data").cloned().unwrap_or(value),
            )),
            _ => {
                let field = |name: &str| value.get(name).and_then(Value::as_str).map(String::from);
                let ts = field("ts");
                let level = field("level");
                let data = value.get("data").cloned().unwrap_or_else(|| value.clone());
                Ok(Frame::Record(TelemetryRecord {
                    ts,
                    topic,
                    level,
                    data,
                }))
            }
        }
    }
}
