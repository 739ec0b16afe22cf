use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Mount status as pushed on the `status` telemetry topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSnapshot {
    pub battery_is_available: bool,
    pub battery_is_charging: bool,
    pub battery_level: f64,
    pub connected: bool,
    pub tracking: bool,
    pub athome: bool,
    pub atpark: bool,
    pub slewing: bool,
    pub gotoing: bool,
    pub ispulseguiding: bool,
    pub altitude: f64,
    pub azimuth: f64,
    pub roll: f64,
    pub rotation: f64,
    pub declination: f64,
    pub rightascension: f64,
    pub siderealtime: f64,
}

/// Receives decoded status frames from the telemetry client.
pub trait StatusSink: Send + Sync {
    fn publish(&self, status: StatusSnapshot);
}

#[derive(Debug, Clone)]
struct Received {
    at: DateTime<Utc>,
    status: StatusSnapshot,
}

/// Keeps the most recent status and when it arrived.
#[derive(Debug, Default)]
pub struct LatestStatus {
    inner: Mutex<Option<Received>>,
}

impl LatestStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.status.clone())
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().unwrap().as_ref().map(|r| r.at)
    }
}

impl StatusSink for LatestStatus {
    fn publish(&self, status: StatusSnapshot) {
        log::debug!(
            "status: az {:.3} alt {:.3} tracking {} slewing {}",
            status.azimuth,
            status.altitude,
            status.tracking,
            status.slewing
        );
        *self.inner.lock().unwrap() = Some(Received {
            at: Utc::now(),
            status,
        });
    }
}
