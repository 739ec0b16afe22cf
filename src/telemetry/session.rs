//! Connection bookkeeping for the telemetry feed.
//!
//! [`Session::handle`] takes one [`Event`] and returns the [`Effect`]s the
//! driver must carry out. It owns no sockets or timers, only the flags that
//! say which of them should currently exist, so a timer is never started twice.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::backoff::Backoff;
use super::history::{TopicHistory, DEFAULT_HISTORY_CAPACITY};
use super::types::{ClientMessage, ConnectionState, Frame, TelemetryRecord};
use crate::status::StatusSnapshot;

pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub backoff: Backoff,
    pub ping_interval: Duration,
    pub stale_after: Duration,
    pub history_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backoff: Backoff::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `Some(url)` is an explicit request, `None` a retry of the last URL.
    Connect(Option<String>),
    Opened,
    Frame(String),
    TransportError(String),
    Closed,
    PingTick,
    ReconnectDue,
    Subscribe { topic: String, filter: Value },
    Unsubscribe(String),
    Clear(String),
    Ping,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Open(String),
    Send(ClientMessage),
    /// Drop the current socket (or pending open) without reporting a close.
    Close,
    StartPing,
    StopPing,
    ScheduleReconnect(Duration),
    /// Retry the last URL now, as a separate step from the teardown.
    Reconnect,
    CancelReconnect,
    PublishStatus(StatusSnapshot),
}

#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    state: ConnectionState,
    url: Option<String>,
    subscriptions: BTreeMap<String, Value>,
    history: TopicHistory,
    last_activity: Option<Instant>,
    retries: u32,
    socket_live: bool,
    ping_running: bool,
    reconnect_pending: bool,
    manual_disconnect: bool,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            state: ConnectionState::Disconnected,
            url: None,
            subscriptions: BTreeMap::new(),
            history: TopicHistory::new(settings.history_capacity),
            last_activity: None,
            retries: 0,
            socket_live: false,
            ping_running: false,
            reconnect_pending: false,
            manual_disconnect: false,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.keys().cloned().collect()
    }

    pub fn history(&self) -> &TopicHistory {
        &self.history
    }

    pub fn records(&self, topic: &str) -> Vec<TelemetryRecord> {
        self.history.records(topic)
    }

    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            Event::Connect(url) => self.connect(url, &mut effects),
            Event::Opened => self.opened(now, &mut effects),
            Event::Frame(text) => self.frame(&text, now, &mut effects),
            Event::TransportError(message) => {
                log::warn!("telemetry transport error: {}", message);
                self.state = ConnectionState::Error;
            }
            Event::Closed => self.closed(&mut effects),
            Event::PingTick => self.ping_tick(now, &mut effects),
            Event::ReconnectDue => {
                if self.reconnect_pending {
                    self.reconnect_pending = false;
                    if !self.manual_disconnect {
                        self.connect(None, &mut effects);
                    }
                }
            }
            Event::Subscribe { topic, filter } => {
                self.subscriptions.insert(topic.clone(), filter.clone());
                if self.state == ConnectionState::Connected {
                    effects.push(Effect::Send(ClientMessage::Subscribe { topic, filter }));
                }
            }
            Event::Unsubscribe(topic) => {
                self.subscriptions.remove(&topic);
                self.history.clear(&topic);
                if self.state == ConnectionState::Connected {
                    effects.push(Effect::Send(ClientMessage::Unsubscribe { topic }));
                }
            }
            Event::Clear(topic) => self.history.clear(&topic),
            Event::Ping => {
                if self.state == ConnectionState::Connected {
                    effects.push(Effect::Send(ClientMessage::Ping));
                }
            }
            Event::Disconnect => {
                log::info!("telemetry disconnect requested");
                self.manual_disconnect = true;
                self.cancel_reconnect(&mut effects);
                self.teardown(&mut effects);
                self.state = ConnectionState::Disconnected;
                self.retries = 0;
                self.url = None;
            }
        }
        effects
    }

    fn connect(&mut self, url: Option<String>, effects: &mut Vec<Effect>) {
        let retry = url.is_none();
        let Some(target) = url.or_else(|| self.url.clone()) else {
            log::warn!("telemetry connect requested without a url");
            return;
        };

        if self.socket_live {
            if self.url.as_deref() == Some(target.as_str()) {
                log::debug!("telemetry already connected to {}", target);
                return;
            }
            log::info!("telemetry switching to {}", target);
            self.teardown(effects);
        }

        self.cancel_reconnect(effects);
        self.manual_disconnect = false;
        self.url = Some(target.clone());
        self.state = if retry {
            ConnectionState::Reconnecting
        } else {
            ConnectionState::Connecting
        };
        self.socket_live = true;
        log::info!("telemetry {} to {}", self.state, target);
        effects.push(Effect::Open(target));
    }

    fn opened(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        if !self.socket_live {
            return;
        }
        log::info!(
            "telemetry connected, replaying {} subscription(s)",
            self.subscriptions.len()
        );
        self.state = ConnectionState::Connected;
        self.retries = 0;
        self.last_activity = Some(now);
        effects.extend(self.subscriptions.iter().map(|(topic, filter)| {
            Effect::Send(ClientMessage::Subscribe {
                topic: topic.clone(),
                filter: filter.clone(),
            })
        }));
        if self.ping_running {
            effects.push(Effect::StopPing);
        }
        self.ping_running = true;
        effects.push(Effect::StartPing);
    }

    fn frame(&mut self, text: &str, now: Instant, effects: &mut Vec<Effect>) {
        self.last_activity = Some(now);
        match Frame::parse(text) {
            Ok(Frame::Pong) => {}
            Ok(Frame::Status(payload)) => match serde_json::from_value::<StatusSnapshot>(payload) {
                Ok(status) => effects.push(Effect::PublishStatus(status)),
                Err(e) => log::warn!("dropping undecodable status frame: {}", e),
            },
            Ok(Frame::Record(record)) => self.history.push(record),
            Err(e) => log::warn!("invalid telemetry: {}", e),
        }
    }

    fn closed(&mut self, effects: &mut Vec<Effect>) {
        if !self.socket_live {
            return;
        }
        log::info!("telemetry connection closed");
        self.socket_live = false;
        self.state = ConnectionState::Disconnected;
        self.stop_ping(effects);
        if !self.manual_disconnect {
            self.schedule_reconnect(effects);
        }
    }

    fn ping_tick(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        if self.state != ConnectionState::Connected || !self.ping_running {
            return;
        }
        let idle = self
            .last_activity
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        if idle > self.settings.stale_after {
            log::warn!(
                "telemetry silent for {:.1}s, forcing reconnect",
                idle.as_secs_f64()
            );
            self.teardown(effects);
            self.state = ConnectionState::Disconnected;
            effects.push(Effect::Reconnect);
            return;
        }
        log::debug!("telemetry ping");
        effects.push(Effect::Send(ClientMessage::Ping));
    }

    fn schedule_reconnect(&mut self, effects: &mut Vec<Effect>) {
        if self.reconnect_pending {
            return;
        }
        let delay = self.settings.backoff.delay(self.retries);
        self.retries = self.retries.saturating_add(1);
        self.reconnect_pending = true;
        log::info!(
            "telemetry reconnect #{} in {} ms",
            self.retries,
            delay.as_millis()
        );
        effects.push(Effect::ScheduleReconnect(delay));
    }

    fn cancel_reconnect(&mut self, effects: &mut Vec<Effect>) {
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }
    }

    fn stop_ping(&mut self, effects: &mut Vec<Effect>) {
        if self.ping_running {
            self.ping_running = false;
            effects.push(Effect::StopPing);
        }
    }

    fn teardown(&mut self, effects: &mut Vec<Effect>) {
        self.stop_ping(effects);
        if self.socket_live {
            self.socket_live = false;
            effects.push(Effect::Close);
        }
    }
}
