use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::pending;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use super::error::TelemetryError;
use super::session::{Effect, Event, Session, SessionSettings};
use super::transport::{Connector, Transport};
use super::types::{ConnectionState, TelemetryRecord};
use crate::status::StatusSink;

type Opening = BoxFuture<'static, Result<Box<dyn Transport>, TelemetryError>>;

const TRANSITION_BUFFER: usize = 64;

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Handle to the telemetry connection worker.
///
/// Every mutating call is queued to the worker and applied in order; the
/// read accessors look at the session the worker last updated.
pub struct TelemetryClient {
    session: Arc<StdMutex<Session>>,
    events_tx: mpsc::UnboundedSender<Event>,
    state_rx: watch::Receiver<ConnectionState>,
    transitions_tx: broadcast::Sender<ConnectionState>,
    worker: Option<WorkerHandle>,
}

impl TelemetryClient {
    pub fn spawn(
        settings: SessionSettings,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let session = Arc::new(StdMutex::new(Session::new(settings)));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (transitions_tx, _) = broadcast::channel(TRANSITION_BUFFER);
        let (stop_tx, stop_rx) = oneshot::channel();

        let driver = Driver {
            session: session.clone(),
            connector,
            sink,
            state_tx,
            transitions_tx: transitions_tx.clone(),
            socket: None,
            opening: None,
            ping: None,
            reconnect_at: None,
        };
        let join = tokio::spawn(run_worker(driver, events_rx, stop_rx));

        Self {
            session,
            events_tx,
            state_rx,
            transitions_tx,
            worker: Some(WorkerHandle { stop_tx, join }),
        }
    }

    fn send(&self, event: Event) -> Result<(), TelemetryError> {
        self.events_tx
            .send(event)
            .map_err(|_| TelemetryError::Stopped)
    }

    pub fn connect(&self, url: impl Into<String>) -> Result<(), TelemetryError> {
        self.send(Event::Connect(Some(url.into())))
    }

    /// Retries the last URL.
    pub fn reconnect(&self) -> Result<(), TelemetryError> {
        self.send(Event::Connect(None))
    }

    pub fn subscribe(&self, topic: impl Into<String>, filter: Value) -> Result<(), TelemetryError> {
        self.send(Event::Subscribe {
            topic: topic.into(),
            filter,
        })
    }

    pub fn unsubscribe(&self, topic: impl Into<String>) -> Result<(), TelemetryError> {
        self.send(Event::Unsubscribe(topic.into()))
    }

    pub fn clear(&self, topic: impl Into<String>) -> Result<(), TelemetryError> {
        self.send(Event::Clear(topic.into()))
    }

    pub fn ping(&self) -> Result<(), TelemetryError> {
        self.send(Event::Ping)
    }

    pub fn disconnect(&self) -> Result<(), TelemetryError> {
        self.send(Event::Disconnect)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Latest state only; intermediate states may be skipped by a slow reader.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Every state change from now on, in order.
    pub fn transitions(&self) -> broadcast::Receiver<ConnectionState> {
        self.transitions_tx.subscribe()
    }

    pub fn history(&self, topic: &str) -> Vec<TelemetryRecord> {
        self.session.lock().unwrap().records(topic)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.session.lock().unwrap().subscriptions()
    }

    pub fn url(&self) -> Option<String> {
        self.session.lock().unwrap().url().map(String::from)
    }

    /// Stops the worker and closes any open socket.
    pub async fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
    }
}

enum Wake {
    Stop,
    Event(Event),
    Opened(Result<Box<dyn Transport>, TelemetryError>),
    Received(Option<Result<String, TelemetryError>>),
    PingTick,
    ReconnectDue,
}

struct Driver {
    session: Arc<StdMutex<Session>>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn StatusSink>,
    state_tx: watch::Sender<ConnectionState>,
    transitions_tx: broadcast::Sender<ConnectionState>,
    socket: Option<Box<dyn Transport>>,
    opening: Option<Opening>,
    ping: Option<Interval>,
    reconnect_at: Option<Instant>,
}

async fn run_worker(
    mut driver: Driver,
    mut events_rx: mpsc::UnboundedReceiver<Event>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let wake = tokio::select! {
            _ = &mut stop_rx => Wake::Stop,
            event = events_rx.recv() => event.map_or(Wake::Stop, Wake::Event),
            result = next_open(&mut driver.opening) => Wake::Opened(result),
            frame = next_frame(&mut driver.socket) => Wake::Received(frame),
            _ = next_tick(&mut driver.ping) => Wake::PingTick,
            _ = sleep_until_some(driver.reconnect_at) => Wake::ReconnectDue,
        };

        match wake {
            Wake::Stop => break,
            Wake::Event(event) => driver.dispatch(vec![event]).await,
            Wake::Opened(result) => {
                driver.opening = None;
                match result {
                    Ok(transport) => {
                        driver.socket = Some(transport);
                        driver.dispatch(vec![Event::Opened]).await;
                    }
                    Err(e) => {
                        driver
                            .dispatch(vec![Event::TransportError(e.to_string()), Event::Closed])
                            .await
                    }
                }
            }
            Wake::Received(Some(Ok(text))) => driver.dispatch(vec![Event::Frame(text)]).await,
            Wake::Received(Some(Err(e))) => {
                driver.drop_socket().await;
                driver
                    .dispatch(vec![Event::TransportError(e.to_string()), Event::Closed])
                    .await;
            }
            Wake::Received(None) => {
                driver.socket = None;
                driver.dispatch(vec![Event::Closed]).await;
            }
            Wake::PingTick => driver.dispatch(vec![Event::PingTick]).await,
            Wake::ReconnectDue => {
                driver.reconnect_at = None;
                driver.dispatch(vec![Event::ReconnectDue]).await;
            }
        }
    }

    driver.drop_socket().await;
    log::info!("telemetry worker stopped");
}

async fn next_open(opening: &mut Option<Opening>) -> Result<Box<dyn Transport>, TelemetryError> {
    match opening {
        Some(future) => future.as_mut().await,
        None => pending().await,
    }
}

async fn next_frame(socket: &mut Option<Box<dyn Transport>>) -> Option<Result<String, TelemetryError>> {
    match socket {
        Some(transport) => transport.recv().await,
        None => pending().await,
    }
}

async fn next_tick(ping: &mut Option<Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

impl Driver {
    /// Feeds events to the session, applying effects until no follow-up
    /// events remain. The state is published after each event.
    async fn dispatch(&mut self, events: Vec<Event>) {
        let mut queue = VecDeque::from(events);
        while let Some(event) = queue.pop_front() {
            let (effects, state) = {
                let mut session = self.session.lock().unwrap();
                let effects = session.handle(event, Instant::now().into_std());
                (effects, session.state())
            };
            self.publish_state(state);
            for effect in effects {
                queue.extend(self.apply(effect).await);
            }
        }
    }

    fn publish_state(&self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            // No subscribers is fine.
            let _ = self.transitions_tx.send(state);
        }
    }

    async fn apply(&mut self, effect: Effect) -> Vec<Event> {
        match effect {
            Effect::Open(url) => {
                self.drop_socket().await;
                let connector = self.connector.clone();
                self.opening = Some(Box::pin(async move { connector.connect(&url).await }));
            }
            Effect::Send(message) => {
                let Some(socket) = self.socket.as_mut() else {
                    log::debug!("telemetry socket not open, dropping {:?}", message);
                    return Vec::new();
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("failed to encode {:?}: {}", message, e);
                        return Vec::new();
                    }
                };
                if let Err(e) = socket.send(text).await {
                    self.drop_socket().await;
                    return vec![Event::TransportError(e.to_string()), Event::Closed];
                }
            }
            Effect::Close => self.drop_socket().await,
            Effect::StartPing => {
                let period = self.session.lock().unwrap().settings().ping_interval;
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ping = Some(interval);
            }
            Effect::StopPing => self.ping = None,
            Effect::ScheduleReconnect(delay) => self.reconnect_at = Some(Instant::now() + delay),
            Effect::Reconnect => return vec![Event::Connect(None)],
            Effect::CancelReconnect => self.reconnect_at = None,
            Effect::PublishStatus(status) => self.sink.publish(status),
        }
        Vec::new()
    }

    async fn drop_socket(&mut self) {
        self.opening = None;
        if let Some(mut socket) = self.socket.take() {
            socket.close().await;
        }
    }
}
