use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::location::LocationProvider;
use super::types::{compute_visibility, CatalogTarget, VisibilitySnapshot};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_LOCATION_RETRY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub refresh_interval: Duration,
    pub location_retry: Duration,
    /// `None` keeps retrying until a location shows up.
    pub max_location_attempts: Option<u32>,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            location_retry: DEFAULT_LOCATION_RETRY,
            max_location_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefreshMode {
    Idle,
    WaitingForLocation { attempts: u32 },
    Running,
    GaveUp { attempts: u32 },
}

#[derive(Debug)]
struct Shared {
    mode: RefreshMode,
    targets: Arc<Vec<CatalogTarget>>,
    latest: Option<VisibilitySnapshot>,
    refreshes: u64,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Keeps catalog az/alt positions current on a timer.
pub struct VisibilityRefresher {
    provider: Arc<dyn LocationProvider>,
    settings: RefreshSettings,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

impl VisibilityRefresher {
    pub fn new(provider: Arc<dyn LocationProvider>, settings: RefreshSettings) -> Self {
        Self {
            provider,
            settings,
            shared: Arc::new(StdMutex::new(Shared {
                mode: RefreshMode::Idle,
                targets: Arc::new(Vec::new()),
                latest: None,
                refreshes: 0,
            })),
            worker: None,
        }
    }

    pub fn mode(&self) -> RefreshMode {
        self.shared.lock().unwrap().mode
    }

    pub fn latest(&self) -> Option<VisibilitySnapshot> {
        self.shared.lock().unwrap().latest.clone()
    }

    /// Number of completed recomputations since construction.
    pub fn refreshes(&self) -> u64 {
        self.shared.lock().unwrap().refreshes
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Recomputes right away if a location is known, without touching the timer.
    pub fn refresh_once(&self) -> Option<VisibilitySnapshot> {
        let site = self.provider.current()?;
        let targets = self.shared.lock().unwrap().targets.clone();
        let snapshot = compute_visibility(&targets, site, Utc::now());
        store(&self.shared, snapshot.clone());
        Some(snapshot)
    }

    /// Starts the periodic refresh for `targets`, replacing any running one.
    pub async fn start(&mut self, targets: Vec<CatalogTarget>) {
        self.stop().await;

        {
            let mut locked = self.shared.lock().unwrap();
            locked.targets = Arc::new(targets);
            locked.mode = RefreshMode::WaitingForLocation { attempts: 0 };
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_refresh_loop(
            self.shared.clone(),
            self.provider.clone(),
            self.settings,
            stop_rx,
        ));
        self.worker = Some(WorkerHandle { stop_tx, join });
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
        let mut locked = self.shared.lock().unwrap();
        if !matches!(locked.mode, RefreshMode::GaveUp { .. }) {
            locked.mode = RefreshMode::Idle;
        }
    }
}

fn store(shared: &StdMutex<Shared>, snapshot: VisibilitySnapshot) {
    let mut locked = shared.lock().unwrap();
    locked.latest = Some(snapshot);
    locked.refreshes += 1;
}

async fn run_refresh_loop(
    shared: Arc<StdMutex<Shared>>,
    provider: Arc<dyn LocationProvider>,
    settings: RefreshSettings,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut attempts = 0u32;
    loop {
        let delay = match provider.current() {
            Some(site) => {
                attempts = 0;
                let targets = shared.lock().unwrap().targets.clone();
                let snapshot = compute_visibility(&targets, site, Utc::now());
                log::info!(
                    "visibility refreshed: {} of {} targets above the horizon",
                    snapshot.visible().count(),
                    snapshot.targets.len()
                );
                store(&shared, snapshot);
                shared.lock().unwrap().mode = RefreshMode::Running;
                settings.refresh_interval
            }
            None => {
                attempts += 1;
                if settings
                    .max_location_attempts
                    .is_some_and(|max| attempts >= max)
                {
                    log::warn!("no observer location after {} attempts, giving up", attempts);
                    shared.lock().unwrap().mode = RefreshMode::GaveUp { attempts };
                    return;
                }
                log::info!(
                    "observer location unknown, retrying in {}",
                    humantime::format_duration(settings.location_retry)
                );
                shared.lock().unwrap().mode = RefreshMode::WaitingForLocation { attempts };
                settings.location_retry
            }
        };

        let should_stop = tokio::select! {
            _ = sleep(delay) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::Site;
    use crate::visibility::location::{FixedLocation, SharedLocation};
    use tokio::time::Instant;

    fn targets() -> Vec<CatalogTarget> {
        vec![
            CatalogTarget::new("Vega", 279.23, 38.78),
            CatalogTarget::new("Canopus", 95.99, -52.70),
        ]
    }

    fn site() -> Site {
        Site::new(45.5, -73.6).unwrap()
    }

    async fn settle() {
        // Let the worker run up to its next sleep.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_the_interval() {
        let mut refresher =
            VisibilityRefresher::new(Arc::new(FixedLocation(site())), RefreshSettings::default());
        refresher.start(targets()).await;
        settle().await;
        assert_eq!(refresher.refreshes(), 1);
        assert_eq!(refresher.mode(), RefreshMode::Running);
        assert_eq!(refresher.latest().unwrap().targets.len(), 2);

        tokio::time::sleep(Duration::from_secs(14 * 60)).await;
        assert_eq!(refresher.refreshes(), 1);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(refresher.refreshes(), 2);

        refresher.stop().await;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(refresher.refreshes(), 2);
        assert_eq!(refresher.mode(), RefreshMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_location_is_known() {
        let location = Arc::new(SharedLocation::new());
        let mut refresher = VisibilityRefresher::new(location.clone(), RefreshSettings::default());
        let started = Instant::now();
        refresher.start(targets()).await;
        settle().await;
        assert_eq!(refresher.mode(), RefreshMode::WaitingForLocation { attempts: 1 });

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(refresher.mode(), RefreshMode::WaitingForLocation { attempts: 3 });
        assert!(refresher.latest().is_none());

        location.set(Some(site()));
        while refresher.latest().is_none() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        let waited = started.elapsed().as_secs();
        assert!((30..=31).contains(&waited), "first refresh after {}s", waited);
        assert_eq!(refresher.latest().unwrap().site, site());

        refresher.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let settings = RefreshSettings {
            max_location_attempts: Some(3),
            ..Default::default()
        };
        let mut refresher = VisibilityRefresher::new(Arc::new(SharedLocation::new()), settings);
        refresher.start(targets()).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(refresher.mode(), RefreshMode::GaveUp { attempts: 3 });
        assert!(refresher.latest().is_none());
        refresher.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_timer() {
        let mut refresher =
            VisibilityRefresher::new(Arc::new(FixedLocation(site())), RefreshSettings::default());
        refresher.start(targets()).await;
        settle().await;
        refresher.start(vec![CatalogTarget::new("Deneb", 310.36, 45.28)]).await;
        settle().await;
        assert_eq!(refresher.refreshes(), 2);
        assert_eq!(refresher.latest().unwrap().targets[0].name, "Deneb");

        tokio::time::sleep(Duration::from_secs(15 * 60 + 1)).await;
        // A leaked first timer would have produced a fourth refresh.
        assert_eq!(refresher.refreshes(), 3);
        refresher.stop().await;
    }

    #[test]
    fn refresh_once_needs_a_location() {
        let location = Arc::new(SharedLocation::new());
        let refresher = VisibilityRefresher::new(location.clone(), RefreshSettings::default());
        assert!(refresher.refresh_once().is_none());
        location.set(Some(site()));
        let snapshot = refresher.refresh_once().unwrap();
        assert!(snapshot.targets.is_empty());
        assert_eq!(refresher.refreshes(), 1);
    }
}
