//! Background loop injecting simulated inbound messages.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::Error;
use crate::messages;
use crate::models::{MessageBody, NewMessage};
use crate::users;

const DEFAULT_STARTUP_POLL: Duration = Duration::from_secs(1);
const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How often to re-check the store while it is still empty.
    pub startup_poll_interval: Duration,
    /// Cadence of synthetic message injection.
    pub dispatch_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            startup_poll_interval: DEFAULT_STARTUP_POLL,
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
        }
    }
}

impl DispatcherConfig {
    /// Defaults, overridable via `RIPPLE_STARTUP_POLL_MS` and
    /// `RIPPLE_DISPATCH_INTERVAL_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = read_env_ms("RIPPLE_STARTUP_POLL_MS") {
            config.startup_poll_interval = ms;
        }
        if let Some(ms) = read_env_ms("RIPPLE_DISPATCH_INTERVAL_MS") {
            config.dispatch_interval = ms;
        }
        config
    }
}

fn read_env_ms(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

/// Owns the injection task. `start` is idempotent while a loop is live and
/// `stop` cancels it at the next select point; the transactional insert in
/// the store guarantees cancellation never leaves a half-applied write.
pub struct MessageDispatcher {
    db: Arc<Database>,
    config: DispatcherConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl MessageDispatcher {
    pub fn new(db: Arc<Database>, config: DispatcherConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            db,
            config,
            handle: Mutex::new(None),
            shutdown_tx,
        }
    }

    /// Start the injection loop. A second call while the loop is running
    /// is a no-op; after `stop` the dispatcher may be started again.
    pub fn start(&self) {
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("dispatcher handle poisoned, refusing to start");
                return;
            }
        };
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("dispatcher already running");
            return;
        }

        let db = Arc::clone(&self.db);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        *guard = Some(tokio::spawn(async move {
            info!("message dispatcher started");

            // Wait until at least one user exists before dispatching
            let user_ids = loop {
                match users::all_user_ids(&db) {
                    Ok(ids) if !ids.is_empty() => break ids,
                    Ok(_) => debug!("store empty, waiting for users"),
                    Err(e) => warn!(error = %e, "failed to list user ids"),
                }
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("message dispatcher stopped");
                        return;
                    }
                    _ = tokio::time::sleep(config.startup_poll_interval) => {}
                }
            };

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("message dispatcher stopped");
                        return;
                    }
                    _ = tokio::time::sleep(config.dispatch_interval) => {}
                }
                // Shutdown wins if it raced the tick
                if shutdown_rx.try_recv().is_ok() {
                    info!("message dispatcher stopped");
                    return;
                }
                if let Err(e) = dispatch_one(&db, &user_ids) {
                    warn!(error = %e, "failed to inject synthetic message");
                }
            }
        }));
    }

    /// Cancel the loop. No further inserts occur after the signal is
    /// observed; an insert already inside the store transaction completes
    /// whole.
    pub fn stop(&self) {
        info!("stopping message dispatcher");
        let _ = self.shutdown_tx.send(());
    }
}

fn dispatch_one(db: &Database, user_ids: &[i64]) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let Some(&sender_id) = user_ids.choose(&mut rng) else {
        return Ok(());
    };

    let body = match rng.gen_range(0..3) {
        0 => MessageBody::Text {
            content: format!(
                "New message from user {} · {}",
                sender_id,
                rng.gen_range(100..1000)
            ),
        },
        1 => MessageBody::Image {
            image_url: format!(
                "https://picsum.photos/seed/{}/320/240",
                rng.gen_range(1..10_000)
            ),
        },
        _ => MessageBody::Card {
            text: format!("User {} sent you an invitation", sender_id),
            button_text: "View".to_string(),
            interaction_state: Default::default(),
        },
    };

    let new = NewMessage {
        sender_id,
        timestamp: chrono::Utc::now().timestamp_millis(),
        is_read: false,
        body,
    };
    messages::insert_message(db, &new)?;
    debug!(sender_id, "synthetic message dispatched");
    Ok(())
}
