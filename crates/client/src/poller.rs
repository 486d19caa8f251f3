use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::session::BoardSession;

/// Used until the server's `ServerInfo` has been fetched.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Refreshes the session's board every `interval` until `shutdown` turns true.
/// Ticks that land while a write is in flight skip the fetch entirely.
/// Intervals shorter than [`MIN_POLL_INTERVAL`] are raised to it.
pub fn spawn_poller(
    session: BoardSession,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = interval.max(MIN_POLL_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let project_id = session.project_id();
        tracing::debug!(%project_id, ?interval, "Board poller started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if session.cache().in_flight() > 0 {
                        tracing::trace!(%project_id, "Write in flight, skipping poll");
                        continue;
                    }
                    match session.refresh().await {
                        Ok(adopted) => tracing::trace!(%project_id, adopted, "Polled board"),
                        Err(err) => tracing::warn!(%project_id, error = %err, "Board poll failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(%project_id, "Board poller stopped");
    })
}
