use std::{sync::Arc, time::Duration};

use crate::{services::session_store::SessionStore, utils::time::Clock};

/// Removes expired sessions on a fixed cadence until the task is aborted.
pub fn spawn_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let expired_count = sessions.purge_expired(clock.now());
            if expired_count > 0 {
                tracing::info!(expired_count, "sessions_expired_purged");
            } else {
                tracing::debug!("session_sweep_found_nothing");
            }
        }
    })
}
