//! Idle Session Reaper
//!
//! Background task that periodically retires UI sessions nobody has used for a
//! while. Retiring a session closes its connection, which drops the session's
//! cached results with it. Cache entries themselves are never checked here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::SessionMap;
use crate::clock::Clock;

/// Removes and closes every UI session idle for at least `idle_timeout_secs`.
///
/// Sessions busy with a request are skipped. Returns the number reaped.
pub async fn reap_idle_sessions(
    sessions: &SessionMap,
    now: DateTime<Utc>,
    idle_timeout_secs: u64,
) -> usize {
    let timeout = i64::try_from(idle_timeout_secs).unwrap_or(i64::MAX);

    let reaped = {
        let mut map = sessions.write().await;
        let idle: Vec<_> = map
            .iter()
            .filter(|(_, session)| {
                session
                    .try_lock()
                    .is_ok_and(|ui| ui.idle_secs(now) >= timeout)
            })
            .map(|(id, _)| *id)
            .collect();
        idle.into_iter()
            .filter_map(|id| map.remove(&id).map(|session| (id, session)))
            .collect::<Vec<_>>()
    };

    for (id, session) in &reaped {
        session.lock().await.close_all().await;
        debug!(ui_session = %id, "idle ui session reaped");
    }
    reaped.len()
}

/// Spawns a background task that periodically reaps idle UI sessions.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_session_reaper(
    sessions: SessionMap,
    clock: Arc<dyn Clock>,
    idle_timeout_secs: u64,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting session reaper with interval of {} seconds, idle timeout {} seconds",
            interval_secs, idle_timeout_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = reap_idle_sessions(&sessions, clock.now(), idle_timeout_secs).await;
            if removed > 0 {
                info!("Session reaper: closed {} idle sessions", removed);
            } else {
                debug!("Session reaper: no idle sessions found");
            }
        }
    })
}
