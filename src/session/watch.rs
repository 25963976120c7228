//! Timer-driven polling of the active call

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::session::manager::{CallSession, SessionManager};
use crate::SessionResult;

/// Poll the active call every `interval` until it reaches a terminal state.
///
/// Polls never overlap: the next tick is only awaited once the previous poll
/// has resolved. `on_change` runs whenever the status or duration changes.
/// When `stop` resolves first, the current snapshot is returned and the call
/// is left in the store for a later resume.
pub async fn watch<F, S>(
    manager: &mut SessionManager,
    interval: Duration,
    mut on_change: F,
    stop: S,
) -> SessionResult<CallSession>
where
    F: FnMut(&CallSession),
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(stop);

    let mut last_seen = None;

    loop {
        tokio::select! {
            _ = &mut stop => {
                tracing::info!("Stopped watching call");
                return Ok(manager.session().clone());
            }
            _ = ticker.tick() => {}
        }

        let session = manager.poll().await?;

        let seen = (session.status, session.duration_ms);
        if last_seen != Some(seen) {
            on_change(&session);
            last_seen = Some(seen);
        }

        if session.status.is_terminal() {
            return Ok(session);
        }
    }
}
