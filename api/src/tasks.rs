use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::state::AppState;

/// Spawns a task that periodically drops expired tokens from the registry.
///
/// Redemption re-checks expiry on its own, so the sweep only bounds memory held by
/// tokens nobody scanned. Returns `None` when `period` is zero.
pub fn spawn_token_sweeper(app_state: AppState, period: Duration) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        return None;
    }

    let attendance = app_state.attendance_clone();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = attendance.tokens().evict_expired();
            if removed > 0 {
                debug!(removed, live = attendance.tokens().len(), "Swept expired tokens");
            }
        }
    }))
}
