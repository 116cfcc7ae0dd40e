//! Background scheduler for periodic portfolio snapshots.

use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;
use ledgerfolio_core::portfolio::snapshot::SnapshotSource;

/// Starts the snapshot scheduler. The first run happens one period after start.
pub fn start_snapshot_scheduler(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        info!("Snapshot scheduler started ({:?} interval)", period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_snapshots(&state).await;
        }
    });
}

/// Takes one scheduled snapshot per known user. Returns how many succeeded.
pub async fn run_scheduled_snapshots(state: &AppState) -> usize {
    let users = match state.portfolio_service.list_users() {
        Ok(users) => users,
        Err(e) => {
            warn!("Scheduled snapshots skipped: could not list users: {}", e);
            return 0;
        }
    };
    if users.is_empty() {
        debug!("Scheduled snapshots skipped: no users");
        return 0;
    }

    info!("Running scheduled snapshots for {} users", users.len());
    let mut created = 0;
    for user_id in &users {
        match state
            .portfolio_service
            .create_snapshot(user_id, SnapshotSource::Scheduled)
            .await
        {
            Ok(snapshot) => {
                created += 1;
                debug!(
                    "Scheduled snapshot {} for {}: total value {}",
                    snapshot.id, user_id, snapshot.total_value
                );
            }
            Err(e) => warn!("Scheduled snapshot for {} failed: {}", user_id, e),
        }
    }
    info!(
        "Scheduled snapshots completed: {}/{} users",
        created,
        users.len()
    );
    created
}
