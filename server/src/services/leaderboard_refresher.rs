use std::time::Duration;

use tracing::info;

use crate::state::AppState;

/// Load the leaderboard at startup, then again every `refresh` if one is set.
pub async fn run(state: AppState, refresh: Option<Duration>) {
    let Some(refresh) = refresh else {
        state.leaderboard.load().await;
        info!("leaderboard periodic refresh disabled");
        return;
    };

    info!(refresh_secs = refresh.as_secs(), "leaderboard refresher started");
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // First tick fires immediately.
    loop {
        interval.tick().await;
        state.leaderboard.refetch().await;
    }
}
