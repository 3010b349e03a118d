use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::config::{
    data_source, ddnet_players_url, upstream_connect_timeout, upstream_http_timeout,
};
use crate::data_source::DataSource;
use crate::stores::leaderboard::LeaderboardStore;
use crate::stores::profiles::ProfileStore;

#[derive(Clone)]
pub struct AppState {
    pub leaderboard: Arc<LeaderboardStore>,
    pub profiles: Arc<ProfileStore>,
    pub data_source: DataSource,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    leaderboard_loads_total: AtomicU64,
    leaderboard_load_failures_total: AtomicU64,
    profile_requests_total: AtomicU64,
    profile_cache_hits_total: AtomicU64,
    profile_local_loads_total: AtomicU64,
    profile_fallback_loads_total: AtomicU64,
    profile_failures_total: AtomicU64,
    maps_catalog_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub leaderboard_loads_total: u64,
    pub leaderboard_load_failures_total: u64,
    pub profile_requests_total: u64,
    pub profile_cache_hits_total: u64,
    pub profile_local_loads_total: u64,
    pub profile_fallback_loads_total: u64,
    pub profile_failures_total: u64,
    pub maps_catalog_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            leaderboard_loads_total: self.leaderboard_loads_total.load(Ordering::Relaxed),
            leaderboard_load_failures_total: self
                .leaderboard_load_failures_total
                .load(Ordering::Relaxed),
            profile_requests_total: self.profile_requests_total.load(Ordering::Relaxed),
            profile_cache_hits_total: self.profile_cache_hits_total.load(Ordering::Relaxed),
            profile_local_loads_total: self.profile_local_loads_total.load(Ordering::Relaxed),
            profile_fallback_loads_total: self
                .profile_fallback_loads_total
                .load(Ordering::Relaxed),
            profile_failures_total: self.profile_failures_total.load(Ordering::Relaxed),
            maps_catalog_failures_total: self
                .maps_catalog_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_leaderboard_load(&self) {
        self.leaderboard_loads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaderboard_load_failure(&self) {
        self.leaderboard_load_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_request(&self) {
        self.profile_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_cache_hit(&self) {
        self.profile_cache_hits_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_local_load(&self) {
        self.profile_local_loads_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_fallback_load(&self) {
        self.profile_fallback_loads_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_failure(&self) {
        self.profile_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_maps_catalog_failure(&self) {
        self.maps_catalog_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(data_source: DataSource, ddnet_players_url: String) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("ddrank/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        let observability = Arc::new(ObservabilityCounters::default());

        Self {
            leaderboard: Arc::new(LeaderboardStore::new(
                http_client.clone(),
                data_source.clone(),
                Arc::clone(&observability),
            )),
            profiles: Arc::new(ProfileStore::new(
                http_client,
                data_source.clone(),
                ddnet_players_url,
                Arc::clone(&observability),
            )),
            data_source,
            observability,
        }
    }

    pub fn from_env() -> Self {
        Self::new(data_source(), ddnet_players_url())
    }
}
