use std::sync::Arc;

use chrono::{DateTime, Utc};
use ddrank_shared::{
    LeaderboardEntry, LeaderboardResponse, fallback_entries, is_supported_schema_version,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::LEADERBOARD_FILE;
use crate::data_source::{DataSource, FetchError};
use crate::state::ObservabilityCounters;

/// Point-in-time view of the leaderboard store. Entries are shared, never mutated.
#[derive(Debug, Clone)]
pub struct LeaderboardSnapshot {
    pub entries: Arc<Vec<LeaderboardEntry>>,
    pub generated_at: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Default for LeaderboardSnapshot {
    /// Sample rows marked as loading, until the first load finishes.
    fn default() -> Self {
        Self {
            entries: Arc::new(fallback_entries()),
            generated_at: None,
            loading: true,
            error: None,
            loaded_at: None,
        }
    }
}

#[derive(Default)]
struct StoreState {
    snapshot: LeaderboardSnapshot,
    in_flight: usize,
}

pub struct LeaderboardStore {
    state: RwLock<StoreState>,
    client: reqwest::Client,
    source: DataSource,
    observability: Arc<ObservabilityCounters>,
}

impl LeaderboardStore {
    pub fn new(
        client: reqwest::Client,
        source: DataSource,
        observability: Arc<ObservabilityCounters>,
    ) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            client,
            source,
            observability,
        }
    }

    pub async fn snapshot(&self) -> LeaderboardSnapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Fetch `leaderboard.json` once and swap it in, or fall back to the sample rows.
    pub async fn load(&self) {
        self.observability.record_leaderboard_load();
        {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.snapshot.loading = true;
            state.snapshot.error = None;
        }

        let result = fetch_leaderboard(&self.client, &self.source).await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        let still_loading = state.in_flight > 0;

        state.snapshot = match result {
            Ok(response) => {
                info!(
                    entries = response.entries.len(),
                    schema_version = response.schema_version,
                    source = %self.source.describe(),
                    "loaded leaderboard"
                );
                LeaderboardSnapshot {
                    entries: Arc::new(response.entries),
                    generated_at: response.generated_at,
                    loading: still_loading,
                    error: None,
                    loaded_at: Some(Utc::now()),
                }
            }
            Err(e) => {
                warn!(error = %e, source = %self.source.describe(), "failed to load leaderboard, using sample data");
                self.observability.record_leaderboard_load_failure();
                LeaderboardSnapshot {
                    entries: Arc::new(fallback_entries()),
                    generated_at: None,
                    loading: still_loading,
                    error: Some(e.to_string()),
                    loaded_at: Some(Utc::now()),
                }
            }
        };
    }

    pub async fn refetch(&self) {
        self.load().await;
    }
}

async fn fetch_leaderboard(
    client: &reqwest::Client,
    source: &DataSource,
) -> Result<LeaderboardResponse, FetchError> {
    let bytes = source.fetch(client, LEADERBOARD_FILE).await?;
    parse_leaderboard(&bytes)
}

/// Reject unknown schema versions before looking at the entry layout.
/// A float with an integral value (`2.0`) counts as that integer.
pub(crate) fn parse_leaderboard(bytes: &[u8]) -> Result<LeaderboardResponse, FetchError> {
    let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
    let raw = value.get("schemaVersion");
    let version = match raw.and_then(schema_version_number) {
        Some(version) if is_supported_schema_version(version) => version,
        _ => {
            return Err(FetchError::SchemaVersion(
                raw.map_or_else(|| "undefined".to_owned(), ToString::to_string),
            ));
        }
    };
    if let Some(object) = value.as_object_mut() {
        object.insert("schemaVersion".to_owned(), version.into());
    }
    Ok(serde_json::from_value(value)?)
}

fn schema_version_number(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|version| version.fract() == 0.0 && version.abs() < i64::MAX as f64)
            .map(|version| version as i64)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use super::{LeaderboardStore, parse_leaderboard};
    use crate::data_source::{DataSource, FetchError};
    use crate::state::ObservabilityCounters;
    use crate::test_support::{Upstream, scratch_dir};

    const V2_PAYLOAD: &str = r#"{
        "schemaVersion": 2,
        "generatedAt": "2026-03-01T12:00:00Z",
        "entries": [
            {"rank": 1, "name": "Alpha", "points": 300, "completionPoints": 200, "teamRankPoints": 50, "rankPoints": 50, "region": "GER"},
            {"rank": 2, "name": "Beta", "points": 250, "completionPoints": 240, "teamRankPoints": 0, "rankPoints": 10, "region": "POL"}
        ]
    }"#;

    fn store_for(base_url: &str) -> (LeaderboardStore, Arc<ObservabilityCounters>) {
        let observability = Arc::new(ObservabilityCounters::default());
        let store = LeaderboardStore::new(
            reqwest::Client::new(),
            DataSource::parse(base_url),
            Arc::clone(&observability),
        );
        (store, observability)
    }

    #[test]
    fn parse_rejects_unknown_schema_versions() {
        let err = parse_leaderboard(br#"{"schemaVersion": 3, "entries": []}"#)
            .expect_err("v3 should be rejected");
        assert_eq!(err.to_string(), "Unknown schema version: 3");

        let err = parse_leaderboard(br#"{"entries": []}"#).expect_err("missing version");
        assert_eq!(err.to_string(), "Unknown schema version: undefined");

        let err = parse_leaderboard(br#"{"schemaVersion": "2", "entries": []}"#)
            .expect_err("string version");
        assert!(matches!(err, FetchError::SchemaVersion(_)));
    }

    #[test]
    fn parse_accepts_integral_float_versions() {
        let response = parse_leaderboard(br#"{"schemaVersion": 2.0, "entries": []}"#)
            .expect("2.0 is version 2");
        assert_eq!(response.schema_version, 2);

        let err = parse_leaderboard(br#"{"schemaVersion": 2.5, "entries": []}"#)
            .expect_err("fractional version");
        assert_eq!(err.to_string(), "Unknown schema version: 2.5");
    }

    #[test]
    fn parse_reports_malformed_payloads() {
        assert!(matches!(
            parse_leaderboard(b"<html>"),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_leaderboard(br#"{"schemaVersion": 2, "entries": [{"name": 5}]}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn parse_accepts_v1_and_v2() {
        let v1 = parse_leaderboard(
            br#"{"schemaVersion": 1, "generatedAt": "x", "entries": [{"rank": 1, "name": "A", "points": 1, "region": "EU"}]}"#,
        )
        .expect("v1 should parse");
        assert_eq!(v1.entries.len(), 1);

        let v2 = parse_leaderboard(V2_PAYLOAD.as_bytes()).expect("v2 should parse");
        assert_eq!(v2.entries[1].completion_points, Some(240.0));
    }

    #[tokio::test]
    async fn starts_with_sample_rows_marked_loading() {
        let (store, _) = store_for("http://127.0.0.1:9");
        let snapshot = store.snapshot().await;
        assert!(snapshot.loading);
        assert_eq!(snapshot.entries.len(), 10);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn load_replaces_entries_and_timestamp() {
        let upstream = Upstream::new().with("/leaderboard.json", StatusCode::OK, V2_PAYLOAD);
        let (base_url, handle) = upstream.spawn().await;
        let (store, observability) = store_for(&base_url);

        store.load().await;
        let snapshot = store.snapshot().await;

        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.generated_at.as_deref(), Some("2026-03-01T12:00:00Z"));
        let names: Vec<&str> = snapshot.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(observability.snapshot().leaderboard_loads_total, 1);
        assert_eq!(observability.snapshot().leaderboard_load_failures_total, 0);

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn http_error_falls_back_to_sample_rows() {
        let upstream = Upstream::new().with("/leaderboard.json", StatusCode::SERVICE_UNAVAILABLE, "");
        let (base_url, handle) = upstream.spawn().await;
        let (store, observability) = store_for(&base_url);

        store.load().await;
        let snapshot = store.snapshot().await;

        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("HTTP 503"));
        assert_eq!(snapshot.entries[0].name, "SpeedDemon");
        assert!(snapshot.generated_at.is_none());
        assert_eq!(observability.snapshot().leaderboard_load_failures_total, 1);

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn failed_refetch_reverts_previous_good_data() {
        let dir = scratch_dir("failed_refetch_reverts_previous_good_data");
        tokio::fs::create_dir_all(&dir).await.expect("create scratch dir");
        tokio::fs::write(dir.join("leaderboard.json"), V2_PAYLOAD)
            .await
            .expect("write leaderboard");
        let store = LeaderboardStore::new(
            reqwest::Client::new(),
            DataSource::Dir(dir.clone()),
            Arc::new(ObservabilityCounters::default()),
        );

        store.load().await;
        assert_eq!(store.snapshot().await.entries.len(), 2);

        tokio::fs::write(dir.join("leaderboard.json"), "{\"schemaVersion\": 2, \"entries\": [")
            .await
            .expect("truncate leaderboard");
        store.refetch().await;

        let snapshot = store.snapshot().await;
        assert!(
            snapshot
                .error
                .as_deref()
                .is_some_and(|error| error.starts_with("Malformed payload"))
        );
        assert_eq!(snapshot.entries.len(), 10);
        assert!(snapshot.generated_at.is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn unknown_schema_version_fails_closed() {
        let upstream = Upstream::new().with(
            "/leaderboard.json",
            StatusCode::OK,
            r#"{"schemaVersion": 9, "generatedAt": "2026-03-01T12:00:00Z", "entries": []}"#,
        );
        let (base_url, handle) = upstream.spawn().await;
        let (store, _) = store_for(&base_url);

        store.load().await;
        let snapshot = store.snapshot().await;
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Unknown schema version: 9")
        );
        assert_eq!(snapshot.entries.len(), 10);

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn each_load_is_a_single_attempt() {
        let upstream = Upstream::new().with("/leaderboard.json", StatusCode::BAD_GATEWAY, "");
        let (base_url, handle) = upstream.spawn().await;
        let (store, _) = store_for(&base_url);

        store.load().await;
        assert_eq!(upstream.hits("/leaderboard.json"), 1);
        store.refetch().await;
        assert_eq!(upstream.hits("/leaderboard.json"), 2);

        handle.abort();
        let _ = handle.await;
    }
}
