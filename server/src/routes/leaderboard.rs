use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use ddrank_shared::{
    LeaderboardEntry, PointsSortKey, RankTier, rerank, split_regions, unique_regions,
};
use serde::{Deserialize, Serialize};

use crate::routes::api::json_response;
use crate::state::AppState;
use crate::stores::leaderboard::LeaderboardSnapshot;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Serialize)]
struct RankedEntry<'a> {
    #[serde(flatten)]
    entry: &'a LeaderboardEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<RankTier>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardView<'a> {
    region: Option<&'a str>,
    sort: &'static str,
    regions: Vec<String>,
    priority_regions: Vec<String>,
    other_regions: Vec<String>,
    entries: Vec<RankedEntry<'a>>,
    generated_at: Option<&'a str>,
    loading: bool,
    error: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardStatus<'a> {
    entry_count: usize,
    generated_at: Option<&'a str>,
    loading: bool,
    error: Option<&'a str>,
}

impl<'a> LeaderboardStatus<'a> {
    fn from_snapshot(snapshot: &'a LeaderboardSnapshot) -> Self {
        Self {
            entry_count: snapshot.entries.len(),
            generated_at: snapshot.generated_at.as_deref(),
            loading: snapshot.loading,
            error: snapshot.error.as_deref(),
        }
    }
}

/// `region` of `""` or `all` means no filter.
fn region_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|region| !region.is_empty() && !region.eq_ignore_ascii_case("all"))
}

fn parse_sort(raw: Option<&str>) -> Result<PointsSortKey, StatusCode> {
    match raw.map(str::trim).filter(|sort| !sort.is_empty()) {
        Some(sort) => sort.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(PointsSortKey::default()),
    }
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response, StatusCode> {
    let sort = parse_sort(query.sort.as_deref())?;
    let region = region_filter(query.region.as_deref());

    let snapshot = state.leaderboard.snapshot().await;
    let ranked = rerank(&snapshot.entries, region, sort);
    let regions = unique_regions(&snapshot.entries);
    let groups = split_regions(&regions);

    let view = LeaderboardView {
        region,
        sort: sort.as_str(),
        regions,
        priority_regions: groups.priority,
        other_regions: groups.other,
        entries: ranked
            .iter()
            .map(|entry| RankedEntry {
                entry,
                tier: RankTier::for_rank(entry.rank),
            })
            .collect(),
        generated_at: snapshot.generated_at.as_deref(),
        loading: snapshot.loading,
        error: snapshot.error.as_deref(),
    };

    json_response(&view, "no-cache")
}

pub async fn refetch_leaderboard(State(state): State<AppState>) -> Result<Response, StatusCode> {
    state.leaderboard.refetch().await;
    let snapshot = state.leaderboard.snapshot().await;
    json_response(&LeaderboardStatus::from_snapshot(&snapshot), "no-store")
}
