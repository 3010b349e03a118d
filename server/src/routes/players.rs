use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use ddrank_shared::time_format::{format_first_finish, format_points, format_time};
use ddrank_shared::{
    LeaderboardEntry, MapInCategory, MapSortKey, MapSortState, ProfileMapRow, RankTier,
    order_categories, regional_rank, unfinished_maps,
};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PLAYER_NAME_LEN;
use crate::routes::api::json_response;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategorySummary<'a> {
    name: &'a str,
    total_maps: u32,
    finished: u32,
    progress_percent: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerView<'a> {
    player: &'a LeaderboardEntry,
    global_rank: u32,
    regional_rank: Option<u32>,
    tier: Option<RankTier>,
    points_display: String,
    categories: Vec<CategorySummary<'a>>,
    loading: bool,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapRowView {
    #[serde(flatten)]
    row: ProfileMapRow,
    points_display: String,
    rank_time_display: String,
    team_rank_time_display: String,
    first_finish_display: String,
}

impl From<ProfileMapRow> for MapRowView {
    fn from(row: ProfileMapRow) -> Self {
        Self {
            points_display: format_points(row.points),
            rank_time_display: format_time(row.rank_time),
            team_rank_time_display: format_time(row.team_rank_time),
            first_finish_display: format_first_finish(row.first_finish.as_deref()),
            row,
        }
    }
}

/// Query a client sends when a column header is clicked in the current state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnToggle {
    key: &'static str,
    sort: &'static str,
    dir: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryView<'a> {
    player: &'a str,
    category: &'a str,
    sort: &'static str,
    dir: &'static str,
    total_maps: u32,
    finished: u32,
    progress_percent: f64,
    maps: Vec<MapRowView>,
    unfinished: Vec<MapInCategory>,
    catalog_loaded: bool,
    columns: Vec<ColumnToggle>,
}

const fn dir_name(ascending: bool) -> &'static str {
    if ascending { "asc" } else { "desc" }
}

fn normalize_player_name(name: &str) -> Result<&str, StatusCode> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(trimmed)
}

/// Explicit `sort`/`dir` query to a table state. A missing `dir` uses the column default.
fn parse_sort_state(query: &CategoryQuery) -> Result<MapSortState, StatusCode> {
    let key = match query.sort.as_deref().filter(|sort| !sort.is_empty()) {
        Some(sort) => sort
            .parse::<MapSortKey>()
            .map_err(|_| StatusCode::BAD_REQUEST)?,
        None => MapSortKey::default(),
    };
    let ascending = match query.dir.as_deref().filter(|dir| !dir.is_empty()) {
        Some("asc") => true,
        Some("desc") => false,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
        None => key.default_ascending(),
    };
    Ok(MapSortState { key, ascending })
}

async fn ensure_ranked(state: &AppState, name: &str) -> Result<(), StatusCode> {
    let snapshot = state.leaderboard.snapshot().await;
    if snapshot.entries.iter().any(|entry| entry.name == name) {
        Ok(())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
) -> Result<Response, StatusCode> {
    let name = normalize_player_name(&raw_name)?;
    let snapshot = state.leaderboard.snapshot().await;
    let entry = snapshot
        .entries
        .iter()
        .find(|entry| entry.name == name)
        .ok_or(StatusCode::NOT_FOUND)?;

    state.profiles.load_player(name).await;
    let profile = state.profiles.profile(name);
    let status = state.profiles.status().await;
    let (loading, error) = if status.player.as_deref() == Some(name) {
        (status.loading, status.error)
    } else {
        (false, None)
    };

    let categories = profile
        .as_deref()
        .map(|profile| {
            order_categories(profile.keys().map(String::as_str))
                .into_iter()
                .filter_map(|category| {
                    let stats = profile.get(category)?;
                    Some(CategorySummary {
                        name: category,
                        total_maps: stats.total_maps,
                        finished: stats.finished,
                        progress_percent: stats.progress_percent(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let view = PlayerView {
        player: entry,
        global_rank: entry.rank,
        regional_rank: regional_rank(&snapshot.entries, name),
        tier: RankTier::for_rank(entry.rank),
        points_display: format_points(entry.points),
        categories,
        loading,
        error,
    };

    json_response(&view, "no-cache")
}

pub async fn get_player_category(
    State(state): State<AppState>,
    Path((raw_name, category)): Path<(String, String)>,
    Query(query): Query<CategoryQuery>,
) -> Result<Response, StatusCode> {
    let name = normalize_player_name(&raw_name)?;
    let sort_state = parse_sort_state(&query)?;
    ensure_ranked(&state, name).await?;

    state.profiles.load_player(name).await;
    let profile = state.profiles.profile(name).ok_or(StatusCode::NOT_FOUND)?;
    let stats = profile.get(&category).ok_or(StatusCode::NOT_FOUND)?;

    let catalog = state.profiles.maps_by_category().await;
    let unfinished = catalog
        .as_deref()
        .and_then(|catalog| catalog.get(&category))
        .map(|maps| unfinished_maps(maps, &stats.maps))
        .unwrap_or_default();

    let columns = MapSortKey::ALL
        .into_iter()
        .map(|key| {
            let next = sort_state.select(key);
            ColumnToggle {
                key: key.as_str(),
                sort: next.key.as_str(),
                dir: dir_name(next.ascending),
            }
        })
        .collect();

    let view = CategoryView {
        player: name,
        category: &category,
        sort: sort_state.key.as_str(),
        dir: dir_name(sort_state.ascending),
        total_maps: stats.total_maps,
        finished: stats.finished,
        progress_percent: stats.progress_percent(),
        maps: sort_state
            .apply(&stats.maps)
            .into_iter()
            .map(MapRowView::from)
            .collect(),
        unfinished,
        catalog_loaded: catalog.is_some(),
        columns,
    };

    json_response(&view, "no-cache")
}

pub async fn get_maps_by_category(State(state): State<AppState>) -> Result<Response, StatusCode> {
    state.profiles.load_maps_by_category().await;
    let catalog = state.profiles.maps_by_category().await;
    json_response(&catalog.as_deref(), "public, max-age=300")
}
