use std::fmt::Write as _;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let leaderboard = state.leaderboard.snapshot().await;
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "data_source": state.data_source.describe(),
        "leaderboard_entries": leaderboard.entries.len(),
        "leaderboard_loading": leaderboard.loading,
        "leaderboard_error": leaderboard.error,
        "leaderboard_loaded_at": leaderboard.loaded_at,
        "cached_profiles": state.profiles.cached_players(),
        "maps_catalog_loaded": state.profiles.maps_by_category().await.is_some(),
        "observability": {
            "leaderboard_loads_total": observability.leaderboard_loads_total,
            "leaderboard_load_failures_total": observability.leaderboard_load_failures_total,
            "profile_requests_total": observability.profile_requests_total,
            "profile_cache_hits_total": observability.profile_cache_hits_total,
            "profile_local_loads_total": observability.profile_local_loads_total,
            "profile_fallback_loads_total": observability.profile_fallback_loads_total,
            "profile_failures_total": observability.profile_failures_total,
            "maps_catalog_failures_total": observability.maps_catalog_failures_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let leaderboard = state.leaderboard.snapshot().await;
    let gauges = Gauges {
        leaderboard_entries: leaderboard.entries.len(),
        leaderboard_healthy: leaderboard.error.is_none(),
        cached_profiles: state.profiles.cached_players(),
        maps_catalog_loaded: state.profiles.maps_by_category().await.is_some(),
    };
    let body = render_prometheus_metrics(gauges, state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

#[derive(Debug, Clone, Copy)]
struct Gauges {
    leaderboard_entries: usize,
    leaderboard_healthy: bool,
    cached_profiles: usize,
    maps_catalog_loaded: bool,
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: impl std::fmt::Display) {
    let _ = writeln!(body, "# HELP ddrank_{name} {help}");
    let _ = writeln!(body, "# TYPE ddrank_{name} {kind}");
    let _ = writeln!(body, "ddrank_{name} {value}");
}

fn render_prometheus_metrics(gauges: Gauges, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "leaderboard_entries",
        "gauge",
        "Entries currently served by the leaderboard store.",
        gauges.leaderboard_entries,
    );
    write_metric(
        &mut body,
        "leaderboard_healthy",
        "gauge",
        "Whether the last leaderboard load succeeded (1 or 0).",
        u8::from(gauges.leaderboard_healthy),
    );
    write_metric(
        &mut body,
        "cached_profiles",
        "gauge",
        "Player profiles held in the profile cache.",
        gauges.cached_profiles,
    );
    write_metric(
        &mut body,
        "maps_catalog_loaded",
        "gauge",
        "Whether the maps-by-category catalog is loaded (1 or 0).",
        u8::from(gauges.maps_catalog_loaded),
    );

    let counters = [
        (
            "leaderboard_loads_total",
            "Total leaderboard load attempts.",
            observability.leaderboard_loads_total,
        ),
        (
            "leaderboard_load_failures_total",
            "Total leaderboard loads that fell back to sample data.",
            observability.leaderboard_load_failures_total,
        ),
        (
            "profile_requests_total",
            "Total profile loads requested for non-blank names.",
            observability.profile_requests_total,
        ),
        (
            "profile_cache_hits_total",
            "Total profile loads answered from cache.",
            observability.profile_cache_hits_total,
        ),
        (
            "profile_local_loads_total",
            "Total profiles loaded from generated profile documents.",
            observability.profile_local_loads_total,
        ),
        (
            "profile_fallback_loads_total",
            "Total profiles loaded from the DDNet players API.",
            observability.profile_fallback_loads_total,
        ),
        (
            "profile_failures_total",
            "Total profile loads where every source failed.",
            observability.profile_failures_total,
        ),
        (
            "maps_catalog_failures_total",
            "Total failed maps-by-category catalog loads.",
            observability.maps_catalog_failures_total,
        ),
    ];
    for (name, help, value) in counters {
        write_metric(&mut body, name, "counter", help, value);
    }

    body
}

/// Serialize `value` and attach a `Cache-Control` header.
pub(crate) fn json_response<T: Serialize>(
    value: &T,
    cache_control: &'static str,
) -> Result<Response, StatusCode> {
    let body = serde_json::to_vec(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(json_bytes_response(Bytes::from(body), cache_control))
}

pub(crate) fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
