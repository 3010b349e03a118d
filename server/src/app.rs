use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/api/leaderboard", get(routes::leaderboard::get_leaderboard))
        .route(
            "/api/leaderboard/refetch",
            post(routes::leaderboard::refetch_leaderboard),
        )
        .route("/api/players/{name}", get(routes::players::get_player))
        .route(
            "/api/players/{name}/categories/{category}",
            get(routes::players::get_player_category),
        )
        .route(
            "/api/maps-by-category",
            get(routes::players::get_maps_by_category),
        )
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .layer(middleware::from_fn(set_cache_control))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Failed responses are never cached; successful ones without a header get the path default.
async fn set_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    let failed = !response.status().is_success();
    let headers = response.headers_mut();
    if failed {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    } else if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control_for_path(&path)),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> &'static str {
    match path {
        "/api/health" | "/api/metrics" | "/api/leaderboard/refetch" => "no-store",
        "/api/maps-by-category" => "public, max-age=300",
        _ => "no-cache",
    }
}
