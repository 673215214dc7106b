// Route definitions

use std::convert::Infallible;
use warp::Filter;

use crate::handlers;
use crate::models::RecommendationRequest;
use crate::state::AppState;

/// Largest accepted request body
const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn configure_routes(
    state: AppState,
    allowed_origins: &[String],
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let api = warp::path("api");

    // GET /api/health
    let health = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    // POST /api/recommendations
    let recommend = api
        .and(warp::path("recommendations"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::recommend_handler);

    // POST /api/stream-recommendations
    let stream_recommend = api
        .and(warp::path("stream-recommendations"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::stream_recommend_handler);

    let cors = warp::cors()
        .allow_origins(allowed_origins.iter().map(String::as_str))
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_header("content-type")
        .allow_credentials(true);

    // Recovered errors pass back through CORS so browsers can read them;
    // the outer recover only sees the 403 for a disallowed origin
    health
        .or(recommend)
        .or(stream_recommend)
        .recover(handlers::handle_rejection)
        .with(cors)
        .recover(handlers::handle_rejection)
}

fn json_body() -> impl Filter<Extract = (RecommendationRequest,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
