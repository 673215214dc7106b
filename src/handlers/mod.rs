// Handlers module

pub mod health;
pub mod recommend;
pub mod rejection;
pub mod stream_recommend;

pub use health::health_handler;
pub use recommend::recommend_handler;
pub use rejection::handle_rejection;
pub use stream_recommend::stream_recommend_handler;

use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::models::ErrorResponse;

/// JSON error body with the given status
pub(crate) fn error_reply(status: StatusCode, body: ErrorResponse) -> Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
