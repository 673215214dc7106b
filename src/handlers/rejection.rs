// Rejection recovery: every failure leaves as a JSON ErrorResponse

use std::convert::Infallible;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::error_reply;
use crate::models::ErrorResponse;

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, body) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("Not found"))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorResponse::with_details("Invalid request body", e.to_string()),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorResponse::new("Expected a JSON body"),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new("Request body too large"),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            ErrorResponse::new("Content-Length required"),
        )
    } else if err.find::<warp::filters::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, ErrorResponse::new("Origin not allowed"))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("Method not allowed"),
        )
    } else {
        error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Internal server error"),
        )
    };

    debug!(status = status.as_u16(), error = %body.error, "request rejected");
    Ok(error_reply(status, body))
}
