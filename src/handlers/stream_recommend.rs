// POST /api/stream-recommendations handler

use futures_util::stream::StreamExt;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use super::error_reply;
use crate::models::{ErrorResponse, RecommendationRequest};
use crate::prompt::build_request;
use crate::relay::RelaySession;
use crate::sse::to_sse_event;
use crate::state::AppState;

pub async fn stream_recommend_handler(
    request: RecommendationRequest,
    state: AppState,
) -> Result<Response, Infallible> {
    // Validation happens before the stream is opened so it can still use a status code
    let symptoms = match request.validated_symptoms() {
        Ok(symptoms) => symptoms,
        Err(e) => {
            warn!(error = %e, "rejecting streaming recommendation request");
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(e.to_string()),
            ));
        }
    };

    let (session, events) = RelaySession::open(
        state.provider.clone(),
        build_request(symptoms, &state.generation),
        &state.relay,
    );

    info!(session_id = %session.id(), "POST /api/stream-recommendations");
    debug!(session_id = %session.id(), symptoms, "processing symptoms with streaming");

    // Dropping the response body drops the receiver, which ends the session
    session.spawn();

    let event_stream = ReceiverStream::new(events).map(|event| to_sse_event(&event));
    let reply = warp::sse::reply(warp::sse::keep_alive().stream(event_stream));

    Ok(warp::reply::with_header(reply, "x-accel-buffering", "no").into_response())
}
