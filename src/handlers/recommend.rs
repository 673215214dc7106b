// POST /api/recommendations handler

use std::convert::Infallible;
use tracing::{debug, error, info, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use super::error_reply;
use crate::models::{ErrorResponse, RecommendationRequest, RecommendationResponse};
use crate::prompt::build_request;
use crate::state::AppState;

pub async fn recommend_handler(
    request: RecommendationRequest,
    state: AppState,
) -> Result<Response, Infallible> {
    let symptoms = match request.validated_symptoms() {
        Ok(symptoms) => symptoms,
        Err(e) => {
            warn!(error = %e, "rejecting recommendation request");
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(e.to_string()),
            ));
        }
    };

    info!("POST /api/recommendations");
    debug!(symptoms, "processing symptoms");

    let completion = state
        .provider
        .complete(build_request(symptoms, &state.generation))
        .await;

    match completion {
        Ok(recommendation) => {
            info!(chars = recommendation.len(), "recommendation completed");
            Ok(warp::reply::with_status(
                warp::reply::json(&RecommendationResponse { recommendation }),
                StatusCode::OK,
            )
            .into_response())
        }
        Err(e) => {
            error!(error = %e, "upstream completion failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::with_details("Failed to get recommendation", e.to_string()),
            ))
        }
    }
}
