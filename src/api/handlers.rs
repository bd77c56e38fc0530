//! HTTP request handlers for the recommendation API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::RecommendError;
use crate::pipeline::types::{FinalRecommendation, SurveyInput};
use crate::session::Session;

use super::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    session_id: String,
    recommendations: Vec<FinalRecommendation>,
    agents_run: Vec<String>,
    from_cache: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    book_id: String,
    rating: u8,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    success: bool,
}

type HandlerError = (StatusCode, Json<ErrorBody>);

/// Map service errors to HTTP statuses. Only availability and completion
/// failures are expected in normal operation; everything else is a bug or
/// a bad request.
fn error_response(err: RecommendError) -> HandlerError {
    let status = match &err {
        RecommendError::LlmUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        RecommendError::Completion(_) | RecommendError::NoCandidates => StatusCode::BAD_GATEWAY,
        RecommendError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        RecommendError::InvalidRating(_) => StatusCode::BAD_REQUEST,
        RecommendError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("{}", err);
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "readmate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn generate(
    State(ctx): State<AppContext>,
    Json(survey): Json<SurveyInput>,
) -> Result<Json<GenerateResponse>, HandlerError> {
    let generated = ctx.service.generate(survey).await.map_err(error_response)?;
    Ok(Json(GenerateResponse {
        session_id: generated.session_id,
        recommendations: generated.recommendations,
        agents_run: generated.agents_run.iter().map(|s| s.to_string()).collect(),
        from_cache: generated.from_cache,
    }))
}

pub async fn submit_rating(
    State(ctx): State<AppContext>,
    Path(session_id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<RatingResponse>, HandlerError> {
    let updated = ctx
        .service
        .submit_rating(&session_id, &request.book_id, request.rating)
        .await
        .map_err(error_response)?;

    if updated {
        Ok(Json(RatingResponse { success: true }))
    } else {
        Err(error_response(RecommendError::SessionNotFound(session_id)))
    }
}

pub async fn get_session(
    State(ctx): State<AppContext>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, HandlerError> {
    match ctx.service.get_session(&session_id).await.map_err(error_response)? {
        Some(session) => Ok(Json(session)),
        None => Err(error_response(RecommendError::SessionNotFound(session_id))),
    }
}
