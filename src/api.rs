use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::campaign::CampaignOptions;
use crate::errors::OrchestratorError;
use crate::orchestrator::CampaignOrchestrator;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub orchestrator: CampaignOrchestrator,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartCampaignRequest {
    pub brief: String,
    /// Overrides the server default when present
    pub manual_review: Option<bool>,
    pub require_final_signoff: Option<bool>,
}

#[derive(Deserialize)]
pub struct RefineCampaignRequest {
    pub instructions: String,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::CampaignNotFound { .. } => ApiError::NotFound(err.to_string()),
            OrchestratorError::EmptyBrief => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/campaigns", get(list_campaigns).post(start_campaign))
        .route(
            "/api/campaigns/{id}",
            get(get_campaign).delete(cancel_campaign),
        )
        .route("/api/campaigns/{id}/resume", post(resume_campaign))
        .route("/api/campaigns/{id}/refine", post(refine_campaign))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_campaigns(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orchestrator.list_campaigns()?))
}

async fn start_campaign(
    State(state): State<SharedState>,
    Json(req): Json<StartCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = state.orchestrator.settings().default_options;
    let options = CampaignOptions {
        manual_review: req.manual_review.unwrap_or(defaults.manual_review),
        require_final_signoff: req
            .require_final_signoff
            .unwrap_or(defaults.require_final_signoff),
    };
    let summary = state
        .orchestrator
        .start_campaign_with(&req.brief, options)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn get_campaign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orchestrator.get_campaign(&id)?))
}

async fn resume_campaign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.orchestrator.resume_campaign(&id).await? {
        return Err(ApiError::Conflict(format!(
            "Campaign {} has nothing to resume",
            id
        )));
    }
    Ok(Json(serde_json::json!({"resumed": true})))
}

async fn refine_campaign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<RefineCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown ids are reported before blank instructions
    state.orchestrator.get_campaign(&id)?;
    if req.instructions.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Refinement instructions must not be empty".to_string(),
        ));
    }
    if !state
        .orchestrator
        .refine_campaign(&id, &req.instructions)
        .await?
    {
        return Err(ApiError::Conflict(format!(
            "Campaign {} is not awaiting review",
            id
        )));
    }
    Ok(Json(serde_json::json!({"refined": true})))
}

async fn cancel_campaign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.orchestrator.cancel_campaign(&id)? {
        return Ok(Json(serde_json::json!({"cancelled": true})));
    }
    let campaign = state.orchestrator.get_campaign(&id)?;
    Err(ApiError::Conflict(format!(
        "Campaign {} is already {}",
        id, campaign.status
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────
