//! AI advisor endpoint.

use super::{ApiError, AppState};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub advice: String,
}

/// `POST /analyze`: generate spending advice for one user.
///
/// Any pipeline failure is logged with its origin and answered with a single
/// server error; no fallback advice is produced.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    match state.advisor.analyze(request.user_id).await {
        Ok(advice) => Ok(Json(AnalysisResponse { advice })),
        Err(err) => {
            log::error!(
                "Advice for user {} failed [{}]: {}",
                request.user_id,
                err.kind(),
                err
            );
            Err(err.into())
        }
    }
}
