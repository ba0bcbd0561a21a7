use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    response::{ApiResult, Envelope},
    state::AppState,
    stats::{repo, repo_types::StatsPatch},
};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_statistics))
        .route("/stats/update", put(update_statistics))
}

/// Every call counts as a visit, so this endpoint is not idempotent.
#[instrument(skip(state))]
pub async fn get_statistics(State(state): State<AppState>) -> ApiResult {
    let stats = repo::get_stats(&state.db).await?;
    Ok(Json(Envelope::ok("Statistics fetched successfully", stats)))
}

#[instrument(skip(state, payload))]
pub async fn update_statistics(
    State(state): State<AppState>,
    payload: Result<Json<StatsPatch>, JsonRejection>,
) -> ApiResult {
    let Json(patch) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return Ok(Json(Envelope::fail(format!(
                "Invalid request body: {}",
                rejection.body_text()
            ))))
        }
    };

    let stats = repo::update_stats(&state.db, &patch).await?;
    info!(?patch, "statistics updated");
    Ok(Json(Envelope::ok("Statistics updated successfully", stats)))
}
