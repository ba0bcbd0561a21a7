use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{db, response::Envelope, state::AppState};

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub register: &'static str,
    pub stats: &'static str,
    pub users: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub app: String,
    pub version: String,
    pub status: &'static str,
    pub message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub api_endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub database: &'static str,
}

pub async fn root(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        app: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        status: "running",
        message: "Welcome to the registration platform backend",
        timestamp: OffsetDateTime::now_utc(),
        api_endpoints: Endpoints {
            register: "POST /api/register",
            stats: "GET /api/stats",
            users: "GET /api/users",
        },
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = db::ping(&state.db).await;
    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        timestamp: OffsetDateTime::now_utc(),
        database: if connected { "connected" } else { "disconnected" },
    })
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<Envelope>) {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::fail(format!("No route for {}", uri.path()))),
    )
}
