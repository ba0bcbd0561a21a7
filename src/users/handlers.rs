use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    response::{ApiResult, Envelope},
    state::AppState,
    users::{
        dto::{
            Pagination, RegisterRequest, RegisteredUser, SearchResults, StatusUpdateRequest,
            StatusUpdated, UserPage, UserSummary,
        },
        repo::RepoError,
        repo_types::{CreateOutcome, User, UserStatus},
        validation::validate,
    },
};

/// Upper bound applied to `limit` on the listing endpoint.
pub const MAX_PAGE_SIZE: i64 = 1000;

pub fn register_routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/status", put(update_user_status))
        .route("/users/search/:query", get(search_users))
        .route("/users/stats/summary", get(users_summary))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Json<Envelope> {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable registration body");
            return Json(bad_request(rejection.body_text()));
        }
    };
    debug!(name = %payload.name, email = %payload.email, "registration received");

    let new_user = match validate(payload) {
        Ok(u) => u,
        Err(e) => {
            warn!(field = e.field, reason = %e.message, "registration rejected");
            return Json(Envelope::fail(e.message));
        }
    };

    debug!(email = %new_user.email, "creating registrant");
    match User::create(&state.db, &new_user).await {
        Ok(CreateOutcome::Created(user)) => {
            info!(user_id = user.id, email = %user.email, "user registered");
            Json(Envelope::ok(
                "Your registration was saved successfully",
                RegisteredUser::from(user),
            ))
        }
        Ok(CreateOutcome::AlreadyRegistered) => {
            warn!(email = %new_user.email, "email already registered");
            Json(Envelope::fail("Email already registered"))
        }
        Err(RepoError::Constraint(detail)) => {
            error!(%detail, "registration hit a storage constraint");
            Json(Envelope::fail("A database error occurred"))
        }
        Err(RepoError::Database(e)) => {
            error!(error = %e, "registration failed");
            Json(Envelope::fail("An error occurred during registration"))
        }
    }
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult {
    let p = match query {
        Ok(Query(p)) => p,
        Err(rejection) => return Ok(Json(bad_request(rejection.body_text()))),
    };
    let skip = p.skip.max(0);
    let limit = p.limit.clamp(0, MAX_PAGE_SIZE);

    let users = User::list(&state.db, skip, limit).await?;
    let total = users.len();
    Ok(Json(Envelope::ok(
        format!("Found {total} users"),
        UserPage {
            users,
            total,
            skip,
            limit,
        },
    )))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Json<Envelope> {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return Json(bad_request(rejection.body_text())),
    };

    let env = match User::find_by_id(&state.db, id).await {
        Ok(Some(user)) => Envelope::ok("User found", user),
        Ok(None) => Envelope::fail(format!("User {id} not found")),
        Err(e) => storage_failed("get_user", e),
    };
    Json(env)
}

#[instrument(skip(state, id, payload))]
pub async fn update_user_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Json<Envelope> {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return Json(bad_request(rejection.body_text())),
    };
    let raw = match payload {
        Ok(Json(StatusUpdateRequest { status: Some(s) })) if !s.is_empty() => s,
        Ok(_) => return Json(Envelope::fail("Status is required")),
        Err(rejection) => return Json(bad_request(rejection.body_text())),
    };

    let status: UserStatus = match raw.parse() {
        Ok(s) => s,
        Err(e) => {
            warn!(user_id = id, error = %e, "status update rejected");
            return Json(Envelope::fail(
                "Invalid status. Must be one of: pending, approved, rejected",
            ));
        }
    };

    let env = match User::update_status(&state.db, id, status).await {
        Ok(Some(user)) => {
            info!(user_id = id, %status, "status updated");
            Envelope::ok(
                format!("User status updated to: {status}"),
                StatusUpdated::from(user),
            )
        }
        Ok(None) => Envelope::fail(format!("User {id} not found")),
        Err(e) => storage_failed("update_user_status", e),
    };
    Json(env)
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<Envelope> {
    let env = match User::search(&state.db, &query).await {
        Ok(results) => {
            let count = results.len();
            Envelope::ok(
                format!("Found {count} results for: {query}"),
                SearchResults {
                    results,
                    query,
                    count,
                },
            )
        }
        Err(e) => storage_failed("search_users", e),
    };
    Json(env)
}

#[instrument(skip(state))]
pub async fn users_summary(State(state): State<AppState>) -> Json<Envelope> {
    let env = match User::summary(&state.db).await {
        Ok(row) => Envelope::ok("User statistics", UserSummary::from(row)),
        Err(e) => storage_failed("users_summary", e),
    };
    Json(env)
}

fn bad_request(detail: String) -> Envelope {
    Envelope::fail(format!("Invalid request: {detail}"))
}

fn storage_failed(op: &'static str, e: RepoError) -> Envelope {
    error!(op, error = %e, "storage operation failed");
    Envelope::fail(STORAGE_FAILURE_MESSAGE)
}

pub const STORAGE_FAILURE_MESSAGE: &str = "An error occurred, please try again later";
