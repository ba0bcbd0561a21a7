use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::{SummaryRow, User, UserStatus};

/// Request body for `POST /api/register`.
///
/// Every field is defaulted so that a missing one is reported by validation
/// instead of by the JSON extractor.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub terms: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub message: &'static str,
    pub user_id: String,
    pub review_time: &'static str,
    pub note: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for RegisteredUser {
    fn from(u: User) -> Self {
        Self {
            user_id: u.display_id(),
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            status: u.status,
            message: "Your request was received",
            review_time: "24-48 hours",
            note: "Your request will be reviewed by an administrator",
            timestamp: OffsetDateTime::now_utc(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: usize,
    pub skip: i64,
    pub limit: i64,
}

/// Body of `PUT /api/users/{id}/status`. Kept as a raw string so unknown
/// values can be answered with an envelope instead of a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<User> for StatusUpdated {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            status: u.status,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<User>,
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusBreakdown {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub today_new_users: i64,
    pub by_status: StatusBreakdown,
    pub status_summary: String,
}

impl From<SummaryRow> for UserSummary {
    fn from(r: SummaryRow) -> Self {
        Self {
            total_users: r.total,
            active_users: r.active,
            today_new_users: r.created_today,
            status_summary: format!(
                "{} approved, {} pending review, {} rejected",
                r.approved, r.pending, r.rejected
            ),
            by_status: StatusBreakdown {
                pending: r.pending,
                approved: r.approved,
                rejected: r.rejected,
            },
        }
    }
}
