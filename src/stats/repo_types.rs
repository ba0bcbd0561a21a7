use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// The single row of `registration_stats`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RegistrationStats {
    pub total_users: i64,
    pub today_visits: i64,
    pub countries_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Fields to overwrite; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsPatch {
    pub total_users: Option<i64>,
    pub today_visits: Option<i64>,
    pub countries_count: Option<i64>,
}

/// Values used when the aggregate is first read before anything wrote it.
pub const SEED_TOTAL_USERS: i64 = 1247;
pub const SEED_TODAY_VISITS: i64 = 538;
pub const SEED_COUNTRIES: i64 = 18;
