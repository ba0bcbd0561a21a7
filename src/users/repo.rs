use sqlx::{error::ErrorKind, SqlitePool};
use thiserror::Error;
use time::{OffsetDateTime, Time};
use tracing::{debug, warn};

use crate::stats;
use crate::users::repo_types::{CreateOutcome, NewUser, SummaryRow, User, UserStatus};

const USER_COLUMNS: &str =
    "id, name, email, phone, is_active, status, created_at, updated_at";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return RepoError::Constraint(db_err.message().to_string());
            }
        }
        RepoError::Database(e)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if matches!(db_err.kind(), ErrorKind::UniqueViolation))
}

impl User {
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Inserts a pending registrant and bumps the stats aggregate in one transaction.
    ///
    /// The email lookup up front is only a shortcut: two concurrent requests can both
    /// pass it, and the unique index on `users.email` decides which one wins.
    pub async fn create(db: &SqlitePool, new_user: &NewUser) -> Result<CreateOutcome, RepoError> {
        if Self::find_by_email(db, &new_user.email).await?.is_some() {
            debug!(email = %new_user.email, "email already present");
            return Ok(CreateOutcome::AlreadyRegistered);
        }

        let now = OffsetDateTime::now_utc();
        let mut tx = db.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO users (name, email, phone, is_active, status, created_at)
            VALUES (?, ?, ?, 1, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.phone)
            .bind(UserStatus::Pending)
            .bind(now)
            .fetch_one(&mut *tx)
            .await;

        let user = match inserted {
            Ok(u) => u,
            Err(e) if is_unique_violation(&e) => {
                warn!(email = %new_user.email, "lost insert race on unique email");
                return Ok(CreateOutcome::AlreadyRegistered);
            }
            Err(e) => return Err(e.into()),
        };

        stats::repo::record_registration(&mut tx, now).await?;
        tx.commit().await?;

        Ok(CreateOutcome::Created(user))
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Page through registrants in insertion order.
    pub async fn list(db: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn update_status(
        db: &SqlitePool,
        id: i64,
        status: UserStatus,
    ) -> Result<Option<User>, RepoError> {
        let sql = format!(
            r#"
            UPDATE users
               SET status = ?, updated_at = ?
             WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(status)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Case-insensitive substring match on name or email.
    pub async fn search(db: &SqlitePool, query: &str) -> Result<Vec<User>, RepoError> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE name LIKE ? ESCAPE '\' OR email LIKE ? ESCAPE '\'
             ORDER BY id ASC
            "#
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Status breakdown plus registrations since UTC midnight.
    pub async fn summary(db: &SqlitePool) -> Result<SummaryRow, RepoError> {
        let midnight = OffsetDateTime::now_utc().replace_time(Time::MIDNIGHT);
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT COUNT(*)                                                  AS total,
                   COALESCE(SUM(CASE WHEN is_active THEN 1 ELSE 0 END), 0)  AS active,
                   COALESCE(SUM(CASE WHEN julianday(created_at) >= julianday(?) THEN 1 ELSE 0 END), 0) AS created_today,
                   COALESCE(SUM(CASE WHEN status = 'pending'  THEN 1 ELSE 0 END), 0) AS pending,
                   COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0) AS approved,
                   COALESCE(SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected
              FROM users
            "#,
        )
        .bind(midnight)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            phone: None,
        }
    }

    async fn created(db: &SqlitePool, name: &str, email: &str) -> User {
        match User::create(db, &new_user(name, email)).await.unwrap() {
            CreateOutcome::Created(u) => u,
            CreateOutcome::AlreadyRegistered => panic!("{email} unexpectedly taken"),
        }
    }

    #[tokio::test]
    async fn create_assigns_pending_and_ids() {
        let db = memory_pool().await;
        let first = created(&db, "Ali Hassan", "ali@example.com").await;
        let second = created(&db, "Sara Omar", "sara@example.com").await;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, UserStatus::Pending);
        assert!(first.is_active);
        assert!(first.updated_at.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_not_inserted() {
        let db = memory_pool().await;
        created(&db, "Ali Hassan", "ali@example.com").await;

        let again = User::create(&db, &new_user("Other", "ali@example.com"))
            .await
            .unwrap();
        assert!(matches!(again, CreateOutcome::AlreadyRegistered));

        let all = User::list(&db, 0, 100).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn registration_bumps_stats_in_same_transaction() {
        let db = memory_pool().await;
        created(&db, "A", "a@example.com").await;
        created(&db, "B", "b@example.com").await;

        let total: i64 = sqlx::query_scalar("SELECT total_users FROM registration_stats WHERE id = 1")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_email() {
        let db = memory_pool().await;
        created(&db, "Ali", "ali@example.com").await;

        let err = sqlx::query(
            "INSERT INTO users (name, email, status, created_at) VALUES ('X', 'ali@example.com', 'pending', '2020-01-01T00:00:00Z')",
        )
        .execute(&db)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn constraint_violation_rolls_back() {
        let db = memory_pool().await;
        let too_long = "x".repeat(101);
        let err = User::create(&db, &new_user(&too_long, "long@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)), "got {err:?}");

        assert!(User::list(&db, 0, 10).await.unwrap().is_empty());
        let stats_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registration_stats")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(stats_rows, 0);
    }

    #[tokio::test]
    async fn list_pages_do_not_overlap() {
        let db = memory_pool().await;
        for i in 0..5 {
            created(&db, &format!("User {i}"), &format!("u{i}@example.com")).await;
        }

        let first = User::list(&db, 0, 2).await.unwrap();
        let second = User::list(&db, 2, 2).await.unwrap();
        let third = User::list(&db, 4, 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        let ids: Vec<i64> = first.iter().chain(&second).chain(&third).map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn update_status_sets_timestamp_and_handles_missing() {
        let db = memory_pool().await;
        let user = created(&db, "Ali", "ali@example.com").await;

        let updated = User::update_status(&db, user.id, UserStatus::Approved)
            .await
            .unwrap()
            .expect("user exists");
        assert_eq!(updated.status, UserStatus::Approved);
        assert!(updated.updated_at.is_some());

        let missing = User::update_status(&db, 999, UserStatus::Rejected).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn search_matches_name_or_email_case_insensitively() {
        let db = memory_pool().await;
        created(&db, "Ali Hassan", "ali@example.com").await;
        created(&db, "Umar Ahmed", "umar@mail.test").await;
        created(&db, "Omar_Ali", "omar@example.com").await;

        let by_name = User::search(&db, "HASSAN").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].email, "ali@example.com");

        let by_email = User::search(&db, "mail.TEST").await.unwrap();
        assert_eq!(by_email.len(), 1);

        let both = User::search(&db, "ali").await.unwrap();
        assert_eq!(both.len(), 2);

        // '_' is literal, not a single-character wildcard
        let literal = User::search(&db, "r_a").await.unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].name, "Omar_Ali");
    }

    #[tokio::test]
    async fn summary_counts_by_status() {
        let db = memory_pool().await;
        let a = created(&db, "A", "a@example.com").await;
        let b = created(&db, "B", "b@example.com").await;
        created(&db, "C", "c@example.com").await;
        User::update_status(&db, a.id, UserStatus::Approved).await.unwrap();
        User::update_status(&db, b.id, UserStatus::Rejected).await.unwrap();

        let s = User::summary(&db).await.unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.active, 3);
        assert_eq!(s.created_today, 3);
        assert_eq!((s.pending, s.approved, s.rejected), (1, 1, 1));
    }

    #[tokio::test]
    async fn summary_counts_fractional_second_after_midnight_as_today() {
        let db = memory_pool().await;
        let today = OffsetDateTime::now_utc().date();
        sqlx::query("INSERT INTO users (name, email, status, created_at) VALUES ('Early', 'early@example.com', 'pending', ?)")
            .bind(format!("{today}T00:00:00.5Z"))
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (name, email, status, created_at) VALUES ('Old', 'old@example.com', 'pending', '2000-01-01T23:59:59.9Z')")
            .execute(&db)
            .await
            .unwrap();

        let s = User::summary(&db).await.unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.created_today, 1);
    }

    #[tokio::test]
    async fn summary_of_empty_table_is_zero() {
        let db = memory_pool().await;
        let s = User::summary(&db).await.unwrap();
        assert_eq!(s.total, 0);
        assert_eq!(s.created_today, 0);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
