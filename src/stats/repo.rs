use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::stats::repo_types::{
    RegistrationStats, StatsPatch, SEED_COUNTRIES, SEED_TODAY_VISITS, SEED_TOTAL_USERS,
};

const STATS_COLUMNS: &str = "total_users, today_visits, countries_count, last_updated";

/// Count one more registrant, creating the row as 1/1/1 if it does not exist yet.
pub async fn record_registration(
    tx: &mut Transaction<'_, Sqlite>,
    now: OffsetDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO registration_stats (id, total_users, today_visits, countries_count, last_updated)
        VALUES (1, 1, 1, 1, ?)
        ON CONFLICT (id) DO UPDATE
           SET total_users  = total_users + 1,
               last_updated = excluded.last_updated
        "#,
    )
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn ensure_row(
    tx: &mut Transaction<'_, Sqlite>,
    seed: (i64, i64, i64),
    now: OffsetDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO registration_stats (id, total_users, today_visits, countries_count, last_updated)
        VALUES (1, ?, ?, ?, ?)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(seed.0)
    .bind(seed.1)
    .bind(seed.2)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns the aggregate and counts the read as a visit.
pub async fn get_stats(db: &SqlitePool) -> Result<RegistrationStats, sqlx::Error> {
    let now = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;

    ensure_row(
        &mut tx,
        (SEED_TOTAL_USERS, SEED_TODAY_VISITS, SEED_COUNTRIES),
        now,
    )
    .await?;

    let sql = format!(
        r#"
        UPDATE registration_stats
           SET today_visits = today_visits + 1, last_updated = ?
         WHERE id = 1
        RETURNING {STATS_COLUMNS}
        "#
    );
    let stats = sqlx::query_as::<_, RegistrationStats>(&sql)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(stats)
}

pub async fn update_stats(
    db: &SqlitePool,
    patch: &StatsPatch,
) -> Result<RegistrationStats, sqlx::Error> {
    let now = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;

    ensure_row(&mut tx, (0, 0, 0), now).await?;

    let sql = format!(
        r#"
        UPDATE registration_stats
           SET total_users     = COALESCE(?, total_users),
               today_visits    = COALESCE(?, today_visits),
               countries_count = COALESCE(?, countries_count),
               last_updated    = ?
         WHERE id = 1
        RETURNING {STATS_COLUMNS}
        "#
    );
    let stats = sqlx::query_as::<_, RegistrationStats>(&sql)
        .bind(patch.total_users)
        .bind(patch.today_visits)
        .bind(patch.countries_count)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(stats)
}
