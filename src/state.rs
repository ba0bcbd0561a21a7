use crate::config::AppConfig;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = crate::db::connect(&config).await?;
        crate::db::migrate(&db).await?;
        Ok(Self::from_parts(db, Arc::new(config)))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }
}

#[cfg(test)]
impl AppState {
    pub fn test_config() -> AppConfig {
        AppConfig {
            app_name: "Registration Platform - Test".into(),
            app_version: "0.0.0-test".into(),
            database_url: "sqlite::memory:".into(),
            db_max_connections: 1,
            cors_origins: vec!["*".into()],
            server: crate::config::ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        }
    }

    pub async fn fake() -> Self {
        let db = crate::db::memory_pool().await;
        Self::from_parts(db, Arc::new(Self::test_config()))
    }
}
