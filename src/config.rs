use anyhow::bail;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub server: ServerConfig,
}

const DEFAULT_DATABASE_URL: &str = "sqlite://registration.db?mode=rwc";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8080,*";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            bail!("DATABASE_URL must point at a sqlite database, got {}", database_url);
        }

        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8000),
        };

        Ok(Self {
            app_name: std::env::var("APP_NAME")
                .unwrap_or_else(|_| "Registration Platform - Backend".into()),
            app_version: std::env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").into()),
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
            ),
            server,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_skips_blanks_and_trims() {
        let origins = parse_origins(" http://a.test , ,http://b.test,* ");
        assert_eq!(origins, vec!["http://a.test", "http://b.test", "*"]);
    }

    #[test]
    fn wildcard_origin_is_detected() {
        let mut cfg = crate::state::AppState::test_config();
        cfg.cors_origins = vec!["http://localhost:3000".into()];
        assert!(!cfg.allows_any_origin());
        cfg.cors_origins.push("*".into());
        assert!(cfg.allows_any_origin());
    }
}
