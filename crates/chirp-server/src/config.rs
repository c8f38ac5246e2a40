use std::net::SocketAddr;
use std::path::Path;

use chirp_crypto::{HashCost, DEFAULT_TOKEN_LIFETIME_SECS};
use chirp_store::DatabaseConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Secret used when none is configured. Never deploy with it.
pub const DEVELOPMENT_SECRET: &str = "chirp-development-secret";

/// Where users, posts, and likes are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    /// Process-local maps; everything is lost on exit.
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    /// HMAC secret for identity tokens.
    pub secret_key: String,
    pub token_lifetime_secs: i64,
    /// Echo raw storage errors in 500 responses. Development only.
    pub expose_internal_errors: bool,
    pub database: DatabaseConfig,
    pub password: HashCost,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            storage: StorageBackend::Sqlite,
            secret_key: DEVELOPMENT_SECRET.into(),
            token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            expose_internal_errors: false,
            database: DatabaseConfig::default(),
            password: HashCost::default(),
        }
    }
}

impl ServerConfig {
    /// Read an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let config = Self::from_toml(&text)?;
                info!(path = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply `DATABASE_URL`, `SECRET_KEY` and `CHIRP_BIND` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.secret_key = secret;
        }
        if let Some(bind) = lookup("CHIRP_BIND") {
            self.bind_addr = bind
                .parse()
                .map_err(|e| ServerError::Config(format!("CHIRP_BIND={bind:?}: {e}")))?;
        }
        Ok(())
    }

    pub fn uses_development_secret(&self) -> bool {
        self.secret_key == DEVELOPMENT_SECRET
    }

    /// A copy that is safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            secret_key: "<redacted>".into(),
            ..self.clone()
        }
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage, StorageBackend::Sqlite);
        assert_eq!(c.token_lifetime_secs, 86_400);
        assert!(c.uses_development_secret());
        assert!(!c.expose_internal_errors);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml(
            r#"
            storage = "memory"
            expose_internal_errors = true

            [database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();
        assert_eq!(c.storage, StorageBackend::Memory);
        assert!(c.expose_internal_errors);
        assert_eq!(c.database.url, "sqlite::memory:");
        assert_eq!(c.database.max_connections, 4);
        assert_eq!(c.password, HashCost::default());
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            ServerConfig::from_toml("storage = 3"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite://other.db"),
            ("SECRET_KEY", "s3cret"),
            ("CHIRP_BIND", "0.0.0.0:8080"),
        ]
        .into_iter()
        .collect();
        let mut c = ServerConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.database.url, "sqlite://other.db");
        assert_eq!(c.secret_key, "s3cret");
        assert_eq!(c.bind_addr.port(), 8080);
        assert!(!c.uses_development_secret());
    }

    #[test]
    fn bad_bind_override_rejected() {
        let mut c = ServerConfig::default();
        let result = c.apply_overrides(|k| (k == "CHIRP_BIND").then(|| "nope".to_string()));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn redacted_hides_secret() {
        let mut c = ServerConfig::default();
        c.secret_key = "s3cret".into();
        let text = c.redacted().to_toml().unwrap();
        assert!(!text.contains("s3cret"));
        assert!(text.contains("<redacted>"));
    }
}
