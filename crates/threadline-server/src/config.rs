//! Server configuration sourced from environment variables.

use anyhow::{Context, Result};
use threadline_auth::AuthConfig;
use threadline_db::DbConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Domain that organization subdomains hang off, e.g. `threadline.app`.
    pub base_domain: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            base_domain: "localhost".into(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `THREADLINE_*` variables. Key material is read
    /// from the files named by `THREADLINE_JWT_PUBLIC_KEY_FILE` and
    /// `THREADLINE_JWT_PRIVATE_KEY_FILE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = var("THREADLINE_DB_URL") {
            config.db.url = url;
        }
        if let Some(ns) = var("THREADLINE_DB_NAMESPACE") {
            config.db.namespace = ns;
        }
        if let Some(db) = var("THREADLINE_DB_DATABASE") {
            config.db.database = db;
        }
        if let Some(user) = var("THREADLINE_DB_USERNAME") {
            config.db.username = user;
        }
        if let Some(pass) = var("THREADLINE_DB_PASSWORD") {
            config.db.password = pass;
        }

        if let Some(path) = var("THREADLINE_JWT_PUBLIC_KEY_FILE") {
            config.auth.jwt_public_key_pem = std::fs::read_to_string(&path)
                .with_context(|| format!("read THREADLINE_JWT_PUBLIC_KEY_FILE: {path}"))?;
        }
        if let Some(path) = var("THREADLINE_JWT_PRIVATE_KEY_FILE") {
            config.auth.jwt_private_key_pem = std::fs::read_to_string(&path)
                .with_context(|| format!("read THREADLINE_JWT_PRIVATE_KEY_FILE: {path}"))?;
        }
        if let Some(issuer) = var("THREADLINE_JWT_ISSUER") {
            config.auth.jwt_issuer = issuer;
        }
        if let Some(secs) = var("THREADLINE_IDENTITY_TOKEN_LIFETIME_SECS") {
            config.auth.identity_token_lifetime_secs = secs
                .parse()
                .with_context(|| "parse THREADLINE_IDENTITY_TOKEN_LIFETIME_SECS")?;
        }

        if let Some(domain) = var("THREADLINE_BASE_DOMAIN") {
            config.base_domain = domain.to_ascii_lowercase();
        }

        Ok(config)
    }
}
