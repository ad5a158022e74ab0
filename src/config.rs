use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use axum::http::HeaderValue;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub model_path: PathBuf,
    /// `None` means any origin is allowed.
    pub cors_allowed_origin: Option<HeaderValue>,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "adhd-screen".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "adhd-screen-users".into()),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|m| *m > 0)
                .unwrap_or(15),
        };

        let model_path = get("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./model/model.json"));

        let cors_allowed_origin = get("CORS_ALLOWED_ORIGIN")
            .filter(|v| !v.trim().is_empty())
            .map(|v| HeaderValue::from_str(v.trim()))
            .transpose()
            .context("CORS_ALLOWED_ORIGIN is not a valid header value")?;

        let listen_addr: SocketAddr = format!(
            "{}:{}",
            get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            get("APP_PORT").unwrap_or_else(|| "8080".into())
        )
        .parse()
        .context("APP_HOST/APP_PORT do not form a socket address")?;

        Ok(Self {
            database_url,
            jwt,
            model_path,
            cors_allowed_origin,
            listen_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/adhd"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.issuer, "adhd-screen");
        assert_eq!(cfg.jwt.audience, "adhd-screen-users");
        assert_eq!(cfg.jwt.ttl_minutes, 15);
        assert_eq!(cfg.model_path, PathBuf::from("./model/model.json"));
        assert!(cfg.cors_allowed_origin.is_none());
        assert_eq!(cfg.listen_addr.port(), 8080);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn blank_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  "), ("JWT_SECRET", "k")]))
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_respected() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", "90"),
            ("MODEL_PATH", "/srv/model.json"),
            ("CORS_ALLOWED_ORIGIN", "https://adhd-client.example"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "5000"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.ttl_minutes, 90);
        assert_eq!(cfg.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(
            cfg.cors_allowed_origin.as_ref().and_then(|v| v.to_str().ok()),
            Some("https://adhd-client.example")
        );
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn nonsense_ttl_falls_back_to_default() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", "-3"),
        ]))
        .expect("config should load");
        assert_eq!(cfg.jwt.ttl_minutes, 15);
    }
}
