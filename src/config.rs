use std::env;

use actix_web::cookie::Key;
use pushkind_common::models::config::CommonServerConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),
}

/// Server settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Cookie domain shared by the storefront and the back-office.
    pub domain: String,
    pub secret: Option<String>,
    pub auth_service_url: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => 8080,
        };

        let auth_service_url = lookup("AUTH_SERVICE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_SERVICE_URL"))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "app.db".to_string()),
            address: lookup("ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            domain: lookup("DOMAIN").unwrap_or_else(|| "localhost".to_string()),
            secret: lookup("SECRET_KEY").filter(|value| !value.is_empty()),
            auth_service_url,
        })
    }

    /// Signing key for the session and flash cookies.
    ///
    /// Falls back to a random key, which logs every visitor out on restart.
    pub fn session_key(&self) -> Key {
        match self.secret.as_deref().map(|secret| Key::try_from(secret.as_bytes())) {
            Some(Ok(key)) => key,
            Some(Err(err)) => {
                log::warn!("SECRET_KEY is unusable ({err}); generating a random key");
                Key::generate()
            }
            None => {
                log::warn!("SECRET_KEY not set; generating a random key");
                Key::generate()
            }
        }
    }

    pub fn common(&self) -> CommonServerConfig {
        CommonServerConfig {
            secret: self.secret.clone().unwrap_or_default(),
            auth_service_url: self.auth_service_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config =
            StoreConfig::from_lookup(lookup(&[("AUTH_SERVICE_URL", "https://auth.example")]))
                .unwrap();

        assert_eq!(config.database_url, "app.db");
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.domain, "localhost");
        assert_eq!(config.secret, None);
        assert_eq!(config.common().auth_service_url, "https://auth.example");
    }

    #[test]
    fn auth_service_url_is_required() {
        let result = StoreConfig::from_lookup(lookup(&[("PORT", "9000")]));

        assert_eq!(result.unwrap_err(), ConfigError::Missing("AUTH_SERVICE_URL"));
    }

    #[test]
    fn port_must_be_numeric() {
        let result = StoreConfig::from_lookup(lookup(&[
            ("AUTH_SERVICE_URL", "https://auth.example"),
            ("PORT", "http"),
        ]));

        assert_eq!(result.unwrap_err(), ConfigError::InvalidPort("http".to_string()));
    }

    #[test]
    fn short_secret_falls_back_to_generated_key() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("AUTH_SERVICE_URL", "https://auth.example"),
            ("SECRET_KEY", "short"),
        ]))
        .unwrap();

        assert_eq!(config.session_key().master().len(), 64);
    }
}
