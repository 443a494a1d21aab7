use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Server settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub oidc_issuer_url: String,
    pub oidc_audiences: Vec<String>,
    pub bind_address: SocketAddr,
    pub run_migrations: bool,
    pub database_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // a missing .env file is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let oidc_audiences = lookup("OIDC_AUDIENCES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            oidc_issuer_url: required("OIDC_ISSUER_URL")?,
            oidc_audiences,
            bind_address: parse_or(&lookup, "BIND_ADDRESS", || {
                SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
            })?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", || false)?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", || {
                DEFAULT_MAX_CONNECTIONS
            })?,
        })
    }

    /// Address to print in logs; wildcard binds are reachable on localhost
    pub fn display_address(&self) -> String {
        if self.bind_address.ip().is_unspecified() {
            format!("http://localhost:{}", self.bind_address.port())
        } else {
            format!("http://{}", self.bind_address)
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/courses"),
            ("OIDC_ISSUER_URL", "https://idp.example.com/realms/courses"),
        ])
        .unwrap();

        assert_eq!(config.bind_address.port(), 3000);
        assert!(!config.run_migrations);
        assert_eq!(config.database_max_connections, 10);
        assert!(config.oidc_audiences.is_empty());
        assert_eq!(config.display_address(), "http://localhost:3000");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/courses"),
            ("OIDC_ISSUER_URL", "https://idp.example.com"),
            ("OIDC_AUDIENCES", "courses-backend, admin ,"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("RUN_MIGRATIONS", "true"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();

        assert_eq!(config.oidc_audiences, ["courses-backend", "admin"]);
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert!(config.run_migrations);
        assert_eq!(config.database_max_connections, 4);
    }

    #[test]
    fn test_missing_and_invalid() {
        let err = config(&[("OIDC_ISSUER_URL", "https://idp.example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/courses"),
            ("OIDC_ISSUER_URL", "https://idp.example.com"),
            ("RUN_MIGRATIONS", "sometimes"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "RUN_MIGRATIONS", .. }));
    }
}
