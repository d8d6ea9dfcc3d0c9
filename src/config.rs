use std::{env, str::FromStr, time::Duration};

use crate::error::ConfigError;

/// Which row store backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
    Rest,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            "rest" | "supabase" => Ok(Self::Rest),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Dev,
    Supabase,
}

impl FromStr for IdentityBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "supabase" => Ok(Self::Supabase),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: usize,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub identity_backend: IdentityBackend,
    pub mock_latency: Duration,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Memory)?;
        let default_identity = match store_backend {
            StoreBackend::Memory => IdentityBackend::Dev,
            _ => IdentityBackend::Supabase,
        };

        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            store_backend,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            supabase_url: lookup("SUPABASE_URL"),
            supabase_anon_key: lookup("SUPABASE_ANON_KEY"),
            identity_backend: parse_or(&lookup, "IDENTITY_PROVIDER", default_identity)?,
            mock_latency: Duration::from_millis(parse_or(&lookup, "MOCK_LATENCY_MS", 300)?),
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?),
        };

        match config.store_backend {
            StoreBackend::Postgres if config.database_url.is_none() => {
                return Err(ConfigError::Missing("DATABASE_URL"))
            }
            StoreBackend::Rest => config.require_supabase()?,
            _ => {}
        }
        match config.identity_backend {
            // Dev sign-in is restricted to the seeded memory store
            IdentityBackend::Dev if config.store_backend != StoreBackend::Memory => {
                return Err(ConfigError::Invalid {
                    name: "IDENTITY_PROVIDER",
                    value: "dev".to_string(),
                })
            }
            IdentityBackend::Supabase => config.require_supabase()?,
            IdentityBackend::Dev => {}
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn require_supabase(&self) -> Result<(), ConfigError> {
        if self.supabase_url.is_none() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if self.supabase_anon_key.is_none() {
            return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_memory_store_and_dev_identity() {
        let config = AppConfig::from_lookup(lookup_from(&[])).expect("defaults are valid");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.identity_backend, IdentityBackend::Dev);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.mock_latency, Duration::from_millis(300));
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "postgres")]))
            .expect_err("missing url rejected");
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn rest_backend_requires_supabase_credentials() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "rest"),
            ("SUPABASE_URL", "https://project.example.co"),
        ]))
        .expect_err("missing key rejected");
        assert!(matches!(err, ConfigError::Missing("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn persistent_stores_default_to_hosted_identity() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/local_directory"),
            ("SUPABASE_URL", "https://project.example.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .expect("postgres with hosted identity is valid");

        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.identity_backend, IdentityBackend::Supabase);
    }

    #[test]
    fn postgres_without_identity_credentials_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/local_directory"),
        ]))
        .expect_err("dev identity must not be implied");
        assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));
    }

    #[test]
    fn dev_identity_is_refused_outside_memory_store() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/local_directory"),
            ("IDENTITY_PROVIDER", "dev"),
        ]))
        .expect_err("dev identity rejected");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "IDENTITY_PROVIDER",
                ..
            }
        ));
    }

    #[test]
    fn malformed_numbers_are_reported_by_name() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")]))
            .expect_err("bad port rejected");
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
