use std::{env, fmt::Display, str::FromStr};

use keepsake_impls::VercelBlobStore;
use keepsake_server::{ServerConfig, DEFAULT_PORT};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not a valid environment")]
    InvalidEnvironment(String),
    #[error("PORT must be a number, got {0}")]
    InvalidPort(String),
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

/// Everything keepsake reads from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,
    pub database_url: Option<String>,
    pub deployment_url: Option<String>,
    pub blob_token: Option<String>,
    pub blob_api_url: String,
}

impl Config {
    /// Reads the config, loading a `.env` file first if there is one
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("KEEPSAKE_ENV")
            .map(|e| e.parse())
            .transpose()?
            .unwrap_or(Environment::Development);

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            environment,
            port,
            database_url: var("DATABASE_URL"),
            deployment_url: var("DEPLOYMENT_URL"),
            blob_token: var("BLOB_READ_WRITE_TOKEN"),
            blob_api_url: var("BLOB_API_URL")
                .unwrap_or_else(|| VercelBlobStore::DEFAULT_URL.to_string()),
        };

        if environment == Environment::Production {
            if config.database_url.is_none() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }

            if config.blob_token.is_none() {
                return Err(ConfigError::Missing("BLOB_READ_WRITE_TOKEN"));
            }
        }

        Ok(config)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            allowed_origin: self.deployment_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_development() {
        let config = config(&[]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.blob_api_url, VercelBlobStore::DEFAULT_URL);
        assert!(config.server().allowed_origin.is_none());
    }

    #[test]
    fn production_needs_database_and_blob_token() {
        let missing = config(&[("KEEPSAKE_ENV", "production")]);
        assert!(matches!(missing, Err(ConfigError::Missing("DATABASE_URL"))));

        let missing = config(&[
            ("KEEPSAKE_ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/keepsake"),
        ]);
        assert!(matches!(
            missing,
            Err(ConfigError::Missing("BLOB_READ_WRITE_TOKEN"))
        ));

        let config = config(&[
            ("KEEPSAKE_ENV", "Production"),
            ("DATABASE_URL", "postgres://localhost/keepsake"),
            ("BLOB_READ_WRITE_TOKEN", "token"),
            ("DEPLOYMENT_URL", "https://keepsake.example"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.server().allowed_origin.as_deref(),
            Some("https://keepsake.example")
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("PORT", "fifty")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config(&[("KEEPSAKE_ENV", "staging")]),
            Err(ConfigError::InvalidEnvironment(_))
        ));
    }
}
