/// Configuration management for the API server
///
/// Loaded from environment variables (a `.env` file is honoured in
/// development via `dotenvy`).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `RUN_MIGRATIONS`: Apply embedded migrations on startup (default: true)
/// - `IDENTITY_JWT_SECRET`: HS256 secret shared with the identity provider
///   (required, at least 32 characters)
///
/// # Example
///
/// ```no_run
/// use orgdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use std::env;

/// Minimum accepted length of the identity secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

/// Identity provider configuration
#[derive(Clone)]
pub struct IdentityConfig {
    /// Secret the provider signs tokens with
    pub jwt_secret: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let url = lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        let run_migrations = parse_bool(lookup("RUN_MIGRATIONS").as_deref(), true)
            .context("RUN_MIGRATIONS must be true or false")?;

        let jwt_secret = lookup("IDENTITY_JWT_SECRET")
            .context("IDENTITY_JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "IDENTITY_JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            );
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url,
                max_connections,
                run_migrations,
            },
            identity: IdentityConfig { jwt_secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> anyhow::Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("unrecognised boolean {:?}", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/orgdesk"),
            ("IDENTITY_JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("DATABASE_URL", "postgresql://localhost/orgdesk"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("RUN_MIGRATIONS", "false"),
            ("IDENTITY_JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.database.max_connections, 25);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("IDENTITY_JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/orgdesk")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/orgdesk"),
            ("IDENTITY_JWT_SECRET", "too-short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let identity = IdentityConfig {
            jwt_secret: SECRET.to_string(),
        };
        assert!(!format!("{:?}", identity).contains(SECRET));
    }
}
