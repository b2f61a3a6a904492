//! Server configuration, read from CLI arguments and the environment.

use clap::{Args, Parser, ValueEnum};
use groundwork_db::DbConfig;
use groundwork_tenancy::{Environment, TenancyConfig};

use crate::auth::AuthConfig;

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,
    /// Structured JSON logs.
    Json,
}

#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `mem://`, `surrealkv://<path>` or `ws://<host>:<port>`
    #[arg(long, env = "DATABASE_URL", default_value = "surrealkv://data/groundwork")]
    pub database_url: String,

    #[arg(long, env = "DATABASE_NAMESPACE", default_value = "groundwork")]
    pub database_namespace: String,

    #[arg(long, env = "DATABASE_NAME", default_value = "main")]
    pub database_name: String,

    #[arg(long, env = "DATABASE_USER")]
    pub database_user: Option<String>,

    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,
}

#[derive(Debug, Args)]
pub struct TenancyArgs {
    /// development, test or production. Unset means production.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    pub app_env: Environment,

    /// Allow the single-tenant fallbacks. Ignored in production.
    #[arg(long, env = "SINGLE_TENANT_MODE", default_value_t = false)]
    pub single_tenant_mode: bool,
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, env = "JWT_PUBLIC_KEY_PEM", hide_env_values = true)]
    pub jwt_public_key_pem: String,

    #[arg(long, env = "JWT_PRIVATE_KEY_PEM", hide_env_values = true)]
    pub jwt_private_key_pem: Option<String>,

    #[arg(long, env = "JWT_ISSUER", default_value = "groundwork")]
    pub jwt_issuer: String,

    #[arg(long, env = "ACCESS_TOKEN_LIFETIME_SECS", default_value_t = 900)]
    pub access_token_lifetime_secs: u64,
}

/// Groundwork API server configuration
#[derive(Debug, Parser)]
#[command(name = "groundwork", about = "Groundwork API server", long_about = None)]
pub struct ServerConfig {
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub tenancy: TenancyArgs,

    #[command(flatten)]
    pub token: TokenArgs,
}

impl ServerConfig {
    /// Load configuration from `.env`, the environment and CLI arguments.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();
        Self::try_parse()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database.database_url.clone(),
            namespace: self.database.database_namespace.clone(),
            database: self.database.database_name.clone(),
            username: self.database.database_user.clone(),
            password: self.database.database_password.clone(),
        }
    }

    /// Whether `SINGLE_TENANT_MODE` was requested where it is not honored.
    pub fn single_tenant_mode_ignored(&self) -> bool {
        self.tenancy.single_tenant_mode && self.tenancy.app_env == Environment::Production
    }

    pub fn tenancy_config(&self) -> TenancyConfig {
        TenancyConfig {
            environment: self.tenancy.app_env,
            single_tenant_mode: self.tenancy.single_tenant_mode,
            ..Default::default()
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_public_key_pem: self.token.jwt_public_key_pem.clone(),
            jwt_private_key_pem: self.token.jwt_private_key_pem.clone(),
            jwt_issuer: self.token.jwt_issuer.clone(),
            access_token_lifetime_secs: self.token.access_token_lifetime_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["groundwork", "--jwt-public-key-pem", "pem"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn production_ignores_single_tenant_mode() {
        let config = parse(&["--app-env", "production", "--single-tenant-mode"]);
        assert!(config.single_tenant_mode_ignored());
        assert!(!config.tenancy_config().relaxed_mode());
    }

    #[test]
    fn development_honors_single_tenant_mode() {
        let config = parse(&["--app-env", "dev", "--single-tenant-mode"]);
        assert!(!config.single_tenant_mode_ignored());
        assert!(config.tenancy_config().relaxed_mode());
    }

    #[test]
    fn unset_app_env_fails_closed() {
        let config = parse(&["--single-tenant-mode"]);
        assert_eq!(config.tenancy.app_env, Environment::Production);
        assert!(config.single_tenant_mode_ignored());
        assert!(!config.tenancy_config().relaxed_mode());
    }

    #[test]
    fn database_settings_flow_into_db_config() {
        let config = parse(&["--database-url", "mem://", "--database-name", "scratch"]);
        let db = config.db_config();
        assert_eq!(db.url, "mem://");
        assert_eq!(db.database, "scratch");
        assert_eq!(db.namespace, "groundwork");
        assert!(db.username.is_none());
    }
}
