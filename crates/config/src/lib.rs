use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "frontdesk.toml",
    "config/frontdesk.toml",
    "crates/config/frontdesk.toml",
    "../frontdesk.toml",
    "../config/frontdesk.toml",
    "../crates/config/frontdesk.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://frontdesk.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings used to verify bearer tokens presented by agents.
///
/// Tokens are issued elsewhere; this service only checks the signature,
/// issuer and expiry.
///
/// ```
/// use frontdesk_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.jwt_issuer, "frontdesk");
/// assert_eq!(auth.token_ttl_seconds, 86_400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "AuthConfig::default_token_ttl")]
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    fn default_secret() -> String {
        "frontdesk-development-secret".to_string()
    }

    fn default_issuer() -> String {
        "frontdesk".to_string()
    }

    const fn default_token_ttl() -> u64 {
        86_400
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_secret(),
            jwt_issuer: Self::default_issuer(),
            token_ttl_seconds: Self::default_token_ttl(),
        }
    }
}

/// Realtime fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound frames buffered per websocket before the connection is
    /// considered stalled and dropped.
    #[serde(default = "RealtimeConfig::default_connection_buffer")]
    pub connection_buffer: usize,
}

impl RealtimeConfig {
    const fn default_connection_buffer() -> usize {
        64
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connection_buffer: Self::default_connection_buffer(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use frontdesk_config::load;
///
/// std::env::remove_var("FRONTDESK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let token_ttl = i64::try_from(defaults.auth.token_ttl_seconds).unwrap_or(i64::MAX);
    let buffer = i64::try_from(defaults.realtime.connection_buffer).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())?
        .set_default("auth.jwt_issuer", defaults.auth.jwt_issuer.clone())?
        .set_default("auth.token_ttl_seconds", token_ttl)?
        .set_default("realtime.connection_buffer", buffer)?;

    let environment_overrides = config::Environment::with_prefix("FRONTDESK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("FRONTDESK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via FRONTDESK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.realtime.connection_buffer == 0 {
        config.realtime.connection_buffer = 1;
    }

    debug!(
        address = %config.http.address,
        port = config.http.port,
        database = %config.database.url,
        "loaded backend configuration"
    );
    Ok(config)
}
