//! CLI argument parsing, validation, and startup helpers.

use crate::db::Database;
use crate::jwt::{self, JwtConfig, KeyMaterial};
use base64::Engine;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tradepost",
    about = "REST backend for users, products, and sessions with token authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tradepost.db")]
    pub database: String,

    /// Base64-encoded PEM private key for signing access tokens
    #[arg(long, env = "ACCESS_TOKEN_PRIVATE_KEY", hide_env_values = true)]
    pub access_token_private_key: String,

    /// Base64-encoded PEM public key for verifying access tokens
    #[arg(long, env = "ACCESS_TOKEN_PUBLIC_KEY", hide_env_values = true)]
    pub access_token_public_key: String,

    /// Base64-encoded PEM private key for signing refresh tokens
    #[arg(long, env = "REFRESH_TOKEN_PRIVATE_KEY", hide_env_values = true)]
    pub refresh_token_private_key: String,

    /// Base64-encoded PEM public key for verifying refresh tokens
    #[arg(long, env = "REFRESH_TOKEN_PUBLIC_KEY", hide_env_values = true)]
    pub refresh_token_public_key: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = jwt::ACCESS_TOKEN_TTL_SECS)]
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = jwt::REFRESH_TOKEN_TTL_SECS)]
    pub refresh_token_ttl_secs: u64,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

fn decode_key(name: &str, value: &str) -> Option<Vec<u8>> {
    match base64::engine::general_purpose::STANDARD.decode(value.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            error!(key = %name, error = %e, "Key is not valid base64");
            None
        }
    }
}

/// Decode the four base64-encoded PEM key strings from the arguments.
/// Returns None and logs an error if any key cannot be decoded.
pub fn load_key_material(args: &Args) -> Option<KeyMaterial> {
    Some(KeyMaterial {
        access_private_pem: decode_key("ACCESS_TOKEN_PRIVATE_KEY", &args.access_token_private_key)?,
        access_public_pem: decode_key("ACCESS_TOKEN_PUBLIC_KEY", &args.access_token_public_key)?,
        refresh_private_pem: decode_key(
            "REFRESH_TOKEN_PRIVATE_KEY",
            &args.refresh_token_private_key,
        )?,
        refresh_public_pem: decode_key("REFRESH_TOKEN_PUBLIC_KEY", &args.refresh_token_public_key)?,
    })
}

/// Build the token codec from the arguments. Bad key material is a
/// deployment error: this logs and returns None so the caller can exit.
pub fn build_jwt_config(args: &Args) -> Option<JwtConfig> {
    let keys = load_key_material(args)?;

    match JwtConfig::new(
        &keys,
        Duration::from_secs(args.access_token_ttl_secs),
        Duration::from_secs(args.refresh_token_ttl_secs),
    ) {
        Ok(config) => Some(config),
        Err(e) => {
            error!(error = %e, "Failed to load signing keys");
            None
        }
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
