//! Command line and environment configuration
//!
//! Flags win over environment variables, which win over defaults. `.env`
//! is loaded before parsing.

use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use clap::Parser;
use loyalty::application::config::normalize_base_url;
use loyalty::{AccrualClientConfig, LoyaltyConfig, PollerConfig};

#[derive(Debug, Parser)]
#[command(name = "gophermart")]
#[command(about = "Loyalty points service", long_about = None)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(short = 'a', long, env = "RUN_ADDRESS", default_value = "127.0.0.1:8880")]
    pub run_address: String,

    /// PostgreSQL connection string
    #[arg(short = 'd', long, env = "DATABASE_URI")]
    pub database_uri: String,

    /// Base address of the accrual system; `http://` is assumed when no scheme is given
    #[arg(
        short = 'r',
        long,
        env = "ACCRUAL_SYSTEM_ADDRESS",
        default_value = "http://127.0.0.1:8080"
    )]
    pub accrual_system_address: String,

    /// Pause between reconciliation cycles
    #[arg(long, env = "ACCRUAL_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub accrual_poll_interval_ms: u64,

    /// Per-request timeout towards the accrual system
    #[arg(long, env = "ACCRUAL_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub accrual_request_timeout_ms: u64,

    /// Backoff for a 429 without a usable Retry-After
    #[arg(long, env = "ACCRUAL_DEFAULT_RETRY_AFTER_MS", default_value_t = 1000)]
    pub accrual_default_retry_after_ms: u64,

    /// Base64 encoded 32 byte HMAC key for session tokens
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 3600)]
    pub session_ttl_secs: u64,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,
}

impl Cli {
    pub fn loyalty_config(&self) -> LoyaltyConfig {
        LoyaltyConfig {
            accrual: AccrualClientConfig {
                base_url: normalize_base_url(&self.accrual_system_address),
                request_timeout: Duration::from_millis(self.accrual_request_timeout_ms),
                default_retry_after: Duration::from_millis(self.accrual_default_retry_after_ms),
            },
            poller: PollerConfig {
                poll_interval: Duration::from_millis(self.accrual_poll_interval_ms),
            },
        }
    }

    /// Debug builds fall back to a random secret; release builds require one.
    pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let session_ttl = Duration::from_secs(self.session_ttl_secs);

        let Some(encoded) = &self.session_secret else {
            if cfg!(debug_assertions) {
                tracing::warn!("SESSION_SECRET not set, using a random secret and insecure cookies");
                return Ok(AuthConfig {
                    session_ttl,
                    ..AuthConfig::development()
                });
            }
            bail!("SESSION_SECRET must be set in production");
        };

        let bytes = platform::crypto::from_base64(encoded.trim())
            .context("SESSION_SECRET is not valid base64")?;
        let Ok(session_secret) = <[u8; 32]>::try_from(bytes.as_slice()) else {
            bail!("SESSION_SECRET must decode to 32 bytes, got {}", bytes.len());
        };

        Ok(AuthConfig {
            session_secret,
            session_ttl,
            ..AuthConfig::default()
        })
    }
}
