//! Server configuration
//!
//! All settings come from environment variables with sensible defaults:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/aura | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development / staging / production |
//! | JWT_SECRET | (dev key) | Shared secret with the auth service |
//! | JWT_ISSUER | aura-auth | Expected token issuer |
//! | GATEWAY_URL | https://api.gateway.test | Payment gateway base URL |
//! | GATEWAY_KEY_ID | (empty) | Merchant key id |
//! | GATEWAY_KEY_SECRET | (empty) | Merchant key secret (HMAC key) |
//! | CURRENCY | INR | Settlement currency |

use crate::auth::JwtConfig;

/// Payment gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the embedded database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// JWT validation settings
    pub jwt: JwtConfig,
    /// Payment gateway settings
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/aura".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            jwt: JwtConfig::from_env(),
            gateway: GatewayConfig {
                base_url: std::env::var("GATEWAY_URL")
                    .unwrap_or_else(|_| "https://api.gateway.test".into()),
                key_id: std::env::var("GATEWAY_KEY_ID").unwrap_or_default(),
                key_secret: std::env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
                currency: std::env::var("CURRENCY").unwrap_or_else(|_| "INR".into()),
            },
        }
    }
}
