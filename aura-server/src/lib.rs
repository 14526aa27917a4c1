//! Aura Storefront Server
//!
//! Document-database-backed REST API for the Aura storefront. The core of
//! the system is the order-placement flow: converting a user's cart into an
//! immutable order while atomically reserving per-size inventory, with two
//! payment paths (cash-on-delivery and gateway-verified online payment).
//!
//! # Module structure
//!
//! ```text
//! aura-server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── auth/          # JWT validation, CurrentUser extractor
//! ├── db/            # Embedded SurrealDB: models + repositories
//! ├── checkout/      # Checkout orchestrator
//! ├── payment/       # Gateway client, signature gate, reconciliation
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod payment;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use checkout::{CheckoutError, CheckoutService, PlacedOrder};
pub use core::{Config, Server, ServerState};
pub use payment::{PaymentConfirmation, PaymentError, PaymentGateway, ReconciliationService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging. Called once from `main`.
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
