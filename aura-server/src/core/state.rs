//! Server state
//!
//! `ServerState` bundles the shared handles every handler needs: config,
//! the embedded database connection and the long-lived services. Cloning is
//! shallow (`Arc` / connection handles).

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::payment::{HttpGateway, PaymentGateway, ReconciliationService, SignatureVerifier};
use crate::utils::AppError;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT validation service
    pub jwt: Arc<JwtService>,
    /// Checkout orchestrator
    pub checkout: CheckoutService,
    /// Payment reconciliation service
    pub reconciliation: ReconciliationService,
}

impl ServerState {
    /// Initialize state against the configured working directory.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = crate::db::connect(&config.work_dir).await?;
        let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpGateway::new(
            config.gateway.base_url.clone(),
            config.gateway.key_id.clone(),
            config.gateway.key_secret.clone(),
        ));
        Ok(Self::assemble(config.clone(), db, gateway))
    }

    /// Wire state from parts. Tests use this with an in-memory database and
    /// a fake gateway.
    pub fn assemble(config: Config, db: Surreal<Db>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt));
        let verifier = Arc::new(SignatureVerifier::new(&config.gateway.key_secret));
        let checkout =
            CheckoutService::new(db.clone(), gateway, config.gateway.currency.clone());
        let reconciliation = ReconciliationService::new(db.clone(), verifier);
        Self {
            config,
            db,
            jwt,
            checkout,
            reconciliation,
        }
    }
}
