//! Application state for bridge-server

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::cloud::{CloudVoucherClient, VoucherGateway};
use crate::config::Config;
use crate::db;
use crate::numbering::SequenceLocks;
use crate::submission::SubmissionService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (immutable after startup)
    pub config: Arc<Config>,
    /// SQLite connection pool for the numbering store
    pub pool: SqlitePool,
    /// Named sequence locks, one per (region, voucher type)
    pub locks: Arc<SequenceLocks>,
    /// Gateway to the destination cloud APIs
    pub gateway: Arc<dyn VoucherGateway>,
}

impl AppState {
    /// Create the state: open the database, run migrations, build the
    /// cloud client.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = db::connect(&config.database_path).await?;
        let gateway: Arc<dyn VoucherGateway> = Arc::new(CloudVoucherClient::new(
            Duration::from_millis(config.push_timeout_ms),
        )?);

        Ok(Self {
            config: Arc::new(config.clone()),
            pool,
            locks: Arc::new(SequenceLocks::new()),
            gateway,
        })
    }

    /// Assemble state from existing parts (tests inject an in-memory
    /// pool and a stub gateway here)
    pub fn with_parts(config: Config, pool: SqlitePool, gateway: Arc<dyn VoucherGateway>) -> Self {
        Self {
            config: Arc::new(config),
            pool,
            locks: Arc::new(SequenceLocks::new()),
            gateway,
        }
    }

    /// Batch orchestrator over this state
    pub fn submission(&self) -> SubmissionService {
        SubmissionService::new(
            self.pool.clone(),
            Arc::clone(&self.locks),
            Arc::clone(&self.gateway),
            Arc::clone(&self.config),
        )
    }
}
