//! Server configuration
//!
//! All settings come from environment variables with development
//! defaults:
//!
//! | Env var | Default | Meaning |
//! |---------|---------|---------|
//! | DATABASE_PATH | bridge.db | SQLite database file |
//! | HTTP_PORT | 8080 | HTTP API port |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | LOCK_WAIT_MS | 15000 | Max wait for a sequence lock |
//! | PUSH_TIMEOUT_MS | 30000 | Timeout for one cloud push request |
//! | FISCAL_YEAR | (empty) | Fiscal-year scope for sequence counters |
//! | NEPAL_SALES_URL / _TOKEN / _SUCCESS_CODE / _PREFIX | see below | Nepal Sales destination |
//! | NEPAL_PURCHASE_URL / _TOKEN / _SUCCESS_CODE / _PREFIX | see below | Nepal Purchase destination |

/// How voucher numbers are assigned for a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingMode {
    /// Allocate from the durable per-(region, voucher type) counter
    Sequential,
    /// Reuse the source system's invoice number (no counter involved)
    SourceInvoice,
}

/// One destination cloud API endpoint and its numbering policy
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    pub region: String,
    pub voucher_type: String,
    /// Voucher-create endpoint of the destination cloud API
    pub cloud_url: String,
    /// Value sent in the auth-token request header
    pub auth_token: String,
    /// Status code the destination returns for an accepted voucher.
    /// Observed as "200" on some endpoints and "101" on others, so it is
    /// configuration rather than a constant.
    pub success_code: String,
    /// Display prefix for assigned voucher numbers
    pub voucher_prefix: String,
    pub numbering: NumberingMode,
    /// Fiscal-year scope for the counter (empty = unscoped)
    pub fiscal_year: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file for the numbering store
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Max wait for the per-(region, voucher type) sequence lock (ms)
    pub lock_wait_ms: u64,
    /// Timeout for one cloud push request (ms)
    pub push_timeout_ms: u64,
    /// Destination routing table
    pub destinations: Vec<DestinationConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let fiscal_year = std::env::var("FISCAL_YEAR").unwrap_or_default();

        let destinations = vec![
            DestinationConfig {
                region: "nepal".into(),
                voucher_type: "sales".into(),
                cloud_url: std::env::var("NEPAL_SALES_URL")
                    .unwrap_or_else(|_| "http://localhost:4000/api/vouchers".into()),
                auth_token: std::env::var("NEPAL_SALES_TOKEN").unwrap_or_default(),
                success_code: std::env::var("NEPAL_SALES_SUCCESS_CODE")
                    .unwrap_or_else(|_| "200".into()),
                voucher_prefix: std::env::var("NEPAL_SALES_PREFIX")
                    .unwrap_or_else(|_| "AQNS".into()),
                numbering: NumberingMode::Sequential,
                fiscal_year: fiscal_year.clone(),
            },
            DestinationConfig {
                region: "nepal".into(),
                voucher_type: "purchase".into(),
                cloud_url: std::env::var("NEPAL_PURCHASE_URL")
                    .unwrap_or_else(|_| "http://localhost:4000/api/purchases".into()),
                auth_token: std::env::var("NEPAL_PURCHASE_TOKEN").unwrap_or_default(),
                success_code: std::env::var("NEPAL_PURCHASE_SUCCESS_CODE")
                    .unwrap_or_else(|_| "200".into()),
                voucher_prefix: std::env::var("NEPAL_PURCHASE_PREFIX")
                    .unwrap_or_else(|_| "AQNP".into()),
                numbering: NumberingMode::SourceInvoice,
                fiscal_year,
            },
        ];

        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "bridge.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            lock_wait_ms: std::env::var("LOCK_WAIT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(15_000),
            push_timeout_ms: std::env::var("PUSH_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            destinations,
        }
    }

    /// Find the destination for a (region, voucher type) route
    pub fn destination(&self, region: &str, voucher_type: &str) -> Option<&DestinationConfig> {
        self.destinations
            .iter()
            .find(|d| d.region == region && d.voucher_type == voucher_type)
    }

    /// Is this a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_lookup() {
        let config = Config::from_env();

        let sales = config.destination("nepal", "sales").unwrap();
        assert_eq!(sales.numbering, NumberingMode::Sequential);

        let purchase = config.destination("nepal", "purchase").unwrap();
        assert_eq!(purchase.numbering, NumberingMode::SourceInvoice);

        assert!(config.destination("india", "sales").is_none());
    }
}
