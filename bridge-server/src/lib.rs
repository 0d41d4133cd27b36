//! Voucher Bridge Server
//!
//! Accepts batches of voucher records selected by regional finance
//! admins and pushes them to destination cloud accounting APIs, with
//! duplicate prevention and gapless sequential voucher numbering for
//! destinations that require it.
//!
//! # Module structure
//!
//! ```text
//! bridge-server/src/
//! ├── config.rs      # Environment configuration + destination routing
//! ├── state.rs       # Shared application state
//! ├── error.rs       # Service-layer error bridging
//! ├── db/            # SQLite pool, counter and ledger access
//! ├── numbering/     # Formatter, named locks, sequence allocator
//! ├── cloud/         # Destination cloud API gateway
//! ├── submission.rs  # Batch orchestrator
//! └── api/           # HTTP routes and handlers
//! ```

pub mod api;
pub mod cloud;
pub mod config;
pub mod db;
pub mod error;
pub mod numbering;
pub mod state;
pub mod submission;

// Re-export public types
pub use config::{Config, DestinationConfig, NumberingMode};
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
pub use submission::SubmissionService;
