// Rundeck execution cleanup: API and database gateways plus the orchestrator driving them
pub mod api;
pub mod cleanup;
pub mod config;
pub mod db;
pub mod error;
pub mod interrupt;
pub mod listing;
pub mod models;
pub mod pagination;
pub mod retry;

pub use api::{ApiClient, HttpGateway, RundeckClient};
pub use cleanup::{CleanupOptions, Orchestrator, ScopeFilter};
pub use config::{CleanupConfig, ExecutionMode, KeepTime};
pub use db::{Database, DbClient};
pub use error::{CleanupError, Result};
pub use interrupt::{InterruptGuard, NeverInterrupt};
pub use listing::ListingFilter;
pub use models::{CleanupSummary, Execution, Scope};
