pub mod backfill;
pub mod config;
pub mod control;
pub mod discord_gateway;
pub mod error_log;
pub mod extract;
pub mod ingest;
pub mod ledger;
pub mod order;
pub mod uptime;

pub use config::RelayConfig;
pub use error_log::ErrorLog;
pub use ledger::{LedgerError, OrderLedger};
pub use order::OrderRecord;
