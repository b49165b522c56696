//! BLT ledger load tester
//!
//! This library issues batches of signed write transactions against a ledger
//! node and aggregates what was sent and confirmed into a [`TestResult`].
//! Two load shapes are provided by [`Blt`]:
//!
//! - [`Blt::run_create_batch`]: independent creations submitted concurrently
//! - [`Blt::run_transfer_chain`]: one creation followed by a strictly
//!   sequential chain of transfers, each spending the previous confirmed one

pub mod config;
pub mod error;
pub mod ledger_client;
pub mod logger;
pub mod observer;
pub mod result;
pub mod runner;

pub use config::{ConfigError, ConnectionConfig, ValidatedConfig};
pub use error::BltError;
pub use ledger_client::{HttpLedgerClient, LedgerClient, LedgerClientConfig, LedgerError};
pub use observer::{IssuedTransaction, TransactionObserver};
pub use result::TestResult;
pub use runner::Blt;
