use blt_common::{crypto::Hash, transaction::TransactionError};
use thiserror::Error;

use crate::{config::ConfigError, ledger_client::LedgerError};

/// Errors surfaced to the caller of a load-test run.
///
/// A failed run never yields a partial result. Transactions accepted by the
/// ledger before the failure stay there and are not reconciled.
#[derive(Error, Debug)]
pub enum BltError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot build ledger client: {0}")]
    Client(#[source] LedgerError),
    #[error("Cannot build transaction: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Submission of transaction {transaction_id} (index {sequence_index}) failed: {source}")]
    Submission {
        sequence_index: usize,
        transaction_id: Hash,
        #[source]
        source: LedgerError,
    },
    #[error("Cannot fetch confirmed transaction {transaction_id} (index {sequence_index}): {source}")]
    ConfirmationFetch {
        sequence_index: usize,
        transaction_id: Hash,
        #[source]
        source: LedgerError,
    },
}

impl BltError {
    /// Index of the transaction that failed, if the error is tied to one
    pub fn sequence_index(&self) -> Option<usize> {
        match self {
            Self::Submission { sequence_index, .. }
            | Self::ConfirmationFetch { sequence_index, .. } => Some(*sequence_index),
            _ => None,
        }
    }
}
