use log::debug;

use super::{
    AssetPayload, CreationTransaction, Transaction, TransactionError, TransferMetadata,
    TransferTransaction,
};
use crate::crypto::derive_keypair;

/// Builds the two transaction shapes issued during a load test.
///
/// Every transaction of a run is owned and signed by the keypair derived from
/// the test identifier. The factory never touches the network, submission
/// belongs to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFactory;

impl TransactionFactory {
    pub fn new() -> Self {
        Self
    }

    /// Build a signed creation whose single output is owned by the test key
    pub fn build_creation(
        &self,
        test_id: &str,
        sequence_index: usize,
    ) -> Result<Transaction, TransactionError> {
        let keypair = derive_keypair(test_id)?;
        let asset = AssetPayload::new(test_id, sequence_index);
        let tx = CreationTransaction::sign(asset, &keypair)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Built creation {} for test '{}' (index {})",
                tx.id(),
                test_id,
                sequence_index
            );
        }
        Ok(Transaction::Creation(tx))
    }

    /// Build a signed transfer of output 0 of `prior` back to the test key
    pub fn build_transfer(
        &self,
        test_id: &str,
        prior: &Transaction,
        sequence_index: usize,
    ) -> Result<Transaction, TransactionError> {
        let keypair = derive_keypair(test_id)?;
        let metadata = TransferMetadata::new(sequence_index);
        let tx = TransferTransaction::sign(prior, keypair.public_key(), metadata, &keypair)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Built transfer {} spending {} for test '{}' (index {})",
                tx.id(),
                prior.id(),
                test_id,
                sequence_index
            );
        }
        Ok(Transaction::Transfer(tx))
    }
}
