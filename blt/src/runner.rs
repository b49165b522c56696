use chrono::Utc;
use futures::future::try_join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use blt_common::{
    api::Confirmation,
    crypto::Hash,
    transaction::{Transaction, TransactionFactory},
};

use crate::{
    config::ConnectionConfig,
    error::BltError,
    ledger_client::{HttpLedgerClient, LedgerClient, LedgerClientConfig},
    observer::{IssuedTransaction, TransactionObserver},
    result::TestResult,
};

// Progress of a transfer chain. Each variant owns what the next step needs.
// The creation and the first transfer both carry sequence index 0: the
// creation is bookkeeping for the chain, transfers are what gets measured.
enum ChainState {
    Creating,
    Transferring {
        index: usize,
        prior: Transaction,
    },
    Confirming {
        index: usize,
        transaction: Transaction,
        confirmation: Confirmation,
    },
    Done,
}

/// Load test engine issuing transactions through a ledger client.
///
/// A `Blt` holds no mutable state: several runs may share one instance.
pub struct Blt {
    client: Arc<dyn LedgerClient>,
    factory: TransactionFactory,
}

impl Blt {
    /// Engine talking HTTP to the node described by `connection`
    pub fn new(connection: &ConnectionConfig) -> Result<Self, BltError> {
        Self::with_client_config(connection, LedgerClientConfig::default())
    }

    pub fn with_client_config(
        connection: &ConnectionConfig,
        config: LedgerClientConfig,
    ) -> Result<Self, BltError> {
        connection.validate()?;
        let client = HttpLedgerClient::with_config(connection, config).map_err(BltError::Client)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Engine using an existing ledger client
    pub fn with_client(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            client,
            factory: TransactionFactory::new(),
        }
    }

    async fn submit(&self, transaction: &Transaction, sequence_index: usize) -> Result<Confirmation, BltError> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("Submitting {:?} {} (index {})", transaction.operation(), transaction.id(), sequence_index);
        }

        self.client
            .submit_and_confirm(transaction)
            .await
            .map_err(|source| {
                warn!("Submission of {} (index {}) failed: {}", transaction.id(), sequence_index, source);
                BltError::Submission {
                    sequence_index,
                    transaction_id: transaction.id().clone(),
                    source,
                }
            })
    }

    async fn fetch(&self, id: &Hash, sequence_index: usize) -> Result<Transaction, BltError> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("Fetching confirmed record of {} (index {})", id, sequence_index);
        }

        self.client.fetch_confirmed(id).await.map_err(|source| {
            warn!("Fetching {} (index {}) failed: {}", id, sequence_index, source);
            BltError::ConfirmationFetch {
                sequence_index,
                transaction_id: id.clone(),
                source,
            }
        })
    }

    /// Submit `count` independent creations concurrently.
    ///
    /// Every transaction is built before the first submission. The observer
    /// runs as each confirmation arrives, the result keeps issue order. The
    /// first failed submission fails the run and drops the others in flight.
    pub async fn run_create_batch(
        &self,
        test_id: &str,
        count: usize,
        observer: Option<&dyn TransactionObserver>,
    ) -> Result<TestResult, BltError> {
        let start_time = Utc::now();
        info!("Starting batch '{}' of {} creations", test_id, count);

        let transactions = (0..count)
            .map(|index| self.factory.build_creation(test_id, index))
            .collect::<Result<Vec<_>, _>>()?;

        let submissions = transactions
            .iter()
            .enumerate()
            .map(|(sequence_index, transaction)| async move {
                let confirmation = self.submit(transaction, sequence_index).await?;
                if let Some(observer) = observer {
                    observer.on_issued(&IssuedTransaction {
                        test_id,
                        transaction,
                        sequence_index,
                        confirmation: &confirmation,
                    });
                }
                Ok::<_, BltError>(confirmation)
            });

        let responses = try_join_all(submissions).await?;

        let result = TestResult::new(test_id, transactions, responses, start_time, Utc::now());
        info!(
            "Batch '{}' completed: {} transactions in {:?}",
            test_id,
            result.transaction_count(),
            result.duration()
        );
        Ok(result)
    }

    /// Create one asset then move it through `count` sequential transfers.
    ///
    /// Each transfer spends the record fetched from the node after the
    /// previous step was confirmed. The creation is always issued, even for
    /// an empty chain, and the result holds the transfers only.
    pub async fn run_transfer_chain(
        &self,
        test_id: &str,
        count: usize,
        observer: Option<&dyn TransactionObserver>,
    ) -> Result<TestResult, BltError> {
        let start_time = Utc::now();
        info!("Starting chain '{}' of {} transfers", test_id, count);

        let mut transactions = Vec::with_capacity(count);
        let mut responses = Vec::with_capacity(count);
        let mut state = ChainState::Creating;

        loop {
            state = match state {
                ChainState::Creating => {
                    let creation = self.factory.build_creation(test_id, 0)?;
                    self.submit(&creation, 0).await?;
                    let prior = self.fetch(creation.id(), 0).await?;
                    debug!("Chain '{}' asset {} created", test_id, prior.asset_id());

                    if count == 0 {
                        ChainState::Done
                    } else {
                        ChainState::Transferring { index: 0, prior }
                    }
                }
                ChainState::Transferring { index, prior } => {
                    let transaction = self.factory.build_transfer(test_id, &prior, index)?;
                    let confirmation = self.submit(&transaction, index).await?;

                    ChainState::Confirming {
                        index,
                        transaction,
                        confirmation,
                    }
                }
                ChainState::Confirming {
                    index,
                    transaction,
                    confirmation,
                } => {
                    let prior = self.fetch(transaction.id(), index).await?;
                    if let Some(observer) = observer {
                        observer.on_issued(&IssuedTransaction {
                            test_id,
                            transaction: &transaction,
                            sequence_index: index,
                            confirmation: &confirmation,
                        });
                    }
                    transactions.push(transaction);
                    responses.push(confirmation);

                    let next = index + 1;
                    if next < count {
                        ChainState::Transferring { index: next, prior }
                    } else {
                        ChainState::Done
                    }
                }
                ChainState::Done => break,
            };
        }

        let result = TestResult::new(test_id, transactions, responses, start_time, Utc::now());
        info!(
            "Chain '{}' completed: {} transfers in {:?}",
            test_id,
            result.transaction_count(),
            result.duration()
        );
        Ok(result)
    }
}
