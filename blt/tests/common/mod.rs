#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use blt::{IssuedTransaction, LedgerClient, LedgerError, TransactionObserver};
use blt_common::{
    api::Confirmation,
    crypto::Hash,
    transaction::{OutputReference, Transaction, TransactionFactory},
};

#[derive(Default)]
struct LedgerState {
    submissions: usize,
    fetches: usize,
    submitted: Vec<Transaction>,
    committed: HashMap<Hash, Transaction>,
    spent: HashSet<OutputReference>,
    completion_order: Vec<Hash>,
    reissued: HashMap<Hash, Transaction>,
}

/// In-memory ledger checking signatures and spends like a real node would.
///
/// Submissions and fetches are counted from 0 in call order, failures and
/// delays are keyed on that count.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    submit_delays: Vec<Duration>,
    fail_submit_at: Option<usize>,
    fail_fetch_at: Option<usize>,
    reissue_seed: Option<String>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the confirmation of the n-th submission by `delays[n]`
    pub fn with_submit_delays(mut self, delays: Vec<Duration>) -> Self {
        self.submit_delays = delays;
        self
    }

    pub fn fail_submit_at(mut self, ordinal: usize) -> Self {
        self.fail_submit_at = Some(ordinal);
        self
    }

    pub fn fail_fetch_at(mut self, ordinal: usize) -> Self {
        self.fail_fetch_at = Some(ordinal);
        self
    }

    /// Serve a different record on fetch: the node moves the fetched output
    /// forward itself with a transfer signed by `seed`, commits it and
    /// returns that transfer as the canonical record.
    pub fn reissue_on_fetch(mut self, seed: &str) -> Self {
        self.reissue_seed = Some(seed.to_string());
        self
    }

    /// Record returned when `id` was fetched in reissue mode
    pub fn canonical_of(&self, id: &Hash) -> Option<Transaction> {
        self.state.lock().reissued.get(id).cloned()
    }

    /// Every transaction received, in call order, including rejected ones
    pub fn submitted(&self) -> Vec<Transaction> {
        self.state.lock().submitted.clone()
    }

    pub fn committed_count(&self) -> usize {
        self.state.lock().committed.len()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches
    }

    /// Ids in the order their confirmations were returned
    pub fn completion_order(&self) -> Vec<Hash> {
        self.state.lock().completion_order.clone()
    }

    fn reject(reason: impl Into<String>) -> LedgerError {
        LedgerError::Rejected {
            status: 400,
            body: reason.into(),
        }
    }

    fn check_spend(state: &LedgerState, transaction: &Transaction) -> Result<(), LedgerError> {
        let (Some(spends), Some(transfer)) = (transaction.spends(), transaction.as_transfer()) else {
            return Ok(());
        };

        let prior = state
            .committed
            .get(&spends.transaction_id)
            .ok_or_else(|| Self::reject("spent output does not exist"))?;
        if prior.owner() != transfer.previous_owner() {
            return Err(Self::reject("spent output has another owner"));
        }
        if prior.asset_id() != transfer.asset_id() {
            return Err(Self::reject("asset id does not match spent output"));
        }
        if state.spent.contains(spends) {
            return Err(Self::reject("double spend"));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Confirmation, LedgerError> {
        let ordinal = {
            let mut state = self.state.lock();
            let ordinal = state.submissions;
            state.submissions += 1;
            state.submitted.push(transaction.clone());
            ordinal
        };

        if let Some(delay) = self.submit_delays.get(ordinal) {
            tokio::time::sleep(*delay).await;
        }

        if self.fail_submit_at == Some(ordinal) {
            return Err(LedgerError::Rejected {
                status: 500,
                body: "injected submission failure".to_string(),
            });
        }

        transaction
            .verify()
            .map_err(|e| Self::reject(e.to_string()))?;

        let mut state = self.state.lock();
        Self::check_spend(&state, transaction)?;
        if let Some(spends) = transaction.spends() {
            state.spent.insert(spends.clone());
        }
        state
            .committed
            .insert(transaction.id().clone(), transaction.clone());
        state.completion_order.push(transaction.id().clone());

        Ok(Confirmation::new(
            transaction.id().clone(),
            transaction.operation(),
        ))
    }

    async fn fetch_confirmed(&self, id: &Hash) -> Result<Transaction, LedgerError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let ordinal = state.fetches;
        state.fetches += 1;

        if self.fail_fetch_at == Some(ordinal) {
            return Err(LedgerError::Rejected {
                status: 503,
                body: "injected fetch failure".to_string(),
            });
        }

        let record = state
            .committed
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        let Some(seed) = &self.reissue_seed else {
            return Ok(record);
        };
        if let Some(reissued) = state.reissued.get(id) {
            return Ok(reissued.clone());
        }

        let reissued = TransactionFactory::new()
            .build_transfer(seed, &record, record.sequence_index())
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        Self::check_spend(state, &reissued)?;
        if let Some(spends) = reissued.spends() {
            state.spent.insert(spends.clone());
        }
        state
            .committed
            .insert(reissued.id().clone(), reissued.clone());
        state.reissued.insert(id.clone(), reissued.clone());

        Ok(reissued)
    }
}

/// Observer remembering every call it receives
#[derive(Default)]
pub struct RecordingObserver {
    calls: Mutex<Vec<(String, usize, Hash, Hash)>>,
}

impl RecordingObserver {
    /// (test id, sequence index, transaction id, confirmed id) per call
    pub fn calls(&self) -> Vec<(String, usize, Hash, Hash)> {
        self.calls.lock().clone()
    }
}

impl TransactionObserver for RecordingObserver {
    fn on_issued(&self, issued: &IssuedTransaction<'_>) {
        self.calls.lock().push((
            issued.test_id.to_string(),
            issued.sequence_index,
            issued.transaction.id().clone(),
            issued.confirmation.id.clone(),
        ));
    }
}
