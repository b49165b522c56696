use blt_common::{api::Confirmation, transaction::Transaction};

/// A transaction the node has just confirmed, as seen by an observer.
///
/// Everything is borrowed from the runner: observers can look but never
/// reach the collections a result is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct IssuedTransaction<'a> {
    pub test_id: &'a str,
    pub transaction: &'a Transaction,
    pub sequence_index: usize,
    pub confirmation: &'a Confirmation,
}

/// Callback invoked once per confirmed transaction of a run
pub trait TransactionObserver: Send + Sync {
    fn on_issued(&self, issued: &IssuedTransaction<'_>);
}

impl<F> TransactionObserver for F
where
    F: Fn(&IssuedTransaction<'_>) + Send + Sync,
{
    fn on_issued(&self, issued: &IssuedTransaction<'_>) {
        self(issued)
    }
}
