use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use blt_common::{api::Confirmation, transaction::Transaction};

/// Outcome of a completed load-test run.
///
/// `transactions` and `responses` are index-aligned in issue order. A result
/// is only ever built by a runner once every transaction was confirmed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TestResult {
    test_id: String,
    transactions: Vec<Transaction>,
    responses: Vec<Confirmation>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TestResult {
    pub fn new(
        test_id: impl Into<String>,
        transactions: Vec<Transaction>,
        responses: Vec<Confirmation>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            transactions,
            responses,
            start_time,
            end_time,
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn responses(&self) -> &[Confirmation] {
        &self.responses
    }

    pub fn start_time(&self) -> &DateTime<Utc> {
        &self.start_time
    }

    pub fn end_time(&self) -> &DateTime<Utc> {
        &self.end_time
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Wall-clock span of the run, never negative even if the clock went backwards
    pub fn duration(&self) -> Duration {
        (self.end_time - self.start_time)
            .abs()
            .to_std()
            .unwrap_or_default()
    }

    /// Mean time spent per transaction, `None` for an empty run
    pub fn average_processing_time(&self) -> Option<Duration> {
        let count = self.transaction_count() as u128;
        if count == 0 {
            return None;
        }

        let nanos = self.duration().as_nanos() / count;
        Some(Duration::from_nanos(nanos.try_into().unwrap_or(u64::MAX)))
    }

    /// Throughput of the run, `None` when nothing was sent or no time elapsed
    pub fn transactions_per_second(&self) -> Option<f64> {
        let secs = self.duration().as_secs_f64();
        if self.transactions.is_empty() || secs == 0.0 {
            return None;
        }
        Some(self.transaction_count() as f64 / secs)
    }

    /// Export the result as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize test result: {}", e))?;

        std::fs::write(&path, content).map_err(|e| {
            anyhow!(
                "Failed to write test result '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        info!("Test result saved to: {}", path.as_ref().display());
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(70));
        println!("LOAD TEST SUMMARY: {}", self.test_id);
        println!("{}", "=".repeat(70));
        println!("Transactions confirmed:       {}", self.transaction_count());
        println!("Started at:                   {}", self.start_time.to_rfc3339());
        println!("Finished at:                  {}", self.end_time.to_rfc3339());
        println!("Total duration:               {:?}", self.duration());
        match self.average_processing_time() {
            Some(avg) => println!("Average processing time:      {avg:?}"),
            None => println!("Average processing time:      n/a"),
        }
        match self.transactions_per_second() {
            Some(tps) => println!("Average TPS:                  {tps:.2}"),
            None => println!("Average TPS:                  n/a"),
        }
        println!("{}", "=".repeat(70));
    }
}
