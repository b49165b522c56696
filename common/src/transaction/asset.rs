use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ASSET_NAME;

/// Asset data attached to a creation transaction.
///
/// Assets written to a ledger are kept forever, so every asset issued by the
/// tester carries the [`ASSET_NAME`] tag to make it easy to filter out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    name: String,
    date: DateTime<Utc>,
    test_id: String,
    transaction_index: usize,
}

impl AssetPayload {
    pub fn new(test_id: impl Into<String>, transaction_index: usize) -> Self {
        Self {
            name: ASSET_NAME.to_string(),
            date: Utc::now(),
            test_id: test_id.into(),
            transaction_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn transaction_index(&self) -> usize {
        self.transaction_index
    }

    /// Whether this asset was issued by the load tester
    pub fn is_blt_asset(&self) -> bool {
        self.name == ASSET_NAME
    }
}

/// Metadata attached to a transfer transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMetadata {
    date: DateTime<Utc>,
    transaction_index: usize,
}

impl TransferMetadata {
    pub fn new(transaction_index: usize) -> Self {
        Self {
            date: Utc::now(),
            transaction_index,
        }
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }

    pub fn transaction_index(&self) -> usize {
        self.transaction_index
    }
}
