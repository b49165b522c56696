use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::OUTPUT_INDEX,
    crypto::{hash, Ed25519Error, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Hash},
};

mod asset;
pub mod factory;

pub use asset::{AssetPayload, TransferMetadata};
pub use factory::TransactionFactory;


#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Signing key error: {0}")]
    Key(#[from] Ed25519Error),
    #[error("Cannot encode transaction body: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Transaction id mismatch: expected {expected}, computed {computed}")]
    IdMismatch { expected: Hash, computed: Hash },
    #[error("Invalid signature for transaction {0}")]
    InvalidSignature(Hash),
}

// Operation kind as it is written on the wire
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Transfer,
}

/// Points at one output of an already confirmed transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputReference {
    pub transaction_id: Hash,
    pub output_index: u32,
}

impl OutputReference {
    pub fn new(transaction_id: Hash, output_index: u32) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }
}

/// Originates a new asset owned by `owner`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CreationTransaction {
    id: Hash,
    asset: AssetPayload,
    owner: Ed25519PublicKey,
    signature: Ed25519Signature,
}

/// Moves output 0 of a prior transaction to `owner`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferTransaction {
    id: Hash,
    asset_id: Hash,
    spends: OutputReference,
    previous_owner: Ed25519PublicKey,
    owner: Ed25519PublicKey,
    metadata: TransferMetadata,
    signature: Ed25519Signature,
}

// Unsigned bodies, the id is the hash of their JSON encoding
#[derive(Serialize)]
struct CreationBody<'a> {
    operation: Operation,
    asset: &'a AssetPayload,
    owner: &'a Ed25519PublicKey,
}

#[derive(Serialize)]
struct TransferBody<'a> {
    operation: Operation,
    asset_id: &'a Hash,
    spends: &'a OutputReference,
    previous_owner: &'a Ed25519PublicKey,
    owner: &'a Ed25519PublicKey,
    metadata: &'a TransferMetadata,
}

fn body_id<T: Serialize>(body: &T) -> Result<Hash, TransactionError> {
    let bytes = serde_json::to_vec(body)?;
    Ok(hash(&bytes))
}

impl CreationTransaction {
    /// Build and sign a self-owned creation
    pub fn sign(asset: AssetPayload, keypair: &Ed25519KeyPair) -> Result<Self, TransactionError> {
        let owner = keypair.public_key();
        let id = body_id(&CreationBody {
            operation: Operation::Create,
            asset: &asset,
            owner: &owner,
        })?;
        let signature = keypair.sign(id.as_bytes());

        Ok(Self {
            id,
            asset,
            owner,
            signature,
        })
    }

    fn compute_id(&self) -> Result<Hash, TransactionError> {
        body_id(&CreationBody {
            operation: Operation::Create,
            asset: &self.asset,
            owner: &self.owner,
        })
    }

    pub fn id(&self) -> &Hash {
        &self.id
    }

    pub fn asset(&self) -> &AssetPayload {
        &self.asset
    }

    pub fn owner(&self) -> &Ed25519PublicKey {
        &self.owner
    }

    pub fn signature(&self) -> &Ed25519Signature {
        &self.signature
    }
}

impl TransferTransaction {
    /// Build and sign a transfer spending output 0 of `prior`
    pub fn sign(
        prior: &Transaction,
        owner: Ed25519PublicKey,
        metadata: TransferMetadata,
        keypair: &Ed25519KeyPair,
    ) -> Result<Self, TransactionError> {
        let asset_id = prior.asset_id().clone();
        let spends = OutputReference::new(prior.id().clone(), OUTPUT_INDEX);
        let previous_owner = *prior.owner();
        let id = body_id(&TransferBody {
            operation: Operation::Transfer,
            asset_id: &asset_id,
            spends: &spends,
            previous_owner: &previous_owner,
            owner: &owner,
            metadata: &metadata,
        })?;
        let signature = keypair.sign(id.as_bytes());

        Ok(Self {
            id,
            asset_id,
            spends,
            previous_owner,
            owner,
            metadata,
            signature,
        })
    }

    fn compute_id(&self) -> Result<Hash, TransactionError> {
        body_id(&TransferBody {
            operation: Operation::Transfer,
            asset_id: &self.asset_id,
            spends: &self.spends,
            previous_owner: &self.previous_owner,
            owner: &self.owner,
            metadata: &self.metadata,
        })
    }

    pub fn id(&self) -> &Hash {
        &self.id
    }

    pub fn asset_id(&self) -> &Hash {
        &self.asset_id
    }

    pub fn spends(&self) -> &OutputReference {
        &self.spends
    }

    pub fn previous_owner(&self) -> &Ed25519PublicKey {
        &self.previous_owner
    }

    pub fn owner(&self) -> &Ed25519PublicKey {
        &self.owner
    }

    pub fn metadata(&self) -> &TransferMetadata {
        &self.metadata
    }

    pub fn signature(&self) -> &Ed25519Signature {
        &self.signature
    }
}

// Every write issued by the load tester
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "operation")]
pub enum Transaction {
    #[serde(rename = "CREATE")]
    Creation(CreationTransaction),
    #[serde(rename = "TRANSFER")]
    Transfer(TransferTransaction),
}

impl Transaction {
    pub fn id(&self) -> &Hash {
        match self {
            Self::Creation(tx) => tx.id(),
            Self::Transfer(tx) => tx.id(),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::Creation(_) => Operation::Create,
            Self::Transfer(_) => Operation::Transfer,
        }
    }

    // Owner of output 0
    pub fn owner(&self) -> &Ed25519PublicKey {
        match self {
            Self::Creation(tx) => tx.owner(),
            Self::Transfer(tx) => tx.owner(),
        }
    }

    /// Id of the creation that originated the asset moved by this transaction
    pub fn asset_id(&self) -> &Hash {
        match self {
            Self::Creation(tx) => tx.id(),
            Self::Transfer(tx) => tx.asset_id(),
        }
    }

    /// Output consumed by this transaction, `None` for a creation
    pub fn spends(&self) -> Option<&OutputReference> {
        match self {
            Self::Creation(_) => None,
            Self::Transfer(tx) => Some(tx.spends()),
        }
    }

    pub fn sequence_index(&self) -> usize {
        match self {
            Self::Creation(tx) => tx.asset().transaction_index(),
            Self::Transfer(tx) => tx.metadata().transaction_index(),
        }
    }

    pub fn signature(&self) -> &Ed25519Signature {
        match self {
            Self::Creation(tx) => tx.signature(),
            Self::Transfer(tx) => tx.signature(),
        }
    }

    // Key expected to have produced the signature
    fn signer(&self) -> &Ed25519PublicKey {
        match self {
            Self::Creation(tx) => tx.owner(),
            Self::Transfer(tx) => tx.previous_owner(),
        }
    }

    /// Recompute the id from the body and check the signature against it.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let computed = match self {
            Self::Creation(tx) => tx.compute_id()?,
            Self::Transfer(tx) => tx.compute_id()?,
        };

        if &computed != self.id() {
            return Err(TransactionError::IdMismatch {
                expected: self.id().clone(),
                computed,
            });
        }

        if log::log_enabled!(log::Level::Trace) {
            trace!("Verifying signature of {} by {}", computed, self.signer());
        }

        self.signer()
            .verify(computed.as_bytes(), self.signature())
            .map_err(|_| TransactionError::InvalidSignature(computed))
    }

    pub fn as_creation(&self) -> Option<&CreationTransaction> {
        match self {
            Self::Creation(tx) => Some(tx),
            Self::Transfer(_) => None,
        }
    }

    pub fn as_transfer(&self) -> Option<&TransferTransaction> {
        match self {
            Self::Creation(_) => None,
            Self::Transfer(tx) => Some(tx),
        }
    }
}
