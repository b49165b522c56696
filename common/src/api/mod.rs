use serde::{Deserialize, Serialize};

use crate::{config::API_VERSION, crypto::Hash, transaction::Operation};

/// Acknowledgement returned by the node once a submitted transaction is committed.
///
/// The node echoes the whole transaction back; only the fields needed to
/// correlate it are kept. The canonical record must be fetched separately.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub id: Hash,
    pub operation: Operation,
}

impl Confirmation {
    pub fn new(id: Hash, operation: Operation) -> Self {
        Self { id, operation }
    }
}

/// Endpoints of the node API, found under `api.v1` in the root document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiInfo {
    #[serde(default)]
    pub version: String,
    pub assets: String,
    pub docs: String,
    pub streams: String,
    pub transactions: String,
}

#[derive(Deserialize)]
struct ApiVersions {
    v1: ApiInfo,
}

#[derive(Deserialize)]
struct RawNodeInfo {
    api: ApiVersions,
    docs: String,
    #[serde(default)]
    keyring: Vec<String>,
    public_key: String,
    software: String,
    version: String,
}

/// Node metadata served at the root url of a node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "RawNodeInfo")]
pub struct NodeInfo {
    pub api: ApiInfo,
    pub docs: String,
    pub keyring: Vec<String>,
    pub public_key: String,
    pub software: String,
    pub version: String,
}

impl From<RawNodeInfo> for NodeInfo {
    fn from(raw: RawNodeInfo) -> Self {
        let mut api = raw.api.v1;
        api.version = API_VERSION.to_string();

        Self {
            api,
            docs: raw.docs,
            keyring: raw.keyring,
            public_key: raw.public_key,
            software: raw.software,
            version: raw.version,
        }
    }
}
