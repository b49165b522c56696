use async_trait::async_trait;
use log::{debug, trace, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::{fmt, time::Duration};
use thiserror::Error;
use url::Url;

use blt_common::{
    api::{Confirmation, NodeInfo},
    crypto::Hash,
    transaction::Transaction,
};

use crate::config::ConnectionConfig;

const APP_ID_HEADER: &str = "app_id";
const APP_KEY_HEADER: &str = "app_key";

/// Errors raised while talking to a ledger node
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Node rejected the request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Transaction {0} not found")]
    NotFound(Hash),
    #[error("Unexpected response from node: {0}")]
    Decode(String),
    #[error("Invalid node url: {0}")]
    Url(#[from] url::ParseError),
}

/// Timeouts applied to every request
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// Write path to a ledger node used by the load runners.
///
/// Implementations must be usable from many tasks at once: a batch run
/// shares one client between all its concurrent submissions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a signed transaction and wait until the node reports it committed
    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Confirmation, LedgerError>;

    /// Fetch the committed record of a transaction by its id
    async fn fetch_confirmed(&self, id: &Hash) -> Result<Transaction, LedgerError>;
}

/// HTTP client for the node transactions API
pub struct HttpLedgerClient {
    client: Client,
    root_url: Url,
    api_url: Url,
    credentials: Option<(String, String)>,
    config: LedgerClientConfig,
}

impl HttpLedgerClient {
    /// Create a new client with default timeouts
    pub fn new(connection: &ConnectionConfig) -> Result<Self, LedgerError> {
        Self::with_config(connection, LedgerClientConfig::default())
    }

    /// Create a new client with custom timeouts
    pub fn with_config(connection: &ConnectionConfig, config: LedgerClientConfig) -> Result<Self, LedgerError> {
        let root_url = Url::parse(&connection.root_url())?;
        let mut api_url = Url::parse(&connection.api_url())?;
        // Url::join replaces the last segment unless the base ends with '/'
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .build()?;

        let credentials = connection
            .credentials()
            .map(|(id, key)| (id.to_string(), key.to_string()));

        Ok(Self {
            client,
            root_url,
            api_url,
            credentials,
            config,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((id, key)) => request.header(APP_ID_HEADER, id).header(APP_KEY_HEADER, key),
            None => request,
        }
    }

    async fn rejected(response: Response) -> LedgerError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!("Node rejected request with HTTP {}: {}", status, body);
        LedgerError::Rejected { status, body }
    }

    /// Get the node metadata served at the root url
    pub async fn get_node_info(&self) -> Result<NodeInfo, LedgerError> {
        debug!("Requesting node info from {}", self.root_url);
        let response = self.authorize(self.client.get(self.root_url.clone())).send().await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        response
            .json::<NodeInfo>()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Confirmation, LedgerError> {
        let mut url = self.api_url.join("transactions")?;
        url.query_pairs_mut().append_pair("mode", "commit");

        if log::log_enabled!(log::Level::Debug) {
            debug!("Submitting transaction {} to {}", transaction.id(), url);
        }
        if log::log_enabled!(log::Level::Trace) {
            if let Ok(body) = serde_json::to_string(transaction) {
                trace!("Transaction body: {}", body);
            }
        }

        let response = self
            .authorize(self.client.post(url))
            .json(transaction)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let confirmation = response
            .json::<Confirmation>()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        if confirmation.id != *transaction.id() {
            return Err(LedgerError::Decode(format!(
                "node confirmed {} while {} was submitted",
                confirmation.id,
                transaction.id()
            )));
        }

        Ok(confirmation)
    }

    async fn fetch_confirmed(&self, id: &Hash) -> Result<Transaction, LedgerError> {
        let url = self.api_url.join(&format!("transactions/{}", id.to_hex()))?;
        debug!("Fetching transaction {} from {}", id, url);

        let response = self.authorize(self.client.get(url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(LedgerError::NotFound(id.clone())),
            status if !status.is_success() => return Err(Self::rejected(response).await),
            _ => {}
        }

        response
            .json::<Transaction>()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

impl fmt::Debug for HttpLedgerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLedgerClient")
            .field("api_url", &self.api_url.as_str())
            .field("authenticated", &self.credentials.is_some())
            .field("config", &self.config)
            .finish()
    }
}
