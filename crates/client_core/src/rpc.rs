//! Wallet provider and name registry reached over HTTP JSON-RPC.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{Address, ChainDescriptor, ChainId, Receipt, TxHash, Wei},
    protocol::{methods, RegisterParams, RpcRequest, RpcResponse, SetRecordParams, SwitchChainParams},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};
use url::Url;

use crate::{error::ProviderError, NameRegistry, TxHandle, WalletProvider};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

pub struct JsonRpcTransport {
    http: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(endpoint: &str) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| ProviderError::Transport(format!("invalid rpc url '{endpoint}': {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ProviderError::Transport(format!(
                "rpc url must start with http:// or https://, got '{endpoint}'"
            )));
        }
        Ok(Self {
            http: Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc: sending request");
        let response: RpcResponse = self
            .http
            .post(self.endpoint.clone())
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;

        if response.id != id {
            return Err(ProviderError::Decode(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }
        let value = response.into_result()?;
        serde_json::from_value(value).map_err(|err| ProviderError::Decode(err.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

/// Wallet reached over JSON-RPC.
///
/// There is no push channel, so chain changes are detected whenever a chain
/// id read or a successful switch reports a value different from the last
/// one observed.
pub struct RpcWalletProvider {
    transport: Arc<JsonRpcTransport>,
    last_chain: Mutex<Option<ChainId>>,
    chain_changed: broadcast::Sender<ChainId>,
}

impl RpcWalletProvider {
    pub fn new(transport: Arc<JsonRpcTransport>) -> Self {
        let (chain_changed, _) = broadcast::channel(16);
        Self {
            transport,
            last_chain: Mutex::new(None),
            chain_changed,
        }
    }

    async fn observe_chain(&self, chain_id: ChainId) {
        let previous = self.last_chain.lock().await.replace(chain_id);
        if matches!(previous, Some(previous) if previous != chain_id) {
            info!(%chain_id, "wallet: chain changed");
            let _ = self.chain_changed.send(chain_id);
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.transport.call(methods::ACCOUNTS, json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.transport
            .call(methods::REQUEST_ACCOUNTS, json!([]))
            .await
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let chain_id = self.transport.call(methods::CHAIN_ID, json!([])).await?;
        self.observe_chain(chain_id).await;
        Ok(chain_id)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        let _: Value = self
            .transport
            .call(methods::SWITCH_CHAIN, json!([SwitchChainParams { chain_id }]))
            .await?;
        self.observe_chain(chain_id).await;
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        let _: Value = self
            .transport
            .call(methods::ADD_CHAIN, json!([descriptor]))
            .await?;
        self.observe_chain(descriptor.chain_id).await;
        Ok(())
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId> {
        self.chain_changed.subscribe()
    }
}

pub struct RpcNameRegistry {
    transport: Arc<JsonRpcTransport>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl RpcNameRegistry {
    pub fn new(transport: Arc<JsonRpcTransport>) -> Self {
        Self {
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, confirmation_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.confirmation_timeout = confirmation_timeout;
        self
    }

    async fn poll_receipt(&self, hash: &TxHash) -> Result<Receipt, ProviderError> {
        loop {
            let receipt: Option<Receipt> = self
                .transport
                .call(methods::GET_RECEIPT, json!([hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            debug!(tx = %hash, "registry: receipt pending");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl NameRegistry for RpcNameRegistry {
    async fn register(
        &self,
        from: &Address,
        name: &str,
        value: Wei,
    ) -> Result<TxHandle, ProviderError> {
        let hash: TxHash = self
            .transport
            .call(
                methods::REGISTER,
                json!([RegisterParams {
                    from: from.clone(),
                    name: name.to_string(),
                    value,
                }]),
            )
            .await?;
        Ok(TxHandle::new(hash, name))
    }

    async fn set_record(
        &self,
        from: &Address,
        name: &str,
        record: &str,
    ) -> Result<TxHandle, ProviderError> {
        let hash: TxHash = self
            .transport
            .call(
                methods::SET_RECORD,
                json!([SetRecordParams {
                    from: from.clone(),
                    name: name.to_string(),
                    record: record.to_string(),
                }]),
            )
            .await?;
        Ok(TxHandle::new(hash, name))
    }

    async fn get_names(&self) -> Result<Vec<String>, ProviderError> {
        self.transport.call(methods::GET_NAMES, json!([])).await
    }

    async fn records(&self, name: &str) -> Result<String, ProviderError> {
        self.transport.call(methods::RECORDS, json!([name])).await
    }

    async fn domains(&self, name: &str) -> Result<Address, ProviderError> {
        self.transport.call(methods::DOMAINS, json!([name])).await
    }

    async fn wait(&self, tx: &TxHandle) -> Result<Receipt, ProviderError> {
        debug!(name = %tx.name, tx = %tx.hash, "rpc: waiting for receipt");
        tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(&tx.hash))
            .await
            .map_err(|_| ProviderError::ConfirmationTimeout(tx.hash.to_string()))?
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
