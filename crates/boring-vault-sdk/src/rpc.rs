//! Blocking JSON-RPC transport for an EVM node.
//!
//! [`JsonRpcSigner`] relies on the node holding the account
//! (`eth_sendTransaction`, `eth_signTypedData_v4`), as wallets and dev nodes
//! do. Receipts are polled until the transaction is mined.

use crate::permit::PermitTypedData;
use crate::provider::{EvmProvider, EvmSigner, ProviderError, TransactionReceipt, TransactionRequest};
use alloy_primitives::{Address, Bytes, B256, U64};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: Option<B256>,
    status: Option<U64>,
}

#[derive(Debug)]
pub struct JsonRpcProvider {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::blocking::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("rpc {id} {method}");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json())
            .map_err(|e| ProviderError(format!("{method}: {e}")))?;

        if let Some(error) = response.error {
            return Err(ProviderError(format!("{} (code {})", error.message, error.code)));
        }
        Ok(response.result)
    }

    fn request_some<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        self.request(method, params)?
            .ok_or_else(|| ProviderError(format!("{method}: empty result")))
    }
}

impl EvmProvider for JsonRpcProvider {
    fn chain_id(&self) -> Result<u64, ProviderError> {
        let id: U64 = self.request_some("eth_chainId", json!([]))?;
        Ok(id.to::<u64>())
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.request_some("eth_call", json!([{ "to": to, "data": data }, "latest"]))
    }

    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.request_some("eth_getCode", json!([address, "latest"]))
    }

    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        self.request_some("eth_getStorageAt", json!([address, slot, "latest"]))
    }
}

/// An account unlocked on the node behind a [`JsonRpcProvider`]
#[derive(Debug)]
pub struct JsonRpcSigner {
    provider: JsonRpcProvider,
    from: Address,
    poll_interval: Duration,
}

impl JsonRpcSigner {
    pub fn new(provider: JsonRpcProvider, from: Address) -> Self {
        Self {
            provider,
            from,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ProviderError> {
        loop {
            let receipt: Option<RawReceipt> = self
                .provider
                .request("eth_getTransactionReceipt", json!([hash]))?;
            if let Some(receipt) = receipt {
                return Ok(TransactionReceipt {
                    transaction_hash: receipt.transaction_hash,
                    status: receipt.status.map_or(false, |status| status == U64::from(1)),
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl EvmProvider for JsonRpcSigner {
    fn chain_id(&self) -> Result<u64, ProviderError> {
        self.provider.chain_id()
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.provider.call(to, data)
    }

    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.provider.get_code(address)
    }

    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        self.provider.get_storage_at(address, slot)
    }
}

impl EvmSigner for JsonRpcSigner {
    fn address(&self) -> Address {
        self.from
    }

    fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ProviderError> {
        let hash: B256 = self.provider.request_some(
            "eth_sendTransaction",
            json!([{
                "from": self.from,
                "to": tx.to,
                "data": tx.data,
                "value": tx.value,
            }]),
        )?;
        debug!("sent {hash}, waiting for receipt");
        self.wait_for_receipt(hash)
    }

    fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, ProviderError> {
        self.provider.request_some(
            "eth_signTypedData_v4",
            json!([self.from, typed_data.to_json().to_string()]),
        )
    }
}
