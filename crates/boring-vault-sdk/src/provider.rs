//! Transport seams between the orchestrator and an EVM node or wallet.
//!
//! The SDK never picks a transport itself. Callers hand in anything that
//! implements [`EvmProvider`] for reads and [`EvmSigner`] for writes; the
//! crate ships [`crate::rpc::JsonRpcProvider`] as a generic implementation.

use crate::permit::PermitTypedData;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use std::sync::Arc;

/// Error reported by the underlying node or wallet. The message is kept
/// verbatim so callers see exactly what the provider said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TransactionRequest {
    pub fn new<C: SolCall>(to: Address, call: &C) -> Self {
        Self {
            to,
            data: call.abi_encode().into(),
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: Option<B256>,
    pub status: bool,
}

/// Read access to a chain
pub trait EvmProvider {
    fn chain_id(&self) -> Result<u64, ProviderError>;
    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;
    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError>;
    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError>;
}

/// A connected account able to submit transactions and sign typed data.
///
/// `send_transaction` blocks until the transaction receipt is observed.
pub trait EvmSigner: EvmProvider {
    fn address(&self) -> Address;
    fn send_transaction(&self, tx: TransactionRequest)
        -> Result<TransactionReceipt, ProviderError>;
    fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, ProviderError>;
}

/// Executes a view call and decodes its return values
pub fn read<P, C>(provider: &P, to: Address, call: &C) -> Result<C::Return, ProviderError>
where
    P: EvmProvider + ?Sized,
    C: SolCall,
{
    let output = provider.call(to, call.abi_encode().into())?;
    C::abi_decode_returns(&output, true)
        .map_err(|e| ProviderError(format!("Failed to decode {}: {e}", C::SIGNATURE)))
}

impl<T: EvmProvider + ?Sized> EvmProvider for &T {
    fn chain_id(&self) -> Result<u64, ProviderError> {
        (**self).chain_id()
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        (**self).call(to, data)
    }

    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        (**self).get_code(address)
    }

    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        (**self).get_storage_at(address, slot)
    }
}

impl<T: EvmProvider + ?Sized> EvmProvider for Arc<T> {
    fn chain_id(&self) -> Result<u64, ProviderError> {
        (**self).chain_id()
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        (**self).call(to, data)
    }

    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        (**self).get_code(address)
    }

    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        (**self).get_storage_at(address, slot)
    }
}

impl<T: EvmSigner + ?Sized> EvmSigner for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ProviderError> {
        (**self).send_transaction(tx)
    }

    fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, ProviderError> {
        (**self).sign_typed_data(typed_data)
    }
}

impl<T: EvmSigner + ?Sized> EvmSigner for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ProviderError> {
        (**self).send_transaction(tx)
    }

    fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, ProviderError> {
        (**self).sign_typed_data(typed_data)
    }
}
