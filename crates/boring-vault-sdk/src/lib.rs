//! Client-side orchestration of Boring Vault deposits, withdraws and
//! bridging on EVM chains.
//!
//! A [`VaultClient`] is built once from a [`VaultConfig`] and a read
//! provider. Every write takes the signer for that call and returns a
//! [`Status`] describing how far it got.

pub mod abi;
pub mod bridge;
pub mod client;
pub mod config;
pub mod deposit;
pub mod error;
pub mod incentives;
pub mod indexer;
pub mod permit;
pub mod provider;
pub mod queue;
pub mod reads;
pub mod requests;
pub mod rpc;
pub mod status;
pub mod withdraw;

pub use bridge::{BridgeParams, NATIVE_FEE_TOKEN};
pub use client::{VaultClient, PERMIT_VALIDITY_SECONDS};
pub use config::{Token, VaultConfig};
pub use error::{ConfigError, VaultError};
pub use indexer::{HttpIndexer, IndexerError, MerkleClaim, RequestIndexer};
pub use permit::{check_contract_for_permit, sign_permit, PermitProbe, PermitSupport};
pub use provider::{EvmProvider, EvmSigner, ProviderError, TransactionReceipt, TransactionRequest};
pub use queue::{BoringQueueAssetParams, QueueVariant};
pub use reads::Amount;
pub use requests::{PendingRequest, RequestSource};
pub use rpc::{JsonRpcProvider, JsonRpcSigner};
pub use status::{Phase, Status};
