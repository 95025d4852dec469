//! In-memory chain and indexer shared by the integration tests.
#![allow(dead_code)]

use alloy_primitives::aliases::{U24, U40, U88, U96};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use boring_vault_sdk::abi::{
    IAccountant, IAtomicQueue, IBeacon, IBoringOnChainQueue, IDelayedWithdraw, ILayerZeroTeller,
    ILens, ITeller, IERC20,
};
use boring_vault_sdk::indexer::{
    parse_boring_queue_requests, BoringQueueRequests, IndexerError, RequestIndexer,
    WithdrawRequestEntry,
};
use boring_vault_sdk::permit::PermitTypedData;
use boring_vault_sdk::{
    EvmProvider, EvmSigner, ProviderError, Token, TransactionReceipt, TransactionRequest,
    VaultClient, VaultConfig,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const VAULT: Address = Address::repeat_byte(0x10);
pub const TELLER: Address = Address::repeat_byte(0x20);
pub const ACCOUNTANT: Address = Address::repeat_byte(0x30);
pub const LENS: Address = Address::repeat_byte(0x40);
pub const DELAY_WITHDRAW: Address = Address::repeat_byte(0x50);
pub const WITHDRAW_QUEUE: Address = Address::repeat_byte(0x60);
pub const BORING_QUEUE: Address = Address::repeat_byte(0x70);
pub const LAYER_ZERO_TELLER: Address = Address::repeat_byte(0x80);
pub const INCENTIVE_DISTRIBUTOR: Address = Address::repeat_byte(0x90);
pub const USDC: Address = Address::repeat_byte(0xa1);
pub const USDT: Address = Address::repeat_byte(0xa2);
pub const USER: Address = Address::repeat_byte(0x0e);

pub const USDT_HEX: &str = "0xa2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> VaultConfig {
    VaultConfig {
        chain: "mainnet".to_string(),
        vault: VAULT,
        teller: TELLER,
        accountant: ACCOUNTANT,
        lens: LENS,
        delay_withdraw: Some(DELAY_WITHDRAW),
        withdraw_queue: Some(WITHDRAW_QUEUE),
        boring_queue: Some(BORING_QUEUE),
        layer_zero_teller: Some(LAYER_ZERO_TELLER),
        incentive_distributor: None,
        base_token: Token::new(USDC, 6, "USDC"),
        deposit_tokens: vec![Token::new(USDC, 6, "USDC")],
        withdraw_tokens: vec![Token::new(USDC, 6, "USDC"), Token::new(USDT, 6, "USDT")],
        vault_decimals: None,
        indexer_url: "http://indexer.invalid".to_string(),
        vault_slug: Some("boring-usd".to_string()),
    }
}

/// Asset policy returned by `withdrawAssets`
#[derive(Debug, Clone, Copy)]
pub struct AssetPolicy {
    pub allow_withdraws: bool,
    pub seconds_to_maturity: u32,
    pub minimum_seconds_to_deadline: u32,
    pub min_discount: u16,
    pub max_discount: u16,
    pub minimum_shares: u128,
}

impl Default for AssetPolicy {
    fn default() -> Self {
        Self {
            allow_withdraws: true,
            seconds_to_maturity: 3 * 86_400,
            minimum_seconds_to_deadline: 3 * 86_400,
            min_discount: 1,
            max_discount: 300,
            minimum_shares: 1_000,
        }
    }
}

pub struct ChainState {
    pub chain_id: u64,
    pub user: Address,
    pub vault_decimals: u8,
    pub token_name: String,
    pub nonce: U256,
    pub unlock_time: u64,
    pub policy: AssetPolicy,
    pub rate: U256,
    pub bridge_fee: U256,
    pub total_assets: U256,
    pub exchange_rate: U256,
    pub shares: U256,
    pub balances: HashMap<(Address, Address), U256>,
    pub allowances: HashMap<(Address, Address, Address), U256>,
    pub atomic_requests: HashMap<Address, IAtomicQueue::AtomicRequest>,
    pub delay_requests: HashMap<Address, (u64, u128)>,
    pub code: HashMap<Address, Bytes>,
    pub storage: HashMap<(Address, B256), B256>,
    pub revert_approvals: bool,
    pub drop_receipt_hashes: bool,
    pub reject_signatures: bool,
    pub sent: Vec<TransactionRequest>,
    pub signed: Vec<PermitTypedData>,
    pub reads: Vec<[u8; 4]>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            chain_id: 1,
            user: USER,
            vault_decimals: 6,
            token_name: "Boring Vault".to_string(),
            nonce: U256::from(3u8),
            unlock_time: 0,
            policy: AssetPolicy::default(),
            rate: U256::from(1_000_000u64),
            bridge_fee: U256::from(10_000_000_000_000_000u64),
            total_assets: U256::from(5_000_000_000u64),
            exchange_rate: U256::from(1_020_000u64),
            shares: U256::from(2_500_000u64),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            atomic_requests: HashMap::new(),
            delay_requests: HashMap::new(),
            code: HashMap::new(),
            storage: HashMap::new(),
            revert_approvals: false,
            drop_receipt_hashes: false,
            reject_signatures: false,
            sent: Vec::new(),
            signed: Vec::new(),
            reads: Vec::new(),
        }
    }
}

/// Chain double that answers view calls from [`ChainState`] and records
/// every transaction and signature request
#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.with(|state| state.sent.clone())
    }

    pub fn sent_selectors(&self) -> Vec<[u8; 4]> {
        self.sent()
            .iter()
            .map(|tx| tx.data[..4].try_into().unwrap())
            .collect()
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.with(|state| {
            state
                .allowances
                .get(&(token, state.user, spender))
                .copied()
                .unwrap_or_default()
        })
    }

    fn answer(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ProviderError::new("empty calldata"))?;
        let mut state = self.state.lock().unwrap();
        state.reads.push(selector);

        let out = if selector == IERC20::decimalsCall::SELECTOR {
            IERC20::decimalsCall::abi_encode_returns(&(state.vault_decimals,))
        } else if selector == IERC20::nameCall::SELECTOR {
            IERC20::nameCall::abi_encode_returns(&(state.token_name.clone(),))
        } else if selector == IERC20::noncesCall::SELECTOR {
            IERC20::noncesCall::abi_encode_returns(&(state.nonce,))
        } else if selector == IERC20::versionCall::SELECTOR {
            return Err(ProviderError::new("execution reverted"));
        } else if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(data, true).unwrap();
            let amount = state
                .allowances
                .get(&(to, call.owner, call.spender))
                .copied()
                .unwrap_or_default();
            IERC20::allowanceCall::abi_encode_returns(&(amount,))
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(data, true).unwrap();
            let balance = state
                .balances
                .get(&(to, call.account))
                .copied()
                .unwrap_or_default();
            IERC20::balanceOfCall::abi_encode_returns(&(balance,))
        } else if selector == ITeller::shareUnlockTimeCall::SELECTOR {
            ITeller::shareUnlockTimeCall::abi_encode_returns(&(U256::from(state.unlock_time),))
        } else if selector == IBoringOnChainQueue::withdrawAssetsCall::SELECTOR {
            let p = state.policy;
            IBoringOnChainQueue::withdrawAssetsCall::abi_encode_returns(&(
                p.allow_withdraws,
                U24::from(p.seconds_to_maturity),
                U24::from(p.minimum_seconds_to_deadline),
                p.min_discount,
                p.max_discount,
                U96::from(p.minimum_shares),
            ))
        } else if selector == IAccountant::getRateInQuoteSafeCall::SELECTOR {
            IAccountant::getRateInQuoteSafeCall::abi_encode_returns(&(state.rate,))
        } else if selector == ILayerZeroTeller::previewFeeCall::SELECTOR {
            ILayerZeroTeller::previewFeeCall::abi_encode_returns(&(state.bridge_fee,))
        } else if selector == ILens::totalAssetsCall::SELECTOR {
            ILens::totalAssetsCall::abi_encode_returns(&(USDC, state.total_assets))
        } else if selector == ILens::balanceOfCall::SELECTOR {
            ILens::balanceOfCall::abi_encode_returns(&(state.shares,))
        } else if selector == ILens::exchangeRateCall::SELECTOR {
            ILens::exchangeRateCall::abi_encode_returns(&(state.exchange_rate,))
        } else if selector == IAtomicQueue::getUserAtomicRequestCall::SELECTOR {
            let call = IAtomicQueue::getUserAtomicRequestCall::abi_decode(data, true).unwrap();
            let request = state
                .atomic_requests
                .get(&call.want)
                .cloned()
                .unwrap_or(IAtomicQueue::AtomicRequest {
                    deadline: 0,
                    atomicPrice: U88::ZERO,
                    offerAmount: U96::ZERO,
                    inSolve: false,
                });
            IAtomicQueue::getUserAtomicRequestCall::abi_encode_returns(&(request,))
        } else if selector == IDelayedWithdraw::withdrawRequestsCall::SELECTOR {
            let call = IDelayedWithdraw::withdrawRequestsCall::abi_decode(data, true).unwrap();
            let (maturity, shares) = state
                .delay_requests
                .get(&call.asset)
                .copied()
                .unwrap_or_default();
            IDelayedWithdraw::withdrawRequestsCall::abi_encode_returns(&(
                false,
                100u16,
                U40::from(maturity),
                U96::from(shares),
                U96::from(1_000_000u64),
            ))
        } else if selector == IBeacon::implementationCall::SELECTOR {
            let implementation = state
                .storage
                .get(&(to, B256::ZERO))
                .map(|word| Address::from_word(*word))
                .unwrap_or_default();
            IBeacon::implementationCall::abi_encode_returns(&(implementation,))
        } else {
            return Err(ProviderError::new(format!(
                "unexpected call {} to {to}",
                alloy_primitives::hex::encode(selector)
            )));
        };
        Ok(out)
    }
}

impl EvmProvider for MockChain {
    fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.with(|state| state.chain_id))
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.answer(to, &data).map(Bytes::from)
    }

    fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        Ok(self.with(|state| state.code.get(&address).cloned().unwrap_or_default()))
    }

    fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        Ok(self.with(|state| {
            state
                .storage
                .get(&(address, slot))
                .copied()
                .unwrap_or_default()
        }))
    }
}

impl EvmSigner for MockChain {
    fn address(&self) -> Address {
        self.with(|state| state.user)
    }

    fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx.clone());
        let hash = B256::with_last_byte(state.sent.len() as u8);

        if tx.data.starts_with(&IERC20::approveCall::SELECTOR) {
            if state.revert_approvals {
                return Ok(TransactionReceipt {
                    transaction_hash: Some(hash),
                    status: false,
                });
            }
            let call = IERC20::approveCall::abi_decode(&tx.data, true).unwrap();
            let owner = state.user;
            state
                .allowances
                .insert((tx.to, owner, call.spender), call.amount);
        }

        Ok(TransactionReceipt {
            transaction_hash: (!state.drop_receipt_hashes).then_some(hash),
            status: true,
        })
    }

    fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_signatures {
            return Err(ProviderError::new("User rejected the request."));
        }
        state.signed.push(typed_data.clone());
        let mut signature = vec![0x11u8; 32];
        signature.extend([0x22u8; 32]);
        signature.push(0x1b);
        Ok(signature.into())
    }
}

/// Indexer double serving canned responses, or failing when `fail` is set
#[derive(Debug, Default)]
pub struct MockIndexer {
    pub boring_queue: BoringQueueRequests,
    pub withdraw_requests: Vec<WithdrawRequestEntry>,
    pub merkle: Value,
    pub fail: bool,
}

impl MockIndexer {
    pub fn with_boring_queue(body: &str) -> Self {
        Self {
            boring_queue: parse_boring_queue_requests(body).unwrap(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl RequestIndexer for MockIndexer {
    fn withdraw_requests(
        &self,
        _chain: &str,
        _vault: Address,
        _user: Address,
    ) -> Result<Vec<WithdrawRequestEntry>, IndexerError> {
        if self.fail {
            return Err(IndexerError::Status(503));
        }
        Ok(self.withdraw_requests.clone())
    }

    fn boring_queue_requests(
        &self,
        _chain: &str,
        _vault: Address,
        _user: Address,
    ) -> Result<BoringQueueRequests, IndexerError> {
        if self.fail {
            return Err(IndexerError::Status(503));
        }
        Ok(self.boring_queue.clone())
    }

    fn merkle_data(
        &self,
        _vault_slug: &str,
        _chain: &str,
        _user: Address,
    ) -> Result<Value, IndexerError> {
        if self.fail {
            return Err(IndexerError::Status(503));
        }
        Ok(self.merkle.clone())
    }
}

pub type TestClient = VaultClient<Arc<MockChain>, MockIndexer>;

pub fn client(chain: &Arc<MockChain>, indexer: MockIndexer) -> TestClient {
    init_logger();
    VaultClient::with_indexer(config(), chain.clone(), indexer).unwrap()
}
