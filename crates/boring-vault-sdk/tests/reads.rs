mod support;

use alloy_primitives::aliases::{U88, U96};
use alloy_primitives::U256;
use boring_vault_sdk::abi::IAtomicQueue;
use boring_vault_sdk::{ConfigError, PendingRequest, RequestSource, VaultClient};
use serde_json::json;
use support::*;

const BORING_QUEUE_BODY: &str = r#"{"Response": {
    "open_requests": [{
        "user": "0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e",
        "wantToken": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1",
        "metadata": {"nonce": 1, "amountOfShares": 5, "amountOfAssets": 5,
                     "creationTime": 1, "secondsToMaturity": 1, "secondsToDeadline": 1}
    }],
    "expired_requests": [{
        "user": "0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e",
        "wantToken": "0xa2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2",
        "metadata": {"nonce": 2, "amountOfShares": 7, "amountOfAssets": 7,
                     "creationTime": 1, "secondsToMaturity": 1, "secondsToDeadline": 1}
    }]
}}"#;

#[test]
fn test_vault_decimals_read_at_construction() {
    let chain = MockChain::new();
    chain.with(|state| state.vault_decimals = 18);
    let client = client(&chain, MockIndexer::default());
    assert_eq!(client.vault_decimals(), 18);

    let mut config = config();
    config.vault_decimals = Some(6);
    let client = VaultClient::with_indexer(config, chain.clone(), MockIndexer::default()).unwrap();
    assert_eq!(client.vault_decimals(), 6);
}

#[test]
fn test_construction_rejects_zero_address() {
    let chain = MockChain::new();
    let mut config = config();
    config.teller = alloy_primitives::Address::ZERO;
    let result = VaultClient::with_indexer(config, chain.clone(), MockIndexer::default());
    assert!(matches!(result, Err(ConfigError::MissingAddress("teller"))));
}

#[test]
fn test_lens_reads_are_formatted() {
    let chain = MockChain::new();
    chain.with(|state| {
        state.balances.insert((USDT, USER), U256::from(42u8));
    });
    let client = client(&chain, MockIndexer::default());

    assert_eq!(client.fetch_total_assets().unwrap().to_string(), "5000.000000");
    assert_eq!(client.fetch_user_shares(USER).unwrap().to_string(), "2.500000");
    assert_eq!(client.fetch_share_value().unwrap().to_string(), "1.020000");
    assert_eq!(client.fetch_user_unlock_time(USER).unwrap(), 0);
    let balance = client.fetch_token_balance(USER, USDT).unwrap();
    assert_eq!(balance.raw, 42);
    assert_eq!(balance.to_string(), "0.000042");
    assert_eq!(client.token_by_address(USDT).unwrap().display_name, "USDT");
}

#[test]
fn test_asset_params_read_from_queue() {
    let chain = MockChain::new();
    let client = client(&chain, MockIndexer::default());

    let params = client.fetch_boring_queue_asset_params(USDC).unwrap();
    assert!(params.allow_withdraws);
    assert_eq!(params.min_discount, 1);
    assert_eq!(params.max_discount, 300);
    assert_eq!(params.minimum_seconds_to_deadline, 3 * 86_400);
    assert_eq!(params.minimum_shares, 1_000);
}

#[test]
fn test_pending_requests_keep_sources_apart() {
    let chain = MockChain::new();
    chain.with(|state| {
        state.atomic_requests.insert(
            USDT,
            IAtomicQueue::AtomicRequest {
                deadline: 1_800_000_000,
                atomicPrice: U88::ZERO,
                offerAmount: U96::from(9_000_000u64),
                inSolve: false,
            },
        );
        state.delay_requests.insert(USDC, (1_700_000_000, 3_000_000));
    });
    let client = client(&chain, MockIndexer::with_boring_queue(BORING_QUEUE_BODY));

    let requests = client.pending_requests(USER).unwrap();
    assert_eq!(requests.len(), 4);

    let on_chain: Vec<_> = requests
        .iter()
        .filter(|r| r.source() == RequestSource::OnChain)
        .collect();
    assert_eq!(on_chain.len(), 2);
    assert!(matches!(
        on_chain[0],
        PendingRequest::OnChainAtomic { want_token, request }
            if *want_token == USDT && request.offer_amount == 9_000_000
    ));
    assert!(matches!(
        on_chain[1],
        PendingRequest::OnChainDelay { token, request }
            if *token == USDC && request.shares == 3_000_000 && request.max_loss == 100
    ));

    let expired: Vec<bool> = requests
        .iter()
        .filter_map(|r| match r {
            PendingRequest::IndexedBoring { expired, .. } => Some(*expired),
            _ => None,
        })
        .collect();
    assert_eq!(expired, vec![false, true]);
    assert_eq!(requests[3].want_token(), Some(USDT));
}

#[test]
fn test_indexer_failure_degrades_to_empty() {
    let chain = MockChain::new();
    let client = client(&chain, MockIndexer::failing());

    assert!(client.withdraw_requests(USER).is_empty());
    assert!(client.boring_queue_requests(USER).is_empty());
    assert!(client.merkle_data(USER).is_none());
}

#[test]
fn test_merkle_data_passes_through() {
    let chain = MockChain::new();
    let indexer = MockIndexer {
        merkle: json!({"Response": {"proofs": []}}),
        ..MockIndexer::default()
    };
    let client = client(&chain, indexer);
    let data = client.merkle_data(USER).unwrap();
    assert!(data["Response"]["proofs"].is_array());
}
