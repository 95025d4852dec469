//! Client for the Seven Seas indexer, which tracks withdraw requests that
//! are only partially mirrored on-chain.

use alloy_primitives::{Address, B256, U256};
use common::normalize_chain_name;
use log::debug;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::Value;

pub const DEFAULT_INDEXER_URL: &str = "https://api.sevenseas.capital";

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Indexer returned HTTP {0}")]
    Status(u16),
    #[error("Malformed indexer response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Response")]
    response: T,
}

/// Open request on the allowance-based atomic queue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequestEntry {
    #[serde(deserialize_with = "lenient_u128")]
    pub amount: u128,
    #[serde(deserialize_with = "lenient_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub deadline: u64,
    #[serde(default)]
    pub error_code: Value,
    #[serde(deserialize_with = "lenient_u128")]
    pub min_price: u128,
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp: u64,
    pub transaction_hash: String,
    pub want_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WithdrawRequestsBody {
    #[serde(default)]
    open_requests: Vec<WithdrawRequestEntry>,
}

/// Metadata the boring queue needs to identify a request on cancellation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoringQueueMetadata {
    #[serde(deserialize_with = "lenient_u128")]
    pub nonce: u128,
    #[serde(deserialize_with = "lenient_u128")]
    pub amount_of_shares: u128,
    #[serde(deserialize_with = "lenient_u128")]
    pub amount_of_assets: u128,
    #[serde(deserialize_with = "lenient_u64")]
    pub creation_time: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub seconds_to_maturity: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub seconds_to_deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoringQueueEntry {
    pub user: String,
    #[serde(rename = "wantToken")]
    pub want_token: String,
    #[serde(rename = "errorCode", default)]
    pub error_code: Value,
    #[serde(default)]
    pub transaction_hash: String,
    pub metadata: BoringQueueMetadata,
}

/// Open and expired boring-queue requests as reported by the indexer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BoringQueueRequests {
    #[serde(default)]
    pub open_requests: Vec<BoringQueueEntry>,
    #[serde(default)]
    pub expired_requests: Vec<BoringQueueEntry>,
}

impl BoringQueueRequests {
    /// Finds the request paying out `want_token`, open requests first.
    /// Matching is case-insensitive on the hex address.
    pub fn find_by_want_token(&self, want_token: Address) -> Option<&BoringQueueEntry> {
        let wanted = want_token.to_string();
        self.open_requests
            .iter()
            .chain(&self.expired_requests)
            .find(|entry| entry.want_token.eq_ignore_ascii_case(&wanted))
    }
}

/// Claim arguments of the incentive distributor, one entry per reward token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleClaim {
    pub root_hashes: Vec<B256>,
    pub tokens: Vec<Address>,
    /// Cumulative claimable balance per token, in base units
    pub balances: Vec<U256>,
    pub merkle_proofs: Vec<Vec<B256>>,
}

impl MerkleClaim {
    /// Every per-token list has one entry per token
    pub fn is_consistent(&self) -> bool {
        let len = self.tokens.len();
        self.root_hashes.len() == len && self.balances.len() == len && self.merkle_proofs.len() == len
    }
}

#[derive(Debug, Deserialize)]
struct MerkleBody {
    tx_data: MerkleClaim,
}

/// Extracts the claim arguments from a `merkle` bundle
pub fn parse_merkle_claim(bundle: &Value) -> Result<MerkleClaim, IndexerError> {
    let envelope: Envelope<MerkleBody> = serde_json::from_value(bundle.clone())?;
    Ok(envelope.response.tx_data)
}

pub fn parse_withdraw_requests(body: &str) -> Result<Vec<WithdrawRequestEntry>, IndexerError> {
    let envelope: Envelope<WithdrawRequestsBody> = serde_json::from_str(body)?;
    Ok(envelope.response.open_requests)
}

pub fn parse_boring_queue_requests(body: &str) -> Result<BoringQueueRequests, IndexerError> {
    let envelope: Envelope<BoringQueueRequests> = serde_json::from_str(body)?;
    Ok(envelope.response)
}

/// Source of indexer-reported withdraw requests
pub trait RequestIndexer {
    fn withdraw_requests(
        &self,
        chain: &str,
        vault: Address,
        user: Address,
    ) -> Result<Vec<WithdrawRequestEntry>, IndexerError>;

    fn boring_queue_requests(
        &self,
        chain: &str,
        vault: Address,
        user: Address,
    ) -> Result<BoringQueueRequests, IndexerError>;

    /// Merkle proof bundle backing an incentive claim
    fn merkle_data(
        &self,
        vault_slug: &str,
        chain: &str,
        user: Address,
    ) -> Result<Value, IndexerError>;
}

/// [`RequestIndexer`] over the indexer's REST API
#[derive(Debug, Clone)]
pub struct HttpIndexer {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpIndexer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn withdraw_requests_url(&self, chain: &str, vault: Address, user: Address) -> String {
        format!(
            "{}/withdrawRequests/{}/{vault}/{user}?string_values=true",
            self.base_url,
            normalize_chain_name(chain)
        )
    }

    pub fn boring_queue_url(&self, chain: &str, vault: Address, user: Address) -> String {
        format!(
            "{}/boringQueue/{}/{vault}/{user}?string_values=true",
            self.base_url,
            normalize_chain_name(chain)
        )
    }

    pub fn merkle_url(&self, vault_slug: &str, chain: &str, user: Address) -> String {
        format!(
            "{}/merkle/{vault_slug}/{}/{user}",
            self.base_url,
            normalize_chain_name(chain)
        )
    }

    fn get_text(&self, url: &str) -> Result<String, IndexerError> {
        debug!("GET {url}");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, IndexerError> {
        Ok(serde_json::from_str(&self.get_text(url)?)?)
    }
}

impl Default for HttpIndexer {
    fn default() -> Self {
        Self::new(DEFAULT_INDEXER_URL)
    }
}

impl RequestIndexer for HttpIndexer {
    fn withdraw_requests(
        &self,
        chain: &str,
        vault: Address,
        user: Address,
    ) -> Result<Vec<WithdrawRequestEntry>, IndexerError> {
        parse_withdraw_requests(&self.get_text(&self.withdraw_requests_url(chain, vault, user))?)
    }

    fn boring_queue_requests(
        &self,
        chain: &str,
        vault: Address,
        user: Address,
    ) -> Result<BoringQueueRequests, IndexerError> {
        parse_boring_queue_requests(&self.get_text(&self.boring_queue_url(chain, vault, user))?)
    }

    fn merkle_data(
        &self,
        vault_slug: &str,
        chain: &str,
        user: Address,
    ) -> Result<Value, IndexerError> {
        self.get_json(&self.merkle_url(vault_slug, chain, user))
    }
}

// Numbers arrive either as JSON numbers or as decimal strings, and share
// amounts at 18 decimals run past u64. A JSON number that large would be
// read as a float, so the raw token is parsed instead.
fn lenient_u128<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    let token = raw.get().trim();
    let digits = token
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(token);
    digits.trim().parse().map_err(D::Error::custom)
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    u64::try_from(lenient_u128(deserializer)?).map_err(D::Error::custom)
}
