//! Borsh mirrors of the Boring Vault program accounts.
//!
//! Every program account starts with an 8 byte Anchor discriminator,
//! `sha256("account:<Name>")[..8]`, followed by the borsh encoded body.
//! Public keys are kept as raw bytes and exposed through accessors.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::hash::hashv;
use solana_sdk::pubkey::Pubkey;

use crate::ResolverError;

pub const DISCRIMINATOR_LEN: usize = 8;

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = hashv(&[b"account:", name.as_bytes()]);
    let mut discriminator = [0u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&hash.to_bytes()[..DISCRIMINATOR_LEN]);
    discriminator
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProgramConfig {
    pub authority: [u8; 32],
    pub vault_count: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct BoringVault {
    pub config: VaultState,
    pub teller: TellerState,
    pub manager: ManagerState,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultState {
    pub vault_id: u64,
    pub authority: [u8; 32],
    pub pending_authority: [u8; 32],
    pub paused: bool,
    pub share_mint: [u8; 32],
    pub deposit_sub_account: u8,
    pub withdraw_sub_account: u8,
    pub current_mint_authority: [u8; 32],
    pub pending_mint_authority: [u8; 32],
}

impl VaultState {
    pub fn authority(&self) -> Pubkey {
        Pubkey::new_from_array(self.authority)
    }

    pub fn share_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.share_mint)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TellerState {
    pub base_asset: [u8; 32],
    pub decimals: u8,
    pub exchange_rate_provider: [u8; 32],
    pub exchange_rate: u64,
    pub exchange_rate_high_water_mark: u64,
    pub fees_owed_in_base_asset: u64,
    pub total_shares_last_update: u64,
    pub last_update_timestamp: u64,
    pub payout_address: [u8; 32],
    pub allowed_exchange_rate_change_upper_bound: u16,
    pub allowed_exchange_rate_change_lower_bound: u16,
    pub minimum_update_delay_in_seconds: u32,
    pub platform_fee_bps: u16,
    pub performance_fee_bps: u16,
    pub withdraw_authority: [u8; 32],
}

impl TellerState {
    pub fn base_asset(&self) -> Pubkey {
        Pubkey::new_from_array(self.base_asset)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ManagerState {
    pub strategist: [u8; 32],
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssetData {
    pub allow_deposits: bool,
    pub allow_withdrawals: bool,
    pub share_premium_bps: u16,
    pub is_pegged_to_base_asset: bool,
    pub price_feed: [u8; 32],
    pub inverse_price_feed: bool,
    pub max_staleness: u64,
    pub min_samples: u32,
}

impl AssetData {
    pub fn price_feed(&self) -> Pubkey {
        Pubkey::new_from_array(self.price_feed)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Noop,
    IngestInstruction(u32, u8),
    IngestAccount(u8),
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CpiDigest {
    pub operators: Vec<Operator>,
}

/// Any account owned by the program, picked by its discriminator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramAccount {
    ProgramConfig(ProgramConfig),
    BoringVault(Box<BoringVault>),
    AssetData(AssetData),
    CpiDigest(CpiDigest),
}

impl ProgramAccount {
    pub fn decode(data: &[u8]) -> Result<Self, ResolverError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(ResolverError::UnknownDiscriminator);
        }
        let (discriminator, mut body) = data.split_at(DISCRIMINATOR_LEN);

        let account = if discriminator == account_discriminator("ProgramConfig") {
            Self::ProgramConfig(deserialize(&mut body)?)
        } else if discriminator == account_discriminator("BoringVault") {
            Self::BoringVault(Box::new(deserialize(&mut body)?))
        } else if discriminator == account_discriminator("AssetData") {
            Self::AssetData(deserialize(&mut body)?)
        } else if discriminator == account_discriminator("CpiDigest") {
            Self::CpiDigest(deserialize(&mut body)?)
        } else {
            return Err(ResolverError::UnknownDiscriminator);
        };
        Ok(account)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ProgramConfig(_) => "ProgramConfig",
            Self::BoringVault(_) => "BoringVault",
            Self::AssetData(_) => "AssetData",
            Self::CpiDigest(_) => "CpiDigest",
        }
    }
}

// Accounts are allocated with spare space, so trailing bytes are ignored.
fn deserialize<T: BorshDeserialize>(body: &mut &[u8]) -> Result<T, ResolverError> {
    T::deserialize(body).map_err(|e| ResolverError::DecodeError(e.to_string()))
}

/// Serializes `body` behind the discriminator of `name`, the layout the
/// program writes.
pub fn encode_account<T: BorshSerialize>(name: &str, body: &T) -> Result<Vec<u8>, ResolverError> {
    let mut data = account_discriminator(name).to_vec();
    body.serialize(&mut data)
        .map_err(|e| ResolverError::DecodeError(e.to_string()))?;
    Ok(data)
}
