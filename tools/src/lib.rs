//! Client-side resolver for Boring Vault program accounts.
//!
//! Derives the program's PDAs from a vault id, decodes the accounts living
//! there and reads share balances through the associated token account.

use std::collections::BTreeMap;

use log::debug;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, program_pack::Pack, pubkey,
    pubkey::Pubkey,
};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_token::state::{Account as TokenAccount, Mint};

pub mod pda;
pub mod state;

pub use pda::{asset_data_pda, share_token_pda, vault_pda, vault_state_pda};
pub use state::{AssetData, BoringVault, ProgramAccount, VaultState};

pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Sub-account indices are a single seed byte
pub const MAX_SUB_ACCOUNTS: u32 = 256;

/// Errors that can occur when resolving vault accounts
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("Vault state not found")]
    VaultStateNotFound,
    #[error("Unknown account discriminator")]
    UnknownDiscriminator,
    #[error("Share mint not found")]
    ShareMintNotFound,
    #[error("Mint not found: {0}")]
    MintNotFound(Pubkey),
    #[error("Asset data not found")]
    AssetDataNotFound,
    /// The account decoded, but as a different program account
    #[error("Expected {expected} account, found {found}")]
    UnexpectedAccount {
        expected: &'static str,
        found: &'static str,
    },
    /// The number of sub-accounts requested exceeds the seed range
    #[error("Invalid number of sub-accounts: {0}")]
    InvalidSubAccountCount(u32),
    #[error("Failed to decode account data: {0}")]
    DecodeError(String),
    #[error("Account {0} is not owned by a token program")]
    InvalidTokenProgram(Pubkey),
    #[error("RPC error: {0}")]
    RpcError(#[from] solana_client::client_error::ClientError),
}

/// Read access to raw accounts. `Ok(None)` means the account does not exist.
pub trait AccountSource {
    fn fetch_account(&self, address: &Pubkey) -> Result<Option<Account>, ResolverError>;
}

impl AccountSource for RpcClient {
    fn fetch_account(&self, address: &Pubkey) -> Result<Option<Account>, ResolverError> {
        Ok(self
            .get_account_with_commitment(address, self.commitment())?
            .value)
    }
}

/// Deposit and withdraw sub-account indices of a vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultSubAccounts {
    pub deposit: u8,
    pub withdraw: u8,
}

/// A share balance, raw and rendered with every decimal place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub raw: u64,
    pub decimals: u8,
    pub formatted: String,
}

/// Totals across a range of vault sub-accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubAccountBalances {
    /// Native SOL in lamports
    pub lamports: u64,
    /// Token amounts in base units, keyed by mint
    pub tokens: BTreeMap<Pubkey, u128>,
}

pub struct VaultResolver<S: AccountSource = RpcClient> {
    program_id: Pubkey,
    source: S,
}

impl VaultResolver<RpcClient> {
    pub fn connect(rpc_url: &str, program_id: Pubkey) -> Self {
        let client =
            RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Self::new(program_id, client)
    }
}

impl<S: AccountSource> VaultResolver<S> {
    pub fn new(program_id: Pubkey, source: S) -> Self {
        Self { program_id, source }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn vault_state_pda(&self, vault_id: u64) -> Pubkey {
        vault_state_pda(&self.program_id, vault_id)
    }

    pub fn vault_pda(&self, vault_id: u64, sub_account: u8) -> Pubkey {
        vault_pda(&self.program_id, vault_id, sub_account)
    }

    pub fn share_token_pda(&self, vault_id: u64) -> Pubkey {
        share_token_pda(&self.program_id, &self.vault_state_pda(vault_id))
    }

    pub fn get_vault_state(&self, vault_id: u64) -> Result<VaultSubAccounts, ResolverError> {
        let vault = self.get_full_vault_data(vault_id)?;
        Ok(VaultSubAccounts {
            deposit: vault.config.deposit_sub_account,
            withdraw: vault.config.withdraw_sub_account,
        })
    }

    /// The whole vault account: configuration, teller and manager state
    pub fn get_full_vault_data(&self, vault_id: u64) -> Result<BoringVault, ResolverError> {
        let address = self.vault_state_pda(vault_id);
        debug!("Reading vault {} state at {}", vault_id, address);

        let account = self
            .source
            .fetch_account(&address)?
            .ok_or(ResolverError::VaultStateNotFound)?;
        match ProgramAccount::decode(&account.data)? {
            ProgramAccount::BoringVault(vault) => Ok(*vault),
            other => Err(ResolverError::UnexpectedAccount {
                expected: "BoringVault",
                found: other.name(),
            }),
        }
    }

    pub fn get_asset_data(&self, vault_id: u64, mint: &Pubkey) -> Result<AssetData, ResolverError> {
        let address = asset_data_pda(&self.program_id, &self.vault_state_pda(vault_id), mint);
        debug!("Reading asset data for {} at {}", mint, address);

        let account = self
            .source
            .fetch_account(&address)?
            .ok_or(ResolverError::AssetDataNotFound)?;
        match ProgramAccount::decode(&account.data)? {
            ProgramAccount::AssetData(data) => Ok(data),
            other => Err(ResolverError::UnexpectedAccount {
                expected: "AssetData",
                found: other.name(),
            }),
        }
    }

    /// Share balance of `wallet` in vault `vault_id`. A wallet without a
    /// token account holds zero shares.
    pub fn get_balance(&self, wallet: &Pubkey, vault_id: u64) -> Result<TokenBalance, ResolverError> {
        let mint = self.share_token_pda(vault_id);
        let mint_account = self
            .source
            .fetch_account(&mint)?
            .ok_or(ResolverError::ShareMintNotFound)?;
        let decimals = unpack_mint(&mint, &mint_account)?.decimals;

        let ata = get_associated_token_address_with_program_id(wallet, &mint, &mint_account.owner);
        debug!("Reading share balance of {} at {}", wallet, ata);
        let raw = match self.source.fetch_account(&ata)? {
            Some(account) => unpack_token_account(&ata, &account)?.amount,
            None => 0,
        };

        Ok(TokenBalance {
            raw,
            decimals,
            formatted: common::format_units(raw as u128, decimals),
        })
    }

    /// Sums lamports and the given mints' token balances held by the first
    /// `sub_accounts` sub-accounts of a vault. Missing accounts count as
    /// zero.
    pub fn sum_sub_account_balances(
        &self,
        vault_id: u64,
        sub_accounts: u32,
        mints: &[Pubkey],
    ) -> Result<SubAccountBalances, ResolverError> {
        if sub_accounts > MAX_SUB_ACCOUNTS {
            return Err(ResolverError::InvalidSubAccountCount(sub_accounts));
        }

        // the token program of each mint is its owner
        let mut token_programs = Vec::with_capacity(mints.len());
        for mint in mints {
            let account = self
                .source
                .fetch_account(mint)?
                .ok_or(ResolverError::MintNotFound(*mint))?;
            unpack_mint(mint, &account)?;
            token_programs.push((*mint, account.owner));
        }

        let mut balances = SubAccountBalances::default();
        for (mint, _) in &token_programs {
            balances.tokens.insert(*mint, 0);
        }

        for sub_account in 0..sub_accounts {
            let pda = self.vault_pda(vault_id, sub_account as u8);

            if let Some(account) = self.source.fetch_account(&pda)? {
                balances.lamports = balances.lamports.saturating_add(account.lamports);
            }

            for (mint, token_program) in &token_programs {
                let ata = get_associated_token_address_with_program_id(&pda, mint, token_program);
                if let Some(account) = self.source.fetch_account(&ata)? {
                    let amount = unpack_token_account(&ata, &account)?.amount;
                    *balances.tokens.entry(*mint).or_default() += amount as u128;
                }
            }
        }

        debug!(
            "Vault {} holds {} lamports across {} sub-accounts",
            vault_id, balances.lamports, sub_accounts
        );
        Ok(balances)
    }
}

fn is_token_program(program_id: &Pubkey) -> bool {
    *program_id == spl_token::id() || *program_id == TOKEN_2022_PROGRAM_ID
}

// Token-2022 accounts share the base layout and append extensions after it.
fn unpack_mint(address: &Pubkey, account: &Account) -> Result<Mint, ResolverError> {
    if !is_token_program(&account.owner) {
        return Err(ResolverError::InvalidTokenProgram(*address));
    }
    if account.data.len() < Mint::LEN {
        return Err(ResolverError::DecodeError(format!("mint {address} too short")));
    }
    Mint::unpack(&account.data[..Mint::LEN]).map_err(|e| ResolverError::DecodeError(e.to_string()))
}

fn unpack_token_account(address: &Pubkey, account: &Account) -> Result<TokenAccount, ResolverError> {
    if !is_token_program(&account.owner) {
        return Err(ResolverError::InvalidTokenProgram(*address));
    }
    if account.data.len() < TokenAccount::LEN {
        return Err(ResolverError::DecodeError(format!(
            "token account {address} too short"
        )));
    }
    TokenAccount::unpack(&account.data[..TokenAccount::LEN])
        .map_err(|e| ResolverError::DecodeError(e.to_string()))
}
