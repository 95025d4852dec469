//! Program-derived addresses of the Boring Vault program.
//!
//! Vault ids are encoded as 8 little-endian bytes, sub-accounts as a single
//! byte.

use solana_sdk::pubkey::Pubkey;

pub const VAULT_STATE_SEED: &[u8] = b"boring-vault-state";
pub const VAULT_SEED: &[u8] = b"boring-vault";
pub const SHARE_TOKEN_SEED: &[u8] = b"share-token";
pub const ASSET_DATA_SEED: &[u8] = b"asset-data";

/// Account holding the vault's configuration, teller and manager state
pub fn vault_state_pda(program_id: &Pubkey, vault_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[VAULT_STATE_SEED, &vault_id.to_le_bytes()], program_id).0
}

/// Sub-account `sub_account` of vault `vault_id`, the address that holds
/// the vault's funds
pub fn vault_pda(program_id: &Pubkey, vault_id: u64, sub_account: u8) -> Pubkey {
    Pubkey::find_program_address(
        &[VAULT_SEED, &vault_id.to_le_bytes(), &[sub_account]],
        program_id,
    )
    .0
}

pub fn share_token_pda(program_id: &Pubkey, vault_state: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[SHARE_TOKEN_SEED, vault_state.as_ref()], program_id).0
}

pub fn asset_data_pda(program_id: &Pubkey, vault_state: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[ASSET_DATA_SEED, vault_state.as_ref(), mint.as_ref()],
        program_id,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_state_pda_is_deterministic() {
        let program_id = Pubkey::new_unique();
        assert_eq!(vault_state_pda(&program_id, 5), vault_state_pda(&program_id, 5));
        assert_ne!(vault_state_pda(&program_id, 5), vault_state_pda(&program_id, 6));
    }

    #[test]
    fn test_pdas_depend_on_program() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert_ne!(vault_state_pda(&a, 1), vault_state_pda(&b, 1));
    }

    #[test]
    fn test_sub_accounts_are_distinct() {
        let program_id = Pubkey::new_unique();
        let deposit = vault_pda(&program_id, 1, 0);
        let withdraw = vault_pda(&program_id, 1, 1);
        assert_ne!(deposit, withdraw);
        assert_ne!(deposit, vault_pda(&program_id, 2, 0));
        assert_ne!(deposit, vault_state_pda(&program_id, 1));
    }

    #[test]
    fn test_share_and_asset_pdas() {
        let program_id = Pubkey::new_unique();
        let state = vault_state_pda(&program_id, 9);
        let mint = Pubkey::new_unique();
        let share_mint = share_token_pda(&program_id, &state);
        assert_eq!(share_mint, share_token_pda(&program_id, &state));
        assert_ne!(
            asset_data_pda(&program_id, &state, &mint),
            asset_data_pda(&program_id, &state, &share_mint)
        );
    }
}
