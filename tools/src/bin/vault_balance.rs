//! Prints a vault's sub-accounts and, optionally, a wallet's share balance.
//!
//! Usage: `vault-balance <rpc-url> <program-id> <vault-id> [wallet]`

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use boring_vault_tools::VaultResolver;
use log::info;
use solana_sdk::pubkey::Pubkey;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        bail!("usage: vault-balance <rpc-url> <program-id> <vault-id> [wallet]");
    }

    let program_id = Pubkey::from_str(&args[1]).context("invalid program id")?;
    let vault_id: u64 = args[2].parse().context("invalid vault id")?;
    let resolver = VaultResolver::connect(&args[0], program_id);

    let vault = resolver
        .get_full_vault_data(vault_id)
        .with_context(|| format!("reading vault {vault_id}"))?;
    info!("Vault {} state at {}", vault_id, resolver.vault_state_pda(vault_id));

    println!("vault id:          {}", vault.config.vault_id);
    println!("paused:            {}", vault.config.paused);
    println!("share mint:        {}", vault.config.share_mint());
    println!("base asset:        {}", vault.teller.base_asset());
    println!(
        "exchange rate:     {}",
        common::format_units(vault.teller.exchange_rate as u128, vault.teller.decimals)
    );
    println!(
        "deposit account:   {} ({})",
        vault.config.deposit_sub_account,
        resolver.vault_pda(vault_id, vault.config.deposit_sub_account)
    );
    println!(
        "withdraw account:  {} ({})",
        vault.config.withdraw_sub_account,
        resolver.vault_pda(vault_id, vault.config.withdraw_sub_account)
    );

    if let Some(wallet) = args.get(3) {
        let wallet = Pubkey::from_str(wallet).context("invalid wallet")?;
        let balance = resolver
            .get_balance(&wallet, vault_id)
            .with_context(|| format!("reading share balance of {wallet}"))?;
        println!("shares of {}: {}", wallet, balance.formatted);
    }

    Ok(())
}
