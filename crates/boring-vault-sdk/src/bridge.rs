//! Cross-chain share transfers through the LayerZero teller.

use crate::abi::{IAccountant, ILayerZeroTeller};
use crate::client::{require, to_u128, to_u96, VaultClient, TRANSACTION};
use crate::indexer::RequestIndexer;
use crate::provider::{read, EvmProvider, EvmSigner};
use crate::status::Status;
use crate::VaultError;
use alloy_primitives::aliases::U96;
use alloy_primitives::{address, Address, Bytes, U256};
use common::{shares_at_rate, to_base_units};
use log::debug;

/// Placeholder address the teller uses for the chain's native gas token
pub const NATIVE_FEE_TOKEN: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Decimals `max_fee` is expressed in (native gas token)
pub const FEE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeParams {
    /// LayerZero endpoint id of the destination chain
    pub chain_selector: u32,
    pub destination_chain_receiver: Address,
    pub bridge_fee_token: Address,
    pub message_gas: u64,
    pub data: Bytes,
}

impl BridgeParams {
    /// Bridge to `receiver` paying the fee in the native token
    pub fn new(chain_selector: u32, receiver: Address, message_gas: u64) -> Self {
        Self {
            chain_selector,
            destination_chain_receiver: receiver,
            bridge_fee_token: NATIVE_FEE_TOKEN,
            message_gas,
            data: Bytes::new(),
        }
    }

    pub(crate) fn bridge_data(&self) -> ILayerZeroTeller::BridgeData {
        ILayerZeroTeller::BridgeData {
            chainSelector: self.chain_selector,
            destinationChainReceiver: self.destination_chain_receiver,
            bridgeFeeToken: self.bridge_fee_token,
            messageGas: self.message_gas,
            data: self.data.clone(),
        }
    }
}

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    /// Bridges `shares` to another chain. Fails without submitting when the
    /// previewed fee exceeds `max_fee`.
    pub fn bridge<S>(&self, signer: &S, shares: &str, params: &BridgeParams, max_fee: &str) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.bridge_status.run("bridge", || {
            let teller = require(self.config.layer_zero_teller)?;
            let shares = to_u96(to_base_units(shares, self.vault_decimals)?, "shareAmount")?;
            let data = params.bridge_data();
            let fee = self.checked_fee(teller, shares, &data, max_fee)?;

            let call = ILayerZeroTeller::bridgeCall {
                shareAmount: shares,
                data,
            };
            self.submit(signer, &self.bridge_status, teller, &call, fee, TRANSACTION)
        })
    }

    /// Deposits `amount` of `token` and bridges the minted shares in one
    /// transaction.
    pub fn deposit_and_bridge<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
        params: &BridgeParams,
        max_fee: &str,
    ) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.bridge_status.run("deposit and bridge", || {
            let teller = require(self.config.layer_zero_teller)?;
            let decimals = self.known_token(token)?.decimals;
            let amount = to_base_units(amount, decimals)?;

            let rate = read(
                &self.provider,
                self.config.accountant,
                &IAccountant::getRateInQuoteSafeCall { quote: token },
            )?
            .rateInQuote;
            let estimate = shares_at_rate(amount, to_u128(rate, "rateInQuote")?, self.vault_decimals)?;
            let data = params.bridge_data();
            let fee = self.checked_fee(teller, to_u96(estimate, "shareAmount")?, &data, max_fee)?;

            self.ensure_allowance(
                signer,
                &self.bridge_status,
                token,
                self.config.vault,
                U256::from(amount),
            )?;
            let call = ILayerZeroTeller::depositAndBridgeCall {
                depositAsset: token,
                depositAmount: U256::from(amount),
                minimumMint: U256::ZERO,
                data,
            };
            self.submit(signer, &self.bridge_status, teller, &call, fee, TRANSACTION)
        })
    }

    fn checked_fee(
        &self,
        teller: Address,
        shares: U96,
        data: &ILayerZeroTeller::BridgeData,
        max_fee: &str,
    ) -> Result<U256, VaultError> {
        let max_fee = U256::from(to_base_units(max_fee, FEE_DECIMALS)?);
        let fee = read(
            &self.provider,
            teller,
            &ILayerZeroTeller::previewFeeCall {
                shareAmount: shares,
                data: data.clone(),
            },
        )?
        .fee;
        debug!("bridge fee {fee}, max {max_fee}");
        if fee > max_fee {
            return Err(VaultError::FeeTooHigh { fee, max_fee });
        }
        Ok(fee)
    }
}
