//! Withdraw flows over the three withdraw mechanisms: the allowance-based
//! atomic queue, the permit-capable boring on-chain queue, and delayed
//! withdraws. Each public method runs to a terminal [`Status`].

use crate::abi::{IAtomicQueue, IBoringOnChainQueue, IDelayedWithdraw, ITeller};
use crate::client::{
    now, require, to_u24, to_u40, to_u96, VaultClient, PERMIT_VALIDITY_SECONDS, TRANSACTION,
};
use crate::indexer::{BoringQueueEntry, RequestIndexer};
use crate::permit::{sign_permit, PermitRequest};
use crate::provider::{read, EvmProvider, EvmSigner};
use crate::queue::{BoringQueueAssetParams, QueueVariant};
use crate::status::{Phase, Status};
use crate::VaultError;
use alloy_primitives::aliases::{U88, U96};
use alloy_primitives::{Address, B256, U256};
use common::{days_to_seconds, percent_to_units, to_base_units};
use log::debug;
use std::str::FromStr;

const WITHDRAW_QUEUE: &str = "Withdraw Queue";

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    /// Requests a withdraw through the legacy atomic queue.
    ///
    /// `discount_percent` is encoded with 1% = 10000 and the request expires
    /// `days_valid` days from now.
    pub fn queue_withdraw<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
        discount_percent: &str,
        days_valid: &str,
    ) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("queue withdraw", || {
            self.try_queue_withdraw(signer, amount, token, discount_percent, days_valid)
        })
    }

    fn try_queue_withdraw<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
        discount_percent: &str,
        days_valid: &str,
    ) -> Result<B256, VaultError>
    where
        S: EvmSigner + ?Sized,
    {
        let queue = require(self.config.withdraw_queue)?;
        self.known_token(token)?;

        let shares = to_base_units(amount, self.vault_decimals)?;
        let offer_amount = to_u96(shares, "offerAmount")?;
        let deadline = now()
            .checked_add(days_to_seconds(days_valid)?)
            .ok_or(VaultError::ValueTooLarge("deadline"))?;
        let discount = QueueVariant::Legacy.encode_discount(discount_percent)?;
        debug!("atomic request: {shares} shares, deadline {deadline}, discount {discount}");

        self.ensure_allowance(
            signer,
            &self.withdraw_status,
            self.config.vault,
            queue,
            U256::from(shares),
        )?;

        let call = IAtomicQueue::safeUpdateAtomicRequestCall {
            offer: self.config.vault,
            want: token,
            userRequest: IAtomicQueue::AtomicRequest {
                deadline,
                atomicPrice: U88::ZERO,
                offerAmount: offer_amount,
                inSolve: false,
            },
            accountant: self.config.accountant,
            discount: U256::from(discount),
        };
        self.submit(signer, &self.withdraw_status, queue, &call, U256::ZERO, WITHDRAW_QUEUE)
    }

    /// Requests a withdraw through the boring on-chain queue.
    ///
    /// `discount_percent` is encoded with 1% = 100 and defaults to the
    /// asset's minimum discount; `days_valid` defaults to the asset's
    /// minimum deadline. Unless `use_allowance` is set the shares are
    /// authorized with a permit signature instead of an approval.
    pub fn queue_boring_withdraw<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
        discount_percent: Option<&str>,
        days_valid: Option<&str>,
        use_allowance: bool,
    ) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("boring queue withdraw", || {
            self.try_queue_boring_withdraw(
                signer,
                amount,
                token,
                discount_percent,
                days_valid,
                use_allowance,
            )
        })
    }

    fn try_queue_boring_withdraw<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
        discount_percent: Option<&str>,
        days_valid: Option<&str>,
        use_allowance: bool,
    ) -> Result<B256, VaultError>
    where
        S: EvmSigner + ?Sized,
    {
        let queue = require(self.config.boring_queue)?;
        self.known_token(token)?;
        let user = signer.address();

        let unlock_time = self.fetch_user_unlock_time(user)?;
        let current = now();
        if current <= unlock_time {
            return Err(VaultError::SharesLocked { unlock_time });
        }

        let params = BoringQueueAssetParams::from(read(
            &self.provider,
            queue,
            &IBoringOnChainQueue::withdrawAssetsCall { assetOut: token },
        )?);
        if !params.allow_withdraws {
            return Err(VaultError::WithdrawsNotAllowed(token));
        }

        let shares = to_base_units(amount, self.vault_decimals)?;
        let discount = discount_percent
            .map(|percent| QueueVariant::Permit.encode_discount(percent))
            .transpose()?;
        let seconds = days_valid.map(days_to_seconds).transpose()?;
        let terms = params.resolve_terms(shares, discount, seconds)?;
        let seconds_to_deadline = to_u24(terms.seconds_to_deadline as u64, "secondsToDeadline")?;
        debug!(
            "boring queue request: {shares} shares, discount {} bps, {} s to deadline",
            terms.discount, terms.seconds_to_deadline
        );

        if use_allowance {
            self.ensure_allowance(
                signer,
                &self.withdraw_status,
                self.config.vault,
                queue,
                U256::from(shares),
            )?;
            let call = IBoringOnChainQueue::requestOnChainWithdrawCall {
                assetOut: token,
                amountOfShares: shares,
                discount: terms.discount,
                secondsToDeadline: seconds_to_deadline,
            };
            return self.submit(signer, &self.withdraw_status, queue, &call, U256::ZERO, TRANSACTION);
        }

        self.withdraw_status.transition(Phase::Signing);
        let permit = sign_permit(
            signer,
            &PermitRequest {
                token: self.config.vault,
                spender: queue,
                value: U256::from(shares),
                deadline: U256::from(current + PERMIT_VALIDITY_SECONDS),
            },
        )?;
        let call = IBoringOnChainQueue::requestOnChainWithdrawWithPermitCall {
            assetOut: token,
            amountOfShares: shares,
            discount: terms.discount,
            secondsToDeadline: seconds_to_deadline,
            permitDeadline: permit.deadline,
            v: permit.v,
            r: permit.r,
            s: permit.s,
        };
        self.submit(signer, &self.withdraw_status, queue, &call, U256::ZERO, TRANSACTION)
    }

    /// Cancels the signer's boring-queue request paying out `token`.
    ///
    /// The request tuple is only known to the indexer, so a lagging indexer
    /// makes the cancellation fail with "No request found for token".
    pub fn boring_queue_cancel<S>(&self, signer: &S, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status
            .run("boring queue cancel", || self.try_boring_queue_cancel(signer, token))
    }

    fn try_boring_queue_cancel<S>(&self, signer: &S, token: Address) -> Result<B256, VaultError>
    where
        S: EvmSigner + ?Sized,
    {
        let queue = require(self.config.boring_queue)?;
        let requests = self.indexed_boring_queue(signer.address());
        let entry = requests
            .find_by_want_token(token)
            .ok_or(VaultError::NoRequestFound)?;
        let request = on_chain_withdraw(entry)?;
        debug!("cancelling boring queue request nonce {}", entry.metadata.nonce);

        let call = IBoringOnChainQueue::cancelOnChainWithdrawCall { request };
        self.submit(signer, &self.withdraw_status, queue, &call, U256::ZERO, TRANSACTION)
    }

    /// Resets the signer's atomic request for `token` to an empty request
    pub fn withdraw_queue_cancel<S>(&self, signer: &S, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("withdraw queue cancel", || {
            let queue = require(self.config.withdraw_queue)?;
            let call = IAtomicQueue::updateAtomicRequestCall {
                offer: self.config.vault,
                want: token,
                userRequest: IAtomicQueue::AtomicRequest {
                    deadline: 0,
                    atomicPrice: U88::ZERO,
                    offerAmount: U96::ZERO,
                    inSolve: false,
                },
            };
            self.submit(signer, &self.withdraw_status, queue, &call, U256::ZERO, WITHDRAW_QUEUE)
        })
    }

    /// Requests a delayed withdraw of `shares`. `max_loss_percent` is
    /// encoded in basis points.
    pub fn delay_withdraw<S>(
        &self,
        signer: &S,
        shares: &str,
        token: Address,
        max_loss_percent: &str,
        allow_third_party_to_complete: bool,
    ) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("delay withdraw", || {
            let delay = require(self.config.delay_withdraw)?;
            self.known_token(token)?;
            let shares = to_base_units(shares, self.vault_decimals)?;
            let shares_u96 = to_u96(shares, "shares")?;
            let max_loss = u16::try_from(percent_to_units(max_loss_percent, 100)?)
                .map_err(|_| VaultError::ValueTooLarge("maxLoss"))?;

            self.ensure_allowance(
                signer,
                &self.withdraw_status,
                self.config.vault,
                delay,
                U256::from(shares),
            )?;
            let call = IDelayedWithdraw::requestWithdrawCall {
                asset: token,
                shares: shares_u96,
                maxLoss: max_loss,
                allowThirdPartyToComplete: allow_third_party_to_complete,
            };
            self.submit(signer, &self.withdraw_status, delay, &call, U256::ZERO, TRANSACTION)
        })
    }

    pub fn delay_withdraw_cancel<S>(&self, signer: &S, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("delay withdraw cancel", || {
            let delay = require(self.config.delay_withdraw)?;
            let call = IDelayedWithdraw::cancelWithdrawCall { asset: token };
            self.submit(signer, &self.withdraw_status, delay, &call, U256::ZERO, TRANSACTION)
        })
    }

    /// Completes a matured delayed withdraw. Maturity is enforced on-chain.
    pub fn delay_withdraw_complete<S>(&self, signer: &S, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("delay withdraw complete", || {
            let delay = require(self.config.delay_withdraw)?;
            let call = IDelayedWithdraw::completeWithdrawCall {
                asset: token,
                account: signer.address(),
            };
            self.submit(signer, &self.withdraw_status, delay, &call, U256::ZERO, TRANSACTION)
        })
    }

    /// Burns `shares` through the teller for `token`, with no minimum on the
    /// assets received.
    pub fn instant_withdraw<S>(&self, signer: &S, shares: &str, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.withdraw_status.run("instant withdraw", || {
            self.known_token(token)?;
            let shares = to_base_units(shares, self.vault_decimals)?;
            let call = ITeller::withdrawCall {
                withdrawAsset: token,
                shareAmount: U256::from(shares),
                minimumAssets: U256::ZERO,
                to: signer.address(),
            };
            self.submit(
                signer,
                &self.withdraw_status,
                self.config.teller,
                &call,
                U256::ZERO,
                TRANSACTION,
            )
        })
    }
}

/// Rebuilds the on-chain request tuple from indexer metadata
fn on_chain_withdraw(
    entry: &BoringQueueEntry,
) -> Result<IBoringOnChainQueue::OnChainWithdraw, VaultError> {
    let parse = |text: &str| {
        Address::from_str(text).map_err(|_| VaultError::MalformedEntry(format!("bad address {text}")))
    };
    let metadata = &entry.metadata;
    Ok(IBoringOnChainQueue::OnChainWithdraw {
        nonce: to_u96(metadata.nonce, "nonce")?,
        user: parse(&entry.user)?,
        assetOut: parse(&entry.want_token)?,
        amountOfShares: metadata.amount_of_shares,
        amountOfAssets: metadata.amount_of_assets,
        creationTime: to_u40(metadata.creation_time, "creationTime")?,
        secondsToMaturity: to_u24(metadata.seconds_to_maturity, "secondsToMaturity")?,
        secondsToDeadline: to_u24(metadata.seconds_to_deadline, "secondsToDeadline")?,
    })
}
