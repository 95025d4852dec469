//! Read-only views of vault and queue state.
//!
//! On-chain reads propagate provider errors. Indexer reads never fail: an
//! unreachable or malformed indexer is logged and reported as "no requests".

use crate::abi::{IAtomicQueue, IBoringOnChainQueue, IDelayedWithdraw, ILens, ITeller, IERC20};
use crate::client::{require, to_u128, VaultClient};
use crate::indexer::{BoringQueueRequests, RequestIndexer};
use crate::provider::{read, EvmProvider};
use crate::queue::BoringQueueAssetParams;
use crate::requests::{DelayWithdrawRequest, PendingRequest};
use crate::VaultError;
use alloy_primitives::Address;
use common::format_units;
use log::{debug, warn};
use serde_json::Value;
use std::fmt;

/// A raw token amount together with the decimals it is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub raw: u128,
    pub decimals: u8,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, self.decimals))
    }
}

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    /// Total assets held by the vault, in base-token units
    pub fn fetch_total_assets(&self) -> Result<Amount, VaultError> {
        let ret = read(
            &self.provider,
            self.config.lens,
            &ILens::totalAssetsCall {
                boringVault: self.config.vault,
                accountant: self.config.accountant,
            },
        )?;
        Ok(Amount {
            raw: to_u128(ret.assets, "assets")?,
            decimals: self.config.base_token.decimals,
        })
    }

    pub fn fetch_user_shares(&self, user: Address) -> Result<Amount, VaultError> {
        let shares = read(
            &self.provider,
            self.config.lens,
            &ILens::balanceOfCall {
                account: user,
                boringVault: self.config.vault,
            },
        )?
        .shares;
        Ok(Amount {
            raw: to_u128(shares, "shares")?,
            decimals: self.vault_decimals,
        })
    }

    /// Value of one share in base-token units
    pub fn fetch_share_value(&self) -> Result<Amount, VaultError> {
        let rate = read(
            &self.provider,
            self.config.lens,
            &ILens::exchangeRateCall {
                accountant: self.config.accountant,
            },
        )?
        .rate;
        Ok(Amount {
            raw: to_u128(rate, "rate")?,
            decimals: self.config.base_token.decimals,
        })
    }

    /// Unix time until which `user`'s freshly minted shares are locked
    pub fn fetch_user_unlock_time(&self, user: Address) -> Result<u64, VaultError> {
        let unlock = read(
            &self.provider,
            self.config.teller,
            &ITeller::shareUnlockTimeCall { user },
        )?
        .unlockTime;
        u64::try_from(unlock).map_err(|_| VaultError::ValueTooLarge("unlockTime"))
    }

    pub fn fetch_token_balance(&self, user: Address, token: Address) -> Result<Amount, VaultError> {
        let decimals = self.known_token(token)?.decimals;
        let balance = read(&self.provider, token, &IERC20::balanceOfCall { account: user })?.balance;
        Ok(Amount {
            raw: to_u128(balance, "balance")?,
            decimals,
        })
    }

    pub fn fetch_boring_queue_asset_params(
        &self,
        token: Address,
    ) -> Result<BoringQueueAssetParams, VaultError> {
        let queue = require(self.config.boring_queue)?;
        let ret = read(
            &self.provider,
            queue,
            &IBoringOnChainQueue::withdrawAssetsCall { assetOut: token },
        )?;
        Ok(ret.into())
    }

    /// Outstanding delayed withdraws of `user`, one per configured withdraw
    /// token with a non-zero share amount
    pub fn fetch_delay_withdraw_requests(
        &self,
        user: Address,
    ) -> Result<Vec<PendingRequest>, VaultError> {
        let delay = require(self.config.delay_withdraw)?;
        let mut requests = Vec::new();
        for token in &self.config.withdraw_tokens {
            let ret = read(
                &self.provider,
                delay,
                &IDelayedWithdraw::withdrawRequestsCall {
                    account: user,
                    asset: token.address,
                },
            )?;
            let request = DelayWithdrawRequest::from(ret);
            if request.shares > 0 {
                requests.push(PendingRequest::OnChainDelay {
                    token: token.address,
                    request,
                });
            }
        }
        Ok(requests)
    }

    /// Open atomic-queue requests of `user` read from the queue contract
    pub fn fetch_atomic_requests(&self, user: Address) -> Result<Vec<PendingRequest>, VaultError> {
        let queue = require(self.config.withdraw_queue)?;
        let mut requests = Vec::new();
        for token in &self.config.withdraw_tokens {
            let request = read(
                &self.provider,
                queue,
                &IAtomicQueue::getUserAtomicRequestCall {
                    user,
                    offer: self.config.vault,
                    want: token.address,
                },
            )?
            .request;
            if !request.offerAmount.is_zero() {
                requests.push(PendingRequest::OnChainAtomic {
                    want_token: token.address,
                    request: request.into(),
                });
            }
        }
        Ok(requests)
    }

    /// Atomic-queue requests as reported by the indexer
    pub fn withdraw_requests(&self, user: Address) -> Vec<PendingRequest> {
        match self
            .indexer
            .withdraw_requests(&self.config.chain, self.config.vault, user)
        {
            Ok(entries) => entries.into_iter().map(PendingRequest::IndexedAtomic).collect(),
            Err(err) => {
                warn!("withdraw requests unavailable for {user}: {err}");
                Vec::new()
            }
        }
    }

    /// Boring-queue requests as reported by the indexer, open ones first
    pub fn boring_queue_requests(&self, user: Address) -> Vec<PendingRequest> {
        let requests = self.indexed_boring_queue(user);
        let open = requests
            .open_requests
            .into_iter()
            .map(|entry| PendingRequest::IndexedBoring {
                entry,
                expired: false,
            });
        let expired = requests
            .expired_requests
            .into_iter()
            .map(|entry| PendingRequest::IndexedBoring {
                entry,
                expired: true,
            });
        open.chain(expired).collect()
    }

    /// Every pending request of `user` the configured contracts and the
    /// indexer know about. Sources are kept apart, never merged.
    pub fn pending_requests(&self, user: Address) -> Result<Vec<PendingRequest>, VaultError> {
        let mut requests = Vec::new();
        if self.config.withdraw_queue.is_some() {
            requests.extend(self.fetch_atomic_requests(user)?);
            requests.extend(self.withdraw_requests(user));
        }
        if self.config.delay_withdraw.is_some() {
            requests.extend(self.fetch_delay_withdraw_requests(user)?);
        }
        if self.config.boring_queue.is_some() {
            requests.extend(self.boring_queue_requests(user));
        }
        debug!("{} pending requests for {user}", requests.len());
        Ok(requests)
    }

    /// Merkle proof bundle for `user`'s incentive claim, if the vault has a
    /// rewards slug and the indexer answers
    pub fn merkle_data(&self, user: Address) -> Option<Value> {
        let slug = self.config.vault_slug.as_deref()?;
        match self.indexer.merkle_data(slug, &self.config.chain, user) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!("merkle data unavailable for {user}: {err}");
                None
            }
        }
    }

    pub(crate) fn indexed_boring_queue(&self, user: Address) -> BoringQueueRequests {
        self.indexer
            .boring_queue_requests(&self.config.chain, self.config.vault, user)
            .unwrap_or_else(|err| {
                warn!("boring queue requests unavailable for {user}: {err}");
                BoringQueueRequests::default()
            })
    }
}
