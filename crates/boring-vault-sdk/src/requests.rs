//! Pending withdraw requests, tagged by where their data came from.
//!
//! On-chain records are authoritative. Indexer records are a cache that may
//! lag behind the chain, and for the boring queue they carry metadata that is
//! not readable on-chain at all.

use crate::abi::{IAtomicQueue, IDelayedWithdraw};
use crate::indexer::{BoringQueueEntry, WithdrawRequestEntry};
use alloy_primitives::Address;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    OnChain,
    IndexerReported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicRequestView {
    pub deadline: u64,
    pub atomic_price: u128,
    pub offer_amount: u128,
    pub in_solve: bool,
}

impl From<IAtomicQueue::AtomicRequest> for AtomicRequestView {
    fn from(request: IAtomicQueue::AtomicRequest) -> Self {
        Self {
            deadline: request.deadline,
            atomic_price: request.atomicPrice.to::<u128>(),
            offer_amount: request.offerAmount.to::<u128>(),
            in_solve: request.inSolve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWithdrawRequest {
    pub allow_third_party_to_complete: bool,
    pub max_loss: u16,
    pub maturity: u64,
    pub shares: u128,
    pub exchange_rate_at_time_of_request: u128,
}

impl DelayWithdrawRequest {
    /// Claimable strictly after maturity
    pub fn is_claimable(&self, now: u64) -> bool {
        self.shares > 0 && now > self.maturity
    }
}

impl From<IDelayedWithdraw::withdrawRequestsReturn> for DelayWithdrawRequest {
    fn from(ret: IDelayedWithdraw::withdrawRequestsReturn) -> Self {
        Self {
            allow_third_party_to_complete: ret.allowThirdPartyToComplete,
            max_loss: ret.maxLoss,
            maturity: ret.maturity.to::<u64>(),
            shares: ret.shares.to::<u128>(),
            exchange_rate_at_time_of_request: ret.exchangeRateAtTimeOfRequest.to::<u128>(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    OnChainAtomic {
        want_token: Address,
        request: AtomicRequestView,
    },
    OnChainDelay {
        token: Address,
        request: DelayWithdrawRequest,
    },
    IndexedAtomic(WithdrawRequestEntry),
    IndexedBoring {
        entry: BoringQueueEntry,
        expired: bool,
    },
}

impl PendingRequest {
    pub fn source(&self) -> RequestSource {
        match self {
            Self::OnChainAtomic { .. } | Self::OnChainDelay { .. } => RequestSource::OnChain,
            Self::IndexedAtomic(_) | Self::IndexedBoring { .. } => RequestSource::IndexerReported,
        }
    }

    pub fn want_token(&self) -> Option<Address> {
        match self {
            Self::OnChainAtomic { want_token, .. } => Some(*want_token),
            Self::OnChainDelay { token, .. } => Some(*token),
            Self::IndexedAtomic(entry) => Address::from_str(&entry.want_token).ok(),
            Self::IndexedBoring { entry, .. } => Address::from_str(&entry.want_token).ok(),
        }
    }
}
