//! Incentive claims against the merkle distributor.

use crate::abi::IIncentiveDistributor;
use crate::client::{require, VaultClient, TRANSACTION};
use crate::indexer::{parse_merkle_claim, RequestIndexer};
use crate::provider::{EvmProvider, EvmSigner};
use crate::status::Status;
use crate::VaultError;
use alloy_primitives::U256;
use log::debug;

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    /// Claims the signer's accrued incentives with the proof bundle served
    /// by the indexer's merkle endpoint.
    ///
    /// Balances in the bundle are cumulative; the distributor pays out only
    /// what has not been claimed yet.
    pub fn claim_incentives<S>(&self, signer: &S) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.claim_status.run("claim incentives", || {
            let distributor = require(self.config.incentive_distributor)?;
            let user = signer.address();
            let bundle = self.merkle_data(user).ok_or(VaultError::NoIncentives)?;
            let claim =
                parse_merkle_claim(&bundle).map_err(|e| VaultError::MalformedEntry(e.to_string()))?;
            if !claim.is_consistent() {
                return Err(VaultError::MalformedEntry(
                    "merkle claim lists differ in length".to_string(),
                ));
            }
            if claim.tokens.is_empty() {
                return Err(VaultError::NoIncentives);
            }
            debug!("claiming {} incentive tokens for {user}", claim.tokens.len());

            let call = IIncentiveDistributor::claimCall {
                user,
                rootHashes: claim.root_hashes,
                tokens: claim.tokens,
                balances: claim.balances,
                merkleProofs: claim.merkle_proofs,
            };
            self.submit(signer, &self.claim_status, distributor, &call, U256::ZERO, TRANSACTION)
        })
    }
}
