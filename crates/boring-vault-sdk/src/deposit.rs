use crate::abi::ITeller;
use crate::client::{now, VaultClient, PERMIT_VALIDITY_SECONDS, TRANSACTION};
use crate::indexer::RequestIndexer;
use crate::permit::{check_contract_for_permit, sign_permit, PermitProbe, PermitRequest};
use crate::provider::{EvmProvider, EvmSigner};
use crate::status::{Phase, Status};
use crate::VaultError;
use alloy_primitives::{Address, B256, U256};
use common::to_base_units;
use log::debug;

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    /// Deposits `amount` of `token` through the teller, approving the vault
    /// first when the allowance is short.
    pub fn deposit<S>(&self, signer: &S, amount: &str, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.deposit_status.run("deposit", || {
            let decimals = self.known_token(token)?.decimals;
            let amount = U256::from(to_base_units(amount, decimals)?);
            self.ensure_allowance(signer, &self.deposit_status, token, self.config.vault, amount)?;

            let call = ITeller::depositCall {
                depositAsset: token,
                depositAmount: amount,
                minimumMint: U256::ZERO,
            };
            self.submit(
                signer,
                &self.deposit_status,
                self.config.teller,
                &call,
                U256::ZERO,
                TRANSACTION,
            )
        })
    }

    /// Deposits with an EIP-2612 permit instead of an approval. Tokens the
    /// permit probe does not positively identify are refused up front.
    pub fn deposit_with_permit<S>(&self, signer: &S, amount: &str, token: Address) -> Status
    where
        S: EvmSigner + ?Sized,
    {
        self.deposit_status.run("deposit with permit", || {
            self.try_deposit_with_permit(signer, amount, token)
        })
    }

    fn try_deposit_with_permit<S>(
        &self,
        signer: &S,
        amount: &str,
        token: Address,
    ) -> Result<B256, VaultError>
    where
        S: EvmSigner + ?Sized,
    {
        let decimals = self.known_token(token)?.decimals;
        let amount = U256::from(to_base_units(amount, decimals)?);

        let support = check_contract_for_permit(&self.provider, token);
        if support.has_permit != PermitProbe::Yes {
            debug!("{token} permit probe: {:?}", support.has_permit);
            return Err(VaultError::PermitUnsupported);
        }

        self.deposit_status.transition(Phase::Signing);
        let permit = sign_permit(
            signer,
            &PermitRequest {
                token,
                spender: self.config.vault,
                value: amount,
                deadline: U256::from(now() + PERMIT_VALIDITY_SECONDS),
            },
        )?;

        let call = ITeller::depositWithPermitCall {
            depositAsset: token,
            depositAmount: amount,
            minimumMint: U256::ZERO,
            deadline: permit.deadline,
            v: permit.v,
            r: permit.r,
            s: permit.s,
        };
        self.submit(
            signer,
            &self.deposit_status,
            self.config.teller,
            &call,
            U256::ZERO,
            TRANSACTION,
        )
    }
}
