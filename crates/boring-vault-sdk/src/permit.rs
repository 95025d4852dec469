//! EIP-2612 permits: typed-data construction, signing and a bytecode probe
//! for permit support.

use crate::abi::{IBeacon, IDaiPermit, IERC20};
use crate::provider::{read, EvmProvider, EvmSigner, ProviderError};
use alloy_primitives::{b256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolCall, SolStruct};
use log::{debug, warn};
use serde_json::{json, Value};

sol! {
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

/// keccak256("eip1967.proxy.implementation") - 1
pub const EIP1967_IMPLEMENTATION_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// keccak256("eip1967.proxy.beacon") - 1
pub const EIP1967_BEACON_SLOT: B256 =
    b256!("a3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");
/// keccak256("org.zeppelinos.proxy.implementation")
pub const OZ_IMPLEMENTATION_SLOT: B256 =
    b256!("7050c9e0f4ca769c69bd3a8ef740bc37934f8e2c036e5a723fd8ee048ed3f8c3");

const MINIMAL_PROXY_PREFIX: [u8; 10] = [0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73];
const MINIMAL_PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermitError {
    #[error("failed to read token name: {0}")]
    Name(ProviderError),
    #[error("failed to read permit nonce: {0}")]
    Nonce(ProviderError),
    #[error("failed to read chain id: {0}")]
    ChainId(ProviderError),
    #[error("signature rejected: {0}")]
    Rejected(ProviderError),
    #[error("expected a 65 byte signature, got {0} bytes")]
    SignatureLength(usize),
}

/// What to authorize with a permit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRequest {
    pub token: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
}

/// EIP-712 payload for `Permit(owner,spender,value,nonce,deadline)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitTypedData {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

impl PermitTypedData {
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    /// Digest a local key would sign
    pub fn signing_hash(&self) -> B256 {
        let permit = Permit {
            owner: self.owner,
            spender: self.spender,
            value: self.value,
            nonce: self.nonce,
            deadline: self.deadline,
        };
        permit.eip712_signing_hash(&self.domain())
    }

    /// JSON document accepted by `eth_signTypedData_v4`
    pub fn to_json(&self) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "Permit": [
                    { "name": "owner", "type": "address" },
                    { "name": "spender", "type": "address" },
                    { "name": "value", "type": "uint256" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "deadline", "type": "uint256" }
                ]
            },
            "primaryType": "Permit",
            "domain": {
                "name": self.name,
                "version": self.version,
                "chainId": self.chain_id,
                "verifyingContract": self.verifying_contract.to_string()
            },
            "message": {
                "owner": self.owner.to_string(),
                "spender": self.spender.to_string(),
                "value": self.value.to_string(),
                "nonce": self.nonce.to_string(),
                "deadline": self.deadline.to_string()
            }
        })
    }
}

/// A split permit signature. Single use: it is consumed on-chain or
/// expires at `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub deadline: U256,
    pub nonce: U256,
}

/// Splits a 65 byte `r || s || v` signature, normalising `v` to 27/28
pub fn split_signature(signature: &[u8]) -> Result<(u8, B256, B256), PermitError> {
    if signature.len() != 65 {
        return Err(PermitError::SignatureLength(signature.len()));
    }
    let r = B256::from_slice(&signature[..32]);
    let s = B256::from_slice(&signature[32..64]);
    let mut v = signature[64];
    if v < 27 {
        v += 27;
    }
    Ok((v, r, s))
}

/// Builds and signs an EIP-2612 permit for `request` on behalf of the signer.
///
/// Reads `name()`, `nonces(owner)` and `version()` from the token; tokens
/// without `version()` use `"1"`.
pub fn sign_permit<S>(signer: &S, request: &PermitRequest) -> Result<PermitSignature, PermitError>
where
    S: EvmSigner + ?Sized,
{
    let owner = signer.address();
    let name = read(signer, request.token, &IERC20::nameCall {})
        .map_err(PermitError::Name)?
        .name;
    let nonce = read(signer, request.token, &IERC20::noncesCall { owner })
        .map_err(PermitError::Nonce)?
        .nonce;
    let version = match read(signer, request.token, &IERC20::versionCall {}) {
        Ok(ret) => ret.version,
        Err(err) => {
            debug!("token {} has no version(), defaulting to 1: {err}", request.token);
            "1".to_string()
        }
    };
    let chain_id = signer.chain_id().map_err(PermitError::ChainId)?;

    let typed_data = PermitTypedData {
        name,
        version,
        chain_id,
        verifying_contract: request.token,
        owner,
        spender: request.spender,
        value: request.value,
        nonce,
        deadline: request.deadline,
    };
    let signature = signer
        .sign_typed_data(&typed_data)
        .map_err(PermitError::Rejected)?;
    let (v, r, s) = split_signature(&signature)?;

    Ok(PermitSignature {
        v,
        r,
        s,
        deadline: request.deadline,
        nonce,
    })
}

/// Tri-state outcome of the permit probe. `Error` means the probe itself
/// could not run, which is not the same as "no permit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitProbe {
    Yes,
    No,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitSupport {
    pub token: Address,
    /// Address whose bytecode was scanned
    pub address: Address,
    pub has_permit: PermitProbe,
}

/// Best-effort check whether `token` implements EIP-2612.
///
/// Proxies are followed to their implementation (EIP-1167 clones, the
/// EIP-1967 implementation and beacon slots, the legacy OpenZeppelin slot)
/// and the runtime bytecode is scanned for the `permit` selectors. A
/// selector match is a heuristic, not a guarantee.
pub fn check_contract_for_permit<P>(provider: &P, token: Address) -> PermitSupport
where
    P: EvmProvider + ?Sized,
{
    let probe = resolve_implementation(provider, token).and_then(|implementation| {
        let code = provider.get_code(implementation)?;
        Ok((implementation, code))
    });

    match probe {
        Ok((implementation, code)) => {
            let has_permit = if contains_selector(&code, IERC20::permitCall::SELECTOR)
                || contains_selector(&code, IDaiPermit::permitCall::SELECTOR)
            {
                PermitProbe::Yes
            } else {
                PermitProbe::No
            };
            debug!("permit probe for {token} via {implementation}: {has_permit:?}");
            PermitSupport {
                token,
                address: implementation,
                has_permit,
            }
        }
        Err(err) => {
            warn!("permit probe for {token} failed: {err}");
            PermitSupport {
                token,
                address: token,
                has_permit: PermitProbe::Error,
            }
        }
    }
}

/// Follows known proxy patterns from `token` to the contract holding the logic
pub fn resolve_implementation<P>(provider: &P, token: Address) -> Result<Address, ProviderError>
where
    P: EvmProvider + ?Sized,
{
    let code = provider.get_code(token)?;
    if let Some(target) = minimal_proxy_target(&code) {
        return Ok(target);
    }

    for slot in [EIP1967_IMPLEMENTATION_SLOT, OZ_IMPLEMENTATION_SLOT] {
        let implementation = Address::from_word(provider.get_storage_at(token, slot)?);
        if !implementation.is_zero() {
            return Ok(implementation);
        }
    }

    let beacon = Address::from_word(provider.get_storage_at(token, EIP1967_BEACON_SLOT)?);
    if !beacon.is_zero() {
        return Ok(read(provider, beacon, &IBeacon::implementationCall {})?.implementation);
    }

    Ok(token)
}

fn minimal_proxy_target(code: &Bytes) -> Option<Address> {
    let expected_len = MINIMAL_PROXY_PREFIX.len() + 20 + MINIMAL_PROXY_SUFFIX.len();
    if code.len() != expected_len
        || !code.starts_with(&MINIMAL_PROXY_PREFIX)
        || !code.ends_with(&MINIMAL_PROXY_SUFFIX)
    {
        return None;
    }
    let start = MINIMAL_PROXY_PREFIX.len();
    Some(Address::from_slice(&code[start..start + 20]))
}

fn contains_selector(code: &[u8], selector: [u8; 4]) -> bool {
    code.windows(4).any(|window| window == selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed_data(nonce: u64) -> PermitTypedData {
        PermitTypedData {
            name: "Boring Vault".to_string(),
            version: "1".to_string(),
            chain_id: 1,
            verifying_contract: Address::repeat_byte(0x01),
            owner: Address::repeat_byte(0x02),
            spender: Address::repeat_byte(0x03),
            value: U256::from(1_500_000u64),
            nonce: U256::from(nonce),
            deadline: U256::from(1_700_000_000u64),
        }
    }

    #[test]
    fn test_split_signature_normalises_v() {
        let mut raw = vec![0x11u8; 32];
        raw.extend([0x22u8; 32]);
        raw.push(1);
        let (v, r, s) = split_signature(&raw).unwrap();
        assert_eq!(v, 28);
        assert_eq!(r, B256::repeat_byte(0x11));
        assert_eq!(s, B256::repeat_byte(0x22));

        raw[64] = 27;
        assert_eq!(split_signature(&raw).unwrap().0, 27);
    }

    #[test]
    fn test_split_signature_rejects_bad_length() {
        assert_eq!(
            split_signature(&[0u8; 64]),
            Err(PermitError::SignatureLength(64))
        );
    }

    #[test]
    fn test_signing_hash_binds_nonce() {
        assert_eq!(typed_data(0).signing_hash(), typed_data(0).signing_hash());
        assert_ne!(typed_data(0).signing_hash(), typed_data(1).signing_hash());
    }

    #[test]
    fn test_typed_data_json_shape() {
        let json = typed_data(7).to_json();
        assert_eq!(json["primaryType"], "Permit");
        assert_eq!(json["domain"]["chainId"], 1);
        assert_eq!(json["message"]["nonce"], "7");
        assert_eq!(json["message"]["value"], "1500000");
        assert_eq!(json["types"]["Permit"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_permit_selectors() {
        assert_eq!(IERC20::permitCall::SELECTOR, [0xd5, 0x05, 0xac, 0xcf]);
        assert_eq!(IDaiPermit::permitCall::SELECTOR, [0x8f, 0xcb, 0xaf, 0x0c]);
    }

    #[test]
    fn test_minimal_proxy_target() {
        let target = Address::repeat_byte(0xaa);
        let mut code = MINIMAL_PROXY_PREFIX.to_vec();
        code.extend_from_slice(target.as_slice());
        code.extend_from_slice(&MINIMAL_PROXY_SUFFIX);
        assert_eq!(minimal_proxy_target(&Bytes::from(code)), Some(target));
        assert_eq!(minimal_proxy_target(&Bytes::from(vec![0u8; 45])), None);
    }
}
