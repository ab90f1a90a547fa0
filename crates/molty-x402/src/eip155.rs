//! EIP-155 "exact" scheme client: ERC-3009 `transferWithAuthorization`
//! signed over EIP-712.
//!
//! The produced payload authorizes the facilitator to move the exact USDC
//! amount from the signer's address. Nothing is broadcast here; the server
//! settles the authorization on-chain.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain, sol};
use async_trait::async_trait;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::b64::Base64Bytes;
use crate::client::{PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient};
use crate::proto::{ExactScheme, PaymentRequired, PaymentRequirements, TokenAmount, X402Version1};
use crate::timestamp::UnixTimestamp;

/// EVM networks the client recognizes, with their EIP-155 chain ids.
const KNOWN_NETWORKS: &[(&str, u64)] = &[("base", 8453), ("base-sepolia", 84532)];

fn chain_id_for(network: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|(name, _)| *name == network)
        .map(|(_, id)| *id)
}

sol! {
    /// Solidity-compatible struct definition for ERC-3009 `transferWithAuthorization`.
    ///
    /// This matches the EIP-3009 format used in EIP-712 typed data: who may
    /// transfer how much, valid in which time window, under which nonce.
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// EIP-712 structured data for an ERC-3009 authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    pub from: Address,
    pub to: Address,
    pub value: TokenAmount,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

/// Full payload authorizing an ERC-3009 transfer: signature plus the signed struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

/// The signed wire payload for the EIP-155 exact scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: X402Version1,
    pub scheme: ExactScheme,
    pub network: String,
    pub payload: ExactEvmPayload,
}

/// Requirements narrowed to what EIP-155 signing needs.
#[derive(Debug, Clone)]
struct Eip155Requirements {
    chain_id: u64,
    network: String,
    asset: Address,
    pay_to: Address,
    value: U256,
    max_timeout_seconds: u64,
    domain_name: String,
    domain_version: String,
}

impl Eip155Requirements {
    fn from_requirements(req: &PaymentRequirements) -> Option<Self> {
        if req.scheme != "exact" {
            return None;
        }
        let chain_id = chain_id_for(&req.network)?;
        let asset: Address = req.asset.parse().ok()?;
        let pay_to: Address = req.pay_to.parse().ok()?;
        // EIP-712 domain name/version ride along in `extra`; USDC deployments
        // reject signatures made against the wrong domain.
        let (domain_name, domain_version) = match &req.extra {
            None => (String::new(), String::new()),
            Some(extra) => (
                extra
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                extra
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
        };
        Some(Self {
            chain_id,
            network: req.network.clone(),
            asset,
            pay_to,
            value: req.max_amount_required.into(),
            max_timeout_seconds: req.max_timeout_seconds,
            domain_name,
            domain_version,
        })
    }
}

/// Scheme client for the EIP-155 "exact" scheme.
#[derive(Debug)]
pub struct Eip155ExactClient<S> {
    signer: S,
}

impl<S> Eip155ExactClient<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeClient for Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter_map(|req| {
                let requirements = Eip155Requirements::from_requirements(req)?;
                Some(PaymentCandidate {
                    network: requirements.network.clone(),
                    asset: req.asset.clone(),
                    amount: req.max_amount_required,
                    scheme: req.scheme.clone(),
                    pay_to: req.pay_to.clone(),
                    signer: Box::new(PayloadSigner {
                        signer: self.signer.clone(),
                        requirements,
                    }),
                })
            })
            .collect()
    }
}

struct PayloadSigner<S> {
    signer: S,
    requirements: Eip155Requirements,
}

#[async_trait]
impl<S> PaymentCandidateSigner for PayloadSigner<S>
where
    S: SignerLike + Send + Sync,
{
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let req = &self.requirements;
        let domain = eip712_domain! {
            name: req.domain_name.clone(),
            version: req.domain_version.clone(),
            chain_id: req.chain_id,
            verifying_contract: req.asset,
        };

        let now = UnixTimestamp::now();
        // valid_after sits in the past so the authorization is immediately usable
        let valid_after = UnixTimestamp::from_secs(now.as_secs().saturating_sub(10 * 60));
        let valid_before = now + req.max_timeout_seconds;
        let nonce: [u8; 32] = rng().random();
        let nonce = FixedBytes(nonce);

        let authorization = ExactEvmPayloadAuthorization {
            from: self.signer.address(),
            to: req.pay_to,
            value: TokenAmount(req.value),
            valid_after,
            valid_before,
            nonce,
        };

        // The values here MUST match the authorization struct exactly; the
        // facilitator reconstructs this struct to verify the signature.
        let transfer_with_authorization = TransferWithAuthorization {
            from: authorization.from,
            to: authorization.to,
            value: req.value,
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            nonce,
        };

        let eip712_hash = transfer_with_authorization.eip712_signing_hash(&domain);
        let signature = self
            .signer
            .sign_hash(&eip712_hash)
            .await
            .map_err(|e| X402Error::SigningError(format!("{e}")))?;

        let payload = PaymentPayload {
            x402_version: X402Version1,
            scheme: ExactScheme::Exact,
            network: req.network.clone(),
            payload: ExactEvmPayload {
                signature: signature.as_bytes().into(),
                authorization,
            },
        };
        let json = serde_json::to_vec(&payload)?;
        Ok(Base64Bytes::encode(&json).to_string())
    }
}

/// A trait that abstracts signing operations, allowing both owned signers and
/// Arc-wrapped signers.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, but callers may
/// want to share one `PrivateKeySigner` across scheme clients.
#[async_trait]
pub trait SignerLike {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the given hash.
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl SignerLike for Arc<PrivateKeySigner> {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self.as_ref())
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self.as_ref(), hash).await
    }
}
