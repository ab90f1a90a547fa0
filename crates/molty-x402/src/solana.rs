//! Solana "exact" scheme client: a partially signed SPL token transfer.
//!
//! The client builds a v0 transaction that moves the exact amount from its
//! own associated token account to the recipient's, names the facilitator
//! (from the requirement's `extra.feePayer`) as fee payer, signs its own
//! required-signer slot, and leaves the fee payer slot empty. The server
//! completes the signature set and broadcasts.
//!
//! RPC is used only to read the mint account and fetch a recent blockhash;
//! nothing is sent on-chain from here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_keypair::Keypair;
use solana_message::VersionedMessage;
use solana_message::v0::Message as MessageV0;
use solana_pubkey::{Pubkey, pubkey};
use solana_signature::Signature;
use solana_signer::Signer;
use solana_instruction::Instruction;
use solana_transaction::versioned::VersionedTransaction;
use spl_token::solana_program::program_pack::Pack;
use std::sync::Arc;

use crate::b64::Base64Bytes;
use crate::client::{PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient};
use crate::proto::{ExactScheme, PaymentRequired, PaymentRequirements, X402Version1};

pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Solana networks the client recognizes.
const KNOWN_NETWORKS: &[&str] = &["solana", "solana-devnet"];

/// The fee payer signs nothing we build; a fixed compute budget is enough
/// for one `transfer_checked` plus budget instructions.
const COMPUTE_UNIT_LIMIT: u32 = 100_000;
const COMPUTE_UNIT_PRICE_MICRO_LAMPORTS: u64 = 1;

/// The signed wire payload for the Solana exact scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: X402Version1,
    pub scheme: ExactScheme,
    pub network: String,
    pub payload: ExactSolanaPayload,
}

/// Base64 bincode-serialized, partially signed versioned transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSolanaPayload {
    pub transaction: String,
}

/// Mint information for SPL tokens.
#[derive(Debug)]
pub enum Mint {
    Token { decimals: u8, token_program: Pubkey },
    Token2022 { decimals: u8, token_program: Pubkey },
}

impl Mint {
    pub fn token_program(&self) -> &Pubkey {
        match self {
            Mint::Token { token_program, .. } => token_program,
            Mint::Token2022 { token_program, .. } => token_program,
        }
    }
}

/// Fetch mint information from the chain to learn decimals and owning program.
pub async fn fetch_mint(mint_address: &Pubkey, rpc_client: &RpcClient) -> Result<Mint, X402Error> {
    let account = rpc_client.get_account(mint_address).await.map_err(|e| {
        X402Error::SigningError(format!("failed to fetch mint {mint_address}: {e}"))
    })?;
    if account.owner == spl_token::id() {
        let mint = spl_token::state::Mint::unpack(&account.data).map_err(|e| {
            X402Error::SigningError(format!("failed to unpack mint {mint_address}: {e}"))
        })?;
        Ok(Mint::Token {
            decimals: mint.decimals,
            token_program: spl_token::id(),
        })
    } else if account.owner == spl_token_2022::id() {
        let mint = spl_token_2022::state::Mint::unpack(&account.data).map_err(|e| {
            X402Error::SigningError(format!("failed to unpack mint {mint_address}: {e}"))
        })?;
        Ok(Mint::Token2022 {
            decimals: mint.decimals,
            token_program: spl_token_2022::id(),
        })
    } else {
        Err(X402Error::SigningError(format!(
            "failed to unpack mint {mint_address}: unknown owner"
        )))
    }
}

fn derive_ata(owner: &Pubkey, token_program: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (ata, _) = Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );
    ata
}

/// Places the signer's signature at its required-signer index, leaving the
/// other slots (the fee payer's) defaulted.
pub fn partially_sign(
    mut tx: VersionedTransaction,
    signer: &Keypair,
) -> Result<VersionedTransaction, X402Error> {
    let msg_bytes = tx.message.serialize();
    let signature = signer
        .try_sign_message(&msg_bytes)
        .map_err(|e| X402Error::SigningError(format!("{e}")))?;

    // Required signatures are the first N account keys
    let num_required = tx.message.header().num_required_signatures as usize;
    let static_keys = tx.message.static_account_keys();
    let pos = static_keys[..num_required]
        .iter()
        .position(|k| *k == signer.pubkey())
        .ok_or_else(|| {
            X402Error::SigningError("signer not among required signers".to_string())
        })?;

    if tx.signatures.len() < num_required {
        tx.signatures.resize(num_required, Signature::default());
    }
    tx.signatures[pos] = signature;
    Ok(tx)
}

/// Requirements narrowed to what Solana signing needs.
#[derive(Debug, Clone)]
struct SolanaRequirements {
    network: String,
    asset: Pubkey,
    pay_to: Pubkey,
    amount: u64,
    fee_payer: Pubkey,
}

impl SolanaRequirements {
    fn from_requirements(req: &PaymentRequirements) -> Option<Self> {
        if req.scheme != "exact" || !KNOWN_NETWORKS.contains(&req.network.as_str()) {
            return None;
        }
        let asset: Pubkey = req.asset.parse().ok()?;
        let pay_to: Pubkey = req.pay_to.parse().ok()?;
        let amount = u64::try_from(req.max_amount_required.0).ok()?;
        // Without a facilitator fee payer we cannot compile the message.
        let fee_payer: Pubkey = req
            .extra
            .as_ref()?
            .get("feePayer")
            .and_then(|v| v.as_str())?
            .parse()
            .ok()?;
        Some(Self {
            network: req.network.clone(),
            asset,
            pay_to,
            amount,
            fee_payer,
        })
    }
}

/// Scheme client for the Solana "exact" scheme.
#[derive(Clone)]
pub struct SolanaExactClient {
    signer: Arc<Keypair>,
    rpc_client: Arc<RpcClient>,
}

impl SolanaExactClient {
    pub fn new(signer: Arc<Keypair>, rpc_client: Arc<RpcClient>) -> Self {
        Self { signer, rpc_client }
    }
}

impl X402SchemeClient for SolanaExactClient {
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter_map(|req| {
                let requirements = SolanaRequirements::from_requirements(req)?;
                Some(PaymentCandidate {
                    network: requirements.network.clone(),
                    asset: req.asset.clone(),
                    amount: req.max_amount_required,
                    scheme: req.scheme.clone(),
                    pay_to: req.pay_to.clone(),
                    signer: Box::new(PayloadSigner {
                        signer: self.signer.clone(),
                        rpc_client: self.rpc_client.clone(),
                        requirements,
                    }),
                })
            })
            .collect()
    }
}

struct PayloadSigner {
    signer: Arc<Keypair>,
    rpc_client: Arc<RpcClient>,
    requirements: SolanaRequirements,
}

#[async_trait]
impl PaymentCandidateSigner for PayloadSigner {
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let req = &self.requirements;
        let mint = fetch_mint(&req.asset, &self.rpc_client).await?;
        let token_program = *mint.token_program();

        let source_ata = derive_ata(&self.signer.pubkey(), &token_program, &req.asset);
        let destination_ata = derive_ata(&req.pay_to, &token_program, &req.asset);

        let transfer_instruction: Instruction = match mint {
            Mint::Token { decimals, .. } => spl_token::instruction::transfer_checked(
                &token_program,
                &source_ata,
                &req.asset,
                &destination_ata,
                &self.signer.pubkey(),
                &[],
                req.amount,
                decimals,
            )
            .map_err(|e| X402Error::SigningError(format!("{e}")))?,
            Mint::Token2022 { decimals, .. } => spl_token_2022::instruction::transfer_checked(
                &token_program,
                &source_ata,
                &req.asset,
                &destination_ata,
                &self.signer.pubkey(),
                &[],
                req.amount,
                decimals,
            )
            .map_err(|e| X402Error::SigningError(format!("{e}")))?,
        };

        let recent_blockhash = self
            .rpc_client
            .get_latest_blockhash()
            .await
            .map_err(|e| X402Error::SigningError(format!("{e}")))?;

        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_price(COMPUTE_UNIT_PRICE_MICRO_LAMPORTS),
            ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT),
            transfer_instruction,
        ];
        let message = MessageV0::try_compile(&req.fee_payer, &instructions, &[], recent_blockhash)
            .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;

        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        };
        let tx = partially_sign(tx, self.signer.as_ref())?;

        let tx_bytes =
            bincode::serialize(&tx).map_err(|e| X402Error::SigningError(format!("{e}")))?;
        let payload = PaymentPayload {
            x402_version: X402Version1,
            scheme: ExactScheme::Exact,
            network: req.network.clone(),
            payload: ExactSolanaPayload {
                transaction: Base64Bytes::encode(&tx_bytes).to_string(),
            },
        };
        let json = serde_json::to_vec(&payload)?;
        Ok(Base64Bytes::encode(&json).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_requirements() -> PaymentRequirements {
        serde_json::from_value(json!({
            "scheme": "exact",
            "network": "solana",
            "maxAmountRequired": "500000",
            "payTo": "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
            "maxTimeoutSeconds": 600,
            "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "extra": { "feePayer": "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d" }
        }))
        .unwrap()
    }

    #[test]
    fn accepts_only_solana_requirements_with_fee_payer() {
        let client = SolanaExactClient::new(
            Arc::new(Keypair::new()),
            Arc::new(RpcClient::new("http://localhost:8899".to_string())),
        );

        let mut no_fee_payer = valid_requirements();
        no_fee_payer.extra = None;
        let mut evm = valid_requirements();
        evm.network = "base".to_string();

        let required = PaymentRequired {
            x402_version: X402Version1,
            accepts: vec![valid_requirements(), no_fee_payer, evm],
            error: None,
        };
        let candidates = client.accept(&required);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].network, "solana");
    }

    #[test]
    fn partial_sign_fills_only_the_signer_slot() {
        let payer = Keypair::new();
        let fee_payer = Keypair::new();
        let instruction = ComputeBudgetInstruction::set_compute_unit_limit(1);
        // Transfer authority must countersign, so include it as a signer account.
        let noop = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![solana_instruction::AccountMeta::new(payer.pubkey(), true)],
            data: vec![],
        };
        let message = MessageV0::try_compile(
            &fee_payer.pubkey(),
            &[instruction, noop],
            &[],
            solana_message::Hash::default(),
        )
        .unwrap();
        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        };

        let signed = partially_sign(tx, &payer).unwrap();
        assert_eq!(signed.signatures.len(), 2);
        // Fee payer slot (index 0) stays empty for the facilitator to fill.
        assert_eq!(signed.signatures[0], Signature::default());
        assert_ne!(signed.signatures[1], Signature::default());
    }

    #[test]
    fn partial_sign_rejects_foreign_signer() {
        let stranger = Keypair::new();
        let fee_payer = Keypair::new();
        let message = MessageV0::try_compile(
            &fee_payer.pubkey(),
            &[ComputeBudgetInstruction::set_compute_unit_limit(1)],
            &[],
            solana_message::Hash::default(),
        )
        .unwrap();
        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        };
        assert!(partially_sign(tx, &stranger).is_err());
    }
}
