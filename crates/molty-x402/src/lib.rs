//! x402 v1 payment handling for the molty CLI.
//!
//! This crate provides the client half of the x402 "payment required"
//! handshake: wire types for payment requirements, a scheme-client seam for
//! chain-specific signing, and two concrete scheme clients:
//!
//! - [`eip155::Eip155ExactClient`] — ERC-3009 `transferWithAuthorization`
//!   signed over EIP-712 with a local private key.
//! - [`solana::SolanaExactClient`] — a partially signed SPL token transfer,
//!   with the facilitator named as fee payer.
//!
//! Scheme clients are registered on an [`client::X402Client`], which selects a
//! candidate from the server's accepted payment methods and returns a signed,
//! base64-encoded payment payload. What happens to that payload — which
//! header or metadata field carries it — is the caller's concern.

pub mod b64;
pub mod client;
pub mod eip155;
pub mod proto;
pub mod solana;
pub mod timestamp;

pub use b64::Base64Bytes;
pub use client::{FirstMatch, PaymentCandidate, X402Client, X402Error, X402SchemeClient};
pub use proto::{PaymentRequired, PaymentRequirements};
