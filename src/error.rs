//! Top-level CLI error type. Every failure path funnels into [`CliError`],
//! printed once with a ❌ prefix, exit code 1.

use crate::amount::AmountError;
use crate::network::NetworkError;
use crate::payment::PaymentError;
use crate::recipient::RecipientError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Recipient(#[from] RecipientError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    A2a(#[from] molty_a2a::A2aError),
    #[error("MOLTY_IDENTITY_TOKEN must be set for gig commands")]
    MissingIdentityToken,
    #[error("payment failed: {0}")]
    Receipt(String),
}
