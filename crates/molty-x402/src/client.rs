//! Client-side orchestration of x402 scheme clients and payment selection.
//!
//! An [`X402Client`] owns a set of registered [`X402SchemeClient`]s, one per
//! chain family and scheme. Given a [`PaymentRequired`] signal from the
//! server, it collects candidates from every registered scheme, lets a
//! [`PaymentSelector`] pick one, and asks the winning candidate to sign,
//! producing a base64 payment payload ready for resubmission.

use async_trait::async_trait;
use std::sync::Arc;

use crate::proto::{PaymentRequired, TokenAmount};

/// Errors that can occur while selecting or signing a payment.
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The server's payment-required data could not be interpreted.
    #[error("Invalid payment requirements: {0}")]
    ParseError(String),
    /// No registered scheme client can satisfy any accepted payment method.
    #[error("No registered signer matches the payment methods offered by the server")]
    NoMatchingPaymentOption,
    /// Chain-level signing failed.
    #[error("Failed to sign payment payload: {0}")]
    SigningError(String),
    /// The constructed payload could not be serialized.
    #[error("Failed to encode payment payload to json")]
    JsonEncodeError(#[from] serde_json::Error),
}

/// One payment method a registered scheme client is able to execute.
pub struct PaymentCandidate {
    pub network: String,
    pub asset: String,
    pub amount: TokenAmount,
    pub scheme: String,
    pub pay_to: String,
    pub signer: Box<dyn PaymentCandidateSigner>,
}

/// Produces a signed, base64-encoded payment payload for one candidate.
#[async_trait]
pub trait PaymentCandidateSigner: Send + Sync {
    async fn sign_payment(&self) -> Result<String, X402Error>;
}

impl PaymentCandidate {
    pub async fn sign(&self) -> Result<String, X402Error> {
        self.signer.sign_payment().await
    }
}

/// A chain- and scheme-specific payment client.
///
/// `accept` inspects the server's payment-required data and returns every
/// payment method this client could execute. Requirements the client cannot
/// represent (wrong network, unparseable addresses, missing extras) are
/// silently skipped rather than rejected.
pub trait X402SchemeClient: Send + Sync {
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate>;
}

/// Trait for selecting the best payment candidate from available options.
pub trait PaymentSelector: Send + Sync {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate>;
}

/// Default selector: returns the first matching candidate.
/// Order is determined by registration order of scheme clients.
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.first()
    }
}

/// Internal collection of registered scheme clients.
#[derive(Default)]
pub struct SchemeRegistry(Vec<Arc<dyn X402SchemeClient>>);

impl SchemeRegistry {
    pub fn push<T: X402SchemeClient + 'static>(&mut self, client: T) {
        self.0.push(Arc::new(client));
    }

    /// Finds all payment candidates that can handle the given payment requirements.
    pub fn candidates(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        let mut candidates = vec![];
        for client in self.0.iter() {
            candidates.extend(client.accept(payment_required));
        }
        candidates
    }
}

/// The main x402 client: registered scheme clients plus a selection strategy.
pub struct X402Client<TSelector = FirstMatch> {
    schemes: SchemeRegistry,
    selector: TSelector,
}

impl X402Client<FirstMatch> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for X402Client<FirstMatch> {
    fn default() -> Self {
        Self {
            schemes: SchemeRegistry::default(),
            selector: FirstMatch,
        }
    }
}

impl<TSelector> X402Client<TSelector> {
    /// Registers a scheme client. Multiple clients may be registered; the
    /// selector decides among their candidates.
    pub fn register<S>(mut self, scheme: S) -> Self
    where
        S: X402SchemeClient + 'static,
    {
        self.schemes.push(scheme);
        self
    }

    /// Replaces the default [`FirstMatch`] selector.
    pub fn with_selector<P: PaymentSelector + 'static>(self, selector: P) -> X402Client<P> {
        X402Client {
            selector,
            schemes: self.schemes,
        }
    }
}

impl<TSelector> X402Client<TSelector>
where
    TSelector: PaymentSelector,
{
    /// Selects a payment method and signs it.
    ///
    /// Returns the base64-encoded payment payload to include when
    /// resubmitting the gated request.
    pub async fn sign_payment(
        &self,
        payment_required: &PaymentRequired,
    ) -> Result<String, X402Error> {
        let candidates = self.schemes.candidates(payment_required);
        let selected = self
            .selector
            .select(&candidates)
            .ok_or(X402Error::NoMatchingPaymentOption)?;
        tracing::debug!(
            network = %selected.network,
            scheme = %selected.scheme,
            amount = %selected.amount,
            "Selected payment candidate"
        );
        selected.sign().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{PaymentRequirements, X402Version1};

    struct StaticSigner(String);

    #[async_trait]
    impl PaymentCandidateSigner for StaticSigner {
        async fn sign_payment(&self) -> Result<String, X402Error> {
            Ok(self.0.clone())
        }
    }

    struct OnlyNetwork(&'static str);

    impl X402SchemeClient for OnlyNetwork {
        fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
            payment_required
                .accepts
                .iter()
                .filter(|r| r.network == self.0)
                .map(|r| PaymentCandidate {
                    network: r.network.clone(),
                    asset: r.asset.clone(),
                    amount: r.max_amount_required,
                    scheme: r.scheme.clone(),
                    pay_to: r.pay_to.clone(),
                    signer: Box::new(StaticSigner(format!("signed-{}", self.0))),
                })
                .collect()
        }
    }

    fn requirements(network: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: network.to_string(),
            max_amount_required: TokenAmount::from(500000u64),
            resource: None,
            description: String::new(),
            mime_type: None,
            pay_to: "recipient".to_string(),
            max_timeout_seconds: 600,
            asset: "usdc".to_string(),
            extra: None,
        }
    }

    #[tokio::test]
    async fn signs_with_first_matching_scheme() {
        let client = X402Client::new()
            .register(OnlyNetwork("base"))
            .register(OnlyNetwork("solana"));
        let required = PaymentRequired {
            x402_version: X402Version1,
            accepts: vec![requirements("solana"), requirements("base")],
            error: None,
        };
        let payload = client.sign_payment(&required).await.unwrap();
        // Registration order wins, not the server's ordering of accepts.
        assert_eq!(payload, "signed-base");
    }

    #[tokio::test]
    async fn errors_when_no_scheme_matches() {
        let client = X402Client::new().register(OnlyNetwork("base"));
        let required = PaymentRequired {
            x402_version: X402Version1,
            accepts: vec![requirements("solana")],
            error: None,
        };
        let result = client.sign_payment(&required).await;
        assert!(matches!(result, Err(X402Error::NoMatchingPaymentOption)));
    }
}
