//! The two-phase x402 payment flow over A2A.
//!
//! Phase 1 submits the intended action. If the server answers with payment
//! requirements, carried either in the task's status-message metadata or in
//! an HTTP 402 body, the registered scheme clients sign a payment and the
//! same call is resubmitted with the task id and the payload attached.

use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use serde_json::{Value, json};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_keypair::Keypair;

use molty_a2a::{A2aClient, A2aError, CallResult, Task};
use molty_x402::eip155::Eip155ExactClient;
use molty_x402::proto::{PAYMENT_PAYLOAD_KEY, PAYMENT_REQUIRED_KEY};
use molty_x402::solana::SolanaExactClient;
use molty_x402::{PaymentRequired, X402Client, X402Error};

use crate::config::Config;
use crate::network::Network;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("EVM_PRIVATE_KEY is not a valid private key: {0}")]
    BadEvmKey(String),
    #[error("SVM_PRIVATE_KEY is not a valid base58 keypair: {0}")]
    BadSvmKey(String),
    #[error("{variable} must be set to pay on {network}")]
    MissingKey {
        variable: &'static str,
        network: Network,
    },
    #[error(transparent)]
    A2a(#[from] A2aError),
    #[error(transparent)]
    Signing(#[from] X402Error),
    #[error("could not read payment requirements: {0}")]
    BadRequirements(serde_json::Error),
    #[error("server demanded payment again after a payment was submitted")]
    PaymentNotAccepted,
    #[error("server unexpectedly demanded payment for {method}")]
    UnexpectedPaymentRequired { method: String },
    #[error("task {state}: {message}")]
    TaskFailed { state: String, message: String },
}

/// Builds an x402 client with the scheme client for the selected network.
pub fn build_x402_client(config: &Config, network: Network) -> Result<X402Client, PaymentError> {
    match network {
        Network::Base => {
            let key = config
                .evm_private_key
                .as_deref()
                .ok_or(PaymentError::MissingKey {
                    variable: "EVM_PRIVATE_KEY",
                    network,
                })?;
            let signer: PrivateKeySigner = key
                .parse()
                .map_err(|e: alloy_signer_local::LocalSignerError| {
                    PaymentError::BadEvmKey(e.to_string())
                })?;
            Ok(X402Client::new().register(Eip155ExactClient::new(signer)))
        }
        Network::Solana => {
            let key = config
                .svm_private_key
                .as_deref()
                .ok_or(PaymentError::MissingKey {
                    variable: "SVM_PRIVATE_KEY",
                    network,
                })?;
            let bytes = bs58::decode(key)
                .into_vec()
                .map_err(|e| PaymentError::BadSvmKey(e.to_string()))?;
            let keypair =
                Keypair::try_from(bytes.as_slice()).map_err(|e| PaymentError::BadSvmKey(e.to_string()))?;
            let rpc_client = Arc::new(RpcClient::new(config.svm_rpc_url.clone()));
            Ok(X402Client::new().register(SolanaExactClient::new(Arc::new(keypair), rpc_client)))
        }
    }
}

fn ensure_ok(task: Task) -> Result<Task, PaymentError> {
    let state = task.state();
    if state.is_terminal_failure() {
        let message = match task.status_text() {
            text if text.is_empty() => "no further detail from server".to_string(),
            text => text,
        };
        return Err(PaymentError::TaskFailed {
            state: state.to_string(),
            message,
        });
    }
    Ok(task)
}

/// Payment requirements extracted from a phase-1 response, with the task id
/// to correlate the resubmission when the server provided one.
fn payment_demand(result: &CallResult) -> Result<Option<(PaymentRequired, Option<String>)>, PaymentError> {
    match result {
        CallResult::PaymentRequired(body) => {
            let required =
                serde_json::from_value(body.clone()).map_err(PaymentError::BadRequirements)?;
            Ok(Some((required, None)))
        }
        CallResult::Task(task) => match task.metadata_value(PAYMENT_REQUIRED_KEY) {
            Some(value) => {
                let required =
                    serde_json::from_value(value.clone()).map_err(PaymentError::BadRequirements)?;
                Ok(Some((required, task.id.clone())))
            }
            None => Ok(None),
        },
    }
}

/// Performs a call that may be gated behind an x402 payment.
pub async fn send_with_payment(
    a2a: &A2aClient,
    x402: &X402Client,
    method: &str,
    params: Value,
) -> Result<Task, PaymentError> {
    let first = a2a.call(method, params.clone()).await?;
    let Some((required, task_id)) = payment_demand(&first)? else {
        return match first {
            CallResult::Task(task) => ensure_ok(task),
            // Unreachable: payment_demand returns Some for this variant.
            CallResult::PaymentRequired(_) => Err(PaymentError::PaymentNotAccepted),
        };
    };

    tracing::info!(%method, accepts = required.accepts.len(), "payment required, signing");
    let payload = x402.sign_payment(&required).await?;

    let mut resubmit = params;
    if let Some(map) = resubmit.as_object_mut() {
        if let Some(id) = task_id {
            map.insert("taskId".to_string(), json!(id));
        }
        map.insert("metadata".to_string(), json!({ PAYMENT_PAYLOAD_KEY: payload }));
    }

    let second = a2a.call(method, resubmit).await?;
    if payment_demand(&second)?.is_some() {
        return Err(PaymentError::PaymentNotAccepted);
    }
    match second {
        CallResult::Task(task) => ensure_ok(task),
        CallResult::PaymentRequired(_) => Err(PaymentError::PaymentNotAccepted),
    }
}

/// Performs a call that must not require payment.
pub async fn call_simple(
    a2a: &A2aClient,
    method: &str,
    params: Value,
) -> Result<Task, PaymentError> {
    match a2a.call(method, params).await? {
        CallResult::Task(task) => {
            if task.metadata_value(PAYMENT_REQUIRED_KEY).is_some() {
                return Err(PaymentError::UnexpectedPaymentRequired {
                    method: method.to_string(),
                });
            }
            ensure_ok(task)
        }
        CallResult::PaymentRequired(_) => Err(PaymentError::UnexpectedPaymentRequired {
            method: method.to_string(),
        }),
    }
}
