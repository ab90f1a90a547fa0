//! `molty send`: a one-off USDC payment to an agent.

use serde_json::json;

use molty_a2a::A2aClient;
use molty_x402::proto::PaymentReceipt;

use crate::amount::Amount;
use crate::config::Config;
use crate::error::CliError;
use crate::network::{Network, select_network};
use crate::payment::{build_x402_client, send_with_payment};
use crate::recipient::Recipient;

pub async fn run(
    config: &Config,
    a2a: &A2aClient,
    recipient: &str,
    amount: &str,
    network_flag: Option<Network>,
) -> Result<(), CliError> {
    let recipient: Recipient = recipient.parse()?;
    let amount: Amount = amount.parse()?;
    let network = select_network(
        network_flag,
        config.evm_private_key.is_some(),
        config.svm_private_key.is_some(),
    )?;
    let x402 = build_x402_client(config, network)?;

    println!("💸 Sending {amount} to {recipient} on {network}...");
    let params = json!({
        "recipient": {
            "platform": recipient.platform(),
            "username": recipient.username(),
        },
        "amount": amount.as_dollars(),
        "network": network.as_str(),
    });
    let task = send_with_payment(a2a, &x402, "molty.send", params).await?;

    match task.first_artifact::<PaymentReceipt>() {
        Some(receipt) if receipt.success => {
            let paid = receipt.amount.map_or_else(|| amount.to_string(), |a| format!("${a}"));
            println!("✅ Sent {paid} to {recipient}");
            if let Some(tx) = receipt.transaction {
                println!("   tx: {tx}");
            }
            if let Some(network) = receipt.network {
                println!("   network: {network}");
            }
        }
        Some(receipt) => {
            let reason = receipt
                .error_reason
                .unwrap_or_else(|| "payment was not settled".to_string());
            return Err(CliError::Receipt(reason));
        }
        None => {
            // No structured receipt; the status message is all we have.
            let text = task.status_text();
            if text.is_empty() {
                println!("✅ Payment accepted ({})", task.state());
            } else {
                println!("✅ {text}");
            }
        }
    }
    Ok(())
}
