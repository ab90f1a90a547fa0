//! `molty gig`: pay-per-task gig workflows.
//!
//! Gigs are server-owned records; this module only sends JSON-RPC calls and
//! renders what comes back. Creation is payment-gated (the payout pool is
//! escrowed up front); every other subcommand is a single call.

use serde::Deserialize;
use serde_json::{Value, json};

use molty_a2a::{A2aClient, Task};

use crate::amount::Amount;
use crate::cli::GigCommand;
use crate::config::Config;
use crate::error::CliError;
use crate::network::select_network;
use crate::payment::{build_x402_client, call_simple, send_with_payment};

/// A gig as returned by the server. Fields the server omits render blank.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub claimed: Option<u32>,
    #[serde(default)]
    pub completed: Option<u32>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub min_followers: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Assigned,
    PendingReview,
    Approved,
    Rejected,
    Disputed,
    Completed,
    FinalRejected,
    #[serde(other)]
    Unknown,
}

impl ClaimStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ClaimStatus::Assigned => "📌",
            ClaimStatus::PendingReview => "⏳",
            ClaimStatus::Approved => "✅",
            ClaimStatus::Rejected => "❌",
            ClaimStatus::Disputed => "⚖️",
            ClaimStatus::Completed => "🎉",
            ClaimStatus::FinalRejected => "🚫",
            ClaimStatus::Unknown => "❔",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Assigned => "assigned",
            ClaimStatus::PendingReview => "pending review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Disputed => "disputed",
            ClaimStatus::Completed => "completed",
            ClaimStatus::FinalRejected => "final rejected",
            ClaimStatus::Unknown => "unknown",
        }
    }
}

/// A worker's claim on a gig.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    #[serde(default)]
    pub gig_id: Option<String>,
    #[serde(default = "unknown_status")]
    pub status: ClaimStatus,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

fn unknown_status() -> ClaimStatus {
    ClaimStatus::Unknown
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: String,
    #[serde(default)]
    pub claim_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn run(config: &Config, a2a: &A2aClient, command: GigCommand) -> Result<(), CliError> {
    if config.identity_token.is_none() {
        return Err(CliError::MissingIdentityToken);
    }
    match command {
        GigCommand::Create {
            description,
            price,
            quantity,
            deadline_hours,
            min_followers,
            network,
        } => {
            let price: Amount = price.parse()?;
            let network = select_network(
                network.network.map(Into::into),
                config.evm_private_key.is_some(),
                config.svm_private_key.is_some(),
            )?;
            let x402 = build_x402_client(config, network)?;

            let mut params = json!({
                "description": description,
                "price": price.as_dollars(),
                "quantity": quantity,
                "network": network.as_str(),
            });
            if let Some(map) = params.as_object_mut() {
                if let Some(hours) = deadline_hours {
                    map.insert("deadlineHours".into(), json!(hours));
                }
                if let Some(min) = min_followers {
                    map.insert("minFollowers".into(), json!(min));
                }
            }

            println!("💸 Creating gig at {price} per task ({quantity} slot(s)) on {network}...");
            let task = send_with_payment(a2a, &x402, "gig.create", params).await?;
            match task.first_artifact::<Gig>() {
                Some(gig) => {
                    println!("🎉 Gig created: {}", gig.id);
                    print_gig(&gig);
                }
                None => print_status(&task, "Gig created"),
            }
        }
        GigCommand::List => {
            let task = call_simple(a2a, "gig.list", json!({})).await?;
            print_gig_list(&task, "No open gigs right now.");
        }
        GigCommand::Created => {
            let task = call_simple(a2a, "gig.created", json!({})).await?;
            print_gig_list(&task, "You have not created any gigs.");
        }
        GigCommand::Get { gig_id } => {
            let task = call_simple(a2a, "gig.get", json!({ "gigId": gig_id })).await?;
            match task.first_artifact::<Gig>() {
                Some(gig) => print_gig(&gig),
                None => print_status(&task, "No gig details returned"),
            }
        }
        GigCommand::Pick { gig_id } => {
            let task = call_simple(a2a, "gig.pick", json!({ "gigId": gig_id })).await?;
            match task.first_artifact::<Claim>() {
                Some(claim) => {
                    println!("📌 Picked gig {gig_id}; your claim id is {}", claim.id);
                    println!("   Submit with: molty gig submit {} \"<content>\"", claim.id);
                }
                None => print_status(&task, "Gig picked"),
            }
        }
        GigCommand::Picked => {
            let task = call_simple(a2a, "gig.picked", json!({})).await?;
            print_claim_list(&task, "You have not picked any gigs.");
        }
        GigCommand::Submit { claim_id, content } => {
            let task = call_simple(
                a2a,
                "gig.submit",
                json!({ "claimId": claim_id, "content": content }),
            )
            .await?;
            print_status(&task, "Work submitted, awaiting review");
        }
        GigCommand::Review {
            claim_id,
            verdict,
            feedback,
        } => {
            let mut params = json!({ "claimId": claim_id, "verdict": verdict.as_str() });
            if let (Some(map), Some(feedback)) = (params.as_object_mut(), feedback) {
                map.insert("feedback".into(), json!(feedback));
            }
            let task = call_simple(a2a, "gig.review", params).await?;
            print_status(&task, "Review recorded");
        }
        GigCommand::Dispute { claim_id, reason } => {
            let mut params = json!({ "claimId": claim_id });
            if let (Some(map), Some(reason)) = (params.as_object_mut(), reason) {
                map.insert("reason".into(), json!(reason));
            }
            let task = call_simple(a2a, "gig.dispute", params).await?;
            print_status(&task, "Dispute filed");
        }
        GigCommand::Disputes => {
            let task = call_simple(a2a, "gig.disputes", json!({})).await?;
            print_dispute_list(&task, "No disputes awaiting resolution.");
        }
        GigCommand::Resolve {
            dispute_id,
            winner,
            note,
        } => {
            let mut params = json!({ "disputeId": dispute_id, "winner": winner.as_str() });
            if let (Some(map), Some(note)) = (params.as_object_mut(), note) {
                map.insert("note".into(), json!(note));
            }
            let task = call_simple(a2a, "gig.resolve", params).await?;
            print_status(&task, "Dispute resolved");
        }
    }
    Ok(())
}

fn print_gig(gig: &Gig) {
    println!("🪧 {} — {}", gig.id, gig.description);
    if let Some(price) = gig.price {
        println!("   price: ${price} per task");
    }
    if let (Some(claimed), Some(quantity)) = (gig.claimed, gig.quantity) {
        println!("   slots: {claimed}/{quantity} claimed");
    }
    if let Some(completed) = gig.completed {
        println!("   completed: {completed}");
    }
    if let Some(deadline) = &gig.deadline {
        println!("   deadline: {deadline}");
    }
    if let Some(min) = gig.min_followers {
        println!("   min followers: {min}");
    }
    if let Some(status) = &gig.status {
        println!("   status: {status}");
    }
}

/// Collects every `T` found in the task's artifacts, flattening arrays.
fn collect<T: serde::de::DeserializeOwned>(task: &Task) -> Vec<T> {
    task.decoded_artifacts()
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items,
            other => vec![other],
        })
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn print_gig_list(task: &Task, empty: &str) {
    let gigs: Vec<Gig> = collect(task);
    if gigs.is_empty() {
        print_status(task, empty);
        return;
    }
    for gig in &gigs {
        print_gig(gig);
    }
    println!("{} gig(s)", gigs.len());
}

fn print_claim_list(task: &Task, empty: &str) {
    let claims: Vec<Claim> = collect(task);
    if claims.is_empty() {
        print_status(task, empty);
        return;
    }
    for claim in &claims {
        let gig = claim.gig_id.as_deref().unwrap_or("?");
        println!(
            "{} {} (gig {gig}) — {}",
            claim.status.icon(),
            claim.id,
            claim.status.as_str()
        );
        if let Some(feedback) = &claim.feedback {
            println!("   feedback: {feedback}");
        }
    }
}

fn print_dispute_list(task: &Task, empty: &str) {
    let disputes: Vec<Dispute> = collect(task);
    if disputes.is_empty() {
        print_status(task, empty);
        return;
    }
    for dispute in &disputes {
        let claim = dispute.claim_id.as_deref().unwrap_or("?");
        let reason = dispute.reason.as_deref().unwrap_or("no reason given");
        println!("⚖️ {} (claim {claim}): {reason}", dispute.id);
    }
}

fn print_status(task: &Task, fallback: &str) {
    let text = task.status_text();
    if text.is_empty() {
        println!("✅ {fallback}");
    } else {
        println!("{text}");
    }
}
