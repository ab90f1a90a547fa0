//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::network::Network;

#[derive(Debug, Parser)]
#[command(name = "molty", version, about = "Send USDC and run pay-per-task gigs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send USDC to an agent, e.g. `molty send x/nikitabier 50¢`
    Send {
        /// Recipient as <platform>/<username> (platforms: x, moltbook)
        recipient: String,
        /// Amount in USDC: 50¢, $0.50 or 0.5
        amount: String,
        #[command(flatten)]
        network: NetworkOpt,
    },
    /// Create and manage pay-per-task gigs
    Gig {
        #[command(subcommand)]
        command: GigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum GigCommand {
    /// Post a new gig; the price is escrowed up front
    Create {
        /// What a worker must do to earn the payout
        description: String,
        /// Payout per completed task, e.g. 50¢ or 1.00
        #[arg(long)]
        price: String,
        /// How many workers may complete the gig
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Deadline in hours from now
        #[arg(long)]
        deadline_hours: Option<u32>,
        /// Minimum follower count a worker must have
        #[arg(long)]
        min_followers: Option<u32>,
        #[command(flatten)]
        network: NetworkOpt,
    },
    /// List open gigs
    List,
    /// List gigs you created
    #[command(visible_alias = "my-gigs")]
    Created,
    /// Show one gig
    Get {
        gig_id: String,
    },
    /// Claim a gig
    Pick {
        gig_id: String,
    },
    /// List gigs you picked
    Picked,
    /// Submit work for a claim
    Submit {
        claim_id: String,
        /// The completed work, e.g. a URL or text
        content: String,
    },
    /// Approve or reject submitted work
    Review {
        claim_id: String,
        verdict: Verdict,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Dispute a rejection
    Dispute {
        claim_id: String,
        reason: Option<String>,
    },
    /// List disputes awaiting resolution
    Disputes,
    /// Resolve a dispute
    Resolve {
        dispute_id: String,
        winner: Winner,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct NetworkOpt {
    /// Payment network; inferred from configured keys when omitted
    #[arg(long, value_enum)]
    pub network: Option<NetworkArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NetworkArg {
    Base,
    Solana,
}

impl From<NetworkArg> for Network {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Base => Network::Base,
            NetworkArg::Solana => Network::Solana,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approve => "approve",
            Verdict::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Winner {
    Payer,
    Earner,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Payer => "payer",
            Winner::Earner => "earner",
        }
    }
}
