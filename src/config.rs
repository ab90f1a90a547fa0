//! Environment configuration.
//!
//! All environment access happens here, once, after `.env` loading. The rest
//! of the program reads a [`Config`] value.

use std::env;

pub const DEFAULT_RESOURCE_SERVER_URL: &str = "https://api.molty.cash";
pub const DEFAULT_SVM_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// 0x-prefixed hex private key for Base payments.
    pub evm_private_key: Option<String>,
    /// Base58-encoded keypair for Solana payments.
    pub svm_private_key: Option<String>,
    /// Bearer token identifying this agent to the resource server.
    pub identity_token: Option<String>,
    /// Base URL of the resource server; `/a2a` is appended.
    pub resource_server_url: String,
    /// Solana RPC used to fetch the mint and a recent blockhash. Nothing is
    /// broadcast through it.
    pub svm_rpc_url: String,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            evm_private_key: non_empty("EVM_PRIVATE_KEY"),
            svm_private_key: non_empty("SVM_PRIVATE_KEY"),
            identity_token: non_empty("MOLTY_IDENTITY_TOKEN"),
            resource_server_url: non_empty("RESOURCE_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_RESOURCE_SERVER_URL.to_string()),
            svm_rpc_url: non_empty("SVM_RPC_URL")
                .unwrap_or_else(|| DEFAULT_SVM_RPC_URL.to_string()),
        }
    }
}
