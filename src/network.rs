//! Payment network selection.
//!
//! The network is chosen from the `--network` flag and which private keys
//! are configured. Selection is a pure function so every combination is
//! unit-testable.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Base,
    Solana,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::Solana => "solana",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NetworkError {
    #[error("--network {network} requires {variable} to be set")]
    MissingKey {
        network: Network,
        variable: &'static str,
    },
    #[error(
        "both EVM_PRIVATE_KEY and SVM_PRIVATE_KEY are set; pass --network base or --network solana"
    )]
    Ambiguous,
    #[error(
        "no payment key configured; set EVM_PRIVATE_KEY (Base) or SVM_PRIVATE_KEY (Solana) in the environment or a .env file"
    )]
    NoKeys,
}

/// Picks the payment network from the flag and the configured keys.
pub fn select_network(
    flag: Option<Network>,
    has_evm_key: bool,
    has_svm_key: bool,
) -> Result<Network, NetworkError> {
    match flag {
        Some(Network::Base) if has_evm_key => Ok(Network::Base),
        Some(Network::Base) => Err(NetworkError::MissingKey {
            network: Network::Base,
            variable: "EVM_PRIVATE_KEY",
        }),
        Some(Network::Solana) if has_svm_key => Ok(Network::Solana),
        Some(Network::Solana) => Err(NetworkError::MissingKey {
            network: Network::Solana,
            variable: "SVM_PRIVATE_KEY",
        }),
        None => match (has_evm_key, has_svm_key) {
            (true, false) => Ok(Network::Base),
            (false, true) => Ok(Network::Solana),
            (true, true) => Err(NetworkError::Ambiguous),
            (false, false) => Err(NetworkError::NoKeys),
        },
    }
}
