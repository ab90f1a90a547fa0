//! Recipient parsing: `<platform>/<username>`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

static MOLTBOOK_USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9_-]{1,30}$").expect("static pattern"));

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecipientError {
    #[error(
        "invalid recipient {input:?}: expected <platform>/<username>, e.g. \"x/nikitabier\" or \"moltbook/somebot\""
    )]
    MissingSeparator { input: String },
    #[error("unknown platform {platform:?}: supported platforms are \"x\" and \"moltbook\"")]
    UnknownPlatform { platform: String },
    #[error("invalid moltbook username {username:?}: use 1-30 letters, digits, '_' or '-'")]
    InvalidUsername { username: String },
}

/// A payment recipient on a supported platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    X(String),
    Moltbook(String),
}

impl Recipient {
    pub fn platform(&self) -> &'static str {
        match self {
            Recipient::X(_) => "x",
            Recipient::Moltbook(_) => "moltbook",
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Recipient::X(username) | Recipient::Moltbook(username) => username,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform(), self.username())
    }
}

impl FromStr for Recipient {
    type Err = RecipientError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (platform, username) =
            input
                .split_once('/')
                .ok_or_else(|| RecipientError::MissingSeparator {
                    input: input.to_string(),
                })?;
        match platform.to_ascii_lowercase().as_str() {
            "x" | "twitter" => {
                let username = username.strip_prefix('@').unwrap_or(username);
                if username.is_empty() {
                    return Err(RecipientError::MissingSeparator {
                        input: input.to_string(),
                    });
                }
                Ok(Recipient::X(username.to_string()))
            }
            "moltbook" | "molt" => {
                if !MOLTBOOK_USERNAME.is_match(username) {
                    return Err(RecipientError::InvalidUsername {
                        username: username.to_string(),
                    });
                }
                Ok(Recipient::Moltbook(username.to_string()))
            }
            other => Err(RecipientError::UnknownPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Recipient, RecipientError> {
        s.parse()
    }

    #[test]
    fn x_handles_parse_with_aliases() {
        assert_eq!(parse("x/nikitabier").unwrap(), Recipient::X("nikitabier".into()));
        assert_eq!(parse("twitter/@someone").unwrap(), Recipient::X("someone".into()));
    }

    #[test]
    fn moltbook_usernames_are_validated() {
        assert_eq!(
            parse("moltbook/Foo_1").unwrap(),
            Recipient::Moltbook("Foo_1".into())
        );
        assert_eq!(
            parse("molt/agent-7").unwrap(),
            Recipient::Moltbook("agent-7".into())
        );
        assert!(matches!(
            parse("moltbook/bad!name"),
            Err(RecipientError::InvalidUsername { .. })
        ));
        assert!(matches!(
            parse(&format!("moltbook/{}", "a".repeat(31))),
            Err(RecipientError::InvalidUsername { .. })
        ));
    }

    #[test]
    fn missing_separator_and_unknown_platform_error() {
        assert!(matches!(
            parse("nohandle"),
            Err(RecipientError::MissingSeparator { .. })
        ));
        assert!(matches!(
            parse("github/octocat"),
            Err(RecipientError::UnknownPlatform { .. })
        ));
    }
}
