//! Wire types for version 1 of the x402 protocol, as carried over the A2A
//! JSON-RPC transport.
//!
//! The resource server signals "payment required" either through a task's
//! status message metadata (under [`PAYMENT_REQUIRED_KEY`]) or through a raw
//! HTTP 402 body. Both carry a [`PaymentRequired`] value. The client answers
//! by resubmitting with a signed payload under [`PAYMENT_PAYLOAD_KEY`].

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;

/// URI of the x402 payments extension, announced on every A2A request.
pub const X402_EXTENSION_URI: &str = "https://github.com/google-agentic-commerce/a2a-x402/v0.1";

/// Message metadata key carrying a [`PaymentRequired`] value.
pub const PAYMENT_REQUIRED_KEY: &str = "x402.payment.required";

/// Message metadata key carrying the signed, base64-encoded payment payload.
pub const PAYMENT_PAYLOAD_KEY: &str = "x402.payment.payload";

/// Message metadata key carrying the server's settlement status.
pub const PAYMENT_STATUS_KEY: &str = "x402.payment.status";

/// Version 1 of the x402 protocol.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl From<X402Version1> for u8 {
    fn from(_: X402Version1) -> Self {
        X402Version1::VALUE
    }
}

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// The "exact" payment scheme: transfer a fixed amount, nothing else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum ExactScheme {
    #[serde(rename = "exact")]
    Exact,
}

impl Display for ExactScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exact")
    }
}

/// A raw on-chain token amount in the asset's smallest unit.
///
/// Serialized as a decimal string to survive JSON number limits; accepts
/// decimal strings, `0x`-prefixed hex strings, and plain integers on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenAmount(pub U256);

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        TokenAmount(U256::from(value))
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(u64),
        }
        let value = match Wire::deserialize(deserializer)? {
            Wire::Number(n) => U256::from(n),
            Wire::Text(s) => {
                let (digits, radix) = match s.strip_prefix("0x") {
                    Some(hex) => (hex, 16),
                    None => (s.as_str(), 10),
                };
                U256::from_str_radix(digits, radix)
                    .map_err(|e| serde::de::Error::custom(format!("invalid token amount: {e}")))?
            }
        };
        Ok(TokenAmount(value))
    }
}

/// Requirements set by the server for one acceptable payment method.
///
/// Addresses are kept as strings here; scheme clients parse them into their
/// chain-native forms and refuse requirements they cannot represent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: TokenAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub pay_to: String,
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

fn default_max_timeout_seconds() -> u64 {
    300
}

/// Payment-required signal: the list of acceptable payment methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: X402Version1,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Settlement receipt decoded from a response artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_amount_accepts_decimal_and_hex_strings() {
        let decimal: TokenAmount = serde_json::from_value(json!("500000")).unwrap();
        assert_eq!(decimal, TokenAmount::from(500000u64));
        let hex: TokenAmount = serde_json::from_value(json!("0x7a120")).unwrap();
        assert_eq!(hex, decimal);
        let number: TokenAmount = serde_json::from_value(json!(500000)).unwrap();
        assert_eq!(number, decimal);
    }

    #[test]
    fn token_amount_serializes_as_decimal_string() {
        let amount = TokenAmount::from(500000u64);
        assert_eq!(serde_json::to_value(amount).unwrap(), json!("500000"));
    }

    #[test]
    fn payment_required_parses_server_shape() {
        let value = json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base",
                "maxAmountRequired": "500000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 600,
                "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
                "extra": { "name": "USD Coin", "version": "2" }
            }]
        });
        let parsed: PaymentRequired = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.accepts.len(), 1);
        assert_eq!(parsed.accepts[0].network, "base");
        assert_eq!(
            parsed.accepts[0].max_amount_required,
            TokenAmount::from(500000u64)
        );
    }

    #[test]
    fn payment_required_rejects_wrong_version() {
        let value = json!({ "x402Version": 3, "accepts": [] });
        let parsed: Result<PaymentRequired, _> = serde_json::from_value(value);
        assert!(parsed.is_err());
    }
}
