//! Task result types for the A2A protocol.
//!
//! Every method call resolves to a [`Task`]: a server-owned record with a
//! status message and optional artifacts. The CLI never computes task state
//! transitions; it only reads what the server returns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle states a task can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Failure states inside an otherwise successful HTTP exchange are
    /// treated the same as transport errors.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, TaskState::Failed | TaskState::Canceled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
            TaskState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One part of a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
    #[serde(other)]
    Unknown,
}

/// A status message attached to a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// Current status of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// An output attached to a completed task. Text parts hold base64-encoded
/// JSON payloads; data parts hold JSON directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A server-owned task record returned from a JSON-RPC call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

impl Task {
    /// Reads a value from the status message metadata.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.status
            .as_ref()?
            .message
            .as_ref()?
            .metadata
            .get(key)
    }

    /// The task state, defaulting to `Unknown` when the server omits status.
    pub fn state(&self) -> TaskState {
        self.status
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(TaskState::Unknown)
    }

    /// Concatenated text parts of the status message.
    pub fn status_text(&self) -> String {
        let parts = self
            .status
            .as_ref()
            .and_then(|s| s.message.as_ref())
            .map(|m| m.parts.as_slice())
            .unwrap_or_default();
        parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Decodes every artifact part into JSON: text parts are base64-decoded
    /// first, data parts are taken as-is. Parts that do not decode are
    /// skipped; the server may attach artifacts this client does not know.
    pub fn decoded_artifacts(&self) -> Vec<Value> {
        self.artifacts
            .iter()
            .flat_map(|artifact| artifact.parts.iter())
            .filter_map(|part| match part {
                Part::Text { text } => b64
                    .decode(text.as_bytes())
                    .ok()
                    .and_then(|bytes| serde_json::from_slice(&bytes).ok()),
                Part::Data { data } => Some(data.clone()),
                Part::Unknown => None,
            })
            .collect()
    }

    /// Finds the first decoded artifact deserializing into `T`.
    pub fn first_artifact<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.decoded_artifacts()
            .into_iter()
            .find_map(|v| serde_json::from_value(v).ok())
    }
}
