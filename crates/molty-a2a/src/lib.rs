//! JSON-RPC 2.0 client for the molty resource server's A2A endpoint.
//!
//! All operations — payments and gig actions alike — are JSON-RPC method
//! calls POSTed to `{base}/a2a`. Results arrive as [`task::Task`] values;
//! failures arrive either as JSON-RPC error envelopes or as plain HTTP
//! errors. An HTTP 402 is not an error at this layer: its body carries
//! payment-requirement data the caller hands to a payment client.

pub mod client;
pub mod jsonrpc;
pub mod task;

pub use client::{A2aClient, A2aError, CallResult};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use task::{Artifact, Message, Part, Task, TaskState, TaskStatus};
