use serde_json::Value;

use crate::{EntityReference, JobId, UtcDateTime};

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Human readable text payloads
    #[default]
    Json,
    MessagePack,
}

/// Serialized form of a [`DeferredInvocation`](crate::DeferredInvocation).
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct InvocationPayload {
    pub receiver: ReceiverPayload,
    pub method_name: String,
    pub args: Vec<Value>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverPayload {
    /// Plain value, embedded in full
    Object { type_name: String, state: Value },
    /// Persisted record, fetched again on load
    Reference(EntityReference),
}

/// Envelope handed to the surrounding queue.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct Job {
    pub id: JobId,
    pub queue: String,
    pub display_name: String,

    pub format: PayloadFormat,
    pub handler: Vec<u8>,

    pub created_at: UtcDateTime,
}
