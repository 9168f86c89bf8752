use serde::{Deserialize, Serialize};

/// A raw inbound SMS as delivered by the message source.
///
/// The engine never mutates a message; every classification and extraction
/// is a pure function over this snapshot. `received_at` is an ISO-like
/// timestamp string (`2025-11-05T12:42:25`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsMessage {
    pub sender: String,
    pub content: String,
    pub received_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl SmsMessage {
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        received_at: impl Into<String>,
    ) -> Self {
        SmsMessage {
            sender: sender.into(),
            content: content.into(),
            received_at: received_at.into(),
            phone_number: None,
        }
    }
}

/// Latest `received_at` in a batch, used as the cache fingerprint.
pub fn latest_timestamp(messages: &[SmsMessage]) -> Option<String> {
    messages
        .iter()
        .map(|m| m.received_at.as_str())
        .max()
        .map(|ts| ts.to_string())
}
