use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Sent { message_id: MessageId },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub to: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryResult {
    pub fn sent(to: impl Into<String>, message_id: MessageId) -> Self {
        Self {
            to: to.into(),
            outcome: DeliveryOutcome::Sent { message_id },
        }
    }

    pub fn failed(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            outcome: DeliveryOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Sent { .. })
    }
}

/// Outcome of one dispatch. `map_link` is always populated, even when no
/// message went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub results: Vec<DeliveryResult>,
    pub map_link: String,
}

impl DeliveryReport {
    /// True when no delivery was attempted at all.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.results.iter().filter(|result| result.is_sent()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.sent_count()
    }

    pub fn all_failed(&self) -> bool {
        !self.is_empty() && self.sent_count() == 0
    }
}
