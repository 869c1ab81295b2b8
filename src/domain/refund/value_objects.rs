use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::RefundError;

// ============================================================================
// Refund Value Objects
// ============================================================================

/// Human-readable refund code (e.g. `RF-2002`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefundCode(String);

impl RefundCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn generate(prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        Self(format!("{}-{}", prefix, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefundCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Reviewing,
    Approved,
    Denied,
    Processed,
}

impl RefundStatus {
    pub const ALL: [RefundStatus; 5] = [
        RefundStatus::Pending,
        RefundStatus::Reviewing,
        RefundStatus::Approved,
        RefundStatus::Denied,
        RefundStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Reviewing => "reviewing",
            RefundStatus::Approved => "approved",
            RefundStatus::Denied => "denied",
            RefundStatus::Processed => "processed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RefundStatus::Denied | RefundStatus::Processed)
    }

    /// Forward-only: a refund can be decided without review, but a decision
    /// is never reopened. Re-setting the current status is allowed (resend).
    pub fn can_transition_to(&self, next: RefundStatus) -> bool {
        use RefundStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Reviewing | Approved | Denied)
                | (Reviewing, Approved | Denied)
                | (Approved, Processed)
        )
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefundStatus {
    type Err = RefundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RefundStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| RefundError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Customer,
    Operator,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSender::Customer => "customer",
            MessageSender::Operator => "operator",
        }
    }
}

impl FromStr for MessageSender {
    type Err = RefundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(MessageSender::Customer),
            "operator" | "admin" => Ok(MessageSender::Operator),
            _ => Err(RefundError::UnknownSender(s.to_string())),
        }
    }
}

/// One entry in a refund's message thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundMessage {
    pub from: MessageSender,
    pub message: String,
    pub date: DateTime<Utc>,
}
