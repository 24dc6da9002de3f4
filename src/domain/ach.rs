use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::{AccountId, UserId};

pub type AchTransferId = u32;

/// Direction of an originated ACH transfer, seen from this bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchAccountType {
    Checking,
    Savings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Returned,
}

/// Client-initiated ACH request, already schema-validated by the route layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchTransferRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub routing_number: String,
    pub account_number: String,
    pub account_type: AchAccountType,
    pub direction: AchDirection,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAchTransfer {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub routing_number: String,
    pub account_number: String,
    pub account_type: AchAccountType,
    pub description: Option<String>,
    pub direction: AchDirection,
    pub status: AchStatus,
}

impl NewAchTransfer {
    pub fn pending(user_id: UserId, request: AchTransferRequest) -> Self {
        Self {
            user_id,
            account_id: request.account_id,
            amount: request.amount,
            routing_number: request.routing_number,
            account_number: request.account_number,
            account_type: request.account_type,
            description: request.description,
            direction: request.direction,
            status: AchStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchTransfer {
    pub id: AchTransferId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub routing_number: String,
    pub account_number: String,
    pub account_type: AchAccountType,
    pub description: Option<String>,
    pub direction: AchDirection,
    pub status: AchStatus,
    pub trace_number: String,
    pub batch_id: String,
    pub date: DateTime<Utc>,
}

impl AchTransfer {
    pub(crate) fn stored(id: AchTransferId, new: NewAchTransfer, date: DateTime<Utc>) -> Self {
        let stamp = date.format("%y%m%d");
        Self {
            id,
            user_id: new.user_id,
            account_id: new.account_id,
            amount: new.amount,
            routing_number: new.routing_number,
            account_number: new.account_number,
            account_type: new.account_type,
            description: new.description,
            direction: new.direction,
            status: new.status,
            trace_number: format!("ACH{}{:07}", stamp, id),
            batch_id: format!("BATCH{}{:06}", stamp, id),
            date,
        }
    }
}

/// Direction of an inbound entry, seen from the receiving account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Credit,
    Debit,
}

impl EntryDirection {
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            EntryDirection::Credit => amount,
            EntryDirection::Debit => -amount,
        }
    }
}

impl core::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntryDirection::Credit => f.write_str("credit"),
            EntryDirection::Debit => f.write_str("debit"),
        }
    }
}

/// One decoded entry of an inbound ACH file.
#[derive(Debug, Clone, PartialEq)]
pub struct AchEntry {
    pub id: String,
    pub account_number: String,
    pub direction: EntryDirection,
    pub amount: Decimal,
    pub company_name: String,
    pub description: Option<String>,
    pub trace_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub id: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EntryOutcome {
    pub fn processed(id: String) -> Self {
        Self {
            id,
            status: EntryStatus::Processed,
            message: None,
        }
    }

    pub fn failed(id: String, message: String) -> Self {
        Self {
            id,
            status: EntryStatus::Failed,
            message: Some(message),
        }
    }
}

/// Result of processing one inbound file. `success` only reflects whether the
/// file itself parsed; entry failures are counted in `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub processed: usize,
    pub failed: usize,
    pub entries: Vec<EntryOutcome>,
}

impl InboundReport {
    pub fn rejected(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            processed: 0,
            failed: 0,
            entries: Vec::new(),
        }
    }
}
