use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{account::AccountId, transaction::Transaction};

pub type TransferId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

/// What the route layer hands over for an internal transfer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_description() -> String {
    "Transfer".to_string()
}

impl TransferRequest {
    pub fn new(
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub status: TransferStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub status: TransferStatus,
}

impl Transfer {
    pub(crate) fn stored(id: TransferId, new: NewTransfer) -> Self {
        Self {
            id,
            from_account_id: new.from_account_id,
            to_account_id: new.to_account_id,
            amount: new.amount,
            description: new.description,
            date: new.date,
            status: new.status,
        }
    }

    /// Shared by both legs of the transfer.
    pub fn reference(&self) -> String {
        format!("TRF{}", self.id)
    }
}

/// A transfer plus its two ledger legs, written as one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommittedTransfer {
    pub transfer: Transfer,
    pub withdrawal: Transaction,
    pub deposit: Transaction,
}
