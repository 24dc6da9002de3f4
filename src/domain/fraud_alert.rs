use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{account::AccountId, account::UserId, transaction::TransactionId};

pub type FraudAlertId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    SuspiciousTransfer,
    SuspiciousTransaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
    UnderReview,
    Resolved,
    FalsePositive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFraudAlert {
    pub user_id: UserId,
    pub account_id: Option<AccountId>,
    pub transaction_id: Option<TransactionId>,
    pub alert_type: AlertType,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
}

impl NewFraudAlert {
    /// A fresh high-severity alert against an account.
    pub fn high(
        user_id: UserId,
        account_id: AccountId,
        alert_type: AlertType,
        description: String,
    ) -> Self {
        Self {
            user_id,
            account_id: Some(account_id),
            transaction_id: None,
            alert_type,
            description,
            severity: Severity::High,
            status: AlertStatus::New,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAlert {
    pub id: FraudAlertId,
    pub user_id: UserId,
    pub account_id: Option<AccountId>,
    pub transaction_id: Option<TransactionId>,
    pub alert_type: AlertType,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

impl FraudAlert {
    pub(crate) fn stored(id: FraudAlertId, new: NewFraudAlert, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            account_id: new.account_id,
            transaction_id: new.transaction_id,
            alert_type: new.alert_type,
            description: new.description,
            severity: new.severity,
            status: new.status,
            created_at,
        }
    }
}
