use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;

pub type TransactionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Ach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// A balance movement that has not been stored yet. Amount is signed:
/// positive credits the account, negative debits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub merchant_name: Option<String>,
    pub merchant_category: Option<String>,
    pub reference: Option<String>,
}

impl NewTransaction {
    pub fn new(
        account_id: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            amount,
            description: description.into(),
            kind,
            category: None,
            date: Utc::now(),
            status: TransactionStatus::Completed,
            merchant_name: None,
            merchant_category: None,
            reference: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_merchant(mut self, name: impl Into<String>, category: Option<String>) -> Self {
        self.merchant_name = Some(name.into());
        self.merchant_category = category;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub(crate) fn stored(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            amount: self.amount,
            description: self.description,
            kind: self.kind,
            category: self.category,
            date: self.date,
            status: self.status,
            merchant_name: self.merchant_name,
            merchant_category: self.merchant_category,
            reference: self.reference,
        }
    }
}

/// Immutable record of a single-account balance movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub merchant_name: Option<String>,
    pub merchant_category: Option<String>,
    pub reference: Option<String>,
}

impl core::fmt::Display for Transaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?},account={},tx={},amount={}",
            self.kind, self.account_id, self.id, self.amount
        )?;
        if let Some(reference) = &self.reference {
            write!(f, ",ref={}", reference)?;
        }
        Ok(())
    }
}
