use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type UserId = u32;
pub type AccountId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name in "Lastname, Firstname" order, as ACH entry records expect it.
    pub fn ach_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub account_type_id: u32,
    pub account_number: String,
    pub balance: Decimal,   // book balance
    pub available: Decimal, // spendable, lags balance while funds are held
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub maturity_date: Option<DateTime<Utc>>,
}

impl Account {
    /// Balance pair after applying `amount`, or `None` on overflow.
    pub fn checked_apply(&self, amount: Decimal) -> Option<(Decimal, Decimal)> {
        Some((
            self.balance.checked_add(amount)?,
            self.available.checked_add(amount)?,
        ))
    }

    pub fn masked_number(&self) -> String {
        mask_account_number(&self.account_number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub user_id: UserId,
    pub account_type_id: u32,
    pub account_number: String,
    pub balance: Decimal,
    pub available: Decimal,
    pub is_active: bool,
    pub maturity_date: Option<DateTime<Utc>>,
}

pub const MASK_CHAR: char = '•';

/// Keeps the last four characters and masks the rest, preserving length.
pub fn mask_account_number(number: &str) -> String {
    let len = number.chars().count();
    if len <= 4 {
        return number.to_string();
    }
    let tail: String = number.chars().skip(len - 4).collect();
    let mut masked: String = std::iter::repeat_n(MASK_CHAR, len - 4).collect();
    masked.push_str(&tail);
    masked
}
