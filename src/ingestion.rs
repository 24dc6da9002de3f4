use std::collections::HashMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::money::parse_amount;
use crate::domain::{
    Account, AchEntry, EntryDirection, EntryRejection, Error, LedgerStore, NewAccount, NewUser,
    UserId,
};

/// Splits an inbound ACH document into its raw entries. Entries are decoded
/// one by one later so a bad entry only fails itself.
pub fn parse_ach_file(content: &str) -> Result<Vec<Value>, Error> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| Error::Ingestion(format!("Failed to process ACH file: {}", e)))?;

    match document.get("entries") {
        Some(Value::Array(entries)) => Ok(entries.clone()),
        _ => Err(Error::Ingestion(
            "Invalid ACH file format: entries array is missing".to_string(),
        )),
    }
}

/// A JSON string or number as text.
fn text_or_number(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Entry id as text; ids may arrive as strings or numbers.
pub fn entry_id(raw: &Value) -> String {
    raw.get("id").and_then(text_or_number).unwrap_or_default()
}

/// Internal shape used only for JSON entry deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRow {
    account_number: String,
    direction: String,
    amount: Decimal,
    company_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    trace_number: Option<Value>,
}

impl TryFrom<(String, EntryRow)> for AchEntry {
    type Error = EntryRejection;

    fn try_from((id, row): (String, EntryRow)) -> Result<Self, Self::Error> {
        let direction = match row.direction.trim().to_ascii_lowercase().as_str() {
            "credit" => EntryDirection::Credit,
            "debit" => EntryDirection::Debit,
            other => {
                return Err(EntryRejection::Malformed(format!(
                    "Invalid direction: {}",
                    other
                )));
            }
        };
        if row.amount <= Decimal::ZERO {
            return Err(EntryRejection::NonPositiveAmount);
        }
        let trace_number = match &row.trace_number {
            None | Some(Value::Null) => None,
            Some(raw) => Some(text_or_number(raw).ok_or_else(|| {
                EntryRejection::Malformed(format!("Invalid trace number: {}", raw))
            })?),
        };

        Ok(AchEntry {
            id,
            account_number: row.account_number,
            direction,
            amount: row.amount,
            company_name: row.company_name,
            description: row.description,
            trace_number,
        })
    }
}

pub fn decode_entry(raw: &Value) -> Result<AchEntry, EntryRejection> {
    let row = EntryRow::deserialize(raw).map_err(|e| EntryRejection::Malformed(e.to_string()))?;
    AchEntry::try_from((entry_id(raw), row))
}

pub struct CsvAccountReader<R: Read> {
    reader: csv::Reader<R>,
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct AccountRow {
    username: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    email: Option<String>,
    account_number: String,
    balance: String,
    #[serde(default)]
    available: Option<String>,
}

/// One account to open, together with its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedAccount {
    pub owner: NewUser,
    pub account_number: String,
    pub balance: Decimal,
    pub available: Decimal,
}

impl TryFrom<AccountRow> for SeedAccount {
    type Error = Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let balance = parse_amount(&row.balance).ok_or_else(|| {
            Error::Ingestion(format!("Invalid balance for {}: {}", row.account_number, row.balance))
        })?;
        let available = match row.available.as_deref() {
            Some(raw) => parse_amount(raw).ok_or_else(|| {
                Error::Ingestion(format!("Invalid available for {}: {}", row.account_number, raw))
            })?,
            None => balance,
        };
        let email = row
            .email
            .unwrap_or_else(|| format!("{}@example.com", row.username));

        Ok(SeedAccount {
            owner: NewUser {
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                email,
                role: "user".to_string(),
            },
            account_number: row.account_number,
            balance,
            available,
        })
    }
}

impl<R: Read> CsvAccountReader<R> {
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self { reader }
    }

    pub fn accounts(self) -> impl Iterator<Item = Result<SeedAccount, Error>> {
        self.reader
            .into_deserialize::<AccountRow>()
            .map(|row_res| match row_res {
                Ok(row) => SeedAccount::try_from(row),
                Err(e) => Err(Error::Ingestion(format!(
                    "CSV deserialization error: {}",
                    e
                ))),
            })
    }
}

/// Opens every seeded account, creating each distinct owner once.
pub async fn seed_ledger<S: LedgerStore>(
    store: &S,
    accounts: impl IntoIterator<Item = Result<SeedAccount, Error>>,
) -> Result<Vec<Account>, Error> {
    let mut owners: HashMap<String, UserId> = HashMap::new();
    let mut opened = Vec::new();

    for seed in accounts {
        let seed = seed?;
        let user_id = match owners.get(&seed.owner.username) {
            Some(id) => *id,
            None => {
                let username = seed.owner.username.clone();
                let user = store.create_user(seed.owner).await?;
                owners.insert(username, user.id);
                user.id
            }
        };

        let account = store
            .create_account(NewAccount {
                user_id,
                account_type_id: 1,
                account_number: seed.account_number,
                balance: seed.balance,
                available: seed.available,
                is_active: true,
                maturity_date: None,
            })
            .await?;
        opened.push(account);
    }

    Ok(opened)
}
