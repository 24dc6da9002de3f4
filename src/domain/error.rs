use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    #[error("Storage failed with: {0}")]
    Storage(String),

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: u32 },

    #[error("ACH entry {id} failed: {reason}")]
    AchEntry { id: String, reason: String },

    #[error("Invalid routing number: {0}")]
    Routing(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    #[error("Configuration failed with: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: u32) -> Self {
        Error::NotFound { entity, id }
    }
}

/// Why an internal transfer did not happen.
#[derive(Debug, thiserror::Error)]
pub enum TransferRejection {
    #[error("Source account not found")]
    SourceNotFound,

    #[error("Destination account not found")]
    DestinationNotFound,

    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Transfer flagged as potentially fraudulent")]
    Flagged,

    #[error("Transfer failed: {0}")]
    Fault(#[from] Error),
}

impl TransferRejection {
    pub fn is_fault(&self) -> bool {
        matches!(self, TransferRejection::Fault(_))
    }
}

/// Why a direct single-account posting did not happen.
#[derive(Debug, thiserror::Error)]
pub enum PostingRejection {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Transaction flagged as potentially fraudulent")]
    Flagged,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Transaction failed: {0}")]
    Fault(#[from] Error),
}

impl PostingRejection {
    pub fn is_fault(&self) -> bool {
        matches!(self, PostingRejection::Fault(_))
    }
}

/// Why one inbound ACH entry was not posted. Never aborts sibling entries.
#[derive(Debug, thiserror::Error)]
pub enum EntryRejection {
    #[error("Invalid ACH entry: {0}")]
    Malformed(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Entry amount must be positive")]
    NonPositiveAmount,

    #[error(transparent)]
    Fault(#[from] Error),
}

/// Why an ACH origination request was refused.
#[derive(Debug, thiserror::Error)]
pub enum AchRejection {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Access denied")]
    AccessDenied,

    #[error("ACH amount must be positive")]
    InvalidAmount,

    #[error("Invalid routing number")]
    InvalidRouting,

    #[error("ACH origination failed: {0}")]
    Fault(#[from] Error),
}

impl AchRejection {
    pub fn is_fault(&self) -> bool {
        matches!(self, AchRejection::Fault(_))
    }
}
