pub mod account;
pub mod ach;
pub mod error;
pub mod fraud_alert;
pub mod money;
pub mod traits;
pub mod transaction;
pub mod transfer;

pub use account::{
    Account, AccountId, NewAccount, NewUser, User, UserId, mask_account_number,
};
pub use ach::{
    AchAccountType, AchDirection, AchEntry, AchStatus, AchTransfer, AchTransferId,
    AchTransferRequest, EntryDirection, EntryOutcome, EntryStatus, InboundReport, NewAchTransfer,
};
pub use error::{AchRejection, EntryRejection, Error, PostingRejection, TransferRejection};
pub use fraud_alert::{
    AlertStatus, AlertType, FraudAlert, FraudAlertId, NewFraudAlert, Severity,
};
pub use traits::{DeadLetterQueue, LedgerStore};
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionKind, TransactionStatus,
};
pub use transfer::{
    CommittedTransfer, NewTransfer, Transfer, TransferId, TransferRequest, TransferStatus,
};
