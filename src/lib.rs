//! Funds movement for a demo retail bank: internal transfers, inbound and
//! outbound ACH, and the fraud screening that gates them. The ledger sits
//! behind [`domain::LedgerStore`]; [`memory_store::InMemoryLedger`] is the
//! in-process backend.

pub mod ach;
pub mod config;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod fraud;
pub mod ingestion;
pub mod locks;
pub mod memory_store;
pub mod nacha;

pub use ach::{AchProcessor, OriginatedAch};
pub use config::Config;
pub use engine::{Engine, PostingOutcome, TransferOutcome};
pub use fraud::{FraudPolicy, FraudRule, FraudScreener};
pub use locks::AccountLocks;
pub use memory_store::InMemoryLedger;
pub use nacha::{AchFile, Originator};
