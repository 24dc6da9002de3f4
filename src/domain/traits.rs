use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{
    Account, AccountId, AchStatus, AchTransfer, AchTransferId, AlertStatus, CommittedTransfer,
    Error, FraudAlert, FraudAlertId, NewAccount, NewAchTransfer, NewFraudAlert, NewTransaction,
    NewTransfer, NewUser, Transaction, Transfer, TransferId, TransferStatus, User, UserId,
};

/// Persistence boundary for the ledger. Getters hand out copies; every
/// mutation goes through one of the methods below.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Error>;
    async fn create_user(&self, user: NewUser) -> Result<User, Error>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, Error>;
    async fn get_account_by_number(&self, number: &str) -> Result<Option<Account>, Error>;
    async fn get_accounts(&self, user_id: UserId) -> Result<Vec<Account>, Error>;
    async fn create_account(&self, account: NewAccount) -> Result<Account, Error>;
    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
        available: Decimal,
    ) -> Result<Account, Error>;

    /// Most recent first.
    async fn get_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, Error>;
    async fn get_recent_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, Error>;
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Applies the signed amount to the account's balance and available and
    /// records the transaction, all or nothing.
    async fn post_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<(Account, Transaction), Error>;

    async fn get_transfers(&self, user_id: UserId) -> Result<Vec<Transfer>, Error>;
    async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer, Error>;
    async fn update_transfer_status(
        &self,
        id: TransferId,
        status: TransferStatus,
    ) -> Result<Transfer, Error>;

    /// Stores the transfer, stamps both legs with its reference, and applies
    /// both legs to their accounts, all or nothing.
    async fn commit_transfer(
        &self,
        transfer: NewTransfer,
        withdrawal: NewTransaction,
        deposit: NewTransaction,
    ) -> Result<CommittedTransfer, Error>;

    async fn get_ach_transfers(&self, user_id: UserId) -> Result<Vec<AchTransfer>, Error>;
    async fn create_ach_transfer(&self, ach: NewAchTransfer) -> Result<AchTransfer, Error>;
    async fn update_ach_transfer_status(
        &self,
        id: AchTransferId,
        status: AchStatus,
        trace_number: Option<String>,
        batch_id: Option<String>,
    ) -> Result<AchTransfer, Error>;

    async fn get_fraud_alerts(&self, user_id: UserId) -> Result<Vec<FraudAlert>, Error>;
    async fn get_all_fraud_alerts(&self) -> Result<Vec<FraudAlert>, Error>;
    async fn create_fraud_alert(&self, alert: NewFraudAlert) -> Result<FraudAlert, Error>;
    async fn update_fraud_alert_status(
        &self,
        id: FraudAlertId,
        status: AlertStatus,
    ) -> Result<FraudAlert, Error>;
}

pub trait DeadLetterQueue: Send + Sync {
    fn report(&self, error: &Error);
}
