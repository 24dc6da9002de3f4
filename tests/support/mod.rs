#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use funds_engine::InMemoryLedger;
use funds_engine::domain::{
    Account, AccountId, AchStatus, AchTransfer, AchTransferId, AlertStatus, CommittedTransfer,
    Error, FraudAlert, FraudAlertId, LedgerStore, NewAccount, NewAchTransfer, NewFraudAlert,
    NewTransaction, NewTransfer, NewUser, Transaction, Transfer, TransferId, TransferStatus, User,
    UserId,
};

pub fn new_user(username: &str, first: &str, last: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}@example.com", username),
        role: "user".to_string(),
    }
}

pub async fn open_account<S: LedgerStore>(
    store: &S,
    user_id: UserId,
    number: &str,
    balance: Decimal,
) -> Account {
    store
        .create_account(NewAccount {
            user_id,
            account_type_id: 1,
            account_number: number.to_string(),
            balance,
            available: balance,
            is_active: true,
            maturity_date: None,
        })
        .await
        .expect("open account")
}

/// Two customers: John Doe owns 1234567890, Ann Smith owns 5555000011.
pub struct TwoCustomers {
    pub store: Arc<InMemoryLedger>,
    pub john: User,
    pub ann: User,
    pub checking: Account,
    pub savings: Account,
}

pub async fn two_customers(john_balance: Decimal, ann_balance: Decimal) -> TwoCustomers {
    let store = Arc::new(InMemoryLedger::new());
    let john = store
        .create_user(new_user("jdoe", "John", "Doe"))
        .await
        .expect("create john");
    let ann = store
        .create_user(new_user("asmith", "Ann", "Smith"))
        .await
        .expect("create ann");
    let checking = open_account(store.as_ref(), john.id, "1234567890", john_balance).await;
    let savings = open_account(store.as_ref(), ann.id, "5555000011", ann_balance).await;
    TwoCustomers {
        store,
        john,
        ann,
        checking,
        savings,
    }
}

pub async fn balance<S: LedgerStore>(store: &S, id: AccountId) -> (Decimal, Decimal) {
    let account = store
        .get_account(id)
        .await
        .expect("read account")
        .expect("account exists");
    (account.balance, account.available)
}

/// Delegates to an in-memory ledger but can be told to fail the atomic
/// writes, the way a database would on a lost connection.
#[derive(Debug, Default)]
pub struct FaultyLedger {
    pub inner: InMemoryLedger,
    fail_commits: AtomicBool,
    fail_posts: AtomicBool,
}

impl FaultyLedger {
    pub fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    pub fn fail_posts(&self) {
        self.fail_posts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for FaultyLedger {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Error> {
        self.inner.get_user(id).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, Error> {
        self.inner.create_user(user).await
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, Error> {
        self.inner.get_account(id).await
    }

    async fn get_account_by_number(&self, number: &str) -> Result<Option<Account>, Error> {
        self.inner.get_account_by_number(number).await
    }

    async fn get_accounts(&self, user_id: UserId) -> Result<Vec<Account>, Error> {
        self.inner.get_accounts(user_id).await
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, Error> {
        self.inner.create_account(account).await
    }

    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
        available: Decimal,
    ) -> Result<Account, Error> {
        self.inner.update_account_balance(id, balance, available).await
    }

    async fn get_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, Error> {
        self.inner.get_transactions(account_id).await
    }

    async fn get_recent_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, Error> {
        self.inner.get_recent_transactions(account_id, limit).await
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        self.inner.create_transaction(transaction).await
    }

    async fn post_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<(Account, Transaction), Error> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::Storage("connection reset".to_string()));
        }
        self.inner.post_transaction(transaction).await
    }

    async fn get_transfers(&self, user_id: UserId) -> Result<Vec<Transfer>, Error> {
        self.inner.get_transfers(user_id).await
    }

    async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer, Error> {
        self.inner.create_transfer(transfer).await
    }

    async fn update_transfer_status(
        &self,
        id: TransferId,
        status: TransferStatus,
    ) -> Result<Transfer, Error> {
        self.inner.update_transfer_status(id, status).await
    }

    async fn commit_transfer(
        &self,
        transfer: NewTransfer,
        withdrawal: NewTransaction,
        deposit: NewTransaction,
    ) -> Result<CommittedTransfer, Error> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(Error::Storage("connection reset".to_string()));
        }
        self.inner
            .commit_transfer(transfer, withdrawal, deposit)
            .await
    }

    async fn get_ach_transfers(&self, user_id: UserId) -> Result<Vec<AchTransfer>, Error> {
        self.inner.get_ach_transfers(user_id).await
    }

    async fn create_ach_transfer(&self, ach: NewAchTransfer) -> Result<AchTransfer, Error> {
        self.inner.create_ach_transfer(ach).await
    }

    async fn update_ach_transfer_status(
        &self,
        id: AchTransferId,
        status: AchStatus,
        trace_number: Option<String>,
        batch_id: Option<String>,
    ) -> Result<AchTransfer, Error> {
        self.inner
            .update_ach_transfer_status(id, status, trace_number, batch_id)
            .await
    }

    async fn get_fraud_alerts(&self, user_id: UserId) -> Result<Vec<FraudAlert>, Error> {
        self.inner.get_fraud_alerts(user_id).await
    }

    async fn get_all_fraud_alerts(&self) -> Result<Vec<FraudAlert>, Error> {
        self.inner.get_all_fraud_alerts().await
    }

    async fn create_fraud_alert(&self, alert: NewFraudAlert) -> Result<FraudAlert, Error> {
        self.inner.create_fraud_alert(alert).await
    }

    async fn update_fraud_alert_status(
        &self,
        id: FraudAlertId,
        status: AlertStatus,
    ) -> Result<FraudAlert, Error> {
        self.inner.update_fraud_alert_status(id, status).await
    }
}
