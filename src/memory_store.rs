use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{
    Account, AccountId, AchStatus, AchTransfer, AchTransferId, AlertStatus, CommittedTransfer,
    Error, FraudAlert, FraudAlertId, LedgerStore, NewAccount, NewAchTransfer, NewFraudAlert,
    NewTransaction, NewTransfer, NewUser, Transaction, TransactionId, Transfer, TransferId,
    TransferStatus, User, UserId,
};

#[derive(Debug, Default)]
struct Sequences {
    user: u32,
    account: u32,
    transaction: u32,
    transfer: u32,
    ach_transfer: u32,
    fraud_alert: u32,
}

fn next_id(counter: &mut u32) -> u32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    accounts: BTreeMap<AccountId, Account>,
    transactions: BTreeMap<TransactionId, Transaction>,
    transfers: BTreeMap<TransferId, Transfer>,
    ach_transfers: BTreeMap<AchTransferId, AchTransfer>,
    fraud_alerts: BTreeMap<FraudAlertId, FraudAlert>,
    ids: Sequences,
}

impl Tables {
    fn insert_transaction(&mut self, transaction: NewTransaction) -> Transaction {
        let id = next_id(&mut self.ids.transaction);
        let stored = transaction.stored(id);
        self.transactions.insert(id, stored.clone());
        stored
    }

    fn history(&self, account_id: AccountId) -> Vec<Transaction> {
        let mut history: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        history
    }

    /// Applies a leg to a scratch copy of its account; nothing in `self` changes.
    fn stage(
        &self,
        staged: &mut BTreeMap<AccountId, Account>,
        leg: &NewTransaction,
    ) -> Result<(), Error> {
        let account = match staged.entry(leg.account_id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(
                self.accounts
                    .get(&leg.account_id)
                    .cloned()
                    .ok_or_else(|| Error::not_found("Account", leg.account_id))?,
            ),
        };
        let (balance, available) = account
            .checked_apply(leg.amount)
            .ok_or(Error::AmountOutOfRange(leg.amount))?;
        account.balance = balance;
        account.available = available;
        Ok(())
    }
}

/// Ledger kept in process memory. Each call takes the table lock once and
/// releases it before returning, so no lock outlives an await point.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tables: RwLock<Tables>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, Error> {
        self.tables
            .read()
            .map_err(|_| Error::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, Error> {
        self.tables
            .write()
            .map_err(|_| Error::Storage("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Error> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Error::Storage(format!(
                "Username {} already exists",
                user.username
            )));
        }
        let id = next_id(&mut tables.ids.user);
        let stored = User {
            id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, Error> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn get_account_by_number(&self, number: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .read()?
            .accounts
            .values()
            .find(|account| account.account_number == number)
            .cloned())
    }

    async fn get_accounts(&self, user_id: UserId) -> Result<Vec<Account>, Error> {
        Ok(self
            .read()?
            .accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, Error> {
        let mut tables = self.write()?;
        if tables
            .accounts
            .values()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(Error::Storage(format!(
                "Account number {} already exists",
                account.account_number
            )));
        }
        let id = next_id(&mut tables.ids.account);
        let stored = Account {
            id,
            user_id: account.user_id,
            account_type_id: account.account_type_id,
            account_number: account.account_number,
            balance: account.balance,
            available: account.available,
            is_active: account.is_active,
            created_at: Utc::now(),
            maturity_date: account.maturity_date,
        };
        tables.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
        available: Decimal,
    ) -> Result<Account, Error> {
        let mut tables = self.write()?;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Account", id))?;
        account.balance = balance;
        account.available = available;
        Ok(account.clone())
    }

    async fn get_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, Error> {
        Ok(self.read()?.history(account_id))
    }

    async fn get_recent_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, Error> {
        let mut history = self.read()?.history(account_id);
        history.truncate(limit);
        Ok(history)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        Ok(self.write()?.insert_transaction(transaction))
    }

    async fn post_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<(Account, Transaction), Error> {
        let mut tables = self.write()?;
        let mut staged = BTreeMap::new();
        tables.stage(&mut staged, &transaction)?;

        let account_id = transaction.account_id;
        let stored = tables.insert_transaction(transaction);
        tables.accounts.extend(staged);
        let account = tables
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Account", account_id))?;
        Ok((account, stored))
    }

    async fn get_transfers(&self, user_id: UserId) -> Result<Vec<Transfer>, Error> {
        let tables = self.read()?;
        let owned: Vec<AccountId> = tables
            .accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .map(|account| account.id)
            .collect();
        let mut transfers: Vec<Transfer> = tables
            .transfers
            .values()
            .filter(|t| owned.contains(&t.from_account_id) || owned.contains(&t.to_account_id))
            .cloned()
            .collect();
        transfers.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transfers)
    }

    async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer, Error> {
        let mut tables = self.write()?;
        let id = next_id(&mut tables.ids.transfer);
        let stored = Transfer::stored(id, transfer);
        tables.transfers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_transfer_status(
        &self,
        id: TransferId,
        status: TransferStatus,
    ) -> Result<Transfer, Error> {
        let mut tables = self.write()?;
        let transfer = tables
            .transfers
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Transfer", id))?;
        transfer.status = status;
        Ok(transfer.clone())
    }

    async fn commit_transfer(
        &self,
        transfer: NewTransfer,
        mut withdrawal: NewTransaction,
        mut deposit: NewTransaction,
    ) -> Result<CommittedTransfer, Error> {
        let mut tables = self.write()?;

        // Validate and compute both legs before touching any table.
        let mut staged = BTreeMap::new();
        tables.stage(&mut staged, &withdrawal)?;
        tables.stage(&mut staged, &deposit)?;

        let id = next_id(&mut tables.ids.transfer);
        let transfer = Transfer::stored(id, transfer);
        tables.transfers.insert(id, transfer.clone());

        withdrawal.reference = Some(transfer.reference());
        deposit.reference = Some(transfer.reference());
        let withdrawal = tables.insert_transaction(withdrawal);
        let deposit = tables.insert_transaction(deposit);
        tables.accounts.extend(staged);

        Ok(CommittedTransfer {
            transfer,
            withdrawal,
            deposit,
        })
    }

    async fn get_ach_transfers(&self, user_id: UserId) -> Result<Vec<AchTransfer>, Error> {
        let mut transfers: Vec<AchTransfer> = self
            .read()?
            .ach_transfers
            .values()
            .filter(|ach| ach.user_id == user_id)
            .cloned()
            .collect();
        transfers.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transfers)
    }

    async fn create_ach_transfer(&self, ach: NewAchTransfer) -> Result<AchTransfer, Error> {
        let mut tables = self.write()?;
        let id = next_id(&mut tables.ids.ach_transfer);
        let stored = AchTransfer::stored(id, ach, Utc::now());
        tables.ach_transfers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_ach_transfer_status(
        &self,
        id: AchTransferId,
        status: AchStatus,
        trace_number: Option<String>,
        batch_id: Option<String>,
    ) -> Result<AchTransfer, Error> {
        let mut tables = self.write()?;
        let ach = tables
            .ach_transfers
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("ACH transfer", id))?;
        ach.status = status;
        if let Some(trace_number) = trace_number {
            ach.trace_number = trace_number;
        }
        if let Some(batch_id) = batch_id {
            ach.batch_id = batch_id;
        }
        Ok(ach.clone())
    }

    async fn get_fraud_alerts(&self, user_id: UserId) -> Result<Vec<FraudAlert>, Error> {
        let mut alerts: Vec<FraudAlert> = self
            .read()?
            .fraud_alerts
            .values()
            .filter(|alert| alert.user_id == user_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    async fn get_all_fraud_alerts(&self) -> Result<Vec<FraudAlert>, Error> {
        let mut alerts: Vec<FraudAlert> = self.read()?.fraud_alerts.values().cloned().collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    async fn create_fraud_alert(&self, alert: NewFraudAlert) -> Result<FraudAlert, Error> {
        let mut tables = self.write()?;
        let id = next_id(&mut tables.ids.fraud_alert);
        let stored = FraudAlert::stored(id, alert, Utc::now());
        tables.fraud_alerts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_fraud_alert_status(
        &self,
        id: FraudAlertId,
        status: AlertStatus,
    ) -> Result<FraudAlert, Error> {
        let mut tables = self.write()?;
        let alert = tables
            .fraud_alerts
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Fraud alert", id))?;
        alert.status = status;
        Ok(alert.clone())
    }
}
