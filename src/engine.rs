use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::domain::{
    AlertType, CommittedTransfer, LedgerStore, NewFraudAlert, NewTransaction, NewTransfer,
    PostingRejection, Transaction, TransactionKind, TransactionStatus, TransferRejection,
    TransferRequest, TransferStatus,
};
use crate::fraud::{FraudPolicy, FraudScreener};
use crate::locks::AccountLocks;

pub type TransferOutcome = Result<CommittedTransfer, TransferRejection>;
pub type PostingOutcome = Result<Transaction, PostingRejection>;

const TRANSFER_CATEGORY: &str = "transfer";

/// Moves money between accounts of this bank and posts screened
/// single-account transactions.
#[derive(Debug)]
pub struct Engine<S: LedgerStore> {
    store: Arc<S>,
    screener: FraudScreener<S>,
    locks: AccountLocks,
}

impl<S: LedgerStore> Engine<S> {
    pub fn new(store: Arc<S>, policy: FraudPolicy, locks: AccountLocks) -> Self {
        Self {
            screener: FraudScreener::new(store.clone(), policy),
            store,
            locks,
        }
    }

    pub fn screener(&self) -> &FraudScreener<S> {
        &self.screener
    }

    /// Runs an internal transfer. Every failure, including a storage fault,
    /// comes back as a rejection; nothing is written unless all checks pass.
    pub async fn transfer(&self, request: TransferRequest) -> TransferOutcome {
        let outcome = self.execute_transfer(&request).await;
        match &outcome {
            Ok(committed) => info!(
                transfer = committed.transfer.id,
                from = request.from_account_id,
                to = request.to_account_id,
                amount = %request.amount,
                "transfer completed"
            ),
            Err(rejection @ TransferRejection::Fault(_)) => error!(
                from = request.from_account_id,
                to = request.to_account_id,
                "{}",
                rejection
            ),
            Err(rejection) => warn!(
                from = request.from_account_id,
                to = request.to_account_id,
                reason = %rejection,
                "transfer rejected"
            ),
        }
        outcome
    }

    async fn execute_transfer(&self, request: &TransferRequest) -> TransferOutcome {
        // Held until the commit so no other movement sees a stale balance.
        let _guard = self
            .locks
            .lock_all(&[request.from_account_id, request.to_account_id])
            .await;

        let from = self
            .store
            .get_account(request.from_account_id)
            .await?
            .ok_or(TransferRejection::SourceNotFound)?;
        let to = self
            .store
            .get_account(request.to_account_id)
            .await?
            .ok_or(TransferRejection::DestinationNotFound)?;

        if request.amount <= Decimal::ZERO {
            return Err(TransferRejection::InvalidAmount);
        }
        if from.available < request.amount {
            return Err(TransferRejection::InsufficientFunds);
        }

        let now = Utc::now();
        let probe = NewTransaction::new(
            from.id,
            -request.amount,
            TransactionKind::Withdrawal,
            request.description.clone(),
        )
        .with_category(TRANSFER_CATEGORY)
        .with_status(TransactionStatus::Pending)
        .with_date(now);

        if self.screener.evaluate(&probe, &from).await? {
            self.store
                .create_fraud_alert(NewFraudAlert::high(
                    from.user_id,
                    from.id,
                    AlertType::SuspiciousTransfer,
                    format!(
                        "Suspicious transfer detected: {} to account {}",
                        request.amount, to.account_number
                    ),
                ))
                .await?;
            return Err(TransferRejection::Flagged);
        }

        let transfer = NewTransfer {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: request.amount,
            description: Some(request.description.clone()),
            date: now,
            status: TransferStatus::Completed,
        };
        let withdrawal = NewTransaction::new(
            from.id,
            -request.amount,
            TransactionKind::Transfer,
            format!(
                "Transfer to account {} - {}",
                to.masked_number(),
                request.description
            ),
        )
        .with_category(TRANSFER_CATEGORY)
        .with_date(now);
        let deposit = NewTransaction::new(
            to.id,
            request.amount,
            TransactionKind::Transfer,
            format!(
                "Transfer from account {} - {}",
                from.masked_number(),
                request.description
            ),
        )
        .with_category(TRANSFER_CATEGORY)
        .with_date(now);

        Ok(self
            .store
            .commit_transfer(transfer, withdrawal, deposit)
            .await?)
    }

    /// Screens and posts one transaction against its account.
    pub async fn post_transaction(&self, transaction: NewTransaction) -> PostingOutcome {
        let account_id = transaction.account_id;
        let outcome = self.execute_posting(transaction).await;
        match &outcome {
            Ok(tx) => info!(
                account = account_id,
                tx = tx.id,
                amount = %tx.amount,
                "transaction posted"
            ),
            Err(rejection @ PostingRejection::Fault(_)) => {
                error!(account = account_id, "{}", rejection)
            }
            Err(rejection) => warn!(
                account = account_id,
                reason = %rejection,
                "transaction rejected"
            ),
        }
        outcome
    }

    async fn execute_posting(&self, transaction: NewTransaction) -> PostingOutcome {
        let _guard = self.locks.lock(transaction.account_id).await;

        let account = self
            .store
            .get_account(transaction.account_id)
            .await?
            .ok_or(PostingRejection::AccountNotFound)?;

        if self.screener.evaluate(&transaction, &account).await? {
            self.store
                .create_fraud_alert(NewFraudAlert::high(
                    account.user_id,
                    account.id,
                    AlertType::SuspiciousTransaction,
                    format!(
                        "Suspicious transaction detected: {} for {}",
                        transaction.description, transaction.amount
                    ),
                ))
                .await?;
            return Err(PostingRejection::Flagged);
        }

        if transaction.amount < Decimal::ZERO {
            let overdrawn = account
                .available
                .checked_add(transaction.amount)
                .is_none_or(|after| after < Decimal::ZERO);
            if overdrawn {
                return Err(PostingRejection::InsufficientFunds);
            }
        }

        let (_, stored) = self.store.post_transaction(transaction).await?;
        Ok(stored)
    }
}
