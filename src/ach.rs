use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    AchRejection, AchTransfer, AchTransferRequest, DeadLetterQueue, EntryDirection,
    EntryOutcome, EntryRejection, Error, InboundReport, LedgerStore, NewAchTransfer,
    NewTransaction, Transaction, TransactionKind, UserId,
};
use crate::ingestion::{decode_entry, entry_id, parse_ach_file};
use crate::locks::AccountLocks;
use crate::nacha::{self, AchFile, Originator};

const ACH_CATEGORY: &str = "ach";
const ACH_MERCHANT_CATEGORY: &str = "financial";

/// A freshly created ACH transfer and the outbound file built for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginatedAch {
    pub transfer: AchTransfer,
    pub file: AchFile,
}

pub fn is_valid_routing(routing: &str) -> bool {
    routing.len() == 9 && routing.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug)]
pub struct AchProcessor<S, D>
where
    S: LedgerStore,
    D: DeadLetterQueue,
{
    store: Arc<S>,
    locks: AccountLocks,
    dlq: D,
    originator: Originator,
}

impl<S, D> AchProcessor<S, D>
where
    S: LedgerStore,
    D: DeadLetterQueue,
{
    pub fn new(store: Arc<S>, locks: AccountLocks, dlq: D, originator: Originator) -> Self {
        Self {
            store,
            locks,
            dlq,
            originator,
        }
    }

    pub fn dlq(&self) -> &D {
        &self.dlq
    }

    /// Posts every entry of an inbound file. A malformed file is rejected as
    /// a whole; after that each entry succeeds or fails on its own.
    pub async fn process_inbound_file(&self, content: &str) -> InboundReport {
        let entries = match parse_ach_file(content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "ACH file rejected");
                let message = match e {
                    Error::Ingestion(message) => message,
                    other => other.to_string(),
                };
                return InboundReport::rejected(message);
            }
        };

        let mut report = InboundReport {
            success: true,
            message: None,
            processed: 0,
            failed: 0,
            entries: Vec::with_capacity(entries.len()),
        };

        for raw in &entries {
            let id = entry_id(raw);
            match self.process_entry(raw).await {
                Ok(tx) => {
                    debug!(entry = %id, tx = tx.id, account = tx.account_id, "ACH entry posted");
                    report.processed += 1;
                    report.entries.push(EntryOutcome::processed(id));
                }
                Err(rejection) => {
                    let reason = rejection.to_string();
                    self.dlq.report(&Error::AchEntry {
                        id: id.clone(),
                        reason: reason.clone(),
                    });
                    report.failed += 1;
                    report.entries.push(EntryOutcome::failed(id, reason));
                }
            }
        }

        info!(
            processed = report.processed,
            failed = report.failed,
            "ACH file processed"
        );
        report
    }

    /// No overdraft check: ACH debits may take an account negative.
    async fn process_entry(&self, raw: &Value) -> Result<Transaction, EntryRejection> {
        let entry = decode_entry(raw)?;
        let account = self
            .store
            .get_account_by_number(&entry.account_number)
            .await?
            .ok_or(EntryRejection::AccountNotFound)?;

        let _guard = self.locks.lock(account.id).await;

        let kind = match entry.direction {
            EntryDirection::Credit => TransactionKind::Deposit,
            EntryDirection::Debit => TransactionKind::Withdrawal,
        };
        let description = entry
            .description
            .clone()
            .unwrap_or_else(|| format!("ACH {} - {}", entry.direction, entry.company_name));

        let tx = NewTransaction::new(
            account.id,
            entry.direction.signed(entry.amount),
            kind,
            description,
        )
        .with_category(ACH_CATEGORY)
        .with_merchant(entry.company_name, Some(ACH_MERCHANT_CATEGORY.to_string()))
        .with_reference(entry.trace_number);

        let (_, stored) = self.store.post_transaction(tx).await?;
        Ok(stored)
    }

    pub async fn build_outbound_file(&self, transfers: &[AchTransfer]) -> Result<AchFile, Error> {
        self.build_outbound_file_at(transfers, Utc::now()).await
    }

    pub async fn build_outbound_file_at(
        &self,
        transfers: &[AchTransfer],
        created_at: DateTime<Utc>,
    ) -> Result<AchFile, Error> {
        nacha::build_outbound_file(self.store.as_ref(), &self.originator, transfers, created_at)
            .await
    }

    /// Records a client-initiated ACH transfer and renders its outbound file.
    /// Balances are untouched until the network settles it.
    pub async fn originate(
        &self,
        user_id: UserId,
        request: AchTransferRequest,
    ) -> Result<OriginatedAch, AchRejection> {
        let account = self
            .store
            .get_account(request.account_id)
            .await?
            .ok_or(AchRejection::AccountNotFound)?;
        if account.user_id != user_id {
            return Err(AchRejection::AccessDenied);
        }
        if request.amount <= Decimal::ZERO {
            return Err(AchRejection::InvalidAmount);
        }
        if !is_valid_routing(&request.routing_number) {
            return Err(AchRejection::InvalidRouting);
        }

        let transfer = self
            .store
            .create_ach_transfer(NewAchTransfer::pending(user_id, request))
            .await?;
        let file = self
            .build_outbound_file(std::slice::from_ref(&transfer))
            .await?;

        info!(
            ach = transfer.id,
            trace = %transfer.trace_number,
            batch = %transfer.batch_id,
            "generated outbound ACH file"
        );
        Ok(OriginatedAch { transfer, file })
    }
}
