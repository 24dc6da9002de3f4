use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Account, Error, LedgerStore, NewTransaction, Transaction};

/// Thresholds for the rule set. Defaults reproduce the fixed rules the bank
/// has always screened with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FraudPolicy {
    /// How many recent transactions form the account's history.
    pub recent_window: usize,
    pub spike_multiplier: Decimal,
    pub spike_floor: Decimal,
    /// A debit may take available this far below zero before it is flagged.
    pub overdraft_allowance: Decimal,
    /// Relative difference under which two amounts count as the same.
    pub similarity_tolerance: Decimal,
    pub repeat_threshold: usize,
    /// Treat "no merchant" on both sides as the same merchant.
    pub match_missing_merchant: bool,
    pub novel_category_min_history: usize,
    pub novel_category_floor: Decimal,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            recent_window: 10,
            spike_multiplier: Decimal::from(5),
            spike_floor: Decimal::from(1000),
            overdraft_allowance: Decimal::ZERO,
            similarity_tolerance: Decimal::new(1, 1),
            repeat_threshold: 2,
            match_missing_merchant: true,
            novel_category_min_history: 5,
            novel_category_floor: Decimal::from(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudRule {
    AmountSpike,
    Overdraft,
    RepeatedMerchant,
    NovelCategory,
}

impl core::fmt::Display for FraudRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            FraudRule::AmountSpike => "amount_spike",
            FraudRule::Overdraft => "overdraft",
            FraudRule::RepeatedMerchant => "repeated_merchant",
            FraudRule::NovelCategory => "novel_category",
        };
        f.write_str(name)
    }
}

impl FraudPolicy {
    /// Every rule the candidate trips against `recent`. Pure: no store access.
    pub fn triggered_rules(
        &self,
        candidate: &NewTransaction,
        account: &Account,
        recent: &[Transaction],
    ) -> Vec<FraudRule> {
        let mut fired = Vec::new();
        if self.amount_spike(candidate, recent) {
            fired.push(FraudRule::AmountSpike);
        }
        if self.overdraft(candidate, account) {
            fired.push(FraudRule::Overdraft);
        }
        if self.repeated_merchant(candidate, recent) {
            fired.push(FraudRule::RepeatedMerchant);
        }
        if self.novel_category(candidate, recent) {
            fired.push(FraudRule::NovelCategory);
        }
        fired
    }

    fn amount_spike(&self, candidate: &NewTransaction, recent: &[Transaction]) -> bool {
        let amount = candidate.amount.abs();
        let average = if recent.is_empty() {
            Decimal::ZERO
        } else {
            let total = recent.iter().fold(Decimal::ZERO, |sum, tx| {
                sum.checked_add(tx.amount.abs()).unwrap_or(Decimal::MAX)
            });
            total / Decimal::from(recent.len() as u64)
        };
        let ceiling = average
            .checked_mul(self.spike_multiplier)
            .unwrap_or(Decimal::MAX);
        amount > ceiling && amount > self.spike_floor
    }

    fn overdraft(&self, candidate: &NewTransaction, account: &Account) -> bool {
        if candidate.amount >= Decimal::ZERO {
            return false;
        }
        match account.available.checked_add(candidate.amount) {
            Some(after) => after < -self.overdraft_allowance,
            None => true,
        }
    }

    fn repeated_merchant(&self, candidate: &NewTransaction, recent: &[Transaction]) -> bool {
        let repeats = recent
            .iter()
            .filter(|tx| self.same_merchant(&tx.merchant_name, &candidate.merchant_name))
            .filter(|tx| self.similar_amount(tx.amount, candidate.amount))
            .count();
        repeats >= self.repeat_threshold
    }

    fn same_merchant(&self, a: &Option<String>, b: &Option<String>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.match_missing_merchant,
            _ => false,
        }
    }

    fn similar_amount(&self, a: Decimal, b: Decimal) -> bool {
        let largest = a.abs().max(b.abs());
        if largest.is_zero() {
            return false;
        }
        match a.checked_sub(b) {
            Some(diff) => diff.abs() / largest < self.similarity_tolerance,
            None => false,
        }
    }

    fn novel_category(&self, candidate: &NewTransaction, recent: &[Transaction]) -> bool {
        let category = match candidate.category.as_deref() {
            Some(category) if !category.is_empty() => category,
            _ => return false,
        };
        let seen: HashSet<&str> = recent
            .iter()
            .filter_map(|tx| tx.category.as_deref())
            .filter(|c| !c.is_empty())
            .collect();
        !seen.contains(category)
            && recent.len() > self.novel_category_min_history
            && candidate.amount.abs() > self.novel_category_floor
    }
}

/// Screens a proposed movement against the account's recent history.
/// Only reports a verdict; persisting alerts is the caller's job.
#[derive(Debug)]
pub struct FraudScreener<S> {
    store: Arc<S>,
    policy: FraudPolicy,
}

impl<S: LedgerStore> FraudScreener<S> {
    pub fn new(store: Arc<S>, policy: FraudPolicy) -> Self {
        Self { store, policy }
    }

    /// `true` when any rule fires. A store failure is returned, never
    /// treated as a clean verdict.
    pub async fn evaluate(
        &self,
        candidate: &NewTransaction,
        account: &Account,
    ) -> Result<bool, Error> {
        let recent = self
            .store
            .get_recent_transactions(account.id, self.policy.recent_window)
            .await?;
        let fired = self.policy.triggered_rules(candidate, account, &recent);
        if !fired.is_empty() {
            debug!(
                account = account.id,
                amount = %candidate.amount,
                rules = ?fired,
                "fraud rules fired"
            );
        }
        Ok(!fired.is_empty())
    }
}
