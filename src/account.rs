use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AccountId = String;
pub type TransactionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Debit,
    Savings,
    Credit,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Card is blocked, debits are not allowed")]
    InstrumentBlocked,
    #[error("Insufficient funds")]
    InsufficientFunds,
}

/// A single customer account as held by the ledger store.
///
/// `balance` is "funds available" for Debit/Savings. For Credit accounts it
/// is the negative of credit used, so a more negative balance means more
/// debt; `limit` is advisory and never enforced against the balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: AccountId,
    kind: AccountKind,
    alias: String,
    display_number: String,
    balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<Decimal>,
    #[serde(default)]
    blocked: bool,
}

impl Account {
    pub fn new(
        id: impl Into<AccountId>,
        kind: AccountKind,
        alias: impl Into<String>,
        display_number: impl Into<String>,
        balance: Decimal,
        limit: Option<Decimal>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            alias: alias.into(),
            display_number: display_number.into(),
            balance,
            limit,
            blocked: false,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn display_number(&self) -> &str {
        &self.display_number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn limit(&self) -> Option<Decimal> {
        self.limit
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Checks whether an outgoing debit of `magnitude` may be taken from
    /// this account. Credit accounts skip the funds check: their balance may
    /// go further negative, bounded only by the advisory `limit`.
    pub fn check_debit(&self, magnitude: Decimal) -> Result<(), AccountError> {
        if self.blocked {
            return Err(AccountError::InstrumentBlocked);
        }
        if self.kind != AccountKind::Credit && self.balance < magnitude {
            return Err(AccountError::InsufficientFunds);
        }
        Ok(())
    }

    /// Debt on a Credit account and the 5% minimum payment on it.
    /// `None` for non-credit accounts or when no limit is configured.
    pub fn minimum_payment(&self) -> Option<Decimal> {
        if self.kind != AccountKind::Credit {
            return None;
        }
        let debt = (self.limit? - self.balance).max(Decimal::ZERO);
        Some(debt * Decimal::new(5, 2))
    }

    /// Decrements the balance by `magnitude`. No validation happens here;
    /// callers go through the ledger store, which pairs this with the
    /// journal append.
    pub(crate) fn apply_delta(&mut self, magnitude: Decimal) {
        self.balance -= magnitude;
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }
}

/// One committed ledger entry. Append-only: created exactly once by the
/// store on commit, never mutated or deleted. The stored `amount` is the
/// negative of the debited magnitude, so `balance_before + amount` gives
/// `balance_after` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub amount: Decimal,
}
