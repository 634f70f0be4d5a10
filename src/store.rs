use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::account::{Account, AccountId, AccountKind, Transaction};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown account `{0}`")]
    AccountNotFound(AccountId),
    #[error("Ledger commit failed; no state was changed, the operation is safe to retry")]
    CommitFailed,
}

/// Authoritative holder of accounts and the append-only journal. The only
/// place balances change.
///
/// The account set is fixed at construction (account management lives
/// outside the core), so the map itself is never locked; each account sits
/// behind its own `Mutex` and all mutations against one account serialize
/// on it. Lock order everywhere: account locks by ascending id, then the
/// journal lock. Commits append to the journal while still holding the
/// account lock(s), so a reader holding an account lock always sees a
/// balance consistent with that account's entries.
pub struct LedgerStore {
    accounts: IndexMap<AccountId, Mutex<Account>>,
    journal: Mutex<Vec<Transaction>>,
    next_entry_id: AtomicU64,
}

impl LedgerStore {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|acc| (acc.id().clone(), Mutex::new(acc)))
                .collect(),
            journal: Mutex::new(Vec::new()),
            next_entry_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of all accounts in insertion order.
    pub fn get_accounts(&self) -> Vec<Account> {
        self.accounts
            .values()
            .map(|cell| {
                // a poisoned account is still readable; commits never leave
                // it torn because the journal append happens under its lock
                cell.lock().unwrap_or_else(PoisonError::into_inner).clone()
            })
            .collect()
    }

    /// Snapshot of the journal, newest first, optionally filtered to one
    /// account.
    pub fn get_transactions(&self, account_id: Option<&AccountId>) -> Vec<Transaction> {
        let journal = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        journal
            .iter()
            .rev()
            .filter(|tx| account_id.is_none_or(|id| &tx.account_id == id))
            .cloned()
            .collect()
    }

    /// First Credit account other than `exclude`, if any. Used to pick the
    /// settlement target.
    pub(crate) fn find_credit_account(&self, exclude: &AccountId) -> Option<AccountId> {
        self.accounts.iter().find_map(|(id, cell)| {
            if id == exclude {
                return None;
            }
            let acc = cell.lock().unwrap_or_else(PoisonError::into_inner);
            (acc.kind() == AccountKind::Credit).then(|| id.clone())
        })
    }

    pub(crate) fn lock_account(
        &self,
        id: &AccountId,
    ) -> Result<MutexGuard<'_, Account>, StoreError> {
        self.accounts
            .get(id)
            .ok_or_else(|| StoreError::AccountNotFound(id.clone()))?
            .lock()
            .map_err(|_| StoreError::CommitFailed)
    }

    /// Locks two distinct accounts, always acquiring the lexicographically
    /// smaller id first so concurrent pair commits cannot deadlock. Guards
    /// are returned in caller order.
    pub(crate) fn lock_pair(
        &self,
        first: &AccountId,
        second: &AccountId,
    ) -> Result<(MutexGuard<'_, Account>, MutexGuard<'_, Account>), StoreError> {
        debug_assert_ne!(first, second);
        if first < second {
            let a = self.lock_account(first)?;
            let b = self.lock_account(second)?;
            Ok((a, b))
        } else {
            let b = self.lock_account(second)?;
            let a = self.lock_account(first)?;
            Ok((a, b))
        }
    }

    /// Posts one entry against an already-locked account: balance decrement
    /// and journal append are indivisible because both happen before the
    /// caller's guard is released.
    pub(crate) fn commit_one(
        &self,
        account: &mut Account,
        magnitude: Decimal,
        description: String,
    ) -> Result<Transaction, StoreError> {
        let mut journal = self.journal.lock().map_err(|_| StoreError::CommitFailed)?;
        let entry = self.new_entry(account.id().clone(), magnitude, description, Utc::now());
        account.apply_delta(magnitude);
        journal.push(entry.clone());
        debug!(
            account = %entry.account_id,
            entry = entry.id,
            %magnitude,
            balance = %account.balance(),
            "posted ledger entry"
        );
        Ok(entry)
    }

    /// Posts the settlement pair under both account locks with a single
    /// journal append and one shared timestamp: any reader sees both
    /// entries or neither.
    pub(crate) fn commit_pair(
        &self,
        source: &mut Account,
        source_magnitude: Decimal,
        source_description: String,
        target: &mut Account,
        target_magnitude: Decimal,
        target_description: String,
    ) -> Result<(Transaction, Transaction), StoreError> {
        let mut journal = self.journal.lock().map_err(|_| StoreError::CommitFailed)?;
        let now = Utc::now();
        let debit = self.new_entry(source.id().clone(), source_magnitude, source_description, now);
        let credit = self.new_entry(target.id().clone(), target_magnitude, target_description, now);
        source.apply_delta(source_magnitude);
        target.apply_delta(target_magnitude);
        journal.push(debit.clone());
        journal.push(credit.clone());
        debug!(
            source = %debit.account_id,
            target = %credit.account_id,
            entries = ?(debit.id, credit.id),
            "posted settlement pair"
        );
        Ok((debit, credit))
    }

    /// The unvalidated mutation primitive: atomically decrements the
    /// account's balance by `magnitude` and appends the matching entry with
    /// `amount = -magnitude`. Funds and block checks are the processor's
    /// job, not performed here.
    pub(crate) fn apply_delta(
        &self,
        account_id: &AccountId,
        magnitude: Decimal,
        description: String,
    ) -> Result<Transaction, StoreError> {
        let mut account = self.lock_account(account_id)?;
        self.commit_one(&mut account, magnitude, description)
    }

    fn new_entry(
        &self,
        account_id: AccountId,
        magnitude: Decimal,
        description: String,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id: self.next_entry_id.fetch_add(1, Ordering::Relaxed),
            account_id,
            timestamp,
            description,
            amount: -magnitude,
        }
    }
}
