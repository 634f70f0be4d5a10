use std::sync::Arc;

use tracing::debug;

use crate::account::AccountId;
use crate::store::{LedgerStore, StoreError};

/// Tracks per-account card block state, independent of balance. Blocking
/// only gates caller-initiated debits; incoming settlement credits still
/// post to a blocked card.
pub struct InstrumentStateManager {
    store: Arc<LedgerStore>,
}

impl InstrumentStateManager {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Flips the block flag and returns the new state. The flip happens
    /// under the account lock, so it serializes with in-flight postings.
    pub fn toggle_block(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        let mut account = self.store.lock_account(account_id)?;
        let blocked = !account.is_blocked();
        account.set_blocked(blocked);
        debug!(account = %account_id, blocked, "instrument block toggled");
        Ok(blocked)
    }

    pub fn is_blocked(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        Ok(self.store.lock_account(account_id)?.is_blocked())
    }
}
