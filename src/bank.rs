use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    account::{Account, AccountId, Transaction},
    instrument::InstrumentStateManager,
    operation::Operation,
    processor::{OperationError, OperationProcessor, ledger_processor::LedgerProcessor},
    store::{LedgerStore, StoreError},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_login: None,
        }
    }
}

/// In-process surface over the core: wires one store instance into the
/// processor and the instrument manager (no ambient singleton) and exposes
/// the read queries and the two mutating entry points. A thin HTTP layer
/// can serialize every returned value as JSON unchanged.
pub struct Bank {
    store: Arc<LedgerStore>,
    processor: LedgerProcessor,
    instruments: InstrumentStateManager,
    profile: Mutex<UserProfile>,
}

impl Bank {
    pub fn new(profile: UserProfile, accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Arc::new(LedgerStore::new(accounts));
        Self {
            processor: LedgerProcessor::new(Arc::clone(&store)),
            instruments: InstrumentStateManager::new(Arc::clone(&store)),
            store,
            profile: Mutex::new(profile),
        }
    }

    pub fn list_accounts(&self) -> Vec<Account> {
        self.store.get_accounts()
    }

    pub fn list_transactions(&self, account_id: Option<&AccountId>) -> Vec<Transaction> {
        self.store.get_transactions(account_id)
    }

    pub fn submit_operation(&self, operation: Operation) -> Result<Transaction, OperationError> {
        self.processor.execute(operation)
    }

    pub fn toggle_instrument_block(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        self.instruments.toggle_block(account_id)
    }

    /// Most recent write wins; there is no further invariant on the login
    /// timestamp.
    pub fn record_login(&self, at: DateTime<Utc>) {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_login = Some(at);
    }

    pub fn profile(&self) -> UserProfile {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
