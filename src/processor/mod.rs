use thiserror::Error;

use crate::{
    account::{AccountError, Transaction},
    operation::Operation,
    store::StoreError,
};

pub mod ledger_processor;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Operation amount must be positive")]
    InvalidAmount,
    #[error("No credit account available to settle against")]
    NoCreditAccount,
    #[error(transparent)]
    AccountErr(#[from] AccountError),
    #[error(transparent)]
    StoreErr(#[from] StoreError),
}

/// Validation-and-commit seam between callers and the ledger store.
///
/// NOTE: a single implementation exists today, but the trait is the
/// integration point for replacing the in-memory store with something
/// more sophisticated.
pub trait OperationProcessor {
    fn execute(&self, operation: Operation) -> Result<Transaction, OperationError>;
}
