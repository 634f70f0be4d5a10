/// Account and ledger-entry types, plus the pure per-account validation
/// that the processor runs before committing anything.
pub mod account;

/// The closed set of monetary operations a caller may submit.
pub mod operation;

/// Authoritative account set and append-only journal, with the per-account
/// locking protocol all mutations go through.
pub mod store;

/// Validates and commits operations against [`store`]; owns the credit-card
/// dual-posting rule.
pub mod processor;

/// Card block/unblock state, consulted by the processor before debits.
pub mod instrument;

/// In-process facade over the core for UI/API callers.
pub mod bank;

/// Ideally, this module should exist in its own crate, as a way to
/// bootstrap the core logic. However, it is also used by the integration
/// tests, so it lives here.
pub mod bin_utils;
