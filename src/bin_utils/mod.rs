//! This module could be a separate crate on its own, to bootstrap [`retail_ledger`]
//! within a binary, but for simplicity purposes it lives here, which also lets the
//! integration tests drive the whole stack through it.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use csv_parser::{CsvOperationParser, parse_accounts};
use csv_printer::{AccountRow, print_accounts};

use crate::processor::{OperationError, OperationProcessor, ledger_processor::LedgerProcessor};
use crate::store::LedgerStore;

pub mod csv_parser;
pub mod csv_printer;

/// Batch driver: seeds a ledger store from an accounts CSV, replays an
/// operations CSV through the processor and prints the final account
/// snapshot. Rejected operations go to `error_printer` with their line
/// number; they never abort the run.
pub struct Service<'w, A, O, W: 'w> {
    pub accounts: A,
    pub operations: O,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, OperationError)>,
}

impl<'w, A, O, W> Service<'w, A, O, W>
where
    A: Read,
    O: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let seed = parse_accounts(self.accounts).context("Failed to parse the accounts file")?;
        let store = Arc::new(LedgerStore::new(seed));
        let processor = LedgerProcessor::new(Arc::clone(&store));

        for (line, operation) in CsvOperationParser::new(self.operations) {
            if let Err(err) = processor.execute(operation) {
                (self.error_printer)(line, err);
            }
        }

        print_accounts(
            self.output,
            store.get_accounts().into_iter().map(|acc| AccountRow {
                id: acc.id().clone(),
                kind: acc.kind(),
                alias: acc.alias().to_string(),
                balance: acc.balance(),
                blocked: acc.is_blocked(),
            }),
        )
    }
}
