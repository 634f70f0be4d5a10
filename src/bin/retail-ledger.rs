use std::fs::File;

use anyhow::{Context, Result};
use retail_ledger::bin_utils::Service;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let accounts_file = args
        .next()
        .context("Expected the accounts file name as the first argument")?;
    let operations_file = args
        .next()
        .context("Expected the operations file name as the second argument")?;

    let accounts = File::open(&accounts_file)
        .with_context(|| format!("Failed to open `{accounts_file}`"))?;
    let operations = File::open(&operations_file)
        .with_context(|| format!("Failed to open `{operations_file}`"))?;

    let service = Service {
        accounts,
        operations,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| {
            // rejections are part of normal operation, keep the run going
            eprintln!("Operation at line {line} rejected: {err}")
        }),
    };
    service.run()
}
