use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};

use crate::account::Account;
use crate::operation::Operation;

/// Parses an operations list in CSV format
/// (`kind,account,amount,reference,provider`).
///
/// # Panics
///
/// If a row cannot be parsed
pub struct CsvOperationParser<R> {
    iter: DeserializeRecordsIntoIter<R, Operation>,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = (u64, Operation);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row.unwrap()))
    }
}

/// Reads the seed accounts file
/// (`id,kind,alias,displayNumber,balance,limit,blocked`).
pub fn parse_accounts<R>(source: R) -> Result<Vec<Account>, csv::Error>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source)
        .into_deserialize()
        .collect()
}
