use sift_core::Transaction;
use std::io::Write;

use crate::csv::CsvError;

pub const EXPORT_HEADER: [&str; 7] = [
    "date",
    "description",
    "merchant",
    "amount",
    "category",
    "type",
    "account",
];

/// Starter file for users assembling their own export.
pub const CSV_TEMPLATE: &str = "date,description,amount,category\n\
2024-05-01,TRADER JOES #123,-45.67,Groceries\n\
2024-05-02,UBER TRIP 9Q8W2,-12.34,Transport\n\
2024-05-03,ACME PAYROLL,2500.00,Income\n";

/// Writes transactions as CSV. Fields holding a comma, quote or newline are
/// quoted with inner quotes doubled. The header is always written.
pub fn write_csv<W: Write>(transactions: &[Transaction], out: W) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);

    writer.write_record(EXPORT_HEADER)?;
    for tx in transactions {
        let amount = tx.amount.to_string();
        writer.write_record([
            tx.date.as_str(),
            tx.description.as_str(),
            tx.merchant.as_str(),
            amount.as_str(),
            tx.category.as_deref().unwrap_or_default(),
            tx.kind.as_str(),
            tx.account.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(transactions: &[Transaction]) -> Result<String, CsvError> {
    let mut buf = Vec::new();
    write_csv(transactions, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
