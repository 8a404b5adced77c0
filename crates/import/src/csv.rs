use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sift_core::{extract_merchant, Money, Transaction};
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;

const DATE_HEADERS: &[&str] = &[
    "date",
    "transaction date",
    "posted date",
    "posting date",
    "trans date",
    "value date",
];
const DESCRIPTION_HEADERS: &[&str] = &["description", "details", "payee", "memo", "narrative"];
const AMOUNT_HEADERS: &[&str] = &["amount", "transaction amount", "value"];
const DEBIT_HEADERS: &[&str] = &["debit", "withdrawal"];
const CREDIT_HEADERS: &[&str] = &["credit", "deposit"];
const TYPE_HEADERS: &[&str] = &["type", "transaction type"];
const ACCOUNT_HEADERS: &[&str] = &["account name", "account", "account number", "card number"];
const CATEGORY_HEADERS: &[&str] = &["category", "categorization"];

/// Type-column keywords that mark an outflow.
pub const OUTFLOW_KEYWORDS: &[&str] = &["debit", "withdraw", "purchase"];
/// Type-column keywords that mark an inflow. Checked after the outflow set,
/// so a type matching both ends up positive.
pub const INFLOW_KEYWORDS: &[&str] = &["credit", "deposit", "income", "refund"];

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One input row as `(header, cell)` pairs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, header: &str, value: &str) -> Self {
        self.cells.push((header.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }
}

impl<H: Into<String>, V: Into<String>> FromIterator<(H, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        RawRow {
            cells: iter.into_iter().map(|(h, v)| (h.into(), v.into())).collect(),
        }
    }
}

/// Which actual header feeds each canonical field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub kind: Option<String>,
    pub account: Option<String>,
    pub category: Option<String>,
}

impl ColumnMap {
    /// Matches headers case-insensitively against the synonym lists.
    /// Synonyms are tried in list order; the first header that matches wins.
    pub fn detect<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let lowered: Vec<(String, &str)> = headers
            .into_iter()
            .map(|h| (h.trim().to_lowercase(), h))
            .collect();

        let pick = |candidates: &[&str]| -> Option<String> {
            candidates.iter().find_map(|cand| {
                lowered
                    .iter()
                    .find(|(low, _)| low == cand)
                    .map(|(_, original)| original.to_string())
            })
        };

        let map = ColumnMap {
            date: pick(DATE_HEADERS),
            description: pick(DESCRIPTION_HEADERS),
            amount: pick(AMOUNT_HEADERS),
            debit: pick(DEBIT_HEADERS),
            credit: pick(CREDIT_HEADERS),
            kind: pick(TYPE_HEADERS),
            account: pick(ACCOUNT_HEADERS),
            category: pick(CATEGORY_HEADERS),
        };
        tracing::debug!(?map, "detected CSV columns");
        map
    }

    fn cell<'r>(&self, column: &Option<String>, row: &'r RawRow) -> Option<&'r str> {
        column.as_deref().and_then(|c| row.get(c))
    }

    /// Builds the canonical transaction for one row.
    pub fn transaction(&self, row: &RawRow) -> Transaction {
        let text = |column: &Option<String>| self.cell(column, row).unwrap_or_default().to_string();

        let description = text(&self.description);
        let kind = text(&self.kind);
        let amount = apply_type_sign(self.resolve_amount(row), &kind);
        let category = self
            .cell(&self.category, row)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string);

        Transaction {
            date: text(&self.date),
            merchant: extract_merchant(&description),
            description,
            amount,
            category,
            kind,
            account: text(&self.account),
        }
    }

    /// The amount column when it has a value, otherwise `credit - debit`.
    fn resolve_amount(&self, row: &RawRow) -> Money {
        if let Some(raw) = self
            .cell(&self.amount, row)
            .filter(|s| !s.trim().is_empty())
        {
            return parse_amount(raw);
        }
        let debit = self.cell(&self.debit, row).map(parse_amount).unwrap_or_default();
        let credit = self.cell(&self.credit, row).map(parse_amount).unwrap_or_default();
        credit.checked_sub(debit).unwrap_or_else(|| {
            tracing::warn!(%credit, %debit, "credit minus debit out of range, using 0");
            Money::zero()
        })
    }
}

/// Forces the sign from keywords in the transaction type text.
///
/// Outflow keywords make the amount negative, then inflow keywords make it
/// positive; when both sets match, the inflow check runs last and wins.
pub fn apply_type_sign(amount: Money, kind: &str) -> Money {
    let kind = kind.to_lowercase();
    let mut amount = amount;
    if OUTFLOW_KEYWORDS.iter().any(|k| kind.contains(k)) {
        amount = amount.as_outflow();
    }
    if INFLOW_KEYWORDS.iter().any(|k| kind.contains(k)) {
        amount = amount.as_inflow();
    }
    amount
}

/// Parses a bank amount after dropping thousands separators.
/// Anything that is not a number becomes zero.
pub fn parse_amount(s: &str) -> Money {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return Money::zero();
    }
    let unsigned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    match Decimal::from_str(unsigned).or_else(|_| Decimal::from_scientific(unsigned)) {
        Ok(dec) => Money::new(dec),
        Err(_) => {
            tracing::warn!(value = s, "unparseable amount, using 0");
            Money::zero()
        }
    }
}

/// Maps heterogeneous bank rows onto [`Transaction`]s.
///
/// Columns are detected once from the first row's headers. Every input row
/// yields exactly one transaction.
pub fn canonicalize(rows: &[RawRow]) -> Vec<Transaction> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let map = ColumnMap::detect(first.headers());
    rows.iter().map(|row| map.transaction(row)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReadOptions {
    pub delimiter: u8,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Reads a headed CSV into raw rows. Short records are padded with blanks.
pub fn read_raw_rows<R: Read>(data: R, options: &CsvReadOptions) -> Result<Vec<RawRow>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Reads and canonicalizes a bank CSV export.
pub fn import_csv<R: Read>(data: R, options: &CsvReadOptions) -> Result<Vec<Transaction>, CsvError> {
    let rows = read_raw_rows(data, options)?;
    let transactions = canonicalize(&rows);
    tracing::info!(rows = transactions.len(), "canonicalized CSV");
    Ok(transactions)
}
