use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// Formats tried, in order, by [`Transaction::parsed_date`].
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
];

/// One bank transaction in canonical shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    /// Raw date text as exported by the bank; may be empty.
    pub date: String,
    pub description: String,
    pub merchant: String,
    pub amount: Money,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: String,
}

impl Transaction {
    /// Category if it is set to something other than blank text.
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn is_categorized(&self) -> bool {
        self.category().is_some()
    }

    /// Label used when reporting rows nobody could categorize.
    pub fn category_or_uncategorized(&self) -> &str {
        self.category().unwrap_or("Uncategorized")
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let s = self.date.trim();
        if s.is_empty() {
            return None;
        }
        // Datetime exports ("2024-05-01 00:00:00") keep the date part.
        let s = s.split_whitespace().next().unwrap_or(s);
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }
}
