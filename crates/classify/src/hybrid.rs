use sift_core::Transaction;
use std::collections::HashSet;

use crate::bayes::NaiveBayesClassifier;
use crate::rules::CategoryRuleSet;

/// Result of one hybrid pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridOutcome {
    pub transactions: Vec<Transaction>,
    /// Rows categorized by a rule in this pass.
    pub by_rules: usize,
    /// Rows categorized by the model in this pass.
    pub by_model: usize,
    /// Rows still without a category.
    pub uncategorized: usize,
}

/// Runs rules, then a freshly trained classifier, over transaction batches.
///
/// Holds the model from the latest pass so single descriptions can be
/// classified between batches. Every pass replaces or clears it.
#[derive(Debug, Default)]
pub struct Categorizer {
    model: Option<NaiveBayesClassifier>,
}

impl Categorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&NaiveBayesClassifier> {
        self.model.as_ref()
    }

    pub fn apply_hybrid(&mut self, rows: &[Transaction], rules: &CategoryRuleSet) -> HybridOutcome {
        self.apply_hybrid_with_seed(rows, &[], rules)
    }

    /// Like [`Categorizer::apply_hybrid`], with extra labeled `seed` rows
    /// added to the training set. Seed rows are not returned.
    pub fn apply_hybrid_with_seed(
        &mut self,
        rows: &[Transaction],
        seed: &[Transaction],
        rules: &CategoryRuleSet,
    ) -> HybridOutcome {
        let mut out = rows.to_vec();

        let mut by_rules = 0;
        for tx in out.iter_mut().filter(|tx| !tx.is_categorized()) {
            if let Some(category) = rules.categorize(&tx.description) {
                tx.category = Some(category.to_string());
                by_rules += 1;
            }
        }

        let Some(model) = train(seed, &out) else {
            self.model = None;
            return summarize(out, by_rules, 0);
        };

        let mut by_model = 0;
        for tx in out.iter_mut().filter(|tx| !tx.is_categorized()) {
            if let Some(category) = model.predict_one(&tx.description) {
                tx.category = Some(category.to_string());
                by_model += 1;
            }
        }

        self.model = Some(model);
        summarize(out, by_rules, by_model)
    }

    /// Categorizes one description: rules first, then the current model.
    pub fn classify_text(&self, text: &str, rules: &CategoryRuleSet) -> Option<String> {
        rules
            .categorize(text)
            .or_else(|| self.model.as_ref().and_then(|m| m.predict_one(text)))
            .map(str::to_string)
    }
}

/// Fits a model on every row with both a category and a description.
/// Returns `None` when fewer than two distinct categories are present.
fn train(seed: &[Transaction], rows: &[Transaction]) -> Option<NaiveBayesClassifier> {
    let labeled: Vec<(&str, &str)> = seed
        .iter()
        .chain(rows)
        .filter(|tx| !tx.description.trim().is_empty())
        .filter_map(|tx| tx.category().map(|c| (tx.description.as_str(), c)))
        .collect();
    let distinct = labeled.iter().map(|(_, c)| *c).collect::<HashSet<_>>().len();

    if distinct < 2 {
        tracing::debug!(
            labeled = labeled.len(),
            categories = distinct,
            "not enough categories to train, skipping model"
        );
        return None;
    }

    let mut model = NaiveBayesClassifier::new();
    model.fit(labeled);
    tracing::debug!(
        docs = model.total_docs(),
        categories = distinct,
        vocabulary = model.vocabulary_size(),
        "trained classifier"
    );
    Some(model)
}

fn summarize(transactions: Vec<Transaction>, by_rules: usize, by_model: usize) -> HybridOutcome {
    let uncategorized = transactions.iter().filter(|t| !t.is_categorized()).count();
    tracing::info!(
        rows = transactions.len(),
        by_rules,
        by_model,
        uncategorized,
        "hybrid categorization finished"
    );
    HybridOutcome {
        transactions,
        by_rules,
        by_model,
        uncategorized,
    }
}

/// One-off hybrid pass with no retained model.
pub fn apply_hybrid(rows: &[Transaction], rules: &CategoryRuleSet) -> Vec<Transaction> {
    Categorizer::new().apply_hybrid(rows, rules).transactions
}
