//! Multinomial Naive Bayes over description words, with add-one smoothing.

use sift_core::tokenize;
use std::collections::{HashMap, HashSet};

/// Per-category counts.
#[derive(Debug, Clone, Default)]
struct ClassStats {
    label: String,
    doc_count: u64,
    token_counts: HashMap<String, u64>,
    total_tokens: u64,
}

#[derive(Debug, Clone, Default)]
pub struct NaiveBayesClassifier {
    /// Categories in the order they were first seen; ties go to the earliest.
    classes: Vec<ClassStats>,
    index: HashMap<String, usize>,
    vocabulary: HashSet<String>,
    total_docs: u64,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds labeled examples to the counts. Calling it again keeps
    /// accumulating; examples with a blank label are ignored.
    pub fn fit<T, L>(&mut self, examples: impl IntoIterator<Item = (T, L)>)
    where
        T: AsRef<str>,
        L: AsRef<str>,
    {
        for (text, label) in examples {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            let slot = match self.index.get(label) {
                Some(&i) => i,
                None => {
                    self.classes.push(ClassStats {
                        label: label.to_string(),
                        ..Default::default()
                    });
                    self.index.insert(label.to_string(), self.classes.len() - 1);
                    self.classes.len() - 1
                }
            };

            self.total_docs += 1;
            let class = &mut self.classes[slot];
            class.doc_count += 1;
            for token in tokenize(text.as_ref()) {
                class.total_tokens += 1;
                *class.token_counts.entry(token.clone()).or_insert(0) += 1;
                self.vocabulary.insert(token);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn total_docs(&self) -> u64 {
        self.total_docs
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.label.as_str())
    }

    pub fn doc_count(&self, label: &str) -> u64 {
        self.index
            .get(label)
            .map_or(0, |&i| self.classes[i].doc_count)
    }

    pub fn token_count(&self, label: &str, token: &str) -> u64 {
        self.index
            .get(label)
            .and_then(|&i| self.classes[i].token_counts.get(token).copied())
            .unwrap_or(0)
    }

    /// Log-probability score of `text` for each category, in first-seen order.
    pub fn log_scores(&self, text: &str) -> Vec<(&str, f64)> {
        let tokens = tokenize(text);
        let vocab = self.vocabulary.len() as f64;
        let total_docs = self.total_docs as f64;

        self.classes
            .iter()
            .map(|class| {
                let prior = (class.doc_count as f64 / total_docs).ln();
                let denom = class.total_tokens as f64 + vocab;
                let likelihood: f64 = tokens
                    .iter()
                    .map(|t| {
                        let count = class.token_counts.get(t).copied().unwrap_or(0) as f64;
                        ((count + 1.0) / denom).ln()
                    })
                    .sum();
                (class.label.as_str(), prior + likelihood)
            })
            .collect()
    }

    /// Highest-scoring category, or `None` before anything has been fit.
    pub fn predict_one(&self, text: &str) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, score) in self.log_scores(text) {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        best.map(|(label, _)| label)
    }

    pub fn predict<T: AsRef<str>>(&self, texts: &[T]) -> Vec<Option<&str>> {
        texts.iter().map(|t| self.predict_one(t.as_ref())).collect()
    }
}
