pub mod bayes;
pub mod hybrid;
pub mod pattern;
pub mod rule_store;
pub mod rules;

pub use bayes::NaiveBayesClassifier;
pub use hybrid::{apply_hybrid, Categorizer, HybridOutcome};
pub use pattern::{Pattern, PatternError};
pub use rule_store::{decode, encode, RuleError, RuleStore, RULES_KEY};
pub use rules::{categorize, CategoryRuleSet};
