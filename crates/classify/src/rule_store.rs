use sift_core::{KeyValueStore, StoreError};
use thiserror::Error;

use crate::pattern::{Pattern, PatternError};
use crate::rules::CategoryRuleSet;

/// Key the rule set is persisted under.
pub const RULES_KEY: &str = "expense_rules";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Category name is empty")]
    EmptyCategory,
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("Failed to persist rules: {0}")]
    Store(#[from] StoreError),
}

/// JSON object of category name to `/body/flags` strings, in scan order.
pub fn encode(rules: &CategoryRuleSet) -> Result<String, StoreError> {
    Ok(serde_json::to_string(rules)?)
}

/// Inverse of [`encode`]. Entries may also be `{"source", "flags"}` objects
/// or bare bodies, which are read as case-insensitive.
pub fn decode(raw: &str) -> Result<CategoryRuleSet, StoreError> {
    Ok(serde_json::from_str(raw)?)
}

/// Loads and saves a [`CategoryRuleSet`] through a key-value store.
#[derive(Debug)]
pub struct RuleStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> RuleStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, RULES_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The persisted rules, or the built-in defaults when nothing is stored.
    pub fn load(&self) -> Result<CategoryRuleSet, StoreError> {
        match self.store.get(&self.key)? {
            Some(raw) => {
                let rules = decode(&raw)?;
                tracing::debug!(key = %self.key, categories = rules.len(), "loaded stored rules");
                Ok(rules)
            }
            None => {
                tracing::debug!(key = %self.key, "no stored rules, using defaults");
                Ok(CategoryRuleSet::defaults())
            }
        }
    }

    /// Overwrites the stored value with `rules`.
    pub fn save(&mut self, rules: &CategoryRuleSet) -> Result<(), StoreError> {
        let raw = encode(rules)?;
        self.store.set(&self.key, &raw)
    }

    /// Validates `pattern`, appends it to `category` and persists the result.
    ///
    /// On any error `rules` and the store are left untouched. Returns `false`
    /// when the category already had the same pattern.
    pub fn add_rule(
        &mut self,
        rules: &mut CategoryRuleSet,
        category: &str,
        pattern: &str,
    ) -> Result<bool, RuleError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(RuleError::EmptyCategory);
        }
        let pattern = Pattern::parse(pattern)?;

        let mut updated = rules.clone();
        if !updated.push_pattern(category, pattern.clone()) {
            tracing::debug!(category, %pattern, "rule already present");
            return Ok(false);
        }
        self.save(&updated)?;
        *rules = updated;
        tracing::info!(category, %pattern, "rule added");
        Ok(true)
    }

    /// Replaces the stored rules with the defaults and returns them.
    pub fn reset(&mut self) -> Result<CategoryRuleSet, StoreError> {
        let defaults = CategoryRuleSet::defaults();
        self.save(&defaults)?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::MemoryStore;

    fn sample() -> CategoryRuleSet {
        let mut rules = CategoryRuleSet::new();
        rules.insert(
            "Groceries",
            vec![
                Pattern::new(r"\btrader\s*joe'?s?\b", "i").unwrap(),
                Pattern::new("SAFEWAY", "").unwrap(),
            ],
        );
        rules.insert("Pets", vec![Pattern::new("petco|chewy", "im").unwrap()]);
        rules
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn load_without_stored_value_gives_defaults() {
        let store = RuleStore::new(MemoryStore::new());
        assert_eq!(store.load().unwrap(), CategoryRuleSet::defaults());
    }

    #[test]
    fn save_then_load_round_trips_source_and_flags() {
        let mut store = RuleStore::new(MemoryStore::new());
        let rules = sample();
        store.save(&rules).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, rules);

        let pairs: Vec<(&str, &str)> = loaded
            .iter()
            .flat_map(|(_, ps)| ps.iter().map(|p| (p.source(), p.flags())))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (r"\btrader\s*joe'?s?\b", "i"),
                ("SAFEWAY", ""),
                ("petco|chewy", "im"),
            ]
        );
    }

    #[test]
    fn defaults_round_trip() {
        let mut store = RuleStore::new(MemoryStore::new());
        store.save(&CategoryRuleSet::defaults()).unwrap();
        assert_eq!(store.load().unwrap(), CategoryRuleSet::defaults());
    }

    #[test]
    fn save_writes_portable_form_under_key() {
        let mut backing = MemoryStore::new();
        let mut store = RuleStore::new(&mut backing);
        store.save(&sample()).unwrap();
        let raw = backing.get(RULES_KEY).unwrap().unwrap();
        assert!(raw.starts_with(r#"{"Groceries":["/\\btrader"#));
        assert!(raw.contains(r#""/SAFEWAY/""#));
    }

    #[test]
    fn load_accepts_mixed_entry_shapes() {
        let mut backing = MemoryStore::new();
        backing
            .set(
                RULES_KEY,
                r#"{"Housing": [{"source": "rent", "flags": "i"}, "/HOA/", "landlord", "/(bad/i"]}"#,
            )
            .unwrap();
        let rules = RuleStore::new(backing).load().unwrap();
        let housing = rules.get("Housing").unwrap();
        assert_eq!(housing.len(), 4);
        assert_eq!((housing[1].source(), housing[1].flags()), ("HOA", ""));
        assert_eq!((housing[2].source(), housing[2].flags()), ("landlord", "i"));
        assert!(!housing[3].is_valid());
        assert_eq!(rules.categorize("Landlord LLC"), Some("Housing"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut backing = MemoryStore::new();
        backing.set(RULES_KEY, "not json").unwrap();
        assert!(matches!(
            RuleStore::new(backing).load(),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn custom_key() {
        let mut store = RuleStore::with_key(MemoryStore::new(), "rules_v2");
        store.save(&sample()).unwrap();
        assert!(store.store().get("rules_v2").unwrap().is_some());
        assert!(store.store().get(RULES_KEY).unwrap().is_none());
    }

    // ── add_rule ──────────────────────────────────────────────────────────────

    #[test]
    fn add_rule_appends_and_persists() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::defaults();
        assert!(store.add_rule(&mut rules, " Pets ", "petco").unwrap());
        assert_eq!(rules.categorize("PETCO #991"), Some("Pets"));
        assert_eq!(store.load().unwrap(), rules);
    }

    #[test]
    fn add_rule_extends_existing_category() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::defaults();
        let before = rules.get("Groceries").unwrap().len();
        store.add_rule(&mut rules, "Groceries", "/aldi/i").unwrap();
        let groceries = rules.get("Groceries").unwrap();
        assert_eq!(groceries.len(), before + 1);
        assert_eq!(groceries.last().unwrap().source(), "aldi");
    }

    #[test]
    fn add_rule_rejects_invalid_pattern_without_side_effects() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::defaults();
        let err = store.add_rule(&mut rules, "Pets", "(petco").unwrap_err();
        assert!(matches!(err, RuleError::Pattern(PatternError::Regex(_))));
        assert!(err.to_string().starts_with("Invalid pattern"));
        assert!(!rules.contains("Pets"));
        assert!(store.store().get(RULES_KEY).unwrap().is_none());
    }

    #[test]
    fn add_rule_rejects_empty_category() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::new();
        assert!(matches!(
            store.add_rule(&mut rules, "  ", "petco"),
            Err(RuleError::EmptyCategory)
        ));
    }

    #[test]
    fn add_rule_duplicate_is_noop() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::new();
        assert!(store.add_rule(&mut rules, "Pets", "petco").unwrap());
        assert!(!store.add_rule(&mut rules, "Pets", "/petco/i").unwrap());
        assert_eq!(rules.get("Pets").unwrap().len(), 1);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut store = RuleStore::new(MemoryStore::new());
        let mut rules = CategoryRuleSet::new();
        store.add_rule(&mut rules, "Pets", "petco").unwrap();
        let reset = store.reset().unwrap();
        assert_eq!(reset, CategoryRuleSet::defaults());
        assert_eq!(store.load().unwrap(), CategoryRuleSet::defaults());
    }
}
