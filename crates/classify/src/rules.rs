use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use sift_core::normalize;
use std::fmt;

use crate::pattern::Pattern;

/// Seed rules used when nothing has been persisted yet.
const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &[
            r"\btrader\s*joe'?s?\b",
            r"\bsafeway\b",
            r"\bwhole\s*foods\b",
            r"\bcostco\b",
            r"\bheb\b",
            r"\bwalmart\b",
            r"\btarget\b",
            r"\binstacart\b",
        ],
    ),
    (
        "Restaurants",
        &[
            r"\bubereats\b",
            r"\bdoordash\b",
            r"\bgrubhub\b",
            r"\bstarbucks\b",
            r"\bmcdonald'?s?\b",
            r"\bchipotle\b",
            r"\btaco\s*bell\b",
            r"\bsubway\b",
            r"\bpizza\b",
            r"\bkfc\b",
            r"\bpanda\s*express\b",
        ],
    ),
    (
        "Transport",
        &[
            r"\buber\b",
            r"\blyft\b",
            r"\bchevron\b",
            r"\bshell\b",
            r"\bexxon\b",
            r"\bbp\b",
            r"\btesla\b",
            r"\bvalero\b",
            r"\bstation\s*gas\b",
            r"\bgas\b",
            r"\bmetro\b",
            r"\bsubway\s*station\b",
        ],
    ),
    (
        "Housing",
        &[
            r"\brent\b",
            r"\bmortgage\b",
            r"\blandlord\b",
            r"\bapartment\b",
            r"\bproperty\s*management\b",
            r"\bhoa\b",
        ],
    ),
    (
        "Utilities",
        &[
            r"\belectric\b",
            r"\bwater\b",
            r"\binternet\b",
            r"\bcomcast\b",
            r"\bat&t\b",
            r"\bverizon\b",
            r"\bt-mobile\b",
            r"\bspectrum\b",
        ],
    ),
    (
        "Entertainment",
        &[
            r"\bnetflix\b",
            r"\bspotify\b",
            r"\bhulu\b",
            r"\bdisney\+?",
            r"\bprime\s*video\b",
            r"\bxbox\b",
            r"\bplaystation\b",
            r"\bsteam\b",
        ],
    ),
    (
        "Shopping",
        &[
            r"\bamzn\b|\bamazon\b",
            r"\bebay\b",
            r"\betsy\b",
            r"\bbest\s*buy\b",
            r"\bapple\s*store\b",
        ],
    ),
    (
        "Health",
        &[
            r"\bcvs\b",
            r"\bwalgreens\b",
            r"\bpharmacy\b",
            r"\bdoctor\b",
            r"\bdentist\b",
            r"\bclinic\b",
            r"\boptical\b",
        ],
    ),
    (
        "Travel",
        &[
            r"\bairbnb\b",
            r"\bbooking\.com\b",
            r"\bexpedia\b",
            r"\bmarriott\b",
            r"\bhilton\b",
            r"\bdelta\b",
            r"\bamerican\s*airlines\b",
            r"\bsouthwest\b",
            r"\bunited\b",
        ],
    ),
    (
        "Income",
        &[
            r"\bpayroll\b",
            r"\bsalary\b",
            r"\bpaycheck\b",
            r"\bdirect\s*deposit\b",
            r"\bvenmo\s*cashout\b",
            r"\bcash\s*app\s*cashout\b",
            r"\bzelle\s*in\b",
            r"\binterest\s*payment\b",
        ],
    ),
    (
        "Fees",
        &[
            r"\boverdraft\b",
            r"\bmaintenance\s*fee\b",
            r"\bservice\s*charge\b",
            r"\batm\s*fee\b",
            r"\bwire\s*fee\b",
        ],
    ),
];

/// Ordered mapping of category name to its patterns.
///
/// Both orders are significant: categories are scanned in insertion order,
/// and patterns within a category in list order. The first hit wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRuleSet {
    categories: Vec<(String, Vec<Pattern>)>,
}

impl CategoryRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in seed rules, all case-insensitive.
    pub fn defaults() -> Self {
        let categories = DEFAULT_RULES
            .iter()
            .map(|(name, sources)| {
                let patterns = sources.iter().map(|s| Pattern::from_parts(s, "i")).collect();
                (name.to_string(), patterns)
            })
            .collect();
        CategoryRuleSet { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.position(category).is_some()
    }

    pub fn get(&self, category: &str) -> Option<&[Pattern]> {
        self.position(category)
            .map(|i| self.categories[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Pattern])> {
        self.categories
            .iter()
            .map(|(name, patterns)| (name.as_str(), patterns.as_slice()))
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|(name, _)| name == category)
    }

    /// Sets a category's patterns. An existing category keeps its place in
    /// the scan order; a new one goes last.
    pub fn insert(&mut self, category: &str, patterns: Vec<Pattern>) {
        match self.position(category) {
            Some(i) => self.categories[i].1 = patterns,
            None => self.categories.push((category.to_string(), patterns)),
        }
    }

    /// Appends `pattern` to `category`, creating the category if needed.
    /// Returns `false` when the category already holds an equal pattern.
    pub fn push_pattern(&mut self, category: &str, pattern: Pattern) -> bool {
        let i = match self.position(category) {
            Some(i) => i,
            None => {
                self.categories.push((category.to_string(), Vec::new()));
                self.categories.len() - 1
            }
        };
        let patterns = &mut self.categories[i].1;
        if patterns.contains(&pattern) {
            return false;
        }
        patterns.push(pattern);
        true
    }

    /// Category of the first pattern that matches the normalized `text`.
    pub fn categorize(&self, text: &str) -> Option<&str> {
        let text = normalize(text);
        for (category, patterns) in &self.categories {
            for pattern in patterns {
                if pattern.is_match(&text) {
                    tracing::trace!(category = category.as_str(), pattern = %pattern, "rule matched");
                    return Some(category.as_str());
                }
            }
        }
        None
    }
}

/// Free-function form of [`CategoryRuleSet::categorize`].
pub fn categorize<'r>(text: &str, rules: &'r CategoryRuleSet) -> Option<&'r str> {
    rules.categorize(text)
}

impl Serialize for CategoryRuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, patterns) in &self.categories {
            map.serialize_entry(category, patterns)?;
        }
        map.end()
    }
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = CategoryRuleSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of category name to a list of patterns")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut rules = CategoryRuleSet::new();
        while let Some((category, patterns)) = access.next_entry::<String, Vec<Pattern>>()? {
            rules.insert(&category, patterns);
        }
        Ok(rules)
    }
}

impl<'de> Deserialize<'de> for CategoryRuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RuleSetVisitor)
    }
}
