use regex::{Regex, RegexBuilder};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Flags that change how a pattern matches.
const MATCH_FLAGS: &[char] = &['i', 'm', 's', 'x'];
/// Flags accepted for compatibility that do not change a yes/no match.
const INERT_FLAGS: &[char] = &['g', 'u', 'y'];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("Invalid pattern: pattern is empty")]
    Empty,
    #[error("Invalid pattern: expected /body/flags, got '{0}'")]
    Malformed(String),
    #[error("Invalid pattern: unknown flag '{0}'")]
    UnknownFlag(char),
    #[error("Invalid pattern: {0}")]
    Regex(String),
}

/// A category matcher stored as `source` + `flags` and compiled once.
///
/// Patterns loaded from persisted data may fail to compile; those keep their
/// text so they survive a save, but never match.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    matcher: Option<Regex>,
}

impl Pattern {
    /// Compiles `source` with `flags`, rejecting anything invalid.
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let matcher = compile(source, flags)?;
        Ok(Pattern {
            source: source.to_string(),
            flags: flags.to_string(),
            matcher: Some(matcher),
        })
    }

    pub fn case_insensitive(source: &str) -> Result<Self, PatternError> {
        Self::new(source, "i")
    }

    /// Parses user-authored text. Text starting with `/` must be in
    /// `/body/flags` form; anything else is a case-insensitive body.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PatternError::Empty);
        }
        if text.starts_with('/') {
            let (body, flags) =
                split_portable(text).ok_or_else(|| PatternError::Malformed(text.to_string()))?;
            Self::new(body, flags)
        } else {
            Self::case_insensitive(text)
        }
    }

    /// Rebuilds a pattern from stored parts without failing. A pattern that
    /// does not compile is kept but disabled.
    pub fn from_parts(source: &str, flags: &str) -> Self {
        let matcher = match compile(source, flags) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(source, flags, error = %e, "disabling invalid stored pattern");
                None
            }
        };
        Pattern {
            source: source.to_string(),
            flags: flags.to_string(),
            matcher,
        }
    }

    /// Lenient counterpart of [`Pattern::parse`] for persisted strings:
    /// `/body/flags` when it looks like one, otherwise a case-insensitive body.
    pub fn from_stored(text: &str) -> Self {
        match split_portable(text) {
            Some((body, flags)) => Self::from_parts(body, flags),
            None => Self::from_parts(text, "i"),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn to_portable(&self) -> String {
        format!("/{}/{}", self.source, self.flags)
    }
}

/// Splits `/body/flags` on the last slash. Text whose tail holds anything
/// but known flags is not in portable form.
fn split_portable(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    flags
        .chars()
        .all(is_known_flag)
        .then_some((body, flags))
}

fn is_known_flag(c: char) -> bool {
    MATCH_FLAGS.contains(&c) || INERT_FLAGS.contains(&c)
}

fn compile(source: &str, flags: &str) -> Result<Regex, PatternError> {
    if source.is_empty() {
        return Err(PatternError::Empty);
    }
    if let Some(bad) = flags.chars().find(|&c| !is_known_flag(c)) {
        return Err(PatternError::UnknownFlag(bad));
    }
    RegexBuilder::new(source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .map_err(|e| PatternError::Regex(e.to_string()))
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("flags", &self.flags)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_portable())
    }
}

/// Shapes a persisted pattern entry may take.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPattern {
    Parts {
        source: String,
        #[serde(default)]
        flags: String,
    },
    Text(String),
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredPattern::deserialize(deserializer)? {
            StoredPattern::Parts { source, flags } => Pattern::from_parts(&source, &flags),
            StoredPattern::Text(text) => Pattern::from_stored(&text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn parse_plain_text_is_case_insensitive() {
        let p = Pattern::parse("Whole Foods").unwrap();
        assert_eq!(p.source(), "Whole Foods");
        assert_eq!(p.flags(), "i");
        assert!(p.is_match("whole foods market"));
    }

    #[test]
    fn parse_portable_form() {
        let p = Pattern::parse(r"/\bnetflix\b/i").unwrap();
        assert_eq!(p.source(), r"\bnetflix\b");
        assert_eq!(p.flags(), "i");
        assert!(p.is_match("NETFLIX.COM"));
    }

    #[test]
    fn parse_portable_without_flags_is_case_sensitive() {
        let p = Pattern::parse("/ACME/").unwrap();
        assert!(p.is_match("ACME PAYROLL"));
        assert!(!p.is_match("acme payroll"));
    }

    #[test]
    fn parse_body_may_contain_slashes() {
        let p = Pattern::parse("/apple.com/bill/i").unwrap();
        assert_eq!(p.source(), "apple.com/bill");
        assert!(p.is_match("apple.com/bill itunes"));
    }

    #[test]
    fn parse_rejects_invalid() {
        assert_eq!(Pattern::parse("   "), Err(PatternError::Empty));
        assert!(matches!(Pattern::parse("/unterminated"), Err(PatternError::Malformed(_))));
        assert!(matches!(Pattern::parse("(unclosed"), Err(PatternError::Regex(_))));
        assert!(matches!(Pattern::parse("/ok/q"), Err(PatternError::Malformed(_))));
        assert_eq!(Pattern::new("ok", "iq"), Err(PatternError::UnknownFlag('q')));
        assert_eq!(Pattern::parse("//i"), Err(PatternError::Empty));
    }

    #[test]
    fn inert_flags_are_accepted() {
        let p = Pattern::parse("/uber/gi").unwrap();
        assert!(p.is_match("UBER TRIP"));
    }

    // ── stored patterns ───────────────────────────────────────────────────────

    #[test]
    fn from_stored_portable_and_bare() {
        let p = Pattern::from_stored(r"/\bcvs\b/i");
        assert_eq!((p.source(), p.flags()), (r"\bcvs\b", "i"));

        let bare = Pattern::from_stored("walgreens");
        assert_eq!((bare.source(), bare.flags()), ("walgreens", "i"));
        assert!(bare.is_match("WALGREENS #42"));
    }

    #[test]
    fn from_stored_slash_path_is_a_bare_body() {
        let p = Pattern::from_stored("/usr/bin");
        assert_eq!((p.source(), p.flags()), ("/usr/bin", "i"));
        assert!(p.is_valid());
        assert!(p.is_match("/USR/BIN/env"));

        let q = Pattern::from_stored("/apple.com/bill/i");
        assert_eq!((q.source(), q.flags()), ("apple.com/bill", "i"));
    }

    #[test]
    fn invalid_stored_pattern_never_matches() {
        let p = Pattern::from_stored("/[broken/i");
        assert!(!p.is_valid());
        assert!(!p.is_match("[broken"));
        assert_eq!(p.to_portable(), "/[broken/i");
    }

    #[test]
    fn deserialize_object_and_string_entries() {
        let patterns: Vec<Pattern> =
            serde_json::from_str(r#"[{"source": "rent", "flags": "i"}, "/hoa/i", "landlord"]"#)
                .unwrap();
        assert_eq!(patterns[0], Pattern::new("rent", "i").unwrap());
        assert_eq!(patterns[1], Pattern::new("hoa", "i").unwrap());
        assert_eq!(patterns[2], Pattern::new("landlord", "i").unwrap());
    }

    #[test]
    fn serializes_to_portable_string() {
        let p = Pattern::new(r"\bpizza\b", "i").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), r#""/\\bpizza\\b/i""#);
    }

    #[test]
    fn equality_ignores_compiled_state() {
        assert_eq!(Pattern::from_parts("(", "i"), Pattern::from_parts("(", "i"));
        assert_ne!(Pattern::new("a", "i").unwrap(), Pattern::new("a", "").unwrap());
    }
}
