use unicode_normalization::UnicodeNormalization;

/// Words that describe how a payment was made rather than who was paid.
pub const MERCHANT_STOPWORDS: &[&str] = &[
    "purchase",
    "pos",
    "debit",
    "credit",
    "payment",
    "card",
    "visa",
    "mastercard",
    "amzn",
    "amazon",
];

/// Folds `text` to lowercase ASCII with single spaces between words.
///
/// Accented letters lose their marks (`é` becomes `e`); every other
/// non-ASCII code point is dropped.
pub fn normalize(text: &str) -> String {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    collapse_whitespace(&ascii.to_lowercase())
}

/// [`normalize`] for optional input; `None` yields an empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text with everything but `[a-z0-9 ]` replaced by spaces,
/// split into words.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Short merchant label: the first two words of the description that are
/// not payment boilerplate.
///
/// When every word is boilerplate the first word is used instead.
pub fn extract_merchant(description: &str) -> String {
    let tokens = tokenize(description);
    let kept: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !MERCHANT_STOPWORDS.contains(t))
        .take(2)
        .collect();

    if kept.is_empty() {
        tokens.into_iter().next().unwrap_or_default()
    } else {
        kept.join(" ")
    }
}
