//! Person name normalization.
//!
//! A name has two forms: the display form keeps the original casing and any
//! honorifics, the comparison form is what relation checks match on.

use serde::{Deserialize, Serialize};

use super::operations::{apply_all, collapse_whitespace, Operation};
use crate::models::PersonName;

/// Honorifics stripped when no list is configured.
pub const DEFAULT_HONORIFICS: [&str; 12] = [
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "sir", "jr", "sr", "ii", "iii",
];

/// Name comparison rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRules {
    /// Honorific tokens, compared case-insensitively without trailing period.
    pub honorifics: Vec<String>,
    /// Extra operations applied to the comparison form.
    #[serde(default)]
    pub folding: Vec<Operation>,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            honorifics: DEFAULT_HONORIFICS.iter().map(|s| s.to_string()).collect(),
            folding: Vec::new(),
        }
    }
}

impl NameRules {
    fn is_honorific(&self, token: &str) -> bool {
        let bare = strip_token_punctuation(token);
        !bare.is_empty()
            && self
                .honorifics
                .iter()
                .any(|h| strip_token_punctuation(h).eq_ignore_ascii_case(bare))
    }
}

fn strip_token_punctuation(token: &str) -> &str {
    token.trim().trim_end_matches([',', '.'])
}

/// Display form: trimmed with whitespace collapsed.
pub fn clean_display(raw: &str) -> String {
    collapse_whitespace(raw)
}

/// Comparison key for a name.
///
/// Honorifics are stripped from both ends; if nothing would remain, the
/// unstripped lower-cased form is kept.
pub fn comparison_form(display: &str, rules: &NameRules) -> String {
    let lowered = collapse_whitespace(display).to_lowercase();
    let tokens: Vec<&str> = lowered.split(' ').filter(|t| !t.is_empty()).collect();

    let mut start = 0;
    let mut end = tokens.len();
    while start < end && rules.is_honorific(tokens[start]) {
        start += 1;
    }
    while end > start && rules.is_honorific(tokens[end - 1]) {
        end -= 1;
    }

    let kept = if start < end {
        &tokens[start..end]
    } else {
        &tokens[..]
    };
    let joined = kept.join(" ");
    let joined = joined.trim_end_matches(',');
    let folded = apply_all(&rules.folding, joined);
    collapse_whitespace(&folded)
}

/// Build both forms of a name. Returns `None` for blank input.
pub fn clean(raw: &str, rules: &NameRules) -> Option<PersonName> {
    let display = clean_display(raw);
    if display.is_empty() {
        return None;
    }
    let comparison = comparison_form(&display, rules);
    Some(PersonName {
        display,
        comparison,
    })
}
