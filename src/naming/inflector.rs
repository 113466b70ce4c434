//! Singular forms of relationship accessors (`jobParts` -> `jobPart`).
//!
//! Only the last word of a camel-cased identifier is inflected, so prefixes
//! such as `job` in `jobStatuses` are left alone.

use std::fmt::Debug;

/// Strategy for turning a plural accessor into the singular type it names.
pub trait Inflector: Send + Sync + Debug {
    /// The singular form of `word`. Words that are already singular are returned unchanged.
    fn singular(&self, word: &str) -> String;

    /// True when the singular of `word` cannot be decided from spelling alone.
    fn is_ambiguous(&self, _word: &str) -> bool {
        false
    }
}

/// Suffix rules for English nouns.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "information",
    "inventory",
    "metadata",
    "money",
    "news",
    "series",
    "sheep",
    "species",
    "stock",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("indices", "index"),
    ("knives", "knife"),
    ("lives", "life"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("movies", "movie"),
    ("people", "person"),
    ("shoes", "shoe"),
    ("vertices", "vertex"),
    ("wives", "wife"),
    ("women", "woman"),
];

// Checked in order; the first matching plural suffix wins.
const SUFFIXES: &[(&str, &str)] = &[
    ("aliases", "alias"),
    ("statuses", "status"),
    ("campuses", "campus"),
    ("buses", "bus"),
    ("yses", "ysis"),
    ("theses", "thesis"),
    ("sses", "ss"),
    ("zzes", "zz"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("ies", "y"),
    ("lves", "lf"),
    ("rves", "rf"),
    ("oes", "o"),
];

// Singular words that happen to end in `s`.
const SINGULAR_ENDINGS: &[&str] = &["ss", "us", "is"];

const AMBIGUOUS: &[&str] = &["axes", "bases", "ellipses", "leaves", "media"];

/// Split `jobPartStatuses` into (`jobPart`, `Statuses`).
fn split_last_word(word: &str) -> (&str, &str) {
    let start = word
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .unwrap_or(0);
    word.split_at(start)
}

/// Re-apply the capitalisation of `original` to `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

impl Inflector for EnglishInflector {
    fn singular(&self, word: &str) -> String {
        let (prefix, last) = split_last_word(word);
        let lower = last.to_lowercase();

        if UNCOUNTABLE.contains(&lower.as_str()) {
            return word.to_string();
        }

        if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
            return format!("{prefix}{}", match_case(last, singular));
        }

        for (plural, singular) in SUFFIXES {
            if lower.ends_with(plural) {
                let stem = &last[..last.len() - plural.len()];
                let replaced = format!("{stem}{singular}");
                return format!("{prefix}{}", match_case(last, &replaced));
            }
        }

        if SINGULAR_ENDINGS.iter().any(|ending| lower.ends_with(ending)) {
            return word.to_string();
        }

        match word.strip_suffix('s') {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => word.to_string(),
        }
    }

    fn is_ambiguous(&self, word: &str) -> bool {
        let (_, last) = split_last_word(word);
        AMBIGUOUS.contains(&last.to_lowercase().as_str())
    }
}
