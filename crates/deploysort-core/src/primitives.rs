//! # Label Primitives
//!
//! Fixed constants and the tokenizer that turns a stage's delimited label
//! string into a [`LabelSet`].

use crate::types::{Label, LabelSet};

/// Characters that separate labels in a delimited label string.
///
/// - Comma, for `"a,b"` style lists
/// - Space, tab, newline, carriage return and form feed, for `"a b"` style lists
///
/// Runs of delimiters produce empty tokens, which are discarded.
pub const LABEL_DELIMITERS: &[char] = &[',', ' ', '\t', '\n', '\r', '\x0c'];

/// Split a delimited label string into a set of labels.
///
/// `None` and empty strings yield an empty set. Duplicates collapse.
#[must_use]
pub fn tokenize_labels(raw: Option<&str>) -> LabelSet {
    raw.map(|s| {
        s.split(LABEL_DELIMITERS)
            .filter(|token| !token.is_empty())
            .map(Label::new)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: Option<&str>) -> Vec<String> {
        tokenize_labels(raw)
            .into_iter()
            .map(|l| l.as_str().to_string())
            .collect()
    }

    #[test]
    fn absent_and_empty_yield_nothing() {
        assert!(tokenize_labels(None).is_empty());
        assert!(tokenize_labels(Some("")).is_empty());
        assert!(tokenize_labels(Some(" ,\t\n ")).is_empty());
    }

    #[test]
    fn mixed_delimiters_split() {
        assert_eq!(
            labels(Some("classloader, metadata\tstructure\r\nbeans\x0cwar")),
            vec!["beans", "classloader", "metadata", "structure", "war"]
        );
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(labels(Some("x,x x")), vec!["x"]);
    }

    #[test]
    fn other_punctuation_is_part_of_label() {
        assert_eq!(labels(Some("a.b;c")), vec!["a.b;c"]);
    }
}
