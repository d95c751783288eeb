use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// One case-insensitive alternation of the search terms, longest first so
/// overlapping terms highlight the larger match.
pub fn build_highlight_regex(tokens: &[String]) -> Option<Regex> {
    let mut unique = Vec::new();
    let mut seen = HashSet::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.to_lowercase()) {
            unique.push(token.as_str());
        }
    }
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = unique
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into `(segment, is_match)` pieces.
pub fn split_matches<'t>(text: &'t str, regex: Option<&Regex>) -> Vec<(&'t str, bool)> {
    let Some(regex) = regex else {
        return vec![(text, false)];
    };
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            pieces.push((&text[last..found.start()], false));
        }
        pieces.push((found.as_str(), true));
        last = found.end();
    }
    if last < text.len() || pieces.is_empty() {
        pieces.push((&text[last..], false));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longer_tokens_first() {
        let regex = build_highlight_regex(&["not".into(), "note".into()]).expect("regex");
        let matches: Vec<_> = regex.find_iter("notebook").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["note"]);
    }

    #[test]
    fn splits_text_around_matches() {
        let regex = build_highlight_regex(&["milk".into()]);
        let pieces = split_matches("Buy MILK now", regex.as_ref());
        assert_eq!(pieces, vec![("Buy ", false), ("MILK", true), (" now", false)]);
    }

    #[test]
    fn no_regex_means_one_plain_piece() {
        assert_eq!(split_matches("plain", None), vec![("plain", false)]);
        assert!(build_highlight_regex(&[String::new()]).is_none());
    }
}
