use crate::storage::Note;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub title_terms: Vec<String>,
    pub pinned_only: bool,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.title_terms.is_empty() && !self.pinned_only
    }

    pub fn highlight_terms(&self) -> Vec<String> {
        let mut terms = self.terms.clone();
        terms.extend(self.title_terms.iter().cloned());
        terms
    }

    /// Every term must hit the title or content; `title:` terms the title.
    pub fn matches(&self, note: &Note) -> bool {
        if self.pinned_only && !note.pinned {
            return false;
        }
        let title = note.title.to_lowercase();
        let content = note.content.to_lowercase();
        self.terms
            .iter()
            .all(|term| title.contains(term.as_str()) || content.contains(term.as_str()))
            && self
                .title_terms
                .iter()
                .all(|term| title.contains(term.as_str()))
    }
}

pub fn parse_query(input: &str) -> SearchQuery {
    let mut query = SearchQuery::default();
    for raw in input.split_whitespace() {
        if raw.eq_ignore_ascii_case("is:pinned") {
            query.pinned_only = true;
            continue;
        }
        if let Some(term) = raw.strip_prefix("title:") {
            if let Some(value) = sanitize_term(term) {
                query.title_terms.push(value);
            }
            continue;
        }
        if let Some(value) = sanitize_term(raw) {
            query.terms.push(value);
        }
    }
    query
}

pub fn filter_notes<'a>(notes: &'a [Note], query: &SearchQuery) -> Vec<&'a Note> {
    notes.iter().filter(|note| query.matches(note)).collect()
}

fn sanitize_term(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
