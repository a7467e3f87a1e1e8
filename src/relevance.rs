// src/relevance.rs
//! Relevance gate: case-insensitive keyword substring match over
//! title + summary hint + extracted body, with a pluggable policy for
//! articles that match nothing.

/// What to do with an article that matched no keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Drop it (production default).
    #[default]
    RejectUnmatched,
    /// Deliver anyway (`allow_all_if_no_keyword_match = true`).
    AllowUnmatched,
}

impl FilterPolicy {
    pub fn from_override(allow_all: bool) -> Self {
        if allow_all {
            Self::AllowUnmatched
        } else {
            Self::RejectUnmatched
        }
    }

    fn admits_unmatched(self) -> bool {
        matches!(self, Self::AllowUnmatched)
    }
}

/// Result of relevance evaluation. `matched` is in vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    pub matched: Vec<String>,
    pub pass: bool,
}

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    // (original spelling, lowercased needle)
    vocabulary: Vec<(String, String)>,
    policy: FilterPolicy,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I, policy: FilterPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.is_empty())
            .map(|k| {
                let lower = k.to_lowercase();
                (k, lower)
            })
            .collect();
        Self { vocabulary, policy }
    }

    /// Never fails; "no match" is an ordinary outcome.
    pub fn evaluate(&self, title: &str, hint: &str, body: &str) -> Relevance {
        let blob = format!("{title} {hint} {body}").to_lowercase();
        let matched: Vec<String> = self
            .vocabulary
            .iter()
            .filter(|(_, needle)| blob.contains(needle.as_str()))
            .map(|(orig, _)| orig.clone())
            .collect();
        let pass = !matched.is_empty() || self.policy.admits_unmatched();
        Relevance { matched, pass }
    }
}
