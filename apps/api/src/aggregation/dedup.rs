use std::collections::HashSet;

use crate::models::Posting;

/// Drops postings whose identity key was already seen; the first one wins.
///
/// The key is `(title, company)`, lowercased with whitespace collapsed, so the
/// same job surfaced by several providers is kept once. Stable and idempotent.
pub fn dedupe(postings: Vec<Posting>) -> Vec<Posting> {
    let mut seen = HashSet::with_capacity(postings.len());
    postings
        .into_iter()
        .filter(|posting| seen.insert(identity_key(posting)))
        .collect()
}

pub fn identity_key(posting: &Posting) -> (String, String) {
    (fold(&posting.title), fold(&posting.company))
}

fn fold(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
