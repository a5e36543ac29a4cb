use crate::models::Posting;

/// Sorts by match score, highest first. Ties keep their incoming order.
pub fn rank(mut postings: Vec<Posting>) -> Vec<Posting> {
    // sort_by is stable
    postings.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    postings
}
