//! # FAQ Retrieval
//!
//! Fetches age-eligible FAQ rows from the store, scores them against the
//! question's keywords and returns a short ranked list.
//!
//! Retrieval never fails the caller: store errors are logged and produce an
//! empty candidate set, so the pipeline can still fall through to generation or
//! the canned fallback.

use crate::{
    constants::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_FAQ_FETCH_LIMIT},
    keywords,
    providers::db::storage::FaqStore,
    types::FaqEntry,
};
use std::cmp::Reverse;
use tracing::{debug, info, warn};

/// An FAQ row with its relevance score. Never leaves this module.
#[derive(Debug)]
struct ScoredFaq {
    entry: FaqEntry,
    score: usize,
}

/// Counts the keywords that occur in the entry's category, question or answer.
pub fn score_entry(entry: &FaqEntry, keywords: &[String]) -> usize {
    let haystack = format!(
        "{} {} {}",
        entry.category.as_deref().unwrap_or_default(),
        entry.question,
        entry.answer
    )
    .to_lowercase();
    keywords
        .iter()
        .filter(|kw| haystack.contains(kw.as_str()))
        .count()
}

/// Sorts `entries` by descending score and keeps the first `limit`.
///
/// The sort is stable, so entries with equal scores keep their retrieval order.
pub fn rank(entries: Vec<FaqEntry>, keywords: &[String], limit: usize) -> Vec<FaqEntry> {
    let mut scored: Vec<ScoredFaq> = entries
        .into_iter()
        .map(|entry| {
            let score = score_entry(&entry, keywords);
            ScoredFaq { entry, score }
        })
        .collect();
    scored.sort_by_key(|s| Reverse(s.score));
    scored
        .into_iter()
        .take(limit)
        .map(|s| s.entry)
        .collect()
}

/// Retrieves ranked FAQ candidates for a question.
#[derive(Debug, Clone)]
pub struct FaqRetriever {
    store: Box<dyn FaqStore>,
    fetch_limit: u32,
    candidate_limit: usize,
}

impl FaqRetriever {
    pub fn new(store: Box<dyn FaqStore>) -> Self {
        Self {
            store,
            fetch_limit: DEFAULT_FAQ_FETCH_LIMIT,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    /// Sets the maximum number of rows fetched from the store per query.
    pub fn fetch_limit(mut self, fetch_limit: u32) -> Self {
        self.fetch_limit = fetch_limit;
        self
    }

    /// Sets the number of ranked candidates returned.
    pub fn candidate_limit(mut self, candidate_limit: usize) -> Self {
        self.candidate_limit = candidate_limit;
        self
    }

    /// Returns up to `candidate_limit` FAQ entries for the question, best first.
    ///
    /// Rows are first filtered by age range. If no row covers the age, an
    /// unfiltered keyword search is used instead.
    pub async fn retrieve(&self, age_months: u32, question: &str) -> Vec<FaqEntry> {
        let keywords = keywords::extract(question);
        debug!(?keywords, "Extracted keywords for FAQ scoring");

        let rows = match self.store.faqs_for_age(age_months, self.fetch_limit).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                info!(age_months, "No age-matched FAQs. Falling back to keyword search.");
                match self.store.search_faqs(&keywords, self.fetch_limit).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!("Keyword FAQ search failed: {e}");
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                warn!("Age-filtered FAQ query failed: {e}");
                return Vec::new();
            }
        };

        let candidates = rank(rows, &keywords, self.candidate_limit);
        info!(count = candidates.len(), "Selected FAQ candidates.");
        candidates
    }
}
