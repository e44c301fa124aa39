//! Fuzzy remedy lookup for stock checks.
//!
//! Front-desk staff type remedy names from memory ("arnika", "nux vom"), so
//! lookups rank the whole inventory by name similarity instead of requiring an
//! exact match.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::db::{Database, DbResult};
use crate::models::Remedy;

/// Minimum similarity for a remedy to be reported.
const MIN_SCORE: f64 = 0.5;

/// A remedy with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemedyMatch {
    pub remedy: Remedy,
    /// 0.0 to 1.0, where 1.0 means the query appears verbatim in the name
    pub score: f64,
}

/// Remedy lookup over a database.
pub struct RemedyLookup<'a> {
    db: &'a Database,
}

impl<'a> RemedyLookup<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find up to `limit` remedies whose name resembles `query`, best first.
    pub fn find(&self, query: &str, limit: usize) -> DbResult<Vec<RemedyMatch>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut matches: Vec<RemedyMatch> = self
            .db
            .list_remedies()?
            .into_iter()
            .filter_map(|remedy| {
                let score = name_score(&query, &remedy.name.to_lowercase());
                (score >= MIN_SCORE).then_some(RemedyMatch { remedy, score })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }
}

/// Similarity of a lowercased query to a lowercased remedy name.
fn name_score(query: &str, name: &str) -> f64 {
    if name.contains(query) {
        return 1.0;
    }
    jaro_winkler(query, name) * 0.6 + normalized_levenshtein(query, name) * 0.4
}
