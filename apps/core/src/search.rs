use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::matcher::{MatchScore, PreparedQuery};
use crate::model::{Indexable, ItemRef, SearchResult};

pub const RESULT_LIMIT: usize = 50;

/// Immutable ranking state for one query.
///
/// `search` never touches `self`; it returns the next session so a snapshot
/// can be read from another thread while the following one is computed.
#[derive(Debug, Clone)]
pub struct SearchSession {
    all_items: Arc<[ItemRef]>,
    matched: Arc<[ItemRef]>,
    query: String,
    results: Arc<[SearchResult]>,
}

struct Scored<'a> {
    item: &'a ItemRef,
    score: MatchScore,
    boosted: i64,
    name_len: usize,
}

impl SearchSession {
    pub fn new(items: impl Into<Arc<[ItemRef]>>) -> Self {
        let all_items = items.into();
        Self {
            matched: Arc::clone(&all_items),
            all_items,
            query: String::new(),
            results: Arc::from(Vec::new()),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &Arc<[SearchResult]> {
        &self.results
    }

    pub fn matched_len(&self) -> usize {
        self.matched.len()
    }

    pub fn search<B>(&self, query: &str, boost: B) -> SearchSession
    where
        B: Fn(&dyn Indexable) -> i64,
    {
        // Anything matching the longer query already matched the shorter one.
        let pool = if query.starts_with(self.query.as_str()) {
            &self.matched
        } else {
            &self.all_items
        };

        let started = Instant::now();
        let prepared = PreparedQuery::new(query);
        let mut scored: Vec<Scored<'_>> = pool
            .iter()
            .filter_map(|item| {
                let score = prepared.score(item.name());
                if !score.is_match() {
                    return None;
                }
                Some(Scored {
                    item,
                    score,
                    boosted: score.score.saturating_sub(boost(item.as_ref())),
                    name_len: item.name().chars().count(),
                })
            })
            .collect();

        // `scored` is still in pool order here, which keeps the subset stable.
        let matched: Arc<[ItemRef]> = scored.iter().map(|entry| Arc::clone(entry.item)).collect();

        scored.sort_by(|a, b| {
            a.boosted
                .cmp(&b.boosted)
                .then_with(|| a.name_len.cmp(&b.name_len))
                .then_with(|| a.score.span_width().cmp(&b.score.span_width()))
        });

        let results: Arc<[SearchResult]> = scored
            .iter()
            .take(RESULT_LIMIT)
            .map(|entry| SearchResult {
                name: entry.item.name().to_string(),
                score: entry.boosted,
                item: Arc::clone(entry.item),
                highlight: highlight_indexes(&entry.score),
            })
            .collect();

        tracing::debug!(
            query,
            matched = matched.len(),
            pool = pool.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "scored candidates"
        );

        SearchSession {
            all_items: Arc::clone(&self.all_items),
            matched,
            query: query.to_string(),
            results,
        }
    }
}

fn highlight_indexes(score: &MatchScore) -> BTreeSet<usize> {
    score
        .range
        .map(|range| (range.start..=range.end).collect())
        .unwrap_or_default()
}

pub fn no_boost(_: &dyn Indexable) -> i64 {
    0
}
