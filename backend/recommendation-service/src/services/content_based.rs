// ============================================
// Content-Based Filtering (title TF-IDF)
// ============================================
//
// Documents are the titles of items with at least one rating.
//
//   tf(item, term)  = occurrences of term in the item's title
//   df(term)        = number of titles containing term
//   idf(term)       = ln(N / df(term)), 0 when N or df is 0
//   tfidf           = tf × idf
//
// Two outputs:
//   term_weights: the TF-IDF keyword map of one item
//   recommend:    items ranked by similarity of their TF-IDF vectors

use super::{EntityKind, RecommendError, RecommendationStrategy, Result, SimilarityMetric, StrategyKind};
use crate::models::{Dataset, ItemId, ScoredItem, TermWeights};
use crate::services::similarity::similarity;
use crate::utils::top_scored;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Term statistics over every rated item's title
#[derive(Debug, Clone, Default)]
pub struct TfIdfCorpus {
    /// item_id → term → occurrences in title
    term_frequencies: BTreeMap<ItemId, BTreeMap<String, u32>>,
    /// term → number of titles containing it
    document_frequencies: HashMap<String, u32>,
}

impl TfIdfCorpus {
    /// Scan the rating index and tokenize each rated item's title once
    pub fn build(dataset: &Dataset) -> Self {
        let mut corpus = Self::default();

        for (item_id, _) in dataset.index.items() {
            let Some(title) = dataset.title(item_id) else {
                debug!(item_id, "Rated item has no title, skipping");
                continue;
            };
            corpus.add_document(item_id, title);
        }

        corpus
    }

    /// Add one title as a document (replacing any earlier title for the item)
    pub fn add_document(&mut self, item_id: ItemId, title: &str) {
        let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
        for token in tokenize(title) {
            *frequencies.entry(token).or_insert(0) += 1;
        }

        if let Some(previous) = self.term_frequencies.remove(&item_id) {
            for term in previous.keys() {
                if let Some(df) = self.document_frequencies.get_mut(term) {
                    *df = df.saturating_sub(1);
                }
            }
        }

        for term in frequencies.keys() {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }
        self.term_frequencies.insert(item_id, frequencies);
    }

    pub fn document_count(&self) -> usize {
        self.term_frequencies.len()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.term_frequencies.contains_key(&item_id)
    }

    pub fn idf(&self, term: &str) -> f64 {
        let n = self.document_count();
        let df = self.document_frequencies.get(term).copied().unwrap_or(0);

        if n == 0 || df == 0 {
            return 0.0;
        }

        (n as f64 / df as f64).ln()
    }

    /// TF-IDF weights for one item's title
    pub fn term_weights(&self, item_id: ItemId) -> Option<TermWeights> {
        self.term_frequencies.get(&item_id).map(|frequencies| {
            frequencies
                .iter()
                .map(|(term, tf)| (term.clone(), *tf as f64 * self.idf(term)))
                .collect()
        })
    }

    pub fn documents(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.term_frequencies.keys().copied()
    }
}

/// Lowercase, split on single spaces, drop empty tokens
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Both weight maps as vectors over their shared vocabulary
fn aligned_terms(a: &TermWeights, b: &TermWeights) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let vocabulary: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    vocabulary
        .into_iter()
        .map(|term| (a.get(term).copied(), b.get(term).copied()))
        .unzip()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentStrategy;

impl ContentStrategy {
    pub fn new() -> Self {
        Self
    }

    /// TF-IDF keyword map for `item_id`
    pub fn term_weights(&self, dataset: &Dataset, item_id: ItemId) -> Result<TermWeights> {
        let corpus = TfIdfCorpus::build(dataset);
        corpus.term_weights(item_id).ok_or(RecommendError::EntityNotFound {
            kind: EntityKind::Item,
            id: item_id,
        })
    }
}

impl RecommendationStrategy for ContentStrategy {
    fn recommend(
        &self,
        dataset: &Dataset,
        item_id: ItemId,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>> {
        let corpus = TfIdfCorpus::build(dataset);
        let target = corpus.term_weights(item_id).ok_or(RecommendError::EntityNotFound {
            kind: EntityKind::Item,
            id: item_id,
        })?;

        let scored: Vec<ScoredItem> = corpus
            .documents()
            .filter(|other_id| *other_id != item_id)
            .filter_map(|other_id| {
                let other = corpus.term_weights(other_id)?;
                let (a, b) = aligned_terms(&target, &other);
                Some(ScoredItem::new(other_id, similarity(metric, &a, &b)))
            })
            .collect();

        let ranked = top_scored(scored, limit);

        info!(
            item_id,
            metric = metric.as_str(),
            documents = corpus.document_count(),
            returned = ranked.len(),
            "Title similarity recommendations generated"
        );

        Ok(ranked)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Title
    }
}
