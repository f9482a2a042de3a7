use super::{EntityKind, RecommendError, RecommendationStrategy, Result, SimilarityMetric, StrategyKind};
use crate::models::{Dataset, ItemId, RatingIndex, ScoredItem};
use crate::services::similarity::similarity;
use crate::utils::top_scored;
use std::collections::BTreeMap;
use tracing::info;

/// Number of star values tracked per item (5★ .. 1★)
pub const DISTRIBUTION_SLOTS: usize = 5;

/// Count of ratings per star value, slot `5 - r` for value `r`
pub type RatingDistribution = [u32; DISTRIBUTION_SLOTS];

/// Rating-distribution ("tag") recommendation
///
/// Each item is described by how often it received each star value. Items
/// whose distribution resembles the target item's are recommended.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagBasedStrategy;

impl TagBasedStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Distribution vector for every rated item
///
/// Only integral values 1..=5 are counted.
pub fn rating_distributions(index: &RatingIndex) -> BTreeMap<ItemId, RatingDistribution> {
    index
        .items()
        .map(|(item_id, ratings)| {
            let mut counts = [0u32; DISTRIBUTION_SLOTS];
            for slot in ratings.iter().filter_map(|rating| distribution_slot(rating.value)) {
                counts[slot] += 1;
            }
            (item_id, counts)
        })
        .collect()
}

fn distribution_slot(value: f64) -> Option<usize> {
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some(DISTRIBUTION_SLOTS - value as usize)
}

/// Empty buckets are absent, so zero counts never match each other
fn as_vector(counts: &RatingDistribution) -> Vec<Option<f64>> {
    counts
        .iter()
        .map(|&count| (count > 0).then_some(count as f64))
        .collect()
}

impl RecommendationStrategy for TagBasedStrategy {
    fn recommend(
        &self,
        dataset: &Dataset,
        item_id: ItemId,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>> {
        let distributions = rating_distributions(&dataset.index);

        let target = match distributions.get(&item_id) {
            Some(counts) => *counts,
            None if dataset.items.contains_key(&item_id) => [0; DISTRIBUTION_SLOTS],
            None => {
                return Err(RecommendError::EntityNotFound {
                    kind: EntityKind::Item,
                    id: item_id,
                })
            }
        };
        let target_vector = as_vector(&target);

        let scored: Vec<ScoredItem> = distributions
            .iter()
            .filter(|(other_id, _)| **other_id != item_id)
            .map(|(other_id, counts)| {
                ScoredItem::new(*other_id, similarity(metric, &target_vector, &as_vector(counts)))
            })
            .collect();

        let ranked = top_scored(scored, limit);

        info!(
            item_id,
            metric = metric.as_str(),
            items = distributions.len(),
            returned = ranked.len(),
            "Rating-distribution recommendations generated"
        );

        Ok(ranked)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Tag
    }
}
