use super::{
    ContentStrategy, ItemBasedStrategy, RecommendError, RecommendationStrategy, Result,
    SimilarityMetric, StrategyKind, TagBasedStrategy, UserBasedStrategy,
};
use crate::models::{Dataset, ItemId, ScoredItem};
use crate::utils::top_scored;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const HYBRID_LABEL: &str = "Hybrid recommendations using a combination of algorithms";

/// Per-strategy blend weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub user: f64,
    pub item: f64,
    pub tag: f64,
    pub title: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            user: 0.3,
            item: 0.2,
            tag: 0.3,
            title: 0.2,
        }
    }
}

impl HybridWeights {
    /// Weight 1 for `kind`, 0 for everything else
    pub fn only(kind: StrategyKind) -> Self {
        let mut weights = Self {
            user: 0.0,
            item: 0.0,
            tag: 0.0,
            title: 0.0,
        };
        weights.set(kind, 1.0);
        weights
    }

    pub fn weight(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::User => self.user,
            StrategyKind::Item => self.item,
            StrategyKind::Tag => self.tag,
            StrategyKind::Title => self.title,
            StrategyKind::Hybrid => 0.0,
        }
    }

    fn set(&mut self, kind: StrategyKind, weight: f64) {
        match kind {
            StrategyKind::User => self.user = weight,
            StrategyKind::Item => self.item = weight,
            StrategyKind::Tag => self.tag = weight,
            StrategyKind::Title => self.title = weight,
            StrategyKind::Hybrid => {}
        }
    }

    /// Overlay a `{strategy: weight}` map on the defaults
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        let mut weights = Self::default();
        for (name, weight) in map {
            let kind: StrategyKind = name.parse()?;
            if kind == StrategyKind::Hybrid {
                return Err(RecommendError::InvalidStrategy(name.clone()));
            }
            weights.set(kind, *weight);
        }
        Ok(weights)
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        [
            (StrategyKind::User.as_str(), self.user),
            (StrategyKind::Item.as_str(), self.item),
            (StrategyKind::Tag.as_str(), self.tag),
            (StrategyKind::Title.as_str(), self.title),
        ]
        .into_iter()
        .collect()
    }

    /// Validate weight values
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, weight) in self.to_map() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!(
                    "Hybrid weight for {} must be a non-negative number, got {}",
                    name, weight
                ));
            }
        }
        Ok(())
    }
}

/// Hybrid combiner: weighted blend of the four strategies
///
/// The user-based result set is the candidate pool. Every candidate's score
/// is `Σ weight[s] × score[s](item)` over the strategies, where an item a
/// strategy did not return contributes 0.
pub struct HybridCombiner {
    strategies: Vec<(Box<dyn RecommendationStrategy>, f64)>, // (strategy, weight)
}

impl HybridCombiner {
    pub fn new(weights: HybridWeights) -> Self {
        let strategies: Vec<(Box<dyn RecommendationStrategy>, f64)> = vec![
            (Box::new(UserBasedStrategy::new()), weights.user),
            (Box::new(ItemBasedStrategy::new()), weights.item),
            (Box::new(TagBasedStrategy::new()), weights.tag),
            (Box::new(ContentStrategy::new()), weights.title),
        ];

        Self { strategies }
    }
}

impl RecommendationStrategy for HybridCombiner {
    fn recommend(
        &self,
        dataset: &Dataset,
        target_id: u32,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>> {
        let mut base: Vec<ItemId> = Vec::new();
        let mut combined: HashMap<ItemId, f64> = HashMap::new();

        for (strategy, weight) in &self.strategies {
            let kind = strategy.kind();

            if kind == StrategyKind::User {
                // Candidate pool: failures here are the caller's problem
                let results = strategy.recommend(dataset, target_id, limit, metric)?;
                for scored in results {
                    base.push(scored.item_id);
                    *combined.entry(scored.item_id).or_insert(0.0) += weight * scored.score;
                }
                continue;
            }

            if *weight == 0.0 {
                debug!(strategy = kind.as_str(), "Zero hybrid weight, skipping");
                continue;
            }

            match strategy.recommend(dataset, target_id, limit, metric) {
                Ok(results) => {
                    for scored in results {
                        if let Some(total) = combined.get_mut(&scored.item_id) {
                            *total += weight * scored.score;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        strategy = kind.as_str(),
                        target_id,
                        error = %e,
                        "Hybrid component failed, contributing nothing"
                    );
                }
            }
        }

        let scored = base
            .into_iter()
            .map(|item_id| ScoredItem::new(item_id, combined.get(&item_id).copied().unwrap_or(0.0)))
            .collect();
        let ranked = top_scored(scored, limit);

        info!(
            target_id,
            metric = metric.as_str(),
            returned = ranked.len(),
            "Hybrid recommendations generated"
        );

        Ok(ranked)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ItemTable, Rating, RatingIndex};

    fn dataset() -> Dataset {
        let ratings = vec![
            Rating::new(1, 1, 5.0),
            Rating::new(1, 2, 4.0),
            Rating::new(2, 1, 5.0),
            Rating::new(2, 3, 4.0),
            Rating::new(2, 4, 2.0),
            Rating::new(3, 2, 4.0),
            Rating::new(3, 3, 5.0),
            Rating::new(3, 5, 1.0),
        ];
        let items: ItemTable = (1..=5)
            .map(|id| (id, Item::new(id, format!("movie {}", id))))
            .collect();
        Dataset::new(RatingIndex::from_ratings(ratings), items)
    }

    #[test]
    fn test_default_weights() {
        let weights = HybridWeights::default();
        assert_eq!(weights.user, 0.3);
        assert_eq!(weights.item, 0.2);
        assert_eq!(weights.tag, 0.3);
        assert_eq!(weights.title, 0.2);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_from_map_overlays_defaults() {
        let map: HashMap<String, f64> = [("user".to_string(), 1.0), ("title".to_string(), 0.0)]
            .into_iter()
            .collect();

        let weights = HybridWeights::from_map(&map).unwrap();
        assert_eq!(weights.user, 1.0);
        assert_eq!(weights.item, 0.2);
        assert_eq!(weights.title, 0.0);

        let bad: HashMap<String, f64> = [("genre".to_string(), 1.0)].into_iter().collect();
        assert!(matches!(
            HybridWeights::from_map(&bad),
            Err(RecommendError::InvalidStrategy(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative() {
        let weights = HybridWeights {
            tag: -0.1,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_user_only_weights_reproduce_user_strategy() {
        let data = dataset();
        let metric = SimilarityMetric::Cosine;

        let user = UserBasedStrategy::new().recommend(&data, 1, 3, metric).unwrap();
        let hybrid = HybridCombiner::new(HybridWeights::only(StrategyKind::User))
            .recommend(&data, 1, 3, metric)
            .unwrap();

        assert_eq!(hybrid, user);
    }

    #[test]
    fn test_only_user_candidates_are_ranked() {
        let data = dataset();

        let user_ids: Vec<ItemId> = UserBasedStrategy::new()
            .recommend(&data, 1, 3, SimilarityMetric::Cosine)
            .unwrap()
            .iter()
            .map(|s| s.item_id)
            .collect();
        let hybrid = HybridCombiner::new(HybridWeights::default())
            .recommend(&data, 1, 3, SimilarityMetric::Cosine)
            .unwrap();

        assert!(hybrid.len() <= 3);
        assert!(hybrid.iter().all(|s| user_ids.contains(&s.item_id)));
    }

    /// User candidates 3 and 4, where item 4's rating distribution matches
    /// item 1's and item 3's does not
    fn blend_dataset() -> Dataset {
        let ratings = vec![
            Rating::new(1, 1, 5.0),
            Rating::new(1, 2, 3.0),
            Rating::new(2, 1, 5.0),
            Rating::new(2, 2, 3.0),
            Rating::new(2, 3, 3.0),
            Rating::new(3, 1, 4.0),
            Rating::new(3, 4, 4.0),
            Rating::new(4, 4, 5.0),
        ];
        let items: ItemTable = (1..=4)
            .map(|id| (id, Item::new(id, format!("movie {}", id))))
            .collect();
        Dataset::new(RatingIndex::from_ratings(ratings), items)
    }

    fn score_of(results: &[ScoredItem], item_id: ItemId) -> f64 {
        results
            .iter()
            .find(|s| s.item_id == item_id)
            .map_or(0.0, |s| s.score)
    }

    #[test]
    fn test_combined_score_is_weighted_sum() {
        let data = blend_dataset();
        let metric = SimilarityMetric::Cosine;
        let weights = HybridWeights::default();

        let user = UserBasedStrategy::new().recommend(&data, 1, 3, metric).unwrap();
        let item = ItemBasedStrategy::new().recommend(&data, 1, 3, metric).unwrap();
        let tag = TagBasedStrategy::new().recommend(&data, 1, 3, metric).unwrap();
        let title = ContentStrategy::new().recommend(&data, 1, 3, metric).unwrap();

        let hybrid = HybridCombiner::new(weights).recommend(&data, 1, 3, metric).unwrap();
        assert_eq!(hybrid.len(), user.len());

        for scored in &hybrid {
            let expected = weights.user * score_of(&user, scored.item_id)
                + weights.item * score_of(&item, scored.item_id)
                + weights.tag * score_of(&tag, scored.item_id)
                + weights.title * score_of(&title, scored.item_id);
            assert!((scored.score - expected).abs() < 1e-12);
        }

        // Tag similarity to item 1 is 0.9487 for item 4 and 0 for item 3
        assert!((score_of(&tag, 4) - 3.0 / 10.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(score_of(&tag, 3), 0.0);
    }

    #[test]
    fn test_blend_reorders_user_candidates() {
        let data = blend_dataset();
        let metric = SimilarityMetric::Cosine;

        let user_ids: Vec<ItemId> = UserBasedStrategy::new()
            .recommend(&data, 1, 3, metric)
            .unwrap()
            .iter()
            .map(|s| s.item_id)
            .collect();
        let hybrid = HybridCombiner::new(HybridWeights::default())
            .recommend(&data, 1, 3, metric)
            .unwrap();
        let hybrid_ids: Vec<ItemId> = hybrid.iter().map(|s| s.item_id).collect();

        // User-only: 2.668 vs 2.425. Blended: 0.994 vs 1.184.
        assert_eq!(user_ids, vec![3, 4]);
        assert_eq!(hybrid_ids, vec![4, 3]);
        assert!((hybrid[0].score - 1.18371).abs() < 1e-4);
        assert!((hybrid[1].score - 0.99432).abs() < 1e-4);
    }

    #[test]
    fn test_component_failure_is_tolerated() {
        // User 9 exists, but there is no item 9 for the tag and title strategies
        let mut data = dataset();
        data.index.insert(Rating::new(9, 1, 5.0));

        let result = HybridCombiner::new(HybridWeights::default()).recommend(
            &data,
            9,
            3,
            SimilarityMetric::Cosine,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_user_failure_propagates() {
        let data = dataset();
        let err = HybridCombiner::new(HybridWeights::default())
            .recommend(&data, 42, 3, SimilarityMetric::Cosine)
            .unwrap_err();
        assert!(matches!(err, RecommendError::EntityNotFound { .. }));
    }
}
