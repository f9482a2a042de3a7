use super::{EntityKind, RecommendError, RecommendationStrategy, Result, SimilarityMetric, StrategyKind};
use crate::models::{Dataset, ItemId, ScoredItem, UserId};
use crate::services::similarity::similarity;
use crate::utils::top_scored;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Item-based recommendation
///
/// Candidates are the items the target user has not rated, gathered from
/// every other user's ratings. Each candidate gets a profile aligned to the
/// target's own rating vector: the coordinate for an item the target rated
/// is the mean rating the candidate received from users who also rated that
/// item. Candidates are ranked by the similarity between the target's
/// ratings and that profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemBasedStrategy;

impl ItemBasedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl RecommendationStrategy for ItemBasedStrategy {
    fn recommend(
        &self,
        dataset: &Dataset,
        user_id: UserId,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>> {
        let target = dataset
            .index
            .user_item_ratings(user_id)
            .ok_or(RecommendError::EntityNotFound {
                kind: EntityKind::User,
                id: user_id,
            })?;

        // Candidate item → [(rater, rating)], plus each rater's item → rating map
        let mut candidate_raters: BTreeMap<ItemId, Vec<(UserId, f64)>> = BTreeMap::new();
        let mut rater_items: HashMap<UserId, BTreeMap<ItemId, f64>> = HashMap::new();

        for (other_id, ratings) in dataset.index.users() {
            if other_id == user_id {
                continue;
            }

            for rating in ratings {
                if target.contains_key(&rating.item_id) {
                    continue;
                }
                candidate_raters
                    .entry(rating.item_id)
                    .or_default()
                    .push((other_id, rating.value));
            }

            rater_items.insert(
                other_id,
                ratings.iter().map(|r| (r.item_id, r.value)).collect(),
            );
        }

        if candidate_raters.is_empty() {
            debug!(user_id, "No unrated items left to recommend");
            return Ok(Vec::new());
        }

        let target_vector: Vec<Option<f64>> = target.values().copied().map(Some).collect();

        let scored: Vec<ScoredItem> = candidate_raters
            .iter()
            .map(|(item_id, raters)| {
                let profile = co_rater_profile(&target, raters, &rater_items);
                ScoredItem::new(*item_id, similarity(metric, &target_vector, &profile))
            })
            .collect();

        let candidates = scored.len();
        let ranked = top_scored(scored, limit);

        info!(
            user_id,
            metric = metric.as_str(),
            candidates,
            returned = ranked.len(),
            "Item-based recommendations generated"
        );

        Ok(ranked)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Item
    }
}

/// Mean candidate rating per target item, over raters who also rated that item
fn co_rater_profile(
    target: &BTreeMap<ItemId, f64>,
    raters: &[(UserId, f64)],
    rater_items: &HashMap<UserId, BTreeMap<ItemId, f64>>,
) -> Vec<Option<f64>> {
    target
        .keys()
        .map(|target_item| {
            let (sum, count) = raters
                .iter()
                .filter(|(rater, _)| {
                    rater_items
                        .get(rater)
                        .is_some_and(|items| items.contains_key(target_item))
                })
                .fold((0.0, 0usize), |(sum, count), (_, value)| (sum + value, count + 1));

            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, RatingIndex};
    use std::collections::HashSet;

    fn dataset(ratings: Vec<Rating>) -> Dataset {
        Dataset::new(RatingIndex::from_ratings(ratings), Default::default())
    }

    #[test]
    fn test_excludes_items_rated_by_target() {
        let data = dataset(vec![
            Rating::new(1, 1, 5.0),
            Rating::new(1, 2, 2.0),
            Rating::new(2, 1, 4.0),
            Rating::new(2, 3, 5.0),
            Rating::new(3, 2, 1.0),
            Rating::new(3, 4, 3.0),
            Rating::new(3, 5, 2.0),
        ]);

        let recommended = ItemBasedStrategy::new()
            .recommend(&data, 1, 2, SimilarityMetric::Cosine)
            .unwrap();

        assert!(recommended.len() <= 2);
        let rated: HashSet<ItemId> = [1, 2].into_iter().collect();
        assert!(recommended.iter().all(|s| !rated.contains(&s.item_id)));
    }

    #[test]
    fn test_profile_alignment() {
        // Target rated items 1 and 2. Candidate 3 was rated 4 by a user who
        // also rated item 1, and 2 by a user who rated items 1 and 2.
        let target: BTreeMap<ItemId, f64> = [(1, 5.0), (2, 3.0)].into_iter().collect();
        let mut rater_items = HashMap::new();
        rater_items.insert(2, [(1, 4.0), (3, 4.0)].into_iter().collect());
        rater_items.insert(3, [(1, 2.0), (2, 2.0), (3, 2.0)].into_iter().collect());

        let profile = co_rater_profile(&target, &[(2, 4.0), (3, 2.0)], &rater_items);
        assert_eq!(profile, vec![Some(3.0), Some(2.0)]);
    }

    #[test]
    fn test_candidate_without_co_raters_scores_zero() {
        let data = dataset(vec![
            Rating::new(1, 1, 5.0),
            // User 2 shares nothing with the target
            Rating::new(2, 9, 5.0),
        ]);

        let recommended = ItemBasedStrategy::new()
            .recommend(&data, 1, 5, SimilarityMetric::Pearson)
            .unwrap();

        assert_eq!(recommended, vec![ScoredItem::new(9, 0.0)]);
    }

    #[test]
    fn test_unknown_user() {
        let data = dataset(vec![Rating::new(1, 1, 5.0)]);
        let err = ItemBasedStrategy::new()
            .recommend(&data, 7, 5, SimilarityMetric::Cosine)
            .unwrap_err();

        assert!(matches!(err, RecommendError::EntityNotFound { kind: EntityKind::User, .. }));
    }
}
