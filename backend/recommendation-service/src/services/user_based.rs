use super::{EntityKind, RecommendError, RecommendationStrategy, Result, SimilarityMetric, StrategyKind};
use crate::models::{Dataset, ItemId, ScoredItem, UserId};
use crate::services::similarity::similarity;
use crate::utils::top_scored;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// User-based collaborative filtering
///
/// Algorithm:
/// 1. Score every other user against the target with the chosen metric,
///    comparing both users' ratings over the union of their rated items
/// 2. Keep the top `limit` users by similarity
/// 3. Aggregate the items they rated that the target has not
/// 4. Return the top `limit` items by aggregated score
///
/// Formula: score[item] = Σ(similarity[user] × rating[user, item])
#[derive(Debug, Clone, Copy, Default)]
pub struct UserBasedStrategy;

impl UserBasedStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Every other user with their similarity to the target, most similar first
    pub fn similar_users(
        &self,
        dataset: &Dataset,
        user_id: UserId,
        metric: SimilarityMetric,
    ) -> Result<Vec<(UserId, f64)>> {
        let target = dataset
            .index
            .user_item_ratings(user_id)
            .ok_or(RecommendError::EntityNotFound {
                kind: EntityKind::User,
                id: user_id,
            })?;

        let mut similarities: Vec<(UserId, f64)> = dataset
            .index
            .users()
            .filter(|(other_id, _)| *other_id != user_id)
            .map(|(other_id, ratings)| {
                let other: BTreeMap<ItemId, f64> = ratings
                    .iter()
                    .map(|rating| (rating.item_id, rating.value))
                    .collect();
                let (a, b) = aligned_vectors(&target, &other);
                (other_id, similarity(metric, &a, &b))
            })
            .collect();

        similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(similarities)
    }
}

impl RecommendationStrategy for UserBasedStrategy {
    fn recommend(
        &self,
        dataset: &Dataset,
        user_id: UserId,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>> {
        let mut similar_users = self.similar_users(dataset, user_id, metric)?;
        similar_users.truncate(limit);

        let seen: BTreeSet<ItemId> = dataset
            .index
            .user_ratings(user_id)
            .unwrap_or_default()
            .iter()
            .map(|rating| rating.item_id)
            .collect();

        let mut aggregated: BTreeMap<ItemId, f64> = BTreeMap::new();
        for (similar_user_id, user_similarity) in &similar_users {
            let ratings = dataset.index.user_ratings(*similar_user_id).unwrap_or_default();
            for rating in ratings {
                if seen.contains(&rating.item_id) {
                    continue;
                }
                *aggregated.entry(rating.item_id).or_insert(0.0) += rating.value * user_similarity;
            }
        }

        if aggregated.is_empty() {
            debug!(
                user_id,
                similar_users = similar_users.len(),
                "No unseen items from similar users"
            );
            return Ok(Vec::new());
        }

        let scored = aggregated
            .into_iter()
            .map(|(item_id, score)| ScoredItem::new(item_id, score))
            .collect();
        let ranked = top_scored(scored, limit);

        info!(
            user_id,
            metric = metric.as_str(),
            similar_users = similar_users.len(),
            returned = ranked.len(),
            "User-based recommendations generated"
        );

        Ok(ranked)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::User
    }
}

/// Build two vectors over the sorted union of item ids; missing items are absent
pub fn aligned_vectors(
    a: &BTreeMap<ItemId, f64>,
    b: &BTreeMap<ItemId, f64>,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let keys: BTreeSet<ItemId> = a.keys().chain(b.keys()).copied().collect();

    keys.iter()
        .map(|item_id| (a.get(item_id).copied(), b.get(item_id).copied()))
        .unzip()
}
