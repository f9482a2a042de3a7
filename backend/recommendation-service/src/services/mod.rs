//! Recommendation engine
//!
//! Strategies, leaf-first:
//! - similarity: metric library shared by every strategy
//! - user_based: neighbours of the target user vote for unseen items
//! - item_based: unseen items whose co-rater profile matches the target user
//! - tag_based: items with a similar rating-value distribution
//! - content_based: TF-IDF over titles (keyword map or title similarity)
//! - hybrid: weighted blend of the four
//!
//! `RecommendationEngine` validates a request and dispatches it.
//! `dataset` loads MovieLens files into the in-memory tables.

pub mod content_based;
pub mod dataset;
pub mod hybrid;
pub mod item_based;
pub mod similarity;
pub mod tag_based;
pub mod user_based;

pub use content_based::{ContentStrategy, TfIdfCorpus};
pub use dataset::{load_movielens, DatasetError};
pub use hybrid::{HybridCombiner, HybridWeights, HYBRID_LABEL};
pub use item_based::ItemBasedStrategy;
pub use similarity::{safe_divide, similarity, similarity_by_name, similarity_dense, SimilarityMetric};
pub use tag_based::TagBasedStrategy;
pub use user_based::UserBasedStrategy;

use crate::models::{Dataset, ItemId, ScoredItem, TermWeights};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Invalid similarity metric: {0} (expected cosine, jaccard, dice or pearson)")]
    InvalidMetric(String),

    #[error("Invalid algorithm: {0} (expected user, item, tag, title or hybrid)")]
    InvalidStrategy(String),

    #[error("Invalid limit: {0} (must be a positive integer)")]
    InvalidLimit(usize),

    #[error("{kind} {id} not found")]
    EntityNotFound { kind: EntityKind, id: u32 },
}

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("User"),
            EntityKind::Item => f.write_str("Item"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    User,
    Item,
    Tag,
    Title,
    Hybrid,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::User => "user",
            StrategyKind::Item => "item",
            StrategyKind::Tag => "tag",
            StrategyKind::Title => "title",
            StrategyKind::Hybrid => "hybrid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::User => "User-based recommendations",
            StrategyKind::Item => "Item-based recommendations",
            StrategyKind::Tag => "Rating-distribution recommendations",
            StrategyKind::Title => "Title keyword recommendations",
            StrategyKind::Hybrid => HYBRID_LABEL,
        }
    }
}

impl FromStr for StrategyKind {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(StrategyKind::User),
            "item" => Ok(StrategyKind::Item),
            "tag" => Ok(StrategyKind::Tag),
            "title" => Ok(StrategyKind::Title),
            "hybrid" => Ok(StrategyKind::Hybrid),
            other => Err(RecommendError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation strategy
///
/// `target_id` is a user id for user/item strategies and an item id for
/// tag/title strategies. Implementations return at most `limit` items sorted
/// by score descending.
pub trait RecommendationStrategy: Send + Sync {
    fn recommend(
        &self,
        dataset: &Dataset,
        target_id: u32,
        limit: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredItem>>;

    fn kind(&self) -> StrategyKind;
}

/// Ranked output of one engine call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub strategy: StrategyKind,
    pub metric: SimilarityMetric,
    pub label: String,
    pub items: Vec<ScoredItem>,
}

impl Recommendations {
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|scored| scored.item_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Ranked(Recommendations),
    /// TF-IDF keyword weights for the `title` algorithm
    Keywords(TermWeights),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub target_id: u32,
    pub limit: usize,
    pub metric: String,
    pub strategy: String,
}

/// Validated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub target_id: u32,
    pub limit: usize,
    pub metric: SimilarityMetric,
    pub strategy: StrategyKind,
}

/// Engine facade: validates requests and dispatches to strategies
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    hybrid_weights: HybridWeights,
}

impl RecommendationEngine {
    pub fn new(hybrid_weights: HybridWeights) -> Self {
        Self { hybrid_weights }
    }

    pub fn hybrid_weights(&self) -> &HybridWeights {
        &self.hybrid_weights
    }

    /// Check metric, strategy and limit, in that order
    pub fn validate(request: &RecommendationRequest) -> Result<ValidatedRequest> {
        let metric: SimilarityMetric = request.metric.parse()?;
        let strategy: StrategyKind = request.strategy.parse()?;

        if request.limit == 0 {
            return Err(RecommendError::InvalidLimit(request.limit));
        }

        Ok(ValidatedRequest {
            target_id: request.target_id,
            limit: request.limit,
            metric,
            strategy,
        })
    }

    /// Run a request. The `title` algorithm yields its keyword map.
    pub fn recommend(&self, dataset: &Dataset, request: &RecommendationRequest) -> Result<EngineOutput> {
        let validated = Self::validate(request)?;

        if validated.strategy == StrategyKind::Title {
            let keywords = ContentStrategy::new().term_weights(dataset, validated.target_id)?;
            debug!(
                item_id = validated.target_id,
                terms = keywords.len(),
                "Title keyword weights computed"
            );
            return Ok(EngineOutput::Keywords(keywords));
        }

        self.run(dataset, validated).map(EngineOutput::Ranked)
    }

    /// Run a request, always producing a ranked list
    pub fn rank(&self, dataset: &Dataset, request: &RecommendationRequest) -> Result<Recommendations> {
        let validated = Self::validate(request)?;
        self.run(dataset, validated)
    }

    fn run(&self, dataset: &Dataset, request: ValidatedRequest) -> Result<Recommendations> {
        let items = self.strategy(request.strategy).recommend(
            dataset,
            request.target_id,
            request.limit,
            request.metric,
        )?;

        info!(
            strategy = request.strategy.as_str(),
            metric = request.metric.as_str(),
            target_id = request.target_id,
            limit = request.limit,
            returned = items.len(),
            "Recommendations computed"
        );

        Ok(Recommendations {
            strategy: request.strategy,
            metric: request.metric,
            label: request.strategy.label().to_string(),
            items,
        })
    }

    /// Strategy for `kind`; the hybrid uses this engine's weights
    pub fn strategy(&self, kind: StrategyKind) -> Box<dyn RecommendationStrategy> {
        match kind {
            StrategyKind::User => Box::new(UserBasedStrategy::new()),
            StrategyKind::Item => Box::new(ItemBasedStrategy::new()),
            StrategyKind::Tag => Box::new(TagBasedStrategy::new()),
            StrategyKind::Title => Box::new(ContentStrategy::new()),
            StrategyKind::Hybrid => Box::new(HybridCombiner::new(self.hybrid_weights)),
        }
    }
}
