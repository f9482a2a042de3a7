/// Recommendation API Handlers
///
/// HTTP front end over `RecommendationEngine`
use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::Result;
use crate::models::{Dataset, ItemId, ScoredItem, TermWeights};
use crate::services::{
    EngineOutput, RecommendationEngine, RecommendationRequest, SimilarityMetric, StrategyKind,
};

/// Request body for POST /recommendations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBody {
    /// User id for user/item/hybrid, item id for tag/title
    pub input_id: u32,

    /// Similarity metric name
    pub similarity: String,

    /// Algorithm name
    pub algorithm: String,

    /// Number of results (server default when omitted, capped at the server max)
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub item_id: ItemId,
    pub title: Option<String>,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RankedResponse {
    pub strategy: StrategyKind,
    pub metric: SimilarityMetric,
    pub label: String,
    pub recommendations: Vec<RecommendedItem>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct KeywordResponse {
    pub strategy: StrategyKind,
    pub metric: SimilarityMetric,
    pub keywords: TermWeights,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    Ranked(RankedResponse),
    Keywords(KeywordResponse),
}

/// Handler state: one immutable dataset snapshot shared by every worker
pub struct RecommendationHandlerState {
    pub dataset: Arc<Dataset>,
    pub engine: RecommendationEngine,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl RecommendationHandlerState {
    /// Requested limit, or the default, capped at the maximum
    fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

fn with_titles(dataset: &Dataset, items: &[ScoredItem]) -> Vec<RecommendedItem> {
    items
        .iter()
        .map(|scored| RecommendedItem {
            item_id: scored.item_id,
            title: dataset.title(scored.item_id).map(str::to_string),
            score: scored.score,
        })
        .collect()
}

/// POST /recommendations
/// Rank items for a user (user/item/hybrid) or an item (tag), or return the
/// title keyword weights of an item (title)
#[post("/recommendations")]
pub async fn post_recommendations(
    body: web::Json<RecommendationBody>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let request = RecommendationRequest {
        target_id: body.input_id,
        limit: state.effective_limit(body.limit),
        metric: body.similarity,
        strategy: body.algorithm,
    };

    debug!(
        target_id = request.target_id,
        limit = request.limit,
        metric = %request.metric,
        strategy = %request.strategy,
        "Recommendation request"
    );

    let metric_name = request.metric.clone();
    let dataset = Arc::clone(&state.dataset);
    let engine = state.engine.clone();
    let output = web::block(move || engine.recommend(&dataset, &request))
        .await?
        .map_err(|err| {
            error!(error = %err, "Recommendation request failed");
            err
        })?;

    let response = match output {
        EngineOutput::Ranked(ranked) => {
            let recommendations = with_titles(&state.dataset, &ranked.items);
            RecommendationResponse::Ranked(RankedResponse {
                strategy: ranked.strategy,
                metric: ranked.metric,
                label: ranked.label,
                count: recommendations.len(),
                recommendations,
            })
        }
        EngineOutput::Keywords(keywords) => RecommendationResponse::Keywords(KeywordResponse {
            strategy: StrategyKind::Title,
            metric: metric_name.parse()?,
            keywords,
        }),
    };

    Ok(HttpResponse::Ok().json(response))
}
