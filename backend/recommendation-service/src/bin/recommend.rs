//! recommend: run one recommendation against a MovieLens directory and print it.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use recommendation_service::models::Dataset;
use recommendation_service::services::{
    load_movielens, EngineOutput, HybridWeights, RecommendationEngine, RecommendationRequest,
    Recommendations, StrategyKind,
};
use recommendation_service::utils::init_tracing;

#[derive(Parser)]
#[command(name = "recommend")]
#[command(about = "Movie recommendations from MovieLens rating data")]
#[command(version)]
struct Cli {
    /// MovieLens directory (u.data, u.item, u.user, u.genre)
    #[arg(short, long)]
    directory: PathBuf,

    /// Number of recommendations
    #[arg(short = 'n', long, default_value = "10")]
    num_recommendations: usize,

    /// Similarity metric: cosine, jaccard, dice or pearson
    #[arg(short, long, default_value = "cosine")]
    similarity: String,

    /// Algorithm: user, item, tag, title or hybrid
    #[arg(short, long, default_value = "user")]
    algorithm: String,

    /// User id (user, item, hybrid) or item id (tag, title)
    #[arg(short, long)]
    input: u32,

    /// Hybrid weight for the user-based strategy
    #[arg(long)]
    user_weight: Option<f64>,

    /// Hybrid weight for the item-based strategy
    #[arg(long)]
    item_weight: Option<f64>,

    /// Hybrid weight for the rating-distribution strategy
    #[arg(long)]
    tag_weight: Option<f64>,

    /// Hybrid weight for the title strategy
    #[arg(long)]
    title_weight: Option<f64>,
}

impl Cli {
    fn hybrid_weights(&self) -> Result<HybridWeights> {
        let defaults = HybridWeights::default();
        let weights = HybridWeights {
            user: self.user_weight.unwrap_or(defaults.user),
            item: self.item_weight.unwrap_or(defaults.item),
            tag: self.tag_weight.unwrap_or(defaults.tag),
            title: self.title_weight.unwrap_or(defaults.title),
        };
        weights.validate().map_err(|e| anyhow!(e))?;
        Ok(weights)
    }
}

fn main() -> Result<()> {
    init_tracing("warn,recommendation_service=info", false);

    let cli = Cli::parse();
    let engine = RecommendationEngine::new(cli.hybrid_weights()?);

    let dataset = load_movielens(&cli.directory)
        .with_context(|| format!("Failed to load dataset from {}", cli.directory.display()))?;

    let request = RecommendationRequest {
        target_id: cli.input,
        limit: cli.num_recommendations,
        metric: cli.similarity.clone(),
        strategy: cli.algorithm.clone(),
    };

    let output = engine
        .recommend(&dataset, &request)
        .context("Recommendation failed")?;

    match output {
        EngineOutput::Keywords(keywords) => {
            info!(item_id = cli.input, terms = keywords.len(), "Title keywords");
            for (term, weight) in &keywords {
                println!("{}\t{:.6}", term, weight);
            }
        }
        EngineOutput::Ranked(ranked) if ranked.strategy == StrategyKind::Hybrid => {
            println!("{}", ranked.label);
            println!("{:?}", ranked.item_ids());
        }
        EngineOutput::Ranked(ranked) => print_titles(&dataset, &ranked),
    }

    Ok(())
}

fn print_titles(dataset: &Dataset, ranked: &Recommendations) {
    if ranked.items.is_empty() {
        println!("No recommendations");
        return;
    }

    for scored in &ranked.items {
        match dataset.title(scored.item_id) {
            Some(title) => println!("{}", title),
            None => println!("{}", scored.item_id),
        }
    }
}
