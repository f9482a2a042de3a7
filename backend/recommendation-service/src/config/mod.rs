use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::HybridWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub dataset: DatasetConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
    /// Emit JSON log lines instead of the plain formatter
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// MovieLens directory (`u.data`, `u.item`, `u.user`, `u.genre`)
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default)]
    pub hybrid_weights: HybridWeights,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            hybrid_weights: HybridWeights::default(),
        }
    }
}

impl Config {
    /// Load from the process environment, after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HybridWeights::default();

        let config = Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                port: parse_or(&lookup, "APP_PORT", 8000)?,
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_json: lookup("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
            },
            dataset: DatasetConfig {
                directory: lookup("DATASET_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_dataset_dir),
            },
            recommendation: RecommendationConfig {
                default_limit: parse_or(&lookup, "DEFAULT_LIMIT", default_limit())?,
                max_limit: parse_or(&lookup, "MAX_LIMIT", default_max_limit())?,
                hybrid_weights: HybridWeights {
                    user: parse_or(&lookup, "HYBRID_USER_WEIGHT", defaults.user)?,
                    item: parse_or(&lookup, "HYBRID_ITEM_WEIGHT", defaults.item)?,
                    tag: parse_or(&lookup, "HYBRID_TAG_WEIGHT", defaults.tag)?,
                    title: parse_or(&lookup, "HYBRID_TITLE_WEIGHT", defaults.title)?,
                },
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let rec = &self.recommendation;

        if rec.default_limit == 0 {
            bail!("DEFAULT_LIMIT must be at least 1");
        }
        if rec.max_limit < rec.default_limit {
            bail!(
                "MAX_LIMIT ({}) must not be below DEFAULT_LIMIT ({})",
                rec.max_limit,
                rec.default_limit
            );
        }
        rec.hybrid_weights.validate().map_err(anyhow::Error::msg)?;

        Ok(())
    }

    /// `tracing` filter used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> String {
        format!("{},recommendation_service=debug", self.app.log_level)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("./data/ml-100k")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 8000);
        assert!(!config.app.log_json);
        assert_eq!(config.dataset.directory, PathBuf::from("./data/ml-100k"));
        assert_eq!(config.recommendation.default_limit, 10);
        assert_eq!(config.recommendation.max_limit, 100);
        assert_eq!(config.recommendation.hybrid_weights, HybridWeights::default());
        assert_eq!(config.log_filter(), "info,recommendation_service=debug");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("APP_PORT", "9090"),
            ("LOG_FORMAT", "JSON"),
            ("DATASET_DIR", "/srv/movielens"),
            ("DEFAULT_LIMIT", "5"),
            ("HYBRID_USER_WEIGHT", "1.0"),
            ("HYBRID_TITLE_WEIGHT", "0"),
        ])
        .unwrap();

        assert_eq!(config.app.port, 9090);
        assert!(config.app.log_json);
        assert_eq!(config.dataset.directory, PathBuf::from("/srv/movielens"));
        assert_eq!(config.recommendation.default_limit, 5);
        assert_eq!(config.recommendation.hybrid_weights.user, 1.0);
        assert_eq!(config.recommendation.hybrid_weights.item, 0.2);
        assert_eq!(config.recommendation.hybrid_weights.title, 0.0);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = load(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));

        assert!(load(&[("HYBRID_TAG_WEIGHT", "-1")]).is_err());
        assert!(load(&[("DEFAULT_LIMIT", "0")]).is_err());
        assert!(load(&[("DEFAULT_LIMIT", "50"), ("MAX_LIMIT", "20")]).is_err());
    }
}
