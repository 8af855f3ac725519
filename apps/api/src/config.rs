use anyhow::{Context, Result};

use crate::ai::features::AiTier;
use crate::ai::gemini::DEFAULT_BASE_URL;
use crate::ai::orchestrator::DEFAULT_MODELS;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub ai_tier: AiTier,
    /// Fallback order, first model tried first.
    pub ai_models: Vec<String>,
    pub daily_ai_budget: Option<f64>,
    pub monthly_ai_budget: Option<f64>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = require_env("GEMINI_API_KEY")
            .or_else(|_| require_env("GOOGLE_AI_API_KEY"))
            .context("Set GEMINI_API_KEY (or GOOGLE_AI_API_KEY)")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key,
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ai_tier: std::env::var("AI_TIER")
                .map(|v| parse_tier(&v))
                .unwrap_or_default(),
            ai_models: parse_model_list(std::env::var("AI_MODELS").ok().as_deref()),
            daily_ai_budget: optional_f64("DAILY_AI_BUDGET")?,
            monthly_ai_budget: optional_f64("MONTHLY_AI_BUDGET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{key} must be a number")),
        Err(_) => Ok(None),
    }
}

fn parse_tier(raw: &str) -> AiTier {
    // FromStr for AiTier is infallible; unknown values fall back to free.
    raw.parse().unwrap_or_default()
}

/// Comma-separated model ids; blank or missing input yields the default order.
fn parse_model_list(raw: Option<&str>) -> Vec<String> {
    let models: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    if models.is_empty() {
        DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
    } else {
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_list_defaults_when_missing_or_blank() {
        assert_eq!(parse_model_list(None), DEFAULT_MODELS);
        assert_eq!(parse_model_list(Some(" , ")), DEFAULT_MODELS);
    }

    #[test]
    fn test_model_list_preserves_order() {
        assert_eq!(
            parse_model_list(Some("gemini-1.5-pro, gemini-1.5-flash")),
            vec!["gemini-1.5-pro", "gemini-1.5-flash"]
        );
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(parse_tier("premium"), AiTier::Premium);
        assert_eq!(parse_tier("nonsense"), AiTier::Free);
    }
}
