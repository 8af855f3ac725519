mod ai;
mod config;
mod db;
mod errors;
mod matching;
mod models;
mod resumes;
mod routes;
mod state;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::cost::PricingTable;
use crate::ai::features::AiProfile;
use crate::ai::gemini::GeminiClient;
use crate::ai::orchestrator::ModelOrchestrator;
use crate::ai::quota::QuotaTracker;
use crate::ai::usage::UsageTracker;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (daily quota counter)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize AI orchestration
    let ai = Arc::new(build_orchestrator(&config)?);
    info!(
        tier = ?ai.profile().tier,
        models = ?ai.models(),
        "AI orchestrator initialized"
    );

    // Build app state
    let state = AppState {
        db,
        s3,
        config: config.clone(),
        ai,
        quota: QuotaTracker::new(redis),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the frontend host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_orchestrator(config: &Config) -> Result<ModelOrchestrator> {
    let backend = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_base_url.clone())
        .context("Failed to build Gemini HTTP client")?;

    let mut profile = AiProfile::for_tier(config.ai_tier);
    if let Some(daily) = config.daily_ai_budget {
        profile.daily_budget = daily;
    }
    if let Some(monthly) = config.monthly_ai_budget {
        profile.monthly_budget = monthly;
    }

    Ok(ModelOrchestrator::new(
        Arc::new(backend),
        config.ai_models.clone(),
        Arc::new(PricingTable::default()),
        Arc::new(UsageTracker::default()),
        profile,
    ))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
