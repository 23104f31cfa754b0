use std::sync::Arc;

use neuraltrade::config::Config;
use neuraltrade::services::{
    PaperExecutor, SimulatedMarketData, SimulatedSentiment, TradingAgent, UniformRiskModel,
};
use neuraltrade::types::StrategyType;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neuraltrade=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and check configuration
    let config = Config::from_env();
    config.validate()?;
    info!(
        "Starting NeuralTrade agent: {} tokens, thresholds {}/{}",
        config.agent.token_universe.len(),
        config.agent.run_strategy_confidence_threshold,
        config.agent.main_loop_confidence_threshold
    );

    // Simulated collaborators for paper trading
    let executor = Arc::new(PaperExecutor::new(
        config
            .account_address
            .clone()
            .unwrap_or_else(|| "paper".to_string()),
    ));
    let agent = Arc::new(TradingAgent::from_config(
        &config,
        Arc::new(UniformRiskModel::new()),
        Arc::new(SimulatedSentiment::new()),
        Arc::new(SimulatedMarketData::new()),
        executor,
    ));

    // Demonstration signal
    match agent.generate_signal("INJ", StrategyType::AiPredictive).await {
        Ok(signal) => info!(
            "Demo signal: {} INJ ({:.1}% confidence, risk {:.1}) - {}",
            signal.action, signal.confidence, signal.risk_score, signal.reasoning
        ),
        Err(e) => error!("Demo signal failed: {}", e),
    }

    let status = agent.portfolio_status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    // Run the main loop until Ctrl-C
    let loop_agent = agent.clone();
    let handle = tokio::spawn(async move { loop_agent.main_loop().await });

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received");
    agent.stop();
    handle.await?;

    let status = agent.portfolio_status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
