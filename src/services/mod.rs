pub mod agent;
pub mod execution;
pub mod market_data;
pub mod risk;
pub mod sentiment;
pub mod signals;

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

pub use agent::{LoopState, PortfolioState, TradingAgent};
pub use execution::{ExecutionBackend, PaperExecutor};
pub use market_data::{MarketDataProvider, SimulatedMarketData};
pub use risk::{DailyStats, FixedRiskModel, RiskEngine, RiskModel, UniformRiskModel};
pub use sentiment::{SentimentProvider, SimulatedSentiment};
pub use signals::{MarketAnalysis, SignalGenerator, TechnicalAnalyzer};

/// Await a collaborator call, failing with [`AppError::Timeout`] after `limit`.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::Timeout {
            operation: operation.to_string(),
            secs: limit.as_secs_f64(),
        })?
}
