//! Trading Agent Runner
//!
//! Owns the portfolio state, executes signals through the execution backend
//! and drives the polling loop across the token universe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use super::state::{CloseReason, PortfolioState, Settlement};
use crate::config::{Config, LoopConfig};
use crate::error::{AppError, Result};
use crate::services::{
    with_timeout, ExecutionBackend, MarketDataProvider, RiskEngine, RiskModel, SentimentProvider,
    SignalGenerator,
};
use crate::types::{
    PerformanceMetrics, PortfolioStatus, StrategyType, TradeAction, TradeRecord, TradeStatus,
    TradingSignal,
};

/// Main-loop lifecycle.
///
/// `Idle -> Running`, `Running -> Backoff -> Running` on a failed iteration,
/// and any state `-> Stopped` once shutdown is requested. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Running,
    Backoff,
    Stopped,
}

/// The trading orchestrator.
pub struct TradingAgent {
    config: LoopConfig,
    account_address: Option<String>,
    generator: SignalGenerator,
    executor: Arc<dyn ExecutionBackend>,
    execution_timeout: Duration,
    /// Positions, trade history and metrics
    state: RwLock<PortfolioState>,
    trade_seq: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
    loop_state_tx: watch::Sender<LoopState>,
}

impl TradingAgent {
    pub fn new(
        config: LoopConfig,
        generator: SignalGenerator,
        executor: Arc<dyn ExecutionBackend>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (loop_state_tx, _) = watch::channel(LoopState::Idle);
        let execution_timeout = generator.timeout();

        Self {
            config,
            account_address: None,
            generator,
            executor,
            execution_timeout,
            state: RwLock::new(PortfolioState::new()),
            trade_seq: AtomicU64::new(0),
            shutdown_tx,
            loop_state_tx,
        }
    }

    /// Wire an agent and its signal generator from application config.
    pub fn from_config(
        config: &Config,
        risk_model: Arc<dyn RiskModel>,
        sentiment: Arc<dyn SentimentProvider>,
        market_data: Arc<dyn MarketDataProvider>,
        executor: Arc<dyn ExecutionBackend>,
    ) -> Self {
        let risk_engine = Arc::new(RiskEngine::new(config.risk.clone(), risk_model));
        let generator = SignalGenerator::new(risk_engine, sentiment, market_data)
            .with_timeout(config.collaborator_timeout)
            .with_lookback(config.ohlcv_lookback);

        Self::new(config.agent.clone(), generator, executor)
            .with_account_address(config.account_address.clone())
            .with_execution_timeout(config.collaborator_timeout)
    }

    pub fn with_account_address(mut self, account_address: Option<String>) -> Self {
        self.account_address = account_address;
        self
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    pub fn risk_engine(&self) -> &Arc<RiskEngine> {
        self.generator.risk_engine()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Generate a signal for one token.
    pub async fn generate_signal(&self, token: &str, strategy: StrategyType) -> Result<TradingSignal> {
        self.generator.generate_signal(token, strategy).await
    }

    /// Generate a signal per token and execute the confident ones.
    ///
    /// Tokens are evaluated concurrently; results come back in input order.
    /// A token that fails is logged and contributes no signal.
    pub async fn run_strategy<S: AsRef<str>>(
        &self,
        strategy: StrategyType,
        tokens: &[S],
    ) -> Vec<TradingSignal> {
        info!("Running {} strategy on {} tokens...", strategy, tokens.len());

        let threshold = self.config.run_strategy_confidence_threshold;
        let results = join_all(
            tokens
                .iter()
                .map(|token| self.generator.generate_signal(token.as_ref(), strategy)),
        )
        .await;

        let mut signals = Vec::with_capacity(tokens.len());
        for (token, result) in tokens.iter().zip(results) {
            let outcome = match result {
                Ok(signal) => self.act_on(&signal, threshold).await.map(|_| signal),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(signal) => signals.push(signal),
                Err(e) => error!("Error processing {}: {}", token.as_ref(), e),
            }
        }

        signals
    }

    /// Execute `signal` when it clears `threshold` and is not HOLD.
    ///
    /// Returns the trade record when an order was submitted.
    async fn act_on(&self, signal: &TradingSignal, threshold: f64) -> Result<Option<TradeRecord>> {
        if signal.action.is_hold() || signal.confidence <= threshold {
            return Ok(None);
        }
        if signal.action == TradeAction::Buy && !self.risk_engine().can_open_position().await {
            info!("Skipping BUY {}: daily loss limit reached", signal.token);
            return Ok(None);
        }
        self.execute_trade(signal, self.config.trade_notional)
            .await
            .map(Some)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Submit `signal` to the execution backend and record the result.
    ///
    /// The traded size is the signal's recommended position size, falling
    /// back to `amount`. Backend failures and timeouts produce a `Failed`
    /// record rather than an error.
    pub async fn execute_trade(&self, signal: &TradingSignal, amount: f64) -> Result<TradeRecord> {
        if signal.action.is_hold() {
            return Err(AppError::InvalidInput(format!(
                "cannot execute a HOLD signal for {}",
                signal.token
            )));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "trade amount must be positive, got {amount}"
            )));
        }

        let size = signal
            .risk_assessment()
            .map(|a| a.recommended_position_size)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(amount);

        info!("Executing {} order for {}...", signal.action, signal.token);

        let submitted = with_timeout(
            self.execution_timeout,
            "execution backend",
            self.executor.submit(&signal.token, signal.action, size),
        )
        .await;

        let (status, tx_ref) = match submitted {
            Ok(receipt) => (receipt.status, Some(receipt.tx_ref)),
            Err(e) => {
                warn!("Execution failed for {} {}: {}", signal.action, signal.token, e);
                (TradeStatus::Failed, None)
            }
        };

        let record = TradeRecord {
            trade_id: self.next_trade_id(),
            token: signal.token.clone(),
            action: signal.action,
            amount: size,
            timestamp: Utc::now(),
            status,
            tx_ref,
        };

        let settlement = {
            let mut state = self.state.write().await;
            state.record_trade(record.clone());

            match (status, signal.metadata.reference_price) {
                (TradeStatus::Executed, Some(price)) => {
                    let bracket = signal
                        .risk_assessment()
                        .filter(|a| a.has_bracket())
                        .map(|a| (a.stop_loss, a.take_profit));
                    state.apply_fill(&signal.token, signal.action, size, price, bracket)
                }
                _ => None,
            }
        };

        if let Some(settlement) = settlement {
            self.risk_engine().record_trade(settlement.pnl).await;
        }

        match status {
            TradeStatus::Executed => {
                info!("Trade executed: {} {:.2} {}", signal.action, size, signal.token)
            }
            TradeStatus::Pending => info!("Trade pending: {} {:.2} {}", signal.action, size, signal.token),
            TradeStatus::Failed => {}
        }

        Ok(record)
    }

    fn next_trade_id(&self) -> String {
        let seq = self.trade_seq.fetch_add(1, Ordering::Relaxed);
        format!("trade_{}_{}", Utc::now().timestamp_micros(), seq)
    }

    /// Mark active positions to market and settle any that crossed their bracket.
    ///
    /// Tokens whose quote is unavailable keep their last mark.
    pub async fn reconcile_positions(&self) -> Vec<(String, Settlement)> {
        let tokens = self.state.read().await.active_tokens();
        if tokens.is_empty() {
            return Vec::new();
        }

        let market = self.generator.market_data();
        let quotes = join_all(tokens.iter().map(|token| {
            with_timeout(
                self.generator.timeout(),
                "market data",
                market.get_market_data(token),
            )
        }))
        .await;

        let mut settled = Vec::new();
        {
            let mut state = self.state.write().await;
            for (token, quote) in tokens.into_iter().zip(quotes) {
                let price = match quote {
                    Ok(quote) if quote.price.is_finite() && quote.price > 0.0 => quote.price,
                    Ok(quote) => {
                        warn!("Ignoring invalid price {} for {}", quote.price, token);
                        continue;
                    }
                    Err(e) => {
                        warn!("Could not mark {}: {}", token, e);
                        continue;
                    }
                };

                state.mark_price(&token, price);
                let reason: Option<CloseReason> = state.bracket_hit(&token);
                if let Some(settlement) = reason.and_then(|reason| state.settle(&token, reason)) {
                    settled.push((token, settlement));
                }
            }
        }

        for (_, settlement) in &settled {
            self.risk_engine().record_trade(settlement.pnl).await;
        }

        debug!(settled = settled.len(), "Positions reconciled");
        settled
    }

    // =========================================================================
    // Main loop
    // =========================================================================

    /// One pass over the token universe. Any error aborts the pass.
    pub async fn run_iteration(&self) -> Result<usize> {
        self.reconcile_positions().await;

        let threshold = self.config.main_loop_confidence_threshold;
        let mut executed = 0;
        for token in &self.config.token_universe {
            let signal = self.generator.generate_signal(token, self.config.strategy).await?;
            if self.act_on(&signal, threshold).await?.is_some() {
                executed += 1;
            }
        }
        Ok(executed)
    }

    /// Poll the token universe until [`TradingAgent::stop`] is called.
    ///
    /// A failed iteration switches to `Backoff` and waits `error_backoff`
    /// before retrying. Shutdown is observed between iterations; an
    /// in-flight iteration always completes.
    pub async fn main_loop(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!(
            "Starting agent loop over {} tokens (every {:?})",
            self.config.token_universe.len(),
            self.config.poll_interval
        );

        while !*shutdown_rx.borrow_and_update() {
            self.set_loop_state(LoopState::Running);

            let pause = match self.run_iteration().await {
                Ok(executed) => {
                    debug!(executed, "Agent iteration complete");
                    self.config.poll_interval
                }
                Err(e) => {
                    error!("Error in main loop: {}", e);
                    self.set_loop_state(LoopState::Backoff);
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Agent loop received shutdown signal");
                }
            }
        }

        self.set_loop_state(LoopState::Stopped);
        info!("Agent loop stopped");
    }

    /// Request shutdown. Takes effect at the next sleep boundary.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Shutting down agent...");
        }
    }

    pub fn is_stopping(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn loop_state(&self) -> LoopState {
        *self.loop_state_tx.borrow()
    }

    /// Watch main-loop state transitions.
    pub fn subscribe_loop_state(&self) -> watch::Receiver<LoopState> {
        self.loop_state_tx.subscribe()
    }

    fn set_loop_state(&self, state: LoopState) {
        let previous = self.loop_state_tx.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "Loop state changed");
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current positions, metrics and total value. No side effects.
    pub async fn portfolio_status(&self) -> PortfolioStatus {
        self.state.read().await.status(self.account_address.clone())
    }

    pub async fn trade_history(&self) -> Vec<TradeRecord> {
        self.state.read().await.trade_history().to_vec()
    }

    pub async fn performance_metrics(&self) -> PerformanceMetrics {
        self.state.read().await.metrics().clone()
    }
}

/// Resolve once the shutdown flag is set.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            // Sender gone: nobody can request shutdown any more
            std::future::pending::<()>().await;
        }
    }
}
