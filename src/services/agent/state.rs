//! Portfolio state owned by the trading agent.
//!
//! All mutation goes through the methods here; the agent holds the state
//! behind a single lock so readers always see a consistent snapshot.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::types::{
    PerformanceMetrics, PortfolioStatus, Position, TradeAction, TradeRecord, TradeStatus,
};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Signal,
}

/// Realized outcome of a close or partial sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub pnl: f64,
    pub pnl_percentage: f64,
    pub reason: CloseReason,
    /// Whether the position was closed out
    pub closed: bool,
}

/// Fraction of a position below which a SELL counts as closing it.
const CLOSE_TOLERANCE: f64 = 1e-9;

/// Positions, trade history and performance metrics.
#[derive(Debug, Clone, Default)]
pub struct PortfolioState {
    positions: BTreeMap<String, Position>,
    trade_history: Vec<TradeRecord>,
    metrics: PerformanceMetrics,
    /// Realized percentage returns, one per close or partial sell
    realized_returns: Vec<f64>,
}

impl PortfolioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, token: &str) -> Option<&Position> {
        self.positions.get(token)
    }

    pub fn trade_history(&self) -> &[TradeRecord] {
        &self.trade_history
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Tokens with an active position.
    pub fn active_tokens(&self) -> Vec<String> {
        self.positions
            .values()
            .filter(|p| p.is_active)
            .map(|p| p.token.clone())
            .collect()
    }

    /// Append a trade. Only executed trades count towards `total_trades`.
    pub fn record_trade(&mut self, record: TradeRecord) {
        if record.status == TradeStatus::Executed {
            self.metrics.total_trades += 1;
            self.metrics.recompute_win_rate();
        }
        self.trade_history.push(record);
    }

    /// Apply an executed fill of `notional` at `price`.
    ///
    /// BUY opens or averages into the token's position. SELL reduces an
    /// active position by `notional / price` units and realizes P&L on those
    /// units, closing the position once nothing is left. Anything else leaves
    /// positions alone.
    pub fn apply_fill(
        &mut self,
        token: &str,
        action: TradeAction,
        notional: f64,
        price: f64,
        bracket: Option<(f64, f64)>,
    ) -> Option<Settlement> {
        if !(price.is_finite() && price > 0.0) {
            return None;
        }

        match action {
            TradeAction::Buy => {
                let quantity = notional / price;
                let (stop_loss, take_profit) = match bracket {
                    Some((sl, tp)) => (Some(sl), Some(tp)),
                    None => (None, None),
                };

                match self.positions.get_mut(token) {
                    Some(position) if position.is_active => {
                        position.add(quantity, price);
                        if bracket.is_some() {
                            position.stop_loss = stop_loss;
                            position.take_profit = take_profit;
                        }
                        debug!(token, amount = position.amount, entry = position.entry_price, "Averaged into position");
                    }
                    _ => {
                        let position = Position::new(token.to_string(), quantity, price)
                            .with_bracket(stop_loss, take_profit);
                        info!("Opened {} position: {:.6} @ {:.4}", token, quantity, price);
                        self.positions.insert(token.to_string(), position);
                    }
                }
                None
            }
            TradeAction::Sell => {
                let position = self.positions.get_mut(token).filter(|p| p.is_active)?;
                let quantity = notional / price;
                if quantity >= position.amount * (1.0 - CLOSE_TOLERANCE) {
                    position.mark(price);
                    return self.settle(token, CloseReason::Signal);
                }

                let pnl = position.reduce(quantity, price);
                let settlement = Settlement {
                    pnl,
                    pnl_percentage: position.pnl_percentage,
                    reason: CloseReason::Signal,
                    closed: false,
                };
                info!(
                    "Reduced {} position by {:.6} @ {:.4} ({:.6} left): pnl {:.2}",
                    token, quantity, price, position.amount, pnl
                );
                self.book(&settlement);
                Some(settlement)
            }
            TradeAction::Hold => None,
        }
    }

    /// Mark an active position to `price`. Returns false when there is none.
    pub fn mark_price(&mut self, token: &str, price: f64) -> bool {
        match self.positions.get_mut(token) {
            Some(position) if position.is_active => {
                position.mark(price);
                true
            }
            _ => false,
        }
    }

    /// Bracket level crossed by an active position at its current price, if any.
    pub fn bracket_hit(&self, token: &str) -> Option<CloseReason> {
        let position = self.positions.get(token).filter(|p| p.is_active)?;
        if position.stop_loss_hit() {
            Some(CloseReason::StopLoss)
        } else if position.take_profit_hit() {
            Some(CloseReason::TakeProfit)
        } else {
            None
        }
    }

    /// Close an active position at its current price and update metrics.
    pub fn settle(&mut self, token: &str, reason: CloseReason) -> Option<Settlement> {
        let position = self.positions.get_mut(token).filter(|p| p.is_active)?;
        position.is_active = false;

        let settlement = Settlement {
            pnl: position.pnl,
            pnl_percentage: position.pnl_percentage,
            reason,
            closed: true,
        };

        info!(
            "Closed {} position ({:?}): pnl {:.2} ({:.2}%)",
            token, reason, settlement.pnl, settlement.pnl_percentage
        );
        self.book(&settlement);
        Some(settlement)
    }

    /// Fold a realized result into the performance metrics.
    fn book(&mut self, settlement: &Settlement) {
        if settlement.pnl > 0.0 {
            self.metrics.winning_trades += 1;
        } else {
            self.metrics.losing_trades += 1;
        }
        self.metrics.total_pnl += settlement.pnl;
        self.metrics.recompute_win_rate();

        self.realized_returns.push(settlement.pnl_percentage);
        self.metrics.sharpe_ratio = sharpe_ratio(&self.realized_returns);
    }

    /// Read-only projection of the portfolio.
    pub fn status(&self, account_address: Option<String>) -> PortfolioStatus {
        let active = self.positions.values().filter(|p| p.is_active);
        PortfolioStatus {
            account_address,
            positions: self.positions.clone(),
            active_trades: active.clone().count(),
            performance_metrics: self.metrics.clone(),
            total_value: active.map(Position::value).fold(0.0, |acc, v| acc + v),
        }
    }
}

/// Mean over sample standard deviation of realized returns.
///
/// 0 with fewer than two returns or zero dispersion.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        mean / std_dev
    } else {
        0.0
    }
}
