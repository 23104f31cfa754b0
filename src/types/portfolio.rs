use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TradeAction;

/// Open (or closed) holding in a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub token: String,
    /// Quantity held, in token units
    pub amount: f64,
    pub entry_price: f64,
    pub current_price: f64,
    /// Unrealized (or, once closed, realized) P&L
    pub pnl: f64,
    /// P&L as percentage of entry notional
    pub pnl_percentage: f64,
    pub timestamp: DateTime<Utc>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
}

impl Position {
    /// Create a new position.
    pub fn new(token: String, amount: f64, entry_price: f64) -> Self {
        Self {
            token,
            amount,
            entry_price,
            current_price: entry_price,
            pnl: 0.0,
            pnl_percentage: 0.0,
            timestamp: Utc::now(),
            is_active: true,
            stop_loss: None,
            take_profit: None,
        }
    }

    /// Attach bracket prices.
    pub fn with_bracket(mut self, stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    /// Update the position with a new market price.
    pub fn mark(&mut self, price: f64) {
        self.current_price = price;
        self.pnl = self.amount * (price - self.entry_price);
        self.pnl_percentage = if self.entry_price > 0.0 {
            (price - self.entry_price) / self.entry_price * 100.0
        } else {
            0.0
        };
        self.timestamp = Utc::now();
    }

    /// Add to the position at `price`, averaging the entry price.
    pub fn add(&mut self, amount: f64, price: f64) {
        let total = self.amount + amount;
        if total > 0.0 {
            self.entry_price = (self.amount * self.entry_price + amount * price) / total;
        }
        self.amount = total;
        self.mark(price);
    }

    /// Sell up to `quantity` at `price`, keeping the entry price.
    ///
    /// Returns the P&L realized on the units sold.
    pub fn reduce(&mut self, quantity: f64, price: f64) -> f64 {
        let sold = quantity.clamp(0.0, self.amount);
        self.amount -= sold;
        self.mark(price);
        sold * (price - self.entry_price)
    }

    /// Current notional value.
    pub fn value(&self) -> f64 {
        self.amount * self.current_price
    }

    pub fn stop_loss_hit(&self) -> bool {
        self.stop_loss
            .map(|sl| sl > 0.0 && self.current_price <= sl)
            .unwrap_or(false)
    }

    pub fn take_profit_hit(&self) -> bool {
        self.take_profit
            .map(|tp| tp > 0.0 && self.current_price >= tp)
            .unwrap_or(false)
    }
}

/// Status of a submitted trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Executed,
    Failed,
    Pending,
}

/// Receipt returned by the execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub tx_ref: String,
    pub status: TradeStatus,
}

/// Entry in the trade history. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub token: String,
    pub action: TradeAction,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub status: TradeStatus,
    /// External transaction reference (absent when submission failed)
    pub tx_ref: Option<String>,
}

/// Running performance statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub sharpe_ratio: f64,
}

impl PerformanceMetrics {
    /// Recompute win rate as winning / total (0 with no trades).
    pub fn recompute_win_rate(&mut self) {
        self.win_rate = if self.total_trades > 0 {
            self.winning_trades as f64 / self.total_trades as f64
        } else {
            0.0
        };
    }
}

/// Read-only projection of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatus {
    pub account_address: Option<String>,
    pub positions: BTreeMap<String, Position>,
    /// Number of active positions
    pub active_trades: usize,
    pub performance_metrics: PerformanceMetrics,
    /// Sum of amount * current_price over active positions
    pub total_value: f64,
}
