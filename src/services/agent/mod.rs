//! Trading agent
//!
//! Signal-driven orchestrator: runs strategies over a token universe,
//! executes confident signals and tracks positions and performance.

pub mod runner;
pub mod state;

pub use runner::{LoopState, TradingAgent};
pub use state::{sharpe_ratio, CloseReason, PortfolioState, Settlement};
