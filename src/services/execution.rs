//! Execution backend seam.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{AppError, Result};
use crate::types::{ExecutionReceipt, TradeAction, TradeStatus};

/// Accepts orders and reports a transaction reference and status.
pub trait ExecutionBackend: Send + Sync {
    fn submit<'a>(
        &'a self,
        token: &'a str,
        action: TradeAction,
        amount: f64,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionReceipt>> + Send + 'a>>;
}

/// Paper executor: every order fills immediately.
///
/// Transaction references are `0x` + hex(sha256(account | nonce | order | time)),
/// unique per submission.
pub struct PaperExecutor {
    account: String,
    nonce: AtomicU64,
}

impl PaperExecutor {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            nonce: AtomicU64::new(0),
        }
    }

    /// Number of orders accepted so far.
    pub fn submitted(&self) -> u64 {
        self.nonce.load(Ordering::Relaxed)
    }

    fn tx_ref(&self, nonce: u64, token: &str, action: TradeAction, amount: f64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.account.as_bytes());
        hasher.update(nonce.to_be_bytes());
        hasher.update(token.as_bytes());
        hasher.update(action.to_string().as_bytes());
        hasher.update(amount.to_be_bytes());
        hasher.update(Utc::now().timestamp_micros().to_be_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

impl Default for PaperExecutor {
    fn default() -> Self {
        Self::new("paper")
    }
}

impl ExecutionBackend for PaperExecutor {
    fn submit<'a>(
        &'a self,
        token: &'a str,
        action: TradeAction,
        amount: f64,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionReceipt>> + Send + 'a>> {
        Box::pin(async move {
            if action.is_hold() {
                return Err(AppError::Execution("cannot submit a HOLD order".to_string()));
            }
            let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
            let tx_ref = self.tx_ref(nonce, token, action, amount);

            info!("Paper {} {:.2} {} -> {}", action, amount, token, tx_ref);

            Ok(ExecutionReceipt {
                tx_ref,
                status: TradeStatus::Executed,
            })
        })
    }
}
