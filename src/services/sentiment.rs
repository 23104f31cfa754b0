//! Sentiment provider seam.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::SentimentReading;

/// Source of normalized token sentiment.
pub trait SentimentProvider: Send + Sync {
    /// Sentiment for `token`; `overall` is in [-1, 1].
    fn get_sentiment<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SentimentReading>> + Send + 'a>>;
}

/// Weights of the social, news and on-chain components in the overall score.
const SOCIAL_WEIGHT: f64 = 0.4;
const NEWS_WEIGHT: f64 = 0.35;
const ON_CHAIN_WEIGHT: f64 = 0.25;

/// Uniform sentiment sampler for paper trading.
pub struct SimulatedSentiment {
    rng: Mutex<StdRng>,
}

impl SimulatedSentiment {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn sample(&self) -> Result<(f64, f64, f64)> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("sentiment rng lock poisoned".to_string()))?;
        Ok((
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        ))
    }
}

impl Default for SimulatedSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentProvider for SimulatedSentiment {
    fn get_sentiment<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SentimentReading>> + Send + 'a>> {
        Box::pin(async move {
            let (social, news, on_chain) = self.sample()?;
            let overall = (social * SOCIAL_WEIGHT + news * NEWS_WEIGHT + on_chain * ON_CHAIN_WEIGHT)
                .clamp(-1.0, 1.0);

            debug!(token, overall, social, news, on_chain, "Simulated sentiment");

            Ok(SentimentReading {
                overall,
                social,
                news,
                on_chain,
                timestamp: Utc::now(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_sentiment_in_range() {
        let provider = SimulatedSentiment::seeded(3);
        for _ in 0..50 {
            let reading = provider.get_sentiment("INJ").await.unwrap();
            assert!((-1.0..=1.0).contains(&reading.overall));
            assert!((-1.0..=1.0).contains(&reading.social));
            assert!((-1.0..=1.0).contains(&reading.news));
            assert!((-1.0..=1.0).contains(&reading.on_chain));
        }
    }

    #[tokio::test]
    async fn test_seeded_sentiment_is_reproducible() {
        let a = SimulatedSentiment::seeded(11).get_sentiment("ETH").await.unwrap();
        let b = SimulatedSentiment::seeded(11).get_sentiment("ETH").await.unwrap();
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.social, b.social);
    }
}
