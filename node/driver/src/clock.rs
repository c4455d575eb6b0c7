//! Deadline waits against the chain's clock.
//!
//! A round's commit and reveal windows are enforced by block timestamp. On a
//! dev chain the clock is advanced with evm_increaseTime; against a live
//! network the driver has no choice but to wait out the window.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::BlockNumber;
use tracing::info;

pub enum ChainClock {
    /// evm_increaseTime + evm_mine on anvil/hardhat style nodes.
    Sim(Arc<Provider<Http>>),
    /// Real wall-clock waits.
    Wall(Arc<Provider<Http>>),
}

/// Seconds left until the deadline, zero once passed.
pub fn remaining(now: u64, deadline: u64) -> u64 {
    deadline.saturating_sub(now)
}

impl ChainClock {
    pub fn new(provider: Arc<Provider<Http>>, simulated: bool) -> Self {
        if simulated {
            ChainClock::Sim(provider)
        } else {
            ChainClock::Wall(provider)
        }
    }

    fn provider(&self) -> &Provider<Http> {
        match self {
            ChainClock::Sim(p) | ChainClock::Wall(p) => p,
        }
    }

    /// Latest block timestamp.
    pub async fn now(&self) -> Result<u64> {
        let block = self
            .provider()
            .get_block(BlockNumber::Latest)
            .await?
            .context("no latest block")?;
        Ok(block.timestamp.as_u64())
    }

    /// Advance past `deadline` (inclusive, +1s skew). Calls gated on the
    /// deadline revert until this returns.
    pub async fn advance_past(&self, deadline: u64) -> Result<()> {
        let now = self.now().await?;
        let wait = remaining(now, deadline) + 1;

        match self {
            ChainClock::Sim(provider) => {
                info!(wait_secs = wait, "advancing simulated chain clock");
                provider
                    .request::<_, serde_json::Value>("evm_increaseTime", [wait])
                    .await?;
                provider
                    .request::<_, serde_json::Value>("evm_mine", ())
                    .await?;
            }
            ChainClock::Wall(_) => {
                info!(wait_secs = wait, "waiting out window");
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_counts_down_to_zero() {
        assert_eq!(remaining(100, 160), 60);
        assert_eq!(remaining(160, 160), 0);
        assert_eq!(remaining(200, 160), 0, "a passed deadline never underflows");
    }
}
