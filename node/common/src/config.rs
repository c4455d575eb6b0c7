//! Loaders for the JSON configuration tree under `config/`.
//!
//! The schema is consumed, not owned, by this layer: the same files feed the
//! contract deployment tooling. Validation happens here so that bad values
//! fail before any transaction is sent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::retry::validate_pct;
use crate::types::ModuleAddressBook;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    pub network: NetworkConfig,
    pub actors: ActorsConfig,
    pub modules: ModuleAddressBook,
    pub params: ProtocolParams,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    /// Advance time via evm_increaseTime instead of real waits.
    #[serde(default)]
    pub simulated_clock: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActorsConfig {
    pub owner_key: String,
    pub employer_key: String,
    pub agent_key: String,
    pub validator_keys: Vec<String>,
    pub moderator_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolParams {
    pub fee_pct: u64,
    pub validator_reward_pct: u64,
    pub validators_per_job: u64,
    pub commit_window_secs: u64,
    pub reveal_window_secs: u64,
    /// Minimum reveals for a round to finalize.
    pub min_reveals: u64,
    /// Minimum approving reveals for a successful outcome.
    pub min_approvals: u64,
    pub non_reveal_penalty_pct: u64,
    /// Whole tokens; scaled to base units by the drivers.
    pub min_stake_tokens: u64,
    pub dispute_fee_tokens: u64,
    pub dispute_window_secs: u64,
    pub burn_pct: u64,
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.rpc_url.is_empty() {
            return Err(ConfigError::MissingField("network.rpc_url"));
        }
        if self.actors.owner_key.is_empty() {
            return Err(ConfigError::MissingField("actors.owner_key"));
        }
        if self.actors.validator_keys.is_empty() {
            return Err(ConfigError::MissingField("actors.validator_keys"));
        }
        if self.actors.moderator_keys.is_empty() {
            return Err(ConfigError::MissingField("actors.moderator_keys"));
        }

        self.modules.ensure_wired()?;

        let p = &self.params;
        validate_pct("fee_pct", p.fee_pct)?;
        validate_pct("validator_reward_pct", p.validator_reward_pct)?;
        validate_pct("non_reveal_penalty_pct", p.non_reveal_penalty_pct)?;
        validate_pct("burn_pct", p.burn_pct)?;

        if p.validators_per_job > self.actors.validator_keys.len() as u64 {
            return Err(ConfigError::OutOfRange {
                field: "validators_per_job",
                value: p.validators_per_job,
                max: self.actors.validator_keys.len() as u64,
            });
        }
        if p.min_reveals > p.validators_per_job {
            return Err(ConfigError::OutOfRange {
                field: "min_reveals",
                value: p.min_reveals,
                max: p.validators_per_job,
            });
        }
        if p.min_approvals > p.min_reveals {
            return Err(ConfigError::OutOfRange {
                field: "min_approvals",
                value: p.min_approvals,
                max: p.min_reveals,
            });
        }
        Ok(())
    }
}

/// Load and validate a demo config, with file-path context on I/O and
/// parse failures.
pub fn load_demo_config(path: &Path) -> Result<DemoConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: DemoConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        r#"{
            "network": { "name": "local", "rpc_url": "http://127.0.0.1:8545", "simulated_clock": true },
            "actors": {
                "owner_key": "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
                "employer_key": "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
                "agent_key": "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
                "validator_keys": [
                    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
                    "47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
                    "8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba"
                ],
                "moderator_keys": [
                    "92db14e403b83dfe3df233f83dfa3a0d7096f21ca9b0d6d6b8d88b2b4ec1564e"
                ]
            },
            "modules": {
                "token": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "stake_manager": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
                "validation_module": "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
                "job_registry": "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9",
                "dispute_module": "0xDc64a140Aa3E981100a9becA4E685f962f0cF6C9",
                "reputation_engine": "0x5FC8d32690cc91D4c39d9d3abcBD16989F875707",
                "identity_registry": "0x0165878A594ca255338adfa4d48449f69242Eb8F",
                "certificate_nft": "0xa513E6E4b8f2a923D98304ec87F64353C4D5C853",
                "fee_pool": "0x2279B7A0a67DB372996a5FaB50D91eAA73d2eBe6"
            },
            "params": {
                "fee_pct": 5,
                "validator_reward_pct": 10,
                "validators_per_job": 3,
                "commit_window_secs": 3600,
                "reveal_window_secs": 3600,
                "min_reveals": 2,
                "min_approvals": 2,
                "non_reveal_penalty_pct": 10,
                "min_stake_tokens": 100,
                "dispute_fee_tokens": 0,
                "dispute_window_secs": 0,
                "burn_pct": 1
            }
        }"#
        .to_string()
    }

    #[test]
    fn sample_config_parses_and_validates() -> Result<()> {
        let config: DemoConfig = serde_json::from_str(&sample())?;
        config.validate()?;
        assert_eq!(config.params.fee_pct, 5);
        assert_eq!(config.actors.validator_keys.len(), 3);
        assert!(config.network.simulated_clock);
        Ok(())
    }

    #[test]
    fn out_of_range_pct_is_rejected() {
        let mut config: DemoConfig = serde_json::from_str(&sample()).unwrap();
        config.params.fee_pct = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn quorum_cannot_exceed_committee() {
        let mut config: DemoConfig = serde_json::from_str(&sample()).unwrap();
        config.params.min_reveals = 4;
        assert!(config.validate().is_err());

        let mut config: DemoConfig = serde_json::from_str(&sample()).unwrap();
        config.params.min_approvals = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_module_address_is_rejected() {
        let mut config: DemoConfig = serde_json::from_str(&sample()).unwrap();
        config.modules.fee_pool = ethers::types::Address::zero();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_moderators_are_rejected() {
        let mut config: DemoConfig = serde_json::from_str(&sample()).unwrap();
        config.actors.moderator_keys.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_demo_config(Path::new("/nonexistent/demo.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/demo.json"));
    }
}
