//! Signer assembly for every role in a run.

use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use tracing::info;

use agijobs_common::config::DemoConfig;
use agijobs_common::contracts::Client;
use agijobs_common::retry::{retry_with_backoff, RetryConfig};
use agijobs_common::types::{ActorProfile, Role};

pub struct ActorSet {
    pub provider: Arc<Provider<Http>>,
    pub chain_id: u64,
    pub owner: Arc<Client>,
    pub employer: Arc<Client>,
    pub agent: Arc<Client>,
    pub validators: Vec<Arc<Client>>,
    /// Moderators sign off-chain only; no middleware needed.
    pub moderators: Vec<LocalWallet>,
}

fn client(provider: &Provider<Http>, key: &str, chain_id: u64) -> Result<Arc<Client>> {
    let wallet: LocalWallet = key.parse().context("invalid private key")?;
    Ok(Arc::new(SignerMiddleware::new(
        provider.clone(),
        wallet.with_chain_id(chain_id),
    )))
}

impl ActorSet {
    pub async fn connect(config: &DemoConfig) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(config.network.rpc_url.as_str()).context("invalid RPC URL")?;

        // get chain ID with retry
        let chain_id = retry_with_backoff(
            || async { provider.get_chainid().await.map_err(Into::into) },
            &RetryConfig::default(),
        )
        .await?
        .as_u64();
        info!(chain_id, network = %config.network.name, "connected");

        let owner = client(&provider, &config.actors.owner_key, chain_id)?;
        let employer = client(&provider, &config.actors.employer_key, chain_id)?;
        let agent = client(&provider, &config.actors.agent_key, chain_id)?;

        let validators = config
            .actors
            .validator_keys
            .iter()
            .map(|key| client(&provider, key, chain_id))
            .collect::<Result<Vec<_>>>()?;

        let moderators = config
            .actors
            .moderator_keys
            .iter()
            .map(|key| {
                let wallet: LocalWallet = key.parse().context("invalid moderator key")?;
                Ok(wallet.with_chain_id(chain_id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
            owner,
            employer,
            agent,
            validators,
            moderators,
        })
    }

    pub fn validator_addresses(&self) -> Vec<Address> {
        self.validators.iter().map(|c| c.address()).collect()
    }

    pub fn moderator_addresses(&self) -> Vec<Address> {
        self.moderators.iter().map(|w| w.address()).collect()
    }

    pub fn profiles(&self) -> Vec<ActorProfile> {
        let mut profiles = vec![
            ActorProfile {
                role: Role::Owner,
                label: "owner".into(),
                address: self.owner.address(),
            },
            ActorProfile {
                role: Role::Employer,
                label: "employer".into(),
                address: self.employer.address(),
            },
            ActorProfile {
                role: Role::Agent,
                label: "agent".into(),
                address: self.agent.address(),
            },
        ];
        for (i, v) in self.validators.iter().enumerate() {
            profiles.push(ActorProfile {
                role: Role::Validator,
                label: format!("validator-{}", i + 1),
                address: v.address(),
            });
        }
        for (i, m) in self.moderators.iter().enumerate() {
            profiles.push(ActorProfile {
                role: Role::Moderator,
                label: format!("moderator-{}", i + 1),
                address: m.address(),
            });
        }
        profiles
    }
}
