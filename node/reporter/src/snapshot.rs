//! On-chain state collection for the operator reports.
//!
//! Purely read-side: balances, stakes, reputation, job records. The caller
//! supplies the job ids of interest and, optionally, the serialized run
//! record to embed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::Serialize;
use tracing::debug;

use agijobs_common::config::ProtocolParams;
use agijobs_common::contracts::ModuleSuite;
use agijobs_common::types::{ActorProfile, JobState, ModuleAddressBook, Role, StakeRole};

#[derive(Debug, Clone, Serialize)]
pub struct ActorRow {
    pub role: Role,
    pub label: String,
    pub address: Address,
    pub token_balance: String,
    pub stake: String,
    pub reputation: String,
    pub certificates: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    pub job_id: String,
    pub employer: Address,
    pub agent: Address,
    pub reward: String,
    pub state: JobState,
    pub success: bool,
    pub burn_confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct ChainSnapshot {
    pub network: String,
    pub chain_id: u64,
    pub generated_at: DateTime<Utc>,
    pub modules: ModuleAddressBook,
    pub params: ProtocolParams,
    pub actors: Vec<ActorRow>,
    pub jobs: Vec<JobRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<serde_json::Value>,
}

fn stake_role(role: Role) -> Option<StakeRole> {
    match role {
        Role::Agent => Some(StakeRole::Agent),
        Role::Validator => Some(StakeRole::Validator),
        _ => None,
    }
}

pub async fn collect(
    suite: &ModuleSuite,
    network: &str,
    chain_id: u64,
    params: &ProtocolParams,
    profiles: &[ActorProfile],
    job_ids: &[U256],
) -> Result<ChainSnapshot> {
    let mut actors = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let balance = suite.token.balance_of(profile.address).await?;
        let stake = match stake_role(profile.role) {
            Some(role) => suite.stake.stake_of(profile.address, role as u8).await?,
            None => U256::zero(),
        };
        let reputation = suite.reputation.reputation_of(profile.address).await?;
        let certificates = suite.certificate.balance_of(profile.address).await?;
        debug!(label = %profile.label, %balance, "actor collected");

        actors.push(ActorRow {
            role: profile.role,
            label: profile.label.clone(),
            address: profile.address,
            token_balance: balance.to_string(),
            stake: stake.to_string(),
            reputation: reputation.to_string(),
            certificates: certificates.to_string(),
        });
    }

    let mut jobs = Vec::with_capacity(job_ids.len());
    for &job_id in job_ids {
        let job = suite.registry.job(job_id).await?;
        jobs.push(JobRow {
            job_id: job_id.to_string(),
            employer: job.employer,
            agent: job.agent,
            reward: job.reward.to_string(),
            state: job.state,
            success: job.success,
            burn_confirmed: job.burn_confirmed,
        });
    }

    Ok(ChainSnapshot {
        network: network.to_owned(),
        chain_id,
        generated_at: Utc::now(),
        modules: suite.book.clone(),
        params: params.clone(),
        actors,
        jobs,
        run: None,
    })
}
