//! Demo scenario drivers: the end-to-end narratives the operator CLI runs
//! against a dev chain.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{ensure, Result};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use tracing::info;

use agijobs_common::config::DemoConfig;
use agijobs_common::contracts::{
    Client, DisputeClient, JobRegistryClient, ModuleSuite, StakeManagerClient, TokenClient,
    ValidationClient,
};
use agijobs_common::types::{tokens, JobState, StakeRole};
use agijobs_driver::actors::ActorSet;
use agijobs_driver::bootstrap;
use agijobs_driver::clock::ChainClock;
use agijobs_driver::context::RunContext;
use agijobs_driver::dispute::DisputeDriver;
use agijobs_driver::lifecycle::JobLifecycle;
use agijobs_driver::validation::RoundDriver;

const DEMO_SPEC_URI: &str = "ipfs://agi-jobs/demo/spec.json";
const DEMO_RESULT_URI: &str = "ipfs://agi-jobs/demo/result.json";
const DEMO_REWARD_TOKENS: u64 = 250;
const JOB_DEADLINE_SECS: u64 = 7 * 24 * 3600;

/// Connected environment for one scenario run.
pub struct Env {
    pub config: DemoConfig,
    pub actors: ActorSet,
    pub suite: ModuleSuite,
    pub clock: ChainClock,
}

pub async fn connect(config: DemoConfig) -> Result<Env> {
    let actors = ActorSet::connect(&config).await?;
    let suite = ModuleSuite::attach(&config.modules, actors.owner.clone());
    let clock = ChainClock::new(actors.provider.clone(), config.network.simulated_clock);
    Ok(Env {
        config,
        actors,
        suite,
        clock,
    })
}

/// Wire module cross-references and enroll the demo identities.
pub async fn bootstrap(env: &Env, execute: bool, ctx: &mut RunContext) -> Result<()> {
    bootstrap::wire(
        &env.suite,
        &env.config.params,
        env.actors.validator_addresses(),
        &env.actors.moderator_addresses(),
        execute,
        ctx,
    )
    .await?;
    bootstrap::enroll_identities(
        &env.suite,
        env.actors.agent.address(),
        &env.actors.validator_addresses(),
        execute,
        ctx,
    )
    .await
}

fn token_for(env: &Env, client: Arc<Client>) -> TokenClient {
    TokenClient::new(env.suite.book.token, client)
}

fn stake_for(env: &Env, client: Arc<Client>) -> StakeManagerClient {
    StakeManagerClient::new(env.suite.book.stake_manager, client)
}

fn registry_for(env: &Env, client: Arc<Client>) -> JobRegistryClient {
    JobRegistryClient::new(env.suite.book.job_registry, client)
}

async fn stake_as(
    env: &Env,
    client: Arc<Client>,
    role: StakeRole,
    amount: U256,
    ctx: &mut RunContext,
) -> Result<()> {
    let who = client.address();
    token_for(env, client.clone())
        .approve(env.suite.book.stake_manager, amount)
        .await?;
    let tx = stake_for(env, client)
        .deposit_stake(role as u8, amount)
        .await?;
    ctx.tx(format!("{:#x} staked {} as {:?}", who, amount, role), tx);
    Ok(())
}

/// Mint working balances and post the stakes every scenario needs.
pub async fn fund_and_stake(env: &Env, ctx: &mut RunContext) -> Result<()> {
    let params = &env.config.params;
    let reward = tokens(DEMO_REWARD_TOKENS);
    let fee = reward * U256::from(params.fee_pct) / U256::from(100);
    let stake = tokens(params.min_stake_tokens);

    let owner_token = token_for(env, env.actors.owner.clone());
    owner_token
        .mint(env.actors.employer.address(), reward + fee)
        .await?;
    owner_token.mint(env.actors.agent.address(), stake).await?;
    for validator in &env.actors.validators {
        owner_token.mint(validator.address(), stake).await?;
    }
    ctx.note("token balances minted for employer, agent, validators");

    // Employer escrows reward + fee through the registry on createJob.
    token_for(env, env.actors.employer.clone())
        .approve(env.suite.book.job_registry, reward + fee)
        .await?;

    stake_as(env, env.actors.agent.clone(), StakeRole::Agent, stake, ctx).await?;
    for validator in &env.actors.validators {
        stake_as(env, validator.clone(), StakeRole::Validator, stake, ctx).await?;
    }
    info!("funding and staking complete");
    Ok(())
}

fn lifecycle(env: &Env) -> JobLifecycle {
    JobLifecycle {
        employer: registry_for(env, env.actors.employer.clone()),
        agent: registry_for(env, env.actors.agent.clone()),
    }
}

fn round_driver(env: &Env) -> RoundDriver {
    RoundDriver {
        validation: ValidationClient::new(
            env.suite.book.validation_module,
            env.actors.owner.clone(),
        ),
        committee: env
            .actors
            .validators
            .iter()
            .map(|client| {
                (
                    client.address(),
                    ValidationClient::new(env.suite.book.validation_module, client.clone()),
                )
            })
            .collect(),
    }
}

/// Drive a job to the point where validation can start: created, applied,
/// submitted, burn confirmed.
async fn drive_to_submitted(env: &Env, ctx: &mut RunContext) -> Result<(U256, H256, H256)> {
    let jobs = lifecycle(env);
    let params = &env.config.params;
    let reward = tokens(DEMO_REWARD_TOKENS);
    let deadline = env.clock.now().await? + JOB_DEADLINE_SECS;

    let (job_id, spec_hash) = jobs
        .create_job(ctx, reward, deadline, DEMO_SPEC_URI)
        .await?;
    jobs.apply_for_job(ctx, job_id).await?;
    jobs.submit(ctx, job_id, DEMO_RESULT_URI).await?;

    let burn_amount = reward * U256::from(params.burn_pct) / U256::from(100);
    let burn_tx_hash = jobs.confirm_burn(ctx, job_id, burn_amount).await?;
    Ok((job_id, spec_hash, burn_tx_hash))
}

/// The end-to-end happy path. With `skip_reveals = 0` all validators
/// approve and reveal; with a nonzero value the tail of the committee
/// withholds its reveal, exercising the partial-quorum finalize.
pub async fn run_happy_path(env: &Env, skip_reveals: usize, ctx: &mut RunContext) -> Result<U256> {
    let params = &env.config.params;

    bootstrap(env, true, ctx).await?;
    fund_and_stake(env, ctx).await?;

    let certificates_before = env
        .suite
        .certificate
        .balance_of(env.actors.agent.address())
        .await?;

    let (job_id, spec_hash, burn_tx_hash) = drive_to_submitted(env, ctx).await?;

    let driver = round_driver(env);
    let committee_size = params.validators_per_job as usize;
    ensure!(
        skip_reveals <= committee_size,
        "cannot skip {} reveals with a committee of {}",
        skip_reveals,
        committee_size
    );
    let approvals = vec![true; committee_size];
    let withhold: HashSet<Address> = env
        .actors
        .validator_addresses()
        .into_iter()
        .rev()
        .take(skip_reveals)
        .collect();

    let outcome = driver
        .run(
            job_id,
            U256::from(rand::random::<u64>()),
            &approvals,
            burn_tx_hash,
            spec_hash,
            &withhold,
            params.min_reveals as usize,
            &env.clock,
            ctx,
        )
        .await?;

    let job = lifecycle(env).job(job_id).await?;
    ensure!(
        job.state == JobState::Finalized,
        "expected Finalized, got {:?}",
        job.state
    );
    ensure!(job.success, "round met quorum with approvals, expected success=true");

    let certificates_after = env
        .suite
        .certificate
        .balance_of(env.actors.agent.address())
        .await?;
    ensure!(
        certificates_after == certificates_before + U256::one(),
        "agent certificate balance must increase by exactly 1 (before {}, after {})",
        certificates_before,
        certificates_after
    );

    ctx.scenario(
        "happy-path",
        true,
        format!(
            "job {} finalized with success=true, {} of {} reveals, certificate minted",
            job_id, outcome.revealed, outcome.committed
        ),
    );
    Ok(job_id)
}

/// Raise a dispute on a submitted job and settle it with moderator
/// signatures. Dispute fee and window are zeroed by the wiring pass, the
/// expedited configuration used in test scenarios.
pub async fn run_dispute(env: &Env, employer_wins: bool, ctx: &mut RunContext) -> Result<U256> {
    bootstrap(env, true, ctx).await?;
    fund_and_stake(env, ctx).await?;

    let (job_id, _spec_hash, _burn_tx_hash) = drive_to_submitted(env, ctx).await?;

    let driver = DisputeDriver {
        raiser: DisputeClient::new(env.suite.book.dispute_module, env.actors.agent.clone()),
        submitter: DisputeClient::new(env.suite.book.dispute_module, env.actors.owner.clone()),
        chain_id: env.actors.chain_id,
    };

    let evidence_hash = H256(keccak256(b"ipfs://agi-jobs/demo/evidence.json"));
    driver
        .raise(ctx, job_id, env.actors.agent.address(), evidence_hash)
        .await?;

    driver
        .resolve_with_signatures(ctx, job_id, employer_wins, &env.actors.moderators)
        .await?;

    let job = lifecycle(env).job(job_id).await?;
    ensure!(
        job.state == JobState::Finalized,
        "expected Finalized after resolution, got {:?}",
        job.state
    );
    ensure!(
        job.success == !employer_wins,
        "resolution outcome mismatch: employer_wins={} but success={}",
        employer_wins,
        job.success
    );

    ctx.scenario(
        "dispute-resolution",
        true,
        format!(
            "job {} resolved via moderator signatures, employer_wins={}",
            job_id, employer_wins
        ),
    );
    Ok(job_id)
}

impl Env {
    /// Network sanity check against the --network flag.
    pub fn ensure_network(&self, requested: Option<&str>) -> Result<()> {
        if let Some(name) = requested {
            ensure!(
                name == self.config.network.name,
                "config is for network `{}`, not `{}`",
                self.config.network.name,
                name
            );
        }
        Ok(())
    }
}

/// Flag values to registry job ids.
pub fn job_ids(ids: &[u64]) -> Vec<U256> {
    ids.iter().map(|&id| U256::from(id)).collect()
}
