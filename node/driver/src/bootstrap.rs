//! Environment bootstrapper: attach to the deployed modules and wire their
//! mutual references and parameters via owner-authorized calls.
//!
//! Bytecode deployment belongs to the contract toolchain; this pass owns the
//! wiring. With `execute = false` every action is recorded as a plan and no
//! transaction is sent.

use anyhow::Result;
use ethers::types::{Address, U256};
use tracing::info;

use agijobs_common::config::ProtocolParams;
use agijobs_common::contracts::ModuleSuite;
use agijobs_common::types::tokens;

use crate::context::RunContext;

pub async fn wire(
    suite: &ModuleSuite,
    params: &ProtocolParams,
    validator_pool: Vec<Address>,
    moderators: &[Address],
    execute: bool,
    ctx: &mut RunContext,
) -> Result<()> {
    info!(execute, "wiring module cross-references");
    let registry = suite.book.job_registry;

    let tx = if execute {
        Some(suite.registry.set_modules(&suite.book).await?)
    } else {
        None
    };
    ctx.owner_action("JobRegistry", "setModules(validation, stakeManager, reputation, dispute, certificate, feePool)", tx);

    let tx = if execute {
        Some(suite.registry.set_fee_pct(U256::from(params.fee_pct)).await?)
    } else {
        None
    };
    ctx.owner_action("JobRegistry", format!("setFeePct({})", params.fee_pct), tx);

    let tx = if execute {
        Some(
            suite
                .registry
                .set_validator_reward_pct(U256::from(params.validator_reward_pct))
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "JobRegistry",
        format!("setValidatorRewardPct({})", params.validator_reward_pct),
        tx,
    );

    let tx = if execute {
        Some(suite.validation.set_job_registry(registry).await?)
    } else {
        None
    };
    ctx.owner_action("ValidationModule", format!("setJobRegistry({:#x})", registry), tx);

    let tx = if execute {
        Some(
            suite
                .validation
                .set_commit_reveal_windows(params.commit_window_secs, params.reveal_window_secs)
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "ValidationModule",
        format!(
            "setCommitRevealWindows({}, {})",
            params.commit_window_secs, params.reveal_window_secs
        ),
        tx,
    );

    let tx = if execute {
        Some(
            suite
                .validation
                .set_validators_per_job(U256::from(params.validators_per_job))
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "ValidationModule",
        format!("setValidatorsPerJob({})", params.validators_per_job),
        tx,
    );

    let pool_desc = format!("setValidatorPool([{} validators])", validator_pool.len());
    let tx = if execute {
        Some(suite.validation.set_validator_pool(validator_pool).await?)
    } else {
        None
    };
    ctx.owner_action("ValidationModule", pool_desc, tx);

    let tx = if execute {
        Some(
            suite
                .validation
                .set_reveal_quorum(U256::from(params.min_reveals), U256::from(params.min_approvals))
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "ValidationModule",
        format!("setRevealQuorum({}, {})", params.min_reveals, params.min_approvals),
        tx,
    );

    let tx = if execute {
        Some(
            suite
                .validation
                .set_non_reveal_penalty(U256::from(params.non_reveal_penalty_pct))
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "ValidationModule",
        format!("setNonRevealPenalty({})", params.non_reveal_penalty_pct),
        tx,
    );

    let tx = if execute {
        Some(suite.stake.set_job_registry(registry).await?)
    } else {
        None
    };
    ctx.owner_action("StakeManager", format!("setJobRegistry({:#x})", registry), tx);

    let tx = if execute {
        Some(suite.stake.set_min_stake(tokens(params.min_stake_tokens)).await?)
    } else {
        None
    };
    ctx.owner_action(
        "StakeManager",
        format!("setMinStake({} tokens)", params.min_stake_tokens),
        tx,
    );

    let tx = if execute {
        Some(suite.dispute.set_job_registry(registry).await?)
    } else {
        None
    };
    ctx.owner_action("DisputeModule", format!("setJobRegistry({:#x})", registry), tx);

    let tx = if execute {
        Some(
            suite
                .dispute
                .set_dispute_fee(tokens(params.dispute_fee_tokens))
                .await?,
        )
    } else {
        None
    };
    ctx.owner_action(
        "DisputeModule",
        format!("setDisputeFee({} tokens)", params.dispute_fee_tokens),
        tx,
    );

    let tx = if execute {
        Some(suite.dispute.set_dispute_window(params.dispute_window_secs).await?)
    } else {
        None
    };
    ctx.owner_action(
        "DisputeModule",
        format!("setDisputeWindow({})", params.dispute_window_secs),
        tx,
    );

    for moderator in moderators {
        let tx = if execute {
            Some(suite.dispute.set_moderator(*moderator, true).await?)
        } else {
            None
        };
        ctx.owner_action("DisputeModule", format!("setModerator({:#x}, true)", moderator), tx);
    }

    let tx = if execute {
        Some(suite.reputation.set_caller(registry, true).await?)
    } else {
        None
    };
    ctx.owner_action("ReputationEngine", format!("setCaller({:#x}, true)", registry), tx);

    let tx = if execute {
        Some(suite.certificate.set_job_registry(registry).await?)
    } else {
        None
    };
    ctx.owner_action("CertificateNFT", format!("setJobRegistry({:#x})", registry), tx);

    let tx = if execute {
        Some(suite.fee_pool.set_burn_pct(U256::from(params.burn_pct)).await?)
    } else {
        None
    };
    ctx.owner_action("FeePool", format!("setBurnPct({})", params.burn_pct), tx);

    info!(actions = ctx.owner_actions.len(), "wiring pass complete");
    Ok(())
}

/// Enroll the demo agent and validators in the identity registry.
pub async fn enroll_identities(
    suite: &ModuleSuite,
    agent: Address,
    validators: &[Address],
    execute: bool,
    ctx: &mut RunContext,
) -> Result<()> {
    let tx = if execute {
        Some(suite.identity.add_additional_agent(agent).await?)
    } else {
        None
    };
    ctx.owner_action("IdentityRegistry", format!("addAdditionalAgent({:#x})", agent), tx);

    for validator in validators {
        let tx = if execute {
            Some(suite.identity.add_additional_validator(*validator).await?)
        } else {
            None
        };
        ctx.owner_action(
            "IdentityRegistry",
            format!("addAdditionalValidator({:#x})", validator),
            tx,
        );
    }
    Ok(())
}
