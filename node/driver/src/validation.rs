//! Validator commit–reveal round driver.
//!
//! The authoritative state machine lives in the validation module contract;
//! this driver sequences the client side: selection, per-validator commits,
//! the commit-window wait, per-validator reveals, the reveal-window wait,
//! and finalization. The single locally-recovered failure is a repeated
//! selectValidators on an already-populated round.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use ethers::types::{Address, H256, U256};
use tracing::{info, warn};

use agijobs_common::contracts::ValidationClient;
use agijobs_common::crypto::{commit_hash, random_salt};
use agijobs_common::error::{classify_chain_err, KnownRevert, TxDisposition};
use agijobs_common::retry::{retry_with_backoff, RetryConfig};
use agijobs_common::types::{CommitRecord, ValidationRound};

use crate::clock::ChainClock;
use crate::context::RunContext;

pub struct RoundDriver {
    /// Validation module bound to any signer, used for selection, round
    /// reads, and finalize (callable by anyone).
    pub validation: ValidationClient,
    /// Validation module bound to each committee member's signer.
    pub committee: Vec<(Address, ValidationClient)>,
}

/// Summary of a driven round.
#[derive(Debug)]
pub struct RoundOutcome {
    pub round: ValidationRound,
    pub committed: usize,
    pub revealed: usize,
    pub finalize_tx: H256,
}

/// True when enough validators revealed for the round to settle.
pub fn meets_reveal_quorum(revealed: usize, committee_size: usize, min_reveals: usize) -> bool {
    revealed >= min_reveals && revealed <= committee_size
}

/// Build the per-validator commit plans for a round. Salts are fresh per
/// validator and retained until the reveal.
pub fn build_commit_plans(
    job_id: U256,
    nonce: U256,
    validators: &[Address],
    approvals: &[bool],
    burn_tx_hash: H256,
    spec_hash: H256,
) -> Result<Vec<(CommitRecord, H256)>> {
    if approvals.len() != validators.len() {
        bail!(
            "approval votes ({}) do not match committee size ({})",
            approvals.len(),
            validators.len()
        );
    }

    Ok(validators
        .iter()
        .zip(approvals)
        .map(|(&validator, &approve)| {
            let salt = random_salt();
            let hash = commit_hash(job_id, nonce, approve, burn_tx_hash, salt, spec_hash);
            (
                CommitRecord {
                    validator,
                    approve,
                    burn_tx_hash,
                    salt,
                    spec_hash,
                },
                hash,
            )
        })
        .collect())
}

impl RoundDriver {
    /// Trigger validator selection and return the populated round.
    ///
    /// A ValidatorsAlreadySelected revert is non-fatal: the existing round
    /// is fetched and returned unchanged. Selection is randomness-dependent
    /// and may settle a block late, so the round is polled with backoff
    /// until the validator list is non-empty.
    pub async fn select_validators(
        &self,
        job_id: U256,
        entropy: U256,
        ctx: &mut RunContext,
    ) -> Result<ValidationRound> {
        match self.validation.select_validators(job_id, entropy).await {
            Ok(tx) => {
                info!(job_id = %job_id, "validator selection requested");
                ctx.tx(format!("validator selection requested for job {}", job_id), tx);
            }
            Err(err) => match classify_chain_err(&err) {
                TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected) => {
                    info!(job_id = %job_id, "validators already selected, reusing round");
                    ctx.note(format!(
                        "validators already selected for job {}, reusing round",
                        job_id
                    ));
                }
                TxDisposition::Fatal => {
                    return Err(err).context("selectValidators reverted");
                }
            },
        }

        let validation = &self.validation;
        let round = retry_with_backoff(
            || async {
                let round = validation.round(job_id).await?;
                if round.validators.is_empty() {
                    bail!("validator set not settled yet");
                }
                Ok(round)
            },
            &RetryConfig::default(),
        )
        .await
        .context("validator set never settled")?;

        info!(
            job_id = %job_id,
            validators = round.validators.len(),
            commit_deadline = round.commit_deadline,
            "round populated"
        );
        Ok(round)
    }

    fn client_for(&self, validator: Address) -> Result<&ValidationClient> {
        self.committee
            .iter()
            .find(|(addr, _)| *addr == validator)
            .map(|(_, client)| client)
            .with_context(|| format!("no signer for selected validator {:#x}", validator))
    }

    /// Submit each validator's commitment in order, one transaction at a
    /// time. Returns the retained plans needed for the reveals.
    pub async fn commit_all(
        &self,
        job_id: U256,
        round: &ValidationRound,
        approvals: &[bool],
        burn_tx_hash: H256,
        spec_hash: H256,
        ctx: &mut RunContext,
    ) -> Result<Vec<CommitRecord>> {
        let plans = build_commit_plans(
            job_id,
            round.nonce,
            &round.validators,
            approvals,
            burn_tx_hash,
            spec_hash,
        )?;

        let mut records = Vec::with_capacity(plans.len());
        for (record, hash) in plans {
            let client = self.client_for(record.validator)?;
            let tx = client
                .commit_validation(job_id, hash)
                .await
                .with_context(|| format!("commit from {:#x}", record.validator))?;
            ctx.tx(
                format!("validator {:#x} committed on job {}", record.validator, job_id),
                tx,
            );
            records.push(record);
        }
        info!(job_id = %job_id, commits = records.len(), "all commitments in");
        Ok(records)
    }

    /// Reveal every retained plan except the validators in `withhold`.
    /// Withheld validators forfeit their reward and take the non-reveal
    /// penalty at finalize; they are excluded from the tally.
    pub async fn reveal_all(
        &self,
        job_id: U256,
        plans: &[CommitRecord],
        withhold: &HashSet<Address>,
        ctx: &mut RunContext,
    ) -> Result<usize> {
        let mut revealed = 0;
        for plan in plans {
            if withhold.contains(&plan.validator) {
                warn!(validator = ?plan.validator, "withholding reveal");
                ctx.note(format!(
                    "validator {:#x} withheld reveal on job {}",
                    plan.validator, job_id
                ));
                continue;
            }

            let client = self.client_for(plan.validator)?;
            let tx = client
                .reveal_validation(job_id, plan.approve, plan.burn_tx_hash, plan.salt)
                .await
                .with_context(|| format!("reveal from {:#x}", plan.validator))?;
            ctx.tx(
                format!(
                    "validator {:#x} revealed {} on job {}",
                    plan.validator,
                    if plan.approve { "approve" } else { "reject" },
                    job_id
                ),
                tx,
            );
            revealed += 1;
        }
        info!(job_id = %job_id, revealed, withheld = withhold.len(), "reveal phase done");
        Ok(revealed)
    }

    pub async fn finalize(&self, job_id: U256, ctx: &mut RunContext) -> Result<H256> {
        let tx = self.validation.finalize(job_id).await.context("finalize")?;
        info!(job_id = %job_id, "round finalized");
        ctx.tx(format!("round finalized for job {}", job_id), tx);
        Ok(tx)
    }

    /// Drive one full round: select, commit, wait, reveal, wait, finalize.
    pub async fn run(
        &self,
        job_id: U256,
        entropy: U256,
        approvals: &[bool],
        burn_tx_hash: H256,
        spec_hash: H256,
        withhold: &HashSet<Address>,
        min_reveals: usize,
        clock: &ChainClock,
        ctx: &mut RunContext,
    ) -> Result<RoundOutcome> {
        let round = self.select_validators(job_id, entropy, ctx).await?;

        let plans = self
            .commit_all(job_id, &round, approvals, burn_tx_hash, spec_hash, ctx)
            .await?;

        clock.advance_past(round.commit_deadline).await?;
        ctx.note(format!("commit window elapsed for job {}", job_id));

        let revealed = self.reveal_all(job_id, &plans, withhold, ctx).await?;
        if !meets_reveal_quorum(revealed, round.validators.len(), min_reveals) {
            bail!(
                "only {} of {} validators revealed, below the {} minimum",
                revealed,
                round.validators.len(),
                min_reveals
            );
        }

        clock.advance_past(round.reveal_deadline).await?;
        ctx.note(format!("reveal window elapsed for job {}", job_id));

        let finalize_tx = self.finalize(job_id, ctx).await?;

        Ok(RoundOutcome {
            committed: plans.len(),
            revealed,
            finalize_tx,
            round,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agijobs_common::crypto::commit_hash;

    #[test]
    fn quorum_accepts_partial_reveals() {
        // 2-of-3 still settles
        assert!(meets_reveal_quorum(2, 3, 2));
        assert!(meets_reveal_quorum(3, 3, 2));
        assert!(!meets_reveal_quorum(1, 3, 2));
    }

    #[test]
    fn commit_plans_carry_unique_salts() -> Result<()> {
        let validators = [
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        ];
        let plans = build_commit_plans(
            U256::from(1),
            U256::from(9),
            &validators,
            &[true, true, false],
            H256::repeat_byte(0xaa),
            H256::repeat_byte(0xbb),
        )?;

        assert_eq!(plans.len(), 3);
        assert_ne!(plans[0].0.salt, plans[1].0.salt);
        assert_ne!(plans[1].0.salt, plans[2].0.salt);
        assert!(plans[0].0.approve);
        assert!(!plans[2].0.approve);
        Ok(())
    }

    #[test]
    fn reveal_tuple_matches_committed_hash() -> Result<()> {
        // Round-trip property: re-hashing the retained plan reproduces the
        // submitted commitment exactly.
        let job_id = U256::from(42);
        let nonce = U256::from(2);
        let plans = build_commit_plans(
            job_id,
            nonce,
            &[Address::repeat_byte(7)],
            &[true],
            H256::repeat_byte(0xcc),
            H256::repeat_byte(0xdd),
        )?;

        let (record, submitted) = &plans[0];
        let recomputed = commit_hash(
            job_id,
            nonce,
            record.approve,
            record.burn_tx_hash,
            record.salt,
            record.spec_hash,
        );
        assert_eq!(recomputed, *submitted);
        Ok(())
    }

    #[test]
    fn mismatched_vote_count_is_rejected() {
        let result = build_commit_plans(
            U256::one(),
            U256::one(),
            &[Address::repeat_byte(1), Address::repeat_byte(2)],
            &[true],
            H256::zero(),
            H256::zero(),
        );
        assert!(result.is_err());
    }
}
