//! Job lifecycle driver: create, apply, submit, burn receipt, confirmation.
//!
//! The employer burn confirmation is a hard prerequisite; validator
//! selection reverts until it lands.

use anyhow::{Context, Result};
use ethers::types::{H256, U256};
use ethers::utils::keccak256;
use tracing::info;

use agijobs_common::contracts::JobRegistryClient;
use agijobs_common::types::Job;

use crate::context::RunContext;

pub struct JobLifecycle {
    /// Registry bound to the employer signer.
    pub employer: JobRegistryClient,
    /// Registry bound to the agent signer.
    pub agent: JobRegistryClient,
}

impl JobLifecycle {
    /// Create a job and return its id, read from nextJobId before the tx.
    pub async fn create_job(
        &self,
        ctx: &mut RunContext,
        reward: U256,
        deadline: u64,
        spec_uri: &str,
    ) -> Result<(U256, H256)> {
        let job_id = self.employer.next_job_id().await?;
        let spec_hash = H256(keccak256(spec_uri.as_bytes()));

        let tx = self
            .employer
            .create_job(reward, deadline, spec_hash, spec_uri)
            .await
            .context("createJob")?;
        info!(job_id = %job_id, %reward, "job created");
        ctx.tx(format!("job {} created (reward {})", job_id, reward), tx);
        Ok((job_id, spec_hash))
    }

    pub async fn apply_for_job(&self, ctx: &mut RunContext, job_id: U256) -> Result<()> {
        let tx = self.agent.apply_for_job(job_id).await.context("applyForJob")?;
        info!(job_id = %job_id, "agent applied");
        ctx.tx(format!("agent applied to job {}", job_id), tx);
        Ok(())
    }

    pub async fn submit(
        &self,
        ctx: &mut RunContext,
        job_id: U256,
        result_uri: &str,
    ) -> Result<H256> {
        let result_hash = H256(keccak256(result_uri.as_bytes()));
        let tx = self
            .agent
            .submit(job_id, result_hash, result_uri)
            .await
            .context("submit")?;
        info!(job_id = %job_id, "deliverable submitted");
        ctx.tx(format!("deliverable submitted for job {}", job_id), tx);
        Ok(result_hash)
    }

    /// Record the off-chain burn receipt, then confirm it as the employer.
    pub async fn confirm_burn(
        &self,
        ctx: &mut RunContext,
        job_id: U256,
        burn_amount: U256,
    ) -> Result<H256> {
        // The receipt references an off-chain burn transaction; the demo
        // derives a stable stand-in hash from the job id.
        let mut id_bytes = [0u8; 32];
        job_id.to_big_endian(&mut id_bytes);
        let burn_tx_hash = H256(keccak256(
            [b"burn-receipt:".as_slice(), &id_bytes].concat(),
        ));

        let tx = self
            .employer
            .submit_burn_receipt(job_id, burn_tx_hash, burn_amount)
            .await
            .context("submitBurnReceipt")?;
        ctx.tx(format!("burn receipt submitted for job {}", job_id), tx);

        let tx = self
            .employer
            .confirm_employer_burn(job_id, burn_tx_hash)
            .await
            .context("confirmEmployerBurn")?;
        info!(job_id = %job_id, "employer burn confirmed");
        ctx.tx(format!("employer burn confirmed for job {}", job_id), tx);
        Ok(burn_tx_hash)
    }

    pub async fn job(&self, job_id: U256) -> Result<Job> {
        self.employer.job(job_id).await
    }
}
