//! Dispute driver: escalate a contested job and settle it with moderator
//! signatures.

use anyhow::{Context, Result};
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Bytes, H256, U256},
};
use tracing::info;

use agijobs_common::contracts::DisputeClient;
use agijobs_common::crypto::{resolution_struct_hash, sign_resolution};
use agijobs_common::types::DisputeCase;

use crate::context::RunContext;

pub struct DisputeDriver {
    /// Dispute module bound to the disputing party's signer.
    pub raiser: DisputeClient,
    /// Dispute module bound to any signer, for resolution submission.
    pub submitter: DisputeClient,
    pub chain_id: u64,
}

impl DisputeDriver {
    pub async fn raise(
        &self,
        ctx: &mut RunContext,
        job_id: U256,
        raiser: ethers::types::Address,
        evidence_hash: H256,
    ) -> Result<DisputeCase> {
        let tx = self
            .raiser
            .raise_dispute(job_id, evidence_hash)
            .await
            .context("raiseDispute")?;
        info!(job_id = %job_id, "dispute raised");
        ctx.tx(format!("dispute raised for job {}", job_id), tx);
        Ok(DisputeCase {
            job_id,
            raiser,
            evidence_hash,
        })
    }

    /// Collect moderator signatures over the resolution struct hash and
    /// submit them.
    ///
    /// The hash binds the dispute module address and live chain id; wallets
    /// are sorted ascending by address because the contract checks signers
    /// in order. A mismatch in any bound field invalidates every signature
    /// with no explicit error, so both values come from the connected
    /// environment rather than configuration.
    pub async fn resolve_with_signatures(
        &self,
        ctx: &mut RunContext,
        job_id: U256,
        employer_wins: bool,
        moderators: &[LocalWallet],
    ) -> Result<H256> {
        let struct_hash = resolution_struct_hash(
            job_id,
            employer_wins,
            self.submitter.address(),
            U256::from(self.chain_id),
        );

        let mut signers: Vec<&LocalWallet> = moderators.iter().collect();
        signers.sort_by_key(|wallet| wallet.address());

        let mut signatures: Vec<Bytes> = Vec::with_capacity(signers.len());
        for wallet in signers {
            signatures.push(sign_resolution(wallet, struct_hash).await?);
        }
        ctx.note(format!(
            "collected {} moderator signatures for job {}",
            signatures.len(),
            job_id
        ));

        let tx = self
            .submitter
            .resolve_with_signatures(job_id, employer_wins, signatures)
            .await
            .context("resolveWithSignatures")?;
        info!(job_id = %job_id, employer_wins, "dispute resolved");
        ctx.tx(
            format!(
                "dispute resolved for job {} (employer_wins={})",
                job_id, employer_wins
            ),
            tx,
        );
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    #[test]
    fn moderators_sign_in_ascending_address_order() {
        let a: LocalWallet =
            "0000000000000000000000000000000000000000000000000000000000000002"
                .parse()
                .unwrap();
        let b: LocalWallet =
            "0000000000000000000000000000000000000000000000000000000000000003"
                .parse()
                .unwrap();

        let mut wallets: Vec<&LocalWallet> = vec![&a, &b];
        wallets.sort_by_key(|w| w.address());
        let sorted: Vec<Address> = wallets.iter().map(|w| w.address()).collect();

        let mut expected = vec![a.address(), b.address()];
        expected.sort();
        assert_eq!(sorted, expected);
    }
}
