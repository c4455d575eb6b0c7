//! Snapshot rendering: plain text for terminals, markdown for runbooks,
//! JSON for machines.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::Result;

use crate::snapshot::ChainSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("unknown format `{}` (expected human|markdown|json)", other),
        }
    }
}

pub fn render(snapshot: &ChainSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => render_human(snapshot),
        OutputFormat::Markdown => render_markdown(snapshot),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(snapshot)?),
    }
}

fn render_human(s: &ChainSnapshot) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "AGI Jobs mission control: {} (chain {})", s.network, s.chain_id)?;
    writeln!(out, "generated {}", s.generated_at.to_rfc3339())?;
    writeln!(out)?;

    writeln!(out, "Modules")?;
    writeln!(out, "  token               {:#x}", s.modules.token)?;
    writeln!(out, "  stake manager       {:#x}", s.modules.stake_manager)?;
    writeln!(out, "  validation module   {:#x}", s.modules.validation_module)?;
    writeln!(out, "  job registry        {:#x}", s.modules.job_registry)?;
    writeln!(out, "  dispute module      {:#x}", s.modules.dispute_module)?;
    writeln!(out, "  reputation engine   {:#x}", s.modules.reputation_engine)?;
    writeln!(out, "  identity registry   {:#x}", s.modules.identity_registry)?;
    writeln!(out, "  certificate NFT     {:#x}", s.modules.certificate_nft)?;
    writeln!(out, "  fee pool            {:#x}", s.modules.fee_pool)?;
    writeln!(out)?;

    writeln!(
        out,
        "Parameters: fee {}%, validator reward {}%, {} validators/job, quorum {}/{} reveals, non-reveal penalty {}%",
        s.params.fee_pct,
        s.params.validator_reward_pct,
        s.params.validators_per_job,
        s.params.min_approvals,
        s.params.min_reveals,
        s.params.non_reveal_penalty_pct,
    )?;
    writeln!(out)?;

    writeln!(out, "Actors")?;
    for actor in &s.actors {
        writeln!(
            out,
            "  {:<14} {:#x}  balance {:<28} stake {:<28} rep {}",
            actor.label, actor.address, actor.token_balance, actor.stake, actor.reputation
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Jobs")?;
    for job in &s.jobs {
        writeln!(
            out,
            "  #{:<4} {:?} success={} burn_confirmed={} reward={}",
            job.job_id, job.state, job.success, job.burn_confirmed, job.reward
        )?;
    }
    Ok(out)
}

fn render_markdown(s: &ChainSnapshot) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# AGI Jobs owner control surface\n")?;
    writeln!(out, "- **Network**: {} (chain id {})", s.network, s.chain_id)?;
    writeln!(out, "- **Generated**: {}\n", s.generated_at.to_rfc3339())?;

    writeln!(out, "## Modules\n")?;
    writeln!(out, "| Module | Address |")?;
    writeln!(out, "| --- | --- |")?;
    writeln!(out, "| Token | `{:#x}` |", s.modules.token)?;
    writeln!(out, "| Stake manager | `{:#x}` |", s.modules.stake_manager)?;
    writeln!(out, "| Validation module | `{:#x}` |", s.modules.validation_module)?;
    writeln!(out, "| Job registry | `{:#x}` |", s.modules.job_registry)?;
    writeln!(out, "| Dispute module | `{:#x}` |", s.modules.dispute_module)?;
    writeln!(out, "| Reputation engine | `{:#x}` |", s.modules.reputation_engine)?;
    writeln!(out, "| Identity registry | `{:#x}` |", s.modules.identity_registry)?;
    writeln!(out, "| Certificate NFT | `{:#x}` |", s.modules.certificate_nft)?;
    writeln!(out, "| Fee pool | `{:#x}` |", s.modules.fee_pool)?;
    writeln!(out)?;

    writeln!(out, "## Parameters\n")?;
    writeln!(out, "| Parameter | Value |")?;
    writeln!(out, "| --- | --- |")?;
    writeln!(out, "| Protocol fee | {}% |", s.params.fee_pct)?;
    writeln!(out, "| Validator reward | {}% |", s.params.validator_reward_pct)?;
    writeln!(out, "| Validators per job | {} |", s.params.validators_per_job)?;
    writeln!(out, "| Commit window | {}s |", s.params.commit_window_secs)?;
    writeln!(out, "| Reveal window | {}s |", s.params.reveal_window_secs)?;
    writeln!(out, "| Reveal quorum | {} reveals, {} approvals |", s.params.min_reveals, s.params.min_approvals)?;
    writeln!(out, "| Non-reveal penalty | {}% |", s.params.non_reveal_penalty_pct)?;
    writeln!(out, "| Burn share | {}% |", s.params.burn_pct)?;
    writeln!(out)?;

    writeln!(out, "## Actors\n")?;
    writeln!(out, "| Role | Label | Address | Balance | Stake | Reputation | Certificates |")?;
    writeln!(out, "| --- | --- | --- | --- | --- | --- | --- |")?;
    for actor in &s.actors {
        writeln!(
            out,
            "| {:?} | {} | `{:#x}` | {} | {} | {} | {} |",
            actor.role,
            actor.label,
            actor.address,
            actor.token_balance,
            actor.stake,
            actor.reputation,
            actor.certificates,
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Jobs\n")?;
    writeln!(out, "| Job | State | Success | Burn confirmed | Reward |")?;
    writeln!(out, "| --- | --- | --- | --- | --- |")?;
    for job in &s.jobs {
        writeln!(
            out,
            "| #{} | {:?} | {} | {} | {} |",
            job.job_id, job.state, job.success, job.burn_confirmed, job.reward
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Job lifecycle\n")?;
    writeln!(out, "```mermaid")?;
    writeln!(out, "stateDiagram-v2")?;
    writeln!(out, "    [*] --> Created")?;
    writeln!(out, "    Created --> Applied: applyForJob")?;
    writeln!(out, "    Applied --> Submitted: submit")?;
    writeln!(out, "    Submitted --> Finalized: commit/reveal quorum")?;
    writeln!(out, "    Submitted --> Disputed: raiseDispute")?;
    writeln!(out, "    Disputed --> Finalized: resolveWithSignatures")?;
    writeln!(out, "    Created --> Cancelled")?;
    writeln!(out, "```")?;

    if let Some(run) = &s.run {
        writeln!(out, "\n## Run record\n")?;
        writeln!(out, "```json")?;
        writeln!(out, "{}", serde_json::to_string_pretty(run)?)?;
        writeln!(out, "```")?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agijobs_common::config::ProtocolParams;
    use agijobs_common::types::{JobState, ModuleAddressBook, Role};
    use crate::snapshot::{ActorRow, ChainSnapshot, JobRow};
    use chrono::Utc;
    use ethers::types::Address;

    fn snapshot() -> ChainSnapshot {
        ChainSnapshot {
            network: "local".into(),
            chain_id: 31337,
            generated_at: Utc::now(),
            modules: ModuleAddressBook {
                token: Address::repeat_byte(0x11),
                stake_manager: Address::repeat_byte(0x12),
                validation_module: Address::repeat_byte(0x13),
                job_registry: Address::repeat_byte(0x14),
                dispute_module: Address::repeat_byte(0x15),
                reputation_engine: Address::repeat_byte(0x16),
                identity_registry: Address::repeat_byte(0x17),
                certificate_nft: Address::repeat_byte(0x18),
                fee_pool: Address::repeat_byte(0x19),
            },
            params: ProtocolParams {
                fee_pct: 5,
                validator_reward_pct: 10,
                validators_per_job: 3,
                commit_window_secs: 3600,
                reveal_window_secs: 3600,
                min_reveals: 2,
                min_approvals: 2,
                non_reveal_penalty_pct: 10,
                min_stake_tokens: 100,
                dispute_fee_tokens: 0,
                dispute_window_secs: 0,
                burn_pct: 1,
            },
            actors: vec![ActorRow {
                role: Role::Agent,
                label: "agent".into(),
                address: Address::repeat_byte(0x22),
                token_balance: "250000000000000000000".into(),
                stake: "100000000000000000000".into(),
                reputation: "1".into(),
                certificates: "1".into(),
            }],
            jobs: vec![JobRow {
                job_id: "1".into(),
                employer: Address::repeat_byte(0x33),
                agent: Address::repeat_byte(0x22),
                reward: "250000000000000000000".into(),
                state: JobState::Finalized,
                success: true,
                burn_confirmed: true,
            }],
            run: None,
        }
    }

    #[test]
    fn format_flag_parses() {
        assert_eq!(OutputFormat::from_str("human").unwrap(), OutputFormat::Human);
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("html").is_err());
    }

    #[test]
    fn markdown_report_lists_modules_and_jobs() -> Result<()> {
        let out = render(&snapshot(), OutputFormat::Markdown)?;
        assert!(out.contains("## Modules"));
        assert!(out.contains("0x1414141414141414141414141414141414141414"));
        assert!(out.contains("| #1 | Finalized | true | true |"));
        assert!(out.contains("stateDiagram-v2"));
        Ok(())
    }

    #[test]
    fn json_report_round_trips() -> Result<()> {
        let out = render(&snapshot(), OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&out)?;
        assert_eq!(value["chain_id"], 31337);
        assert_eq!(value["jobs"][0]["state"], "Finalized");
        Ok(())
    }

    #[test]
    fn human_report_mentions_quorum() -> Result<()> {
        let out = render(&snapshot(), OutputFormat::Human)?;
        assert!(out.contains("quorum 2/2 reveals"));
        assert!(out.contains("mission control: local (chain 31337)"));
        Ok(())
    }

    #[test]
    fn human_report_is_plain_ascii() -> Result<()> {
        let out = render(&snapshot(), OutputFormat::Human)?;
        assert!(out.is_ascii(), "terminal report must stay plain ASCII");
        Ok(())
    }
}
