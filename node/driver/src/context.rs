//! Explicit run record threaded through every driver call.
//!
//! One `RunContext` is created per script run, mutated by each step, and
//! returned to the caller for reporting. Nothing here is process-global.

use chrono::{DateTime, Utc};
use ethers::types::H256;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEvent {
    pub seq: usize,
    pub label: String,
    pub tx_hash: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerAction {
    pub seq: usize,
    pub module: String,
    pub action: String,
    /// None when the run is a dry-run plan.
    pub tx_hash: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunContext {
    pub timeline: Vec<TimelineEvent>,
    pub owner_actions: Vec<OwnerAction>,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step with no associated transaction.
    pub fn note(&mut self, label: impl Into<String>) {
        self.push_event(label.into(), None);
    }

    /// Record a mined transaction.
    pub fn tx(&mut self, label: impl Into<String>, tx_hash: H256) {
        self.push_event(label.into(), Some(format!("{:#x}", tx_hash)));
    }

    fn push_event(&mut self, label: String, tx_hash: Option<String>) {
        self.timeline.push(TimelineEvent {
            seq: self.timeline.len(),
            label,
            tx_hash,
            at: Utc::now(),
        });
    }

    /// Record an owner-authorized configuration call; `tx_hash` is None for
    /// planned-but-not-executed actions.
    pub fn owner_action(
        &mut self,
        module: impl Into<String>,
        action: impl Into<String>,
        tx_hash: Option<H256>,
    ) {
        self.owner_actions.push(OwnerAction {
            seq: self.owner_actions.len(),
            module: module.into(),
            action: action.into(),
            tx_hash: tx_hash.map(|h| format!("{:#x}", h)),
            at: Utc::now(),
        });
    }

    pub fn scenario(&mut self, name: impl Into<String>, passed: bool, detail: impl Into<String>) {
        self.scenarios.push(ScenarioOutcome {
            name: name.into(),
            passed,
            detail: detail.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_keeps_insertion_order() {
        let mut ctx = RunContext::new();
        ctx.note("job created");
        ctx.tx("agent applied", H256::repeat_byte(1));
        ctx.note("burn confirmed");

        assert_eq!(ctx.timeline.len(), 3);
        assert_eq!(ctx.timeline[0].seq, 0);
        assert_eq!(ctx.timeline[2].seq, 2);
        assert!(ctx.timeline[0].tx_hash.is_none());
        assert_eq!(
            ctx.timeline[1].tx_hash.as_deref(),
            Some("0x0101010101010101010101010101010101010101010101010101010101010101")
        );
    }

    #[test]
    fn dry_run_owner_actions_have_no_tx() {
        let mut ctx = RunContext::new();
        ctx.owner_action("ValidationModule", "setRevealQuorum(2, 2)", None);
        ctx.owner_action("JobRegistry", "setFeePct(5)", Some(H256::repeat_byte(2)));

        assert!(ctx.owner_actions[0].tx_hash.is_none());
        assert!(ctx.owner_actions[1].tx_hash.is_some());
    }

    #[test]
    fn context_serializes_for_reports() {
        let mut ctx = RunContext::new();
        ctx.note("start");
        ctx.scenario("happy-path", true, "finalized with success=true");

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["timeline"][0]["label"], "start");
        assert_eq!(json["scenarios"][0]["passed"], true);
    }
}
