use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// AGIALPHA token decimals.
pub const TOKEN_DECIMALS: u32 = 18;

/// Whole-token amount scaled to base units.
pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(TOKEN_DECIMALS as usize)
}

/// Job lifecycle state as packed in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Created,
    Applied,
    Submitted,
    Disputed,
    Finalized,
    Cancelled,
}

impl TryFrom<u8> for JobState {
    type Error = anyhow::Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => JobState::Created,
            1 => JobState::Applied,
            2 => JobState::Submitted,
            3 => JobState::Disputed,
            4 => JobState::Finalized,
            5 => JobState::Cancelled,
            other => anyhow::bail!("unknown job state: {}", other),
        })
    }
}

/// Staking role discriminant used by the stake manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeRole {
    Agent = 0,
    Validator = 1,
}

/// Client-side mirror of the registry's job record.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub employer: Address,
    pub agent: Address,
    pub reward: U256,
    pub state: JobState,
    pub success: bool,
    pub burn_confirmed: bool,
    pub spec_hash: H256,
    pub deadline: u64,
}

/// Client-side mirror of a validation round.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRound {
    pub validators: Vec<Address>,
    pub nonce: U256,
    pub commit_deadline: u64,
    pub reveal_deadline: u64,
    pub approvals: U256,
    pub rejections: U256,
}

/// The plaintext tuple behind one validator's commitment.
///
/// The salt exists only here between commit and reveal; losing it before the
/// reveal makes the commitment unanswerable.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub validator: Address,
    pub approve: bool,
    pub burn_tx_hash: H256,
    pub salt: H256,
    pub spec_hash: H256,
}

/// A raised dispute as the client tracks it.
#[derive(Debug, Clone, Serialize)]
pub struct DisputeCase {
    pub job_id: U256,
    pub raiser: Address,
    pub evidence_hash: H256,
}

/// Logical actor role in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Employer,
    Agent,
    Validator,
    Moderator,
}

/// Role-to-address record built at bootstrap.
#[derive(Debug, Clone, Serialize)]
pub struct ActorProfile {
    pub role: Role,
    pub label: String,
    pub address: Address,
}

/// Deployed module addresses, consumed from the config tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleAddressBook {
    pub token: Address,
    pub stake_manager: Address,
    pub validation_module: Address,
    pub job_registry: Address,
    pub dispute_module: Address,
    pub reputation_engine: Address,
    pub identity_registry: Address,
    pub certificate_nft: Address,
    pub fee_pool: Address,
}

impl ModuleAddressBook {
    fn entries(&self) -> [(&'static str, Address); 9] {
        [
            ("token", self.token),
            ("stake_manager", self.stake_manager),
            ("validation_module", self.validation_module),
            ("job_registry", self.job_registry),
            ("dispute_module", self.dispute_module),
            ("reputation_engine", self.reputation_engine),
            ("identity_registry", self.identity_registry),
            ("certificate_nft", self.certificate_nft),
            ("fee_pool", self.fee_pool),
        ]
    }

    /// Every module must have a non-zero address before any tx is sent.
    pub fn ensure_wired(&self) -> Result<(), ConfigError> {
        for (field, addr) in self.entries() {
            if addr == Address::zero() {
                return Err(ConfigError::InvalidAddress {
                    field,
                    value: format!("{:?}", addr),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_decodes_packed_values() {
        assert_eq!(JobState::try_from(0).unwrap(), JobState::Created);
        assert_eq!(JobState::try_from(4).unwrap(), JobState::Finalized);
        assert!(JobState::try_from(6).is_err());
    }

    #[test]
    fn tokens_scale_to_base_units() {
        assert_eq!(tokens(250), U256::from(250) * U256::exp10(18));
        assert_eq!(tokens(0), U256::zero());
    }

    #[test]
    fn address_book_rejects_zero_entries() {
        let mut book = ModuleAddressBook {
            token: Address::repeat_byte(1),
            stake_manager: Address::repeat_byte(2),
            validation_module: Address::repeat_byte(3),
            job_registry: Address::repeat_byte(4),
            dispute_module: Address::repeat_byte(5),
            reputation_engine: Address::repeat_byte(6),
            identity_registry: Address::repeat_byte(7),
            certificate_nft: Address::repeat_byte(8),
            fee_pool: Address::repeat_byte(9),
        };
        assert!(book.ensure_wired().is_ok());

        book.dispute_module = Address::zero();
        assert!(book.ensure_wired().is_err());
    }
}
