use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::LocalWallet,
    types::{Address, H256, U256},
};

use crate::types::{Job, JobState, ModuleAddressBook, ValidationRound};

// Generate contract bindings
abigen!(
    AgiToken,
    r#"[
        function mint(address to, uint256 amount) external
        function approve(address spender, uint256 amount) external returns (bool)
        function transfer(address to, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

abigen!(
    StakeManager,
    r#"[
        function depositStake(uint8 role, uint256 amount) external
        function setMinStake(uint256 amount) external
        function setJobRegistry(address registry) external
        function stakeOf(address account, uint8 role) external view returns (uint256)
    ]"#
);

abigen!(
    JobRegistry,
    r#"[
        function createJob(uint256 reward, uint64 deadline, bytes32 specHash, string uri) external
        function applyForJob(uint256 jobId, string subdomain, bytes32[] proof) external
        function submit(uint256 jobId, bytes32 resultHash, string resultUri, string subdomain, bytes32[] proof) external
        function submitBurnReceipt(uint256 jobId, bytes32 burnTxHash, uint256 amount, uint256 blockNumber) external
        function confirmEmployerBurn(uint256 jobId, bytes32 burnTxHash) external
        function setModules(address validation, address stakeManager, address reputation, address dispute, address certificate, address feePool) external
        function setFeePct(uint256 pct) external
        function setValidatorRewardPct(uint256 pct) external
        function nextJobId() external view returns (uint256)
        function jobs(uint256 jobId) external view returns (address employer, address agent, uint256 reward, uint8 state, bool success, bool burnConfirmed, bytes32 specHash, uint64 deadline)
    ]"#
);

abigen!(
    ValidationModule,
    r#"[
        function selectValidators(uint256 jobId, uint256 entropy) external
        function commitValidation(uint256 jobId, bytes32 commitHash, string subdomain, bytes32[] proof) external
        function revealValidation(uint256 jobId, bool approve, bytes32 burnTxHash, bytes32 salt, string subdomain, bytes32[] proof) external
        function finalize(uint256 jobId) external
        function rounds(uint256 jobId) external view returns (address[] validators, uint256 nonce, uint64 commitDeadline, uint64 revealDeadline, uint256 approvals, uint256 rejections)
        function setJobRegistry(address registry) external
        function setCommitRevealWindows(uint64 commitWindow, uint64 revealWindow) external
        function setValidatorsPerJob(uint256 count) external
        function setValidatorPool(address[] pool) external
        function setRevealQuorum(uint256 minReveals, uint256 minApprovals) external
        function setNonRevealPenalty(uint256 pct) external
        error ValidatorsAlreadySelected()
    ]"#
);

abigen!(
    DisputeModule,
    r#"[
        function raiseDispute(uint256 jobId, bytes32 evidenceHash) external
        function resolveWithSignatures(uint256 jobId, bool employerWins, bytes[] signatures) external
        function setJobRegistry(address registry) external
        function setDisputeFee(uint256 fee) external
        function setDisputeWindow(uint64 window) external
        function setModerator(address moderator, bool enabled) external
    ]"#
);

abigen!(
    ReputationEngine,
    r#"[
        function reputationOf(address account) external view returns (uint256)
        function setCaller(address caller, bool allowed) external
    ]"#
);

abigen!(
    IdentityRegistry,
    r#"[
        function addAdditionalAgent(address agent) external
        function addAdditionalValidator(address validator) external
    ]"#
);

abigen!(
    CertificateNft,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
        function setJobRegistry(address registry) external
    ]"#
);

abigen!(
    FeePool,
    r#"[
        function setBurnPct(uint256 pct) external
        function pendingFees() external view returns (uint256)
    ]"#
);

pub type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

async fn send_tx<D>(
    call: ethers::contract::ContractCall<Client, D>,
    label: &'static str,
) -> Result<H256>
where
    D: ethers::abi::Detokenize,
{
    let pending = call.send().await.map_err(anyhow::Error::new)?;
    let receipt = pending
        .await
        .map_err(anyhow::Error::new)?
        .with_context(|| format!("{label}: transaction dropped from mempool"))?;
    Ok(receipt.transaction_hash)
}

/// AGIALPHA token client
#[derive(Clone)]
pub struct TokenClient {
    contract: AgiToken<Client>,
}

impl TokenClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: AgiToken::new(addr, client),
        }
    }

    pub async fn mint(&self, to: Address, amount: U256) -> Result<H256> {
        send_tx(self.contract.mint(to, amount), "mint").await
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<H256> {
        send_tx(self.contract.approve(spender, amount), "approve").await
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<H256> {
        send_tx(self.contract.transfer(to, amount), "transfer").await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        Ok(self.contract.balance_of(account).call().await?)
    }
}

/// Stake manager client
#[derive(Clone)]
pub struct StakeManagerClient {
    contract: StakeManager<Client>,
}

impl StakeManagerClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: StakeManager::new(addr, client),
        }
    }

    pub async fn deposit_stake(&self, role: u8, amount: U256) -> Result<H256> {
        send_tx(self.contract.deposit_stake(role, amount), "depositStake").await
    }

    pub async fn set_min_stake(&self, amount: U256) -> Result<H256> {
        send_tx(self.contract.set_min_stake(amount), "setMinStake").await
    }

    pub async fn set_job_registry(&self, registry: Address) -> Result<H256> {
        send_tx(self.contract.set_job_registry(registry), "setJobRegistry").await
    }

    pub async fn stake_of(&self, account: Address, role: u8) -> Result<U256> {
        Ok(self.contract.stake_of(account, role).call().await?)
    }
}

/// Job registry client
#[derive(Clone)]
pub struct JobRegistryClient {
    contract: JobRegistry<Client>,
}

impl JobRegistryClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: JobRegistry::new(addr, client),
        }
    }

    pub async fn create_job(
        &self,
        reward: U256,
        deadline: u64,
        spec_hash: H256,
        uri: &str,
    ) -> Result<H256> {
        send_tx(
            self.contract
                .create_job(reward, deadline, spec_hash.into(), uri.to_owned()),
            "createJob",
        )
        .await
    }

    pub async fn apply_for_job(&self, job_id: U256) -> Result<H256> {
        send_tx(
            self.contract.apply_for_job(job_id, String::new(), vec![]),
            "applyForJob",
        )
        .await
    }

    pub async fn submit(&self, job_id: U256, result_hash: H256, result_uri: &str) -> Result<H256> {
        send_tx(
            self.contract.submit(
                job_id,
                result_hash.into(),
                result_uri.to_owned(),
                String::new(),
                vec![],
            ),
            "submit",
        )
        .await
    }

    pub async fn submit_burn_receipt(
        &self,
        job_id: U256,
        burn_tx_hash: H256,
        amount: U256,
    ) -> Result<H256> {
        send_tx(
            self.contract
                .submit_burn_receipt(job_id, burn_tx_hash.into(), amount, U256::zero()),
            "submitBurnReceipt",
        )
        .await
    }

    pub async fn confirm_employer_burn(&self, job_id: U256, burn_tx_hash: H256) -> Result<H256> {
        send_tx(
            self.contract.confirm_employer_burn(job_id, burn_tx_hash.into()),
            "confirmEmployerBurn",
        )
        .await
    }

    pub async fn set_modules(&self, book: &ModuleAddressBook) -> Result<H256> {
        send_tx(
            self.contract.set_modules(
                book.validation_module,
                book.stake_manager,
                book.reputation_engine,
                book.dispute_module,
                book.certificate_nft,
                book.fee_pool,
            ),
            "setModules",
        )
        .await
    }

    pub async fn set_fee_pct(&self, pct: U256) -> Result<H256> {
        send_tx(self.contract.set_fee_pct(pct), "setFeePct").await
    }

    pub async fn set_validator_reward_pct(&self, pct: U256) -> Result<H256> {
        send_tx(
            self.contract.set_validator_reward_pct(pct),
            "setValidatorRewardPct",
        )
        .await
    }

    pub async fn next_job_id(&self) -> Result<U256> {
        Ok(self.contract.next_job_id().call().await?)
    }

    pub async fn job(&self, job_id: U256) -> Result<Job> {
        let (employer, agent, reward, state, success, burn_confirmed, spec_hash, deadline) =
            self.contract.jobs(job_id).call().await?;
        Ok(Job {
            employer,
            agent,
            reward,
            state: JobState::try_from(state)?,
            success,
            burn_confirmed,
            spec_hash: H256::from(spec_hash),
            deadline,
        })
    }
}

/// Validation module client
#[derive(Clone)]
pub struct ValidationClient {
    contract: ValidationModule<Client>,
}

impl ValidationClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: ValidationModule::new(addr, client),
        }
    }

    pub async fn select_validators(&self, job_id: U256, entropy: U256) -> Result<H256> {
        send_tx(
            self.contract.select_validators(job_id, entropy),
            "selectValidators",
        )
        .await
    }

    pub async fn commit_validation(&self, job_id: U256, commit_hash: H256) -> Result<H256> {
        send_tx(
            self.contract
                .commit_validation(job_id, commit_hash.into(), String::new(), vec![]),
            "commitValidation",
        )
        .await
    }

    pub async fn reveal_validation(
        &self,
        job_id: U256,
        approve: bool,
        burn_tx_hash: H256,
        salt: H256,
    ) -> Result<H256> {
        send_tx(
            self.contract.reveal_validation(
                job_id,
                approve,
                burn_tx_hash.into(),
                salt.into(),
                String::new(),
                vec![],
            ),
            "revealValidation",
        )
        .await
    }

    pub async fn finalize(&self, job_id: U256) -> Result<H256> {
        send_tx(self.contract.finalize(job_id), "finalize").await
    }

    pub async fn round(&self, job_id: U256) -> Result<ValidationRound> {
        let (validators, nonce, commit_deadline, reveal_deadline, approvals, rejections) =
            self.contract.rounds(job_id).call().await?;
        Ok(ValidationRound {
            validators,
            nonce,
            commit_deadline,
            reveal_deadline,
            approvals,
            rejections,
        })
    }

    pub async fn set_job_registry(&self, registry: Address) -> Result<H256> {
        send_tx(self.contract.set_job_registry(registry), "setJobRegistry").await
    }

    pub async fn set_commit_reveal_windows(&self, commit: u64, reveal: u64) -> Result<H256> {
        send_tx(
            self.contract.set_commit_reveal_windows(commit, reveal),
            "setCommitRevealWindows",
        )
        .await
    }

    pub async fn set_validators_per_job(&self, count: U256) -> Result<H256> {
        send_tx(
            self.contract.set_validators_per_job(count),
            "setValidatorsPerJob",
        )
        .await
    }

    pub async fn set_validator_pool(&self, pool: Vec<Address>) -> Result<H256> {
        send_tx(self.contract.set_validator_pool(pool), "setValidatorPool").await
    }

    pub async fn set_reveal_quorum(&self, min_reveals: U256, min_approvals: U256) -> Result<H256> {
        send_tx(
            self.contract.set_reveal_quorum(min_reveals, min_approvals),
            "setRevealQuorum",
        )
        .await
    }

    pub async fn set_non_reveal_penalty(&self, pct: U256) -> Result<H256> {
        send_tx(
            self.contract.set_non_reveal_penalty(pct),
            "setNonRevealPenalty",
        )
        .await
    }
}

/// Dispute module client
#[derive(Clone)]
pub struct DisputeClient {
    contract: DisputeModule<Client>,
}

impl DisputeClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: DisputeModule::new(addr, client),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub async fn raise_dispute(&self, job_id: U256, evidence_hash: H256) -> Result<H256> {
        send_tx(
            self.contract.raise_dispute(job_id, evidence_hash.into()),
            "raiseDispute",
        )
        .await
    }

    pub async fn resolve_with_signatures(
        &self,
        job_id: U256,
        employer_wins: bool,
        signatures: Vec<ethers::types::Bytes>,
    ) -> Result<H256> {
        send_tx(
            self.contract
                .resolve_with_signatures(job_id, employer_wins, signatures),
            "resolveWithSignatures",
        )
        .await
    }

    pub async fn set_job_registry(&self, registry: Address) -> Result<H256> {
        send_tx(self.contract.set_job_registry(registry), "setJobRegistry").await
    }

    pub async fn set_dispute_fee(&self, fee: U256) -> Result<H256> {
        send_tx(self.contract.set_dispute_fee(fee), "setDisputeFee").await
    }

    pub async fn set_dispute_window(&self, window: u64) -> Result<H256> {
        send_tx(self.contract.set_dispute_window(window), "setDisputeWindow").await
    }

    pub async fn set_moderator(&self, moderator: Address, enabled: bool) -> Result<H256> {
        send_tx(
            self.contract.set_moderator(moderator, enabled),
            "setModerator",
        )
        .await
    }
}

/// Reputation engine client
#[derive(Clone)]
pub struct ReputationClient {
    contract: ReputationEngine<Client>,
}

impl ReputationClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: ReputationEngine::new(addr, client),
        }
    }

    pub async fn reputation_of(&self, account: Address) -> Result<U256> {
        Ok(self.contract.reputation_of(account).call().await?)
    }

    pub async fn set_caller(&self, caller: Address, allowed: bool) -> Result<H256> {
        send_tx(self.contract.set_caller(caller, allowed), "setCaller").await
    }
}

/// Identity registry client
#[derive(Clone)]
pub struct IdentityClient {
    contract: IdentityRegistry<Client>,
}

impl IdentityClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: IdentityRegistry::new(addr, client),
        }
    }

    pub async fn add_additional_agent(&self, agent: Address) -> Result<H256> {
        send_tx(
            self.contract.add_additional_agent(agent),
            "addAdditionalAgent",
        )
        .await
    }

    pub async fn add_additional_validator(&self, validator: Address) -> Result<H256> {
        send_tx(
            self.contract.add_additional_validator(validator),
            "addAdditionalValidator",
        )
        .await
    }
}

/// Certificate NFT client
#[derive(Clone)]
pub struct CertificateClient {
    contract: CertificateNft<Client>,
}

impl CertificateClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: CertificateNft::new(addr, client),
        }
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.contract.balance_of(owner).call().await?)
    }

    pub async fn set_job_registry(&self, registry: Address) -> Result<H256> {
        send_tx(self.contract.set_job_registry(registry), "setJobRegistry").await
    }
}

/// Fee pool client
#[derive(Clone)]
pub struct FeePoolClient {
    contract: FeePool<Client>,
}

impl FeePoolClient {
    pub fn new(addr: Address, client: Arc<Client>) -> Self {
        Self {
            contract: FeePool::new(addr, client),
        }
    }

    pub async fn set_burn_pct(&self, pct: U256) -> Result<H256> {
        send_tx(self.contract.set_burn_pct(pct), "setBurnPct").await
    }

    pub async fn pending_fees(&self) -> Result<U256> {
        Ok(self.contract.pending_fees().call().await?)
    }
}

/// Every module client bound to one signer, typically the owner.
#[derive(Clone)]
pub struct ModuleSuite {
    pub book: ModuleAddressBook,
    pub token: TokenClient,
    pub stake: StakeManagerClient,
    pub registry: JobRegistryClient,
    pub validation: ValidationClient,
    pub dispute: DisputeClient,
    pub reputation: ReputationClient,
    pub identity: IdentityClient,
    pub certificate: CertificateClient,
    pub fee_pool: FeePoolClient,
}

impl ModuleSuite {
    pub fn attach(book: &ModuleAddressBook, client: Arc<Client>) -> Self {
        Self {
            book: book.clone(),
            token: TokenClient::new(book.token, client.clone()),
            stake: StakeManagerClient::new(book.stake_manager, client.clone()),
            registry: JobRegistryClient::new(book.job_registry, client.clone()),
            validation: ValidationClient::new(book.validation_module, client.clone()),
            dispute: DisputeClient::new(book.dispute_module, client.clone()),
            reputation: ReputationClient::new(book.reputation_engine, client.clone()),
            identity: IdentityClient::new(book.identity_registry, client.clone()),
            certificate: CertificateClient::new(book.certificate_nft, client.clone()),
            fee_pool: FeePoolClient::new(book.fee_pool, client),
        }
    }
}
