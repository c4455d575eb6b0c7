use anyhow::Result;
use ethers::{
    abi::{encode, Token},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};

/// Commitment binding for one validator's vote.
///
/// keccak256 over the ABI encoding of (jobId, round nonce, approve,
/// burnTxHash, salt, specHash). The reveal resubmits the same tuple; the
/// contract recomputes this hash and rejects any mismatch.
pub fn commit_hash(
    job_id: U256,
    nonce: U256,
    approve: bool,
    burn_tx_hash: H256,
    salt: H256,
    spec_hash: H256,
) -> H256 {
    let encoded = encode(&[
        Token::Uint(job_id),
        Token::Uint(nonce),
        Token::Bool(approve),
        Token::FixedBytes(burn_tx_hash.as_bytes().to_vec()),
        Token::FixedBytes(salt.as_bytes().to_vec()),
        Token::FixedBytes(spec_hash.as_bytes().to_vec()),
    ]);
    H256(keccak256(encoded))
}

/// Typehash for the moderator resolution struct.
pub fn resolution_typehash() -> H256 {
    H256(keccak256(
        "ResolveDispute(uint256 jobId,bool employerWins,address module,uint256 chainId)",
    ))
}

/// Struct hash moderators co-sign to settle a dispute.
///
/// Module address and chain id are part of the hash; a mismatch in either
/// invalidates every collected signature without an explicit error.
pub fn resolution_struct_hash(
    job_id: U256,
    employer_wins: bool,
    dispute_module: Address,
    chain_id: U256,
) -> H256 {
    let encoded = encode(&[
        Token::FixedBytes(resolution_typehash().as_bytes().to_vec()),
        Token::Uint(job_id),
        Token::Bool(employer_wins),
        Token::Address(dispute_module),
        Token::Uint(chain_id),
    ]);
    H256(keccak256(encoded))
}

/// EIP-191 personal-sign of a resolution struct hash. 65-byte r||s||v.
pub async fn sign_resolution(wallet: &LocalWallet, struct_hash: H256) -> Result<Bytes> {
    let signature = wallet.sign_message(struct_hash.as_bytes()).await?;
    Ok(Bytes::from(signature.to_vec()))
}

/// Fresh 32-byte commit salt.
pub fn random_salt() -> H256 {
    H256(rand::random::<[u8; 32]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple() -> (U256, U256, bool, H256, H256, H256) {
        (
            U256::from(7),
            U256::from(1),
            true,
            H256::repeat_byte(0xaa),
            H256::repeat_byte(0xbb),
            H256::repeat_byte(0xcc),
        )
    }

    #[test]
    fn commit_hash_is_deterministic() {
        let (job, nonce, approve, burn, salt, spec) = tuple();
        let a = commit_hash(job, nonce, approve, burn, salt, spec);
        let b = commit_hash(job, nonce, approve, burn, salt, spec);
        assert_eq!(a, b, "identical tuples must hash identically");
    }

    #[test]
    fn commit_hash_binds_every_field() {
        let (job, nonce, approve, burn, salt, spec) = tuple();
        let base = commit_hash(job, nonce, approve, burn, salt, spec);

        assert_ne!(base, commit_hash(job + 1, nonce, approve, burn, salt, spec));
        assert_ne!(base, commit_hash(job, nonce + 1, approve, burn, salt, spec));
        assert_ne!(base, commit_hash(job, nonce, !approve, burn, salt, spec));
        assert_ne!(
            base,
            commit_hash(job, nonce, approve, H256::repeat_byte(0xab), salt, spec)
        );
        assert_ne!(
            base,
            commit_hash(job, nonce, approve, burn, H256::repeat_byte(0xbc), spec)
        );
        assert_ne!(
            base,
            commit_hash(job, nonce, approve, burn, salt, H256::repeat_byte(0xcd))
        );
    }

    #[test]
    fn struct_hash_binds_module_and_chain() {
        let module = Address::repeat_byte(0x11);
        let base = resolution_struct_hash(U256::from(3), true, module, U256::from(31337));

        assert_ne!(
            base,
            resolution_struct_hash(U256::from(3), true, module, U256::from(1)),
            "chain id must be part of the signed struct"
        );
        assert_ne!(
            base,
            resolution_struct_hash(U256::from(3), true, Address::repeat_byte(0x12), U256::from(31337)),
            "module address must be part of the signed struct"
        );
        assert_ne!(
            base,
            resolution_struct_hash(U256::from(3), false, module, U256::from(31337))
        );
    }

    #[test]
    fn salts_do_not_repeat() {
        let a = random_salt();
        let b = random_salt();
        assert_ne!(a, b);
        assert_ne!(a, H256::zero());
    }

    #[tokio::test]
    async fn resolution_signature_recovers_signer() -> Result<()> {
        let wallet: LocalWallet =
            "0000000000000000000000000000000000000000000000000000000000000001".parse()?;
        let hash = resolution_struct_hash(
            U256::from(1),
            false,
            Address::repeat_byte(0x22),
            U256::from(31337),
        );
        let sig_bytes = sign_resolution(&wallet, hash).await?;
        assert_eq!(sig_bytes.len(), 65);

        let sig = ethers::types::Signature::try_from(sig_bytes.as_ref())?;
        let recovered = sig.recover(hash.as_bytes().to_vec())?;
        assert_eq!(recovered, wallet.address());
        Ok(())
    }
}
