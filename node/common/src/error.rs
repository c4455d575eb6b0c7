use ethers::{contract::ContractError, utils::id};
use thiserror::Error;

use crate::contracts::Client;

/// Revert conditions the drivers recover from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownRevert {
    /// selectValidators on a job whose round is already populated. The
    /// driver fetches the existing round instead of aborting.
    ValidatorsAlreadySelected,
}

/// Disposition of a failed transaction, decided once at the submission
/// boundary. Everything that is not a known-retryable revert aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxDisposition {
    Retryable(KnownRevert),
    Fatal,
}

/// Classify a revert from its message and, when present, its raw return
/// data. Custom errors are matched by 4-byte selector; string reverts by
/// reason substring.
pub fn classify_revert(message: &str, revert_data: Option<&[u8]>) -> TxDisposition {
    if let Some(data) = revert_data {
        let selector = id("ValidatorsAlreadySelected()");
        if data.len() >= 4 && data[..4] == selector[..] {
            return TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected);
        }
    }

    let lowered = message.to_ascii_lowercase();
    if lowered.contains("validatorsalreadyselected")
        || lowered.contains("validators already selected")
    {
        return TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected);
    }

    TxDisposition::Fatal
}

/// Classify an error bubbled out of a contract call.
pub fn classify_chain_err(err: &anyhow::Error) -> TxDisposition {
    let revert_data = err
        .downcast_ref::<ContractError<Client>>()
        .and_then(|c| c.as_revert())
        .map(|b| b.as_ref().to_vec());
    classify_revert(&err.to_string(), revert_data.as_deref())
}

/// Configuration problems caught before any transaction is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid address for `{field}`: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("`{field}` out of range: {value} (expected at most {max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_match_is_retryable() {
        let selector = id("ValidatorsAlreadySelected()");
        let disposition = classify_revert("execution reverted", Some(&selector[..]));
        assert_eq!(
            disposition,
            TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected)
        );
    }

    #[test]
    fn reason_string_match_is_retryable() {
        let disposition =
            classify_revert("execution reverted: validators already selected", None);
        assert_eq!(
            disposition,
            TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected)
        );

        let disposition = classify_revert("custom error ValidatorsAlreadySelected()", None);
        assert_eq!(
            disposition,
            TxDisposition::Retryable(KnownRevert::ValidatorsAlreadySelected)
        );
    }

    #[test]
    fn other_reverts_are_fatal() {
        assert_eq!(
            classify_revert("execution reverted: NotAuthorized()", None),
            TxDisposition::Fatal
        );
        let wrong_selector = id("NotAuthorized()");
        assert_eq!(
            classify_revert("execution reverted", Some(&wrong_selector[..])),
            TxDisposition::Fatal
        );
        assert_eq!(classify_revert("nonce too low", None), TxDisposition::Fatal);
    }
}
