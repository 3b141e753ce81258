use crate::ast::TxOutput;
use rust_decimal::Decimal;

/// A contract failed semantic validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    /// An identifier does not follow the name pattern or is a keyword.
    #[error("invalid {kind} name \"{value}\"")]
    InvalidName { kind: &'static str, value: String },

    #[error("invalid {kind} \"{value}\": expected a lowercase hex string")]
    InvalidHex { kind: &'static str, value: String },

    #[error("{what} amount must be non-negative, got {amount}")]
    NegativeAmount { what: &'static str, amount: Decimal },

    #[error("{kind} requires at least {min} branches, got {found}")]
    TooFewBranches {
        kind: &'static str,
        min: usize,
        found: usize,
    },

    #[error("{kind} requires at least one {what}")]
    MissingIds {
        kind: &'static str,
        what: &'static str,
    },

    #[error("duplicate {what} \"{id}\" in {kind}")]
    DuplicateId {
        kind: &'static str,
        what: &'static str,
        id: String,
    },

    #[error("participant with identifier {participant} is not defined")]
    ParticipantNotDefined { participant: String },

    #[error("participant with identifier \"{participant}\" already defined")]
    ParticipantAlreadyDefined { participant: String },

    /// Two preconditions lock the same transaction output.
    #[error("transaction output {tx} already locked in deposit {other}")]
    TxAlreadyLocked { tx: TxOutput, other: String },

    #[error("volatile deposit with identifier \"{deposit_id}\" is not defined")]
    VolatileDepositNotDefined { deposit_id: String },

    #[error("volatile deposit with identifier \"{deposit_id}\" is already defined")]
    VolatileDepositAlreadyDefined { deposit_id: String },

    #[error("secret \"{secret_id}\" already used by precondition {other}")]
    SecretAlreadyDefined { secret_id: String, other: String },

    #[error("hash \"{secret_hash}\" already committed by secret '{other_secret_id}'")]
    SecretHashAlreadyCommitted {
        secret_hash: String,
        other_secret_id: String,
    },

    #[error("secret with identifier \"{secret_id}\" is not defined")]
    SecretNotDefined { secret_id: String },

    /// Split branch amounts do not add up to the funds reaching the split.
    #[error("split spends {spends} BTC but it receives {receives} BTC")]
    SplitMismatch { spends: Decimal, receives: Decimal },

    /// Adding up amounts on some execution path exceeds the representable range.
    #[error("{what} exceeds the largest representable amount")]
    AmountOverflow { what: &'static str },

    /// A put-family expression consumes deposits already consumed on the
    /// same execution path. Ids are sorted.
    #[error("volatile deposits already spent: ({})", .deposit_ids.join(", "))]
    VolatileDepositsAlreadySpent { deposit_ids: Vec<String> },
}

impl ContractError {
    /// Validation pass that raised the error: 1 for scoping and structure,
    /// 2 for the funds-flow check.
    pub fn pass(&self) -> u8 {
        match self {
            ContractError::SplitMismatch { .. }
            | ContractError::AmountOverflow { .. }
            | ContractError::VolatileDepositsAlreadySpent { .. } => 2,
            _ => 1,
        }
    }
}
