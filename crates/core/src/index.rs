//! Declaration index: participants and preconditions by identifier.
//!
//! Built once, in declaration order, before the contract tree is walked.
//! Every uniqueness rule on declarations is enforced here.

use crate::ast::{Participant, Precondition, TxOutput};
use crate::error::ContractError;
use crate::names::{check_hex, check_name};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Lookup tables over the declarations of a contract. Values are positions
/// into the participant and precondition slices the index was built from.
#[derive(Debug, Default)]
pub struct Index {
    pub participants: HashMap<String, usize>,
    /// Map from locked transaction output -> precondition position
    pub locked_txs: HashMap<TxOutput, usize>,
    pub volatile_deposits: HashMap<String, usize>,
    pub secrets: HashMap<String, usize>,
    /// Map from secret hash -> id of the secret committing to it
    pub secret_hashes: HashMap<String, String>,
}

impl Index {
    pub fn has_participant(&self, participant: &str) -> bool {
        self.participants.contains_key(participant)
    }

    pub fn require_participant(&self, participant: &str) -> Result<(), ContractError> {
        if self.has_participant(participant) {
            Ok(())
        } else {
            Err(ContractError::ParticipantNotDefined {
                participant: participant.to_owned(),
            })
        }
    }

    pub fn require_volatile_deposit(&self, deposit_id: &str) -> Result<(), ContractError> {
        if self.volatile_deposits.contains_key(deposit_id) {
            Ok(())
        } else {
            Err(ContractError::VolatileDepositNotDefined {
                deposit_id: deposit_id.to_owned(),
            })
        }
    }

    pub fn require_secret(&self, secret_id: &str) -> Result<(), ContractError> {
        if self.secrets.contains_key(secret_id) {
            Ok(())
        } else {
            Err(ContractError::SecretNotDefined {
                secret_id: secret_id.to_owned(),
            })
        }
    }
}

pub fn build_index(
    participants: &[Participant],
    preconditions: &[Precondition],
) -> Result<Index, ContractError> {
    let mut idx = Index::default();

    for (pos, p) in participants.iter().enumerate() {
        check_name("participant", &p.identifier)?;
        check_hex("public key", &p.pubkey)?;
        if idx.participants.contains_key(&p.identifier) {
            return Err(ContractError::ParticipantAlreadyDefined {
                participant: p.identifier.clone(),
            });
        }
        idx.participants.insert(p.identifier.clone(), pos);
    }

    for (pos, pre) in preconditions.iter().enumerate() {
        idx.require_participant(pre.participant())?;

        if let Some(tx) = pre.tx() {
            check_name("transaction", &tx.tx_identifier)?;
            if let Some(&other) = idx.locked_txs.get(tx) {
                return Err(ContractError::TxAlreadyLocked {
                    tx: tx.clone(),
                    other: preconditions[other].to_string(),
                });
            }
            idx.locked_txs.insert(tx.clone(), pos);
        }

        match pre {
            Precondition::Deposit { amount, .. } => {
                check_amount("deposit", *amount)?;
            }
            Precondition::Fee { amount, .. } => {
                check_amount("fee", *amount)?;
            }
            Precondition::VolatileDeposit {
                deposit_id, amount, ..
            } => {
                check_name("volatile deposit", deposit_id)?;
                check_amount("volatile deposit", *amount)?;
                if idx.volatile_deposits.contains_key(deposit_id) {
                    return Err(ContractError::VolatileDepositAlreadyDefined {
                        deposit_id: deposit_id.clone(),
                    });
                }
                idx.volatile_deposits.insert(deposit_id.clone(), pos);
            }
            Precondition::Secret {
                secret_id,
                secret_hash,
                ..
            } => {
                check_name("secret", secret_id)?;
                check_hex("secret hash", secret_hash)?;
                if let Some(&other) = idx.secrets.get(secret_id) {
                    return Err(ContractError::SecretAlreadyDefined {
                        secret_id: secret_id.clone(),
                        other: preconditions[other].to_string(),
                    });
                }
                if let Some(other_secret_id) = idx.secret_hashes.get(secret_hash) {
                    return Err(ContractError::SecretHashAlreadyCommitted {
                        secret_hash: secret_hash.clone(),
                        other_secret_id: other_secret_id.clone(),
                    });
                }
                idx.secrets.insert(secret_id.clone(), pos);
                idx.secret_hashes
                    .insert(secret_hash.clone(), secret_id.clone());
            }
        }
    }

    Ok(idx)
}

fn check_amount(what: &'static str, amount: Decimal) -> Result<(), ContractError> {
    if amount < Decimal::ZERO {
        return Err(ContractError::NegativeAmount { what, amount });
    }
    Ok(())
}

pub(crate) fn check_split_amount(amount: Decimal) -> Result<(), ContractError> {
    check_amount("split branch", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn participant(id: &str) -> Participant {
        Participant {
            identifier: id.to_owned(),
            pubkey: "0a".to_owned(),
        }
    }

    fn tx(id: &str, index: u32) -> TxOutput {
        TxOutput {
            tx_identifier: id.to_owned(),
            index,
        }
    }

    fn deposit(p: &str, amount: i64, tx_id: &str) -> Precondition {
        Precondition::Deposit {
            participant: p.to_owned(),
            amount: Decimal::from(amount),
            tx: tx(tx_id, 0),
        }
    }

    fn secret(p: &str, id: &str, hash: &str) -> Precondition {
        Precondition::Secret {
            participant: p.to_owned(),
            secret_id: id.to_owned(),
            secret_hash: hash.to_owned(),
        }
    }

    #[test]
    fn duplicate_participant_rejected() {
        let err = build_index(&[participant("A"), participant("A")], &[]).unwrap_err();
        assert_eq!(
            err,
            ContractError::ParticipantAlreadyDefined {
                participant: "A".to_owned()
            }
        );
        assert_eq!(err.pass(), 1);
    }

    #[test]
    fn precondition_of_unknown_participant_rejected() {
        let err = build_index(&[participant("A")], &[deposit("B", 1, "txB")]).unwrap_err();
        assert!(err.to_string().contains("participant with identifier B is not defined"));
    }

    #[test]
    fn same_tx_locked_by_fee_and_deposit() {
        let fee = Precondition::Fee {
            participant: "A".to_owned(),
            amount: Decimal::ONE,
            tx: tx("txA", 0),
        };
        let err = build_index(&[participant("A")], &[deposit("A", 1, "txA"), fee]).unwrap_err();
        assert!(matches!(err, ContractError::TxAlreadyLocked { .. }));
        assert!(err.to_string().contains("txA@0 already locked"));
    }

    #[test]
    fn same_tx_different_output_index_is_fine() {
        let other = Precondition::Deposit {
            participant: "A".to_owned(),
            amount: Decimal::ONE,
            tx: tx("txA", 1),
        };
        assert!(build_index(&[participant("A")], &[deposit("A", 1, "txA"), other]).is_ok());
    }

    #[test]
    fn secret_hash_reuse_rejected() {
        let err = build_index(
            &[participant("A"), participant("B")],
            &[secret("A", "a", "00ff"), secret("B", "b", "00ff")],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "hash \"00ff\" already committed by secret 'a'"
        );
    }

    #[test]
    fn secret_id_reuse_rejected() {
        let err = build_index(
            &[participant("A")],
            &[secret("A", "a", "01"), secret("A", "a", "02")],
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::SecretAlreadyDefined { .. }));
    }

    #[test]
    fn negative_deposit_rejected() {
        let err = build_index(&[participant("A")], &[deposit("A", -1, "txA")]).unwrap_err();
        assert!(matches!(err, ContractError::NegativeAmount { .. }));
    }

    #[test]
    fn keyword_participant_rejected() {
        let err = build_index(&[participant("split")], &[]).unwrap_err();
        assert!(matches!(err, ContractError::InvalidName { .. }));
    }
}
