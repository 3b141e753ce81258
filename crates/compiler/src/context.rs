//! Read-only view of a contract shared by all transformer passes.

use crate::error::CompileError;
use crate::graph::{ExecutionGraph, Node};
use bitmc_core::{Contract, Precondition};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolatileDeposit {
    pub deposit_id: String,
    pub participant: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDecl {
    pub secret_id: String,
    pub participant: String,
}

/// Contract facts the passes need, with every amount already converted
/// to an integer.
#[derive(Debug, Clone)]
pub struct ContractContext {
    participants: Vec<String>,
    persistent_total: i64,
    volatile_total: i64,
    total_deposits: i64,
    volatile: Vec<VolatileDeposit>,
    /// Volatile total per owner.
    volatile_by_owner: HashMap<String, i64>,
    secrets: Vec<SecretDecl>,
    node_funds: Vec<i64>,
    graph: ExecutionGraph,
}

fn integral(what: impl Into<String>, amount: Decimal) -> Result<i64, CompileError> {
    let non_integral = |what: String| CompileError::NonIntegralAmount { what, amount };
    if !amount.fract().is_zero() {
        return Err(non_integral(what.into()));
    }
    amount.to_i64().ok_or_else(|| non_integral(what.into()))
}

fn add(acc: i64, amount: i64, what: &str) -> Result<i64, CompileError> {
    acc.checked_add(amount).ok_or_else(|| CompileError::overflow(what))
}

impl ContractContext {
    pub fn new(contract: &Contract) -> Result<Self, CompileError> {
        let mut persistent_total = 0i64;
        let mut volatile = Vec::new();
        let mut secrets = Vec::new();
        for prec in contract.preconditions() {
            match prec {
                Precondition::Deposit {
                    participant,
                    amount,
                    tx,
                } => {
                    let amount = integral(format!("deposit {tx} of {participant}"), *amount)?;
                    persistent_total = add(persistent_total, amount, "total of the deposits")?;
                }
                Precondition::VolatileDeposit {
                    participant,
                    deposit_id,
                    amount,
                    ..
                } => volatile.push(VolatileDeposit {
                    deposit_id: deposit_id.clone(),
                    participant: participant.clone(),
                    amount: integral(format!("volatile deposit {deposit_id}"), *amount)?,
                }),
                Precondition::Secret {
                    participant,
                    secret_id,
                    ..
                } => secrets.push(SecretDecl {
                    secret_id: secret_id.clone(),
                    participant: participant.clone(),
                }),
                // rejected earlier by the supported-subset guard
                Precondition::Fee { .. } => {}
            }
        }

        let mut volatile_total = 0i64;
        let mut volatile_by_owner = HashMap::new();
        for v in &volatile {
            volatile_total = add(volatile_total, v.amount, "total of the volatile deposits")?;
            let owned = volatile_by_owner.entry(v.participant.clone()).or_insert(0i64);
            *owned = add(*owned, v.amount, "volatile deposits of one participant")?;
        }
        let total_deposits = add(persistent_total, volatile_total, "total of all deposits")?;

        let graph = ExecutionGraph::build(contract)?;
        let node_funds = graph
            .nodes()
            .iter()
            .map(|n| integral(format!("funds of {}", n.full_id()), n.funds))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ContractContext {
            participants: contract.participant_ids().map(str::to_owned).collect(),
            persistent_total,
            volatile_total,
            total_deposits,
            volatile,
            volatile_by_owner,
            secrets,
            node_funds,
            graph,
        })
    }

    /// Participant identifiers in declaration order.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn graph(&self) -> &ExecutionGraph {
        &self.graph
    }

    pub fn has_timeouts(&self) -> bool {
        self.graph.has_timeouts()
    }

    pub fn total_persistent(&self) -> i64 {
        self.persistent_total
    }

    pub fn total_volatile(&self) -> i64 {
        self.volatile_total
    }

    /// Upper bound of every funds variable.
    pub fn total_deposits(&self) -> i64 {
        self.total_deposits
    }

    pub fn volatile_deposits(&self) -> &[VolatileDeposit] {
        &self.volatile
    }

    pub fn volatile_deposit(&self, deposit_id: &str) -> Option<&VolatileDeposit> {
        self.volatile.iter().find(|v| v.deposit_id == deposit_id)
    }

    /// Sum of the volatile deposits owned by `participant`.
    pub fn volatile_total_of(&self, participant: &str) -> i64 {
        self.volatile_by_owner.get(participant).copied().unwrap_or(0)
    }

    pub fn secrets(&self) -> &[SecretDecl] {
        &self.secrets
    }

    pub fn secret(&self, secret_id: &str) -> Option<&SecretDecl> {
        self.secrets.iter().find(|s| s.secret_id == secret_id)
    }

    pub fn secrets_of<'a>(
        &'a self,
        participant: &'a str,
    ) -> impl Iterator<Item = &'a SecretDecl> + 'a {
        self.secrets.iter().filter(move |s| s.participant == participant)
    }

    pub fn funds_of(&self, node: &Node) -> i64 {
        self.node_funds[node.id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitmc_core::{Expr, Participant, TxOutput};
    use std::str::FromStr;

    fn tx(id: &str) -> TxOutput {
        TxOutput {
            tx_identifier: id.to_owned(),
            index: 0,
        }
    }

    fn contract(amount: &str) -> Contract {
        Contract::new(
            vec![Participant {
                identifier: "A".to_owned(),
                pubkey: "aa".to_owned(),
            }],
            vec![
                Precondition::Deposit {
                    participant: "A".to_owned(),
                    amount: Decimal::from_str(amount).unwrap(),
                    tx: tx("t1"),
                },
                Precondition::VolatileDeposit {
                    participant: "A".to_owned(),
                    deposit_id: "x".to_owned(),
                    amount: Decimal::from(2),
                    tx: tx("t2"),
                },
                Precondition::Secret {
                    participant: "A".to_owned(),
                    secret_id: "s".to_owned(),
                    secret_hash: "ab".to_owned(),
                },
            ],
            Expr::withdraw("A"),
        )
        .unwrap()
    }

    #[test]
    fn totals_and_indexes() {
        let ctx = ContractContext::new(&contract("3")).unwrap();
        assert_eq!(ctx.participants(), ["A".to_owned()]);
        assert_eq!(ctx.total_persistent(), 3);
        assert_eq!(ctx.total_deposits(), 5);
        assert_eq!(ctx.volatile_total_of("A"), 2);
        assert_eq!(ctx.secret("s").map(|s| s.participant.as_str()), Some("A"));
        assert_eq!(ctx.secrets_of("A").count(), 1);
        assert_eq!(ctx.funds_of(ctx.graph().root()), 3);
        assert!(!ctx.has_timeouts());
    }

    #[test]
    fn deposits_summing_past_the_integer_range_are_rejected() {
        let deposit = |t: &str| Precondition::Deposit {
            participant: "A".to_owned(),
            amount: Decimal::from(i64::MAX),
            tx: tx(t),
        };
        let c = Contract::new(
            vec![Participant {
                identifier: "A".to_owned(),
                pubkey: "aa".to_owned(),
            }],
            vec![deposit("t1"), deposit("t2")],
            Expr::withdraw("A"),
        )
        .unwrap();
        let err = ContractContext::new(&c).unwrap_err();
        assert!(matches!(err, CompileError::AmountOverflow { .. }));
        assert_eq!(
            err.to_string(),
            "total of the deposits exceeds the integer range of the model"
        );
    }

    #[test]
    fn fractional_amounts_are_rejected() {
        let err = ContractContext::new(&contract("1.5")).unwrap_err();
        assert!(matches!(err, CompileError::NonIntegralAmount { .. }));
    }
}
