//! Pass 2: symbolic funds-flow check.
//!
//! Walks every execution path carrying the funds available at that point
//! and the volatile deposits not yet consumed on that path. The state is
//! cloned at every branch, so a deposit consumed in one branch of a
//! `choice` or `split` stays available to its siblings.

use crate::ast::{Expr, Precondition};
use crate::error::ContractError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct FundsState {
    funds: Decimal,
    available: BTreeMap<String, Decimal>,
}

impl FundsState {
    fn with_funds(&self, funds: Decimal) -> Self {
        FundsState {
            funds,
            available: self.available.clone(),
        }
    }

    /// Consume `deposit_ids` on this path, adding their amounts to the funds.
    fn spend(&self, deposit_ids: &[String]) -> Result<Self, ContractError> {
        let mut spent: Vec<String> = deposit_ids
            .iter()
            .filter(|id| !self.available.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !spent.is_empty() {
            spent.sort();
            return Err(ContractError::VolatileDepositsAlreadySpent {
                deposit_ids: spent,
            });
        }

        let mut next = self.clone();
        for id in deposit_ids {
            if let Some(amount) = next.available.remove(id) {
                next.funds = add_amounts(next.funds, amount, "funds after put")?;
            }
        }
        Ok(next)
    }
}

pub fn check_funds(preconditions: &[Precondition], root: &Expr) -> Result<(), ContractError> {
    let mut initial = FundsState {
        funds: Decimal::ZERO,
        available: BTreeMap::new(),
    };
    for pre in preconditions {
        match pre {
            Precondition::Deposit { amount, .. } => {
                initial.funds = add_amounts(initial.funds, *amount, "total deposit")?;
            }
            Precondition::VolatileDeposit {
                deposit_id, amount, ..
            } => {
                initial.available.insert(deposit_id.clone(), *amount);
            }
            Precondition::Fee { .. } | Precondition::Secret { .. } => {}
        }
    }
    check_expr(root, &initial)
}

fn add_amounts(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ContractError> {
    a.checked_add(b).ok_or(ContractError::AmountOverflow { what })
}

fn check_expr(expr: &Expr, state: &FundsState) -> Result<(), ContractError> {
    match expr {
        Expr::Withdraw { .. } => Ok(()),
        Expr::Split { branches } => {
            let spends = branches.iter().try_fold(Decimal::ZERO, |acc, b| {
                add_amounts(acc, b.amount, "split total")
            })?;
            if spends != state.funds {
                return Err(ContractError::SplitMismatch {
                    spends,
                    receives: state.funds,
                });
            }
            for b in branches {
                check_expr(&b.branch, &state.with_funds(b.amount))?;
            }
            Ok(())
        }
        Expr::Put {
            deposit_ids,
            branch,
        }
        | Expr::PutReveal {
            deposit_ids,
            branch,
            ..
        }
        | Expr::PutRevealIf {
            deposit_ids,
            branch,
            ..
        } => check_expr(branch, &state.spend(deposit_ids)?),
        Expr::Choice { .. }
        | Expr::After { .. }
        | Expr::Auth { .. }
        | Expr::Reveal { .. }
        | Expr::RevealIf { .. } => {
            for child in expr.children() {
                check_expr(child, state)?;
            }
            Ok(())
        }
    }
}
