//! Pass 1 (tree half): structural arity checks and identifier resolution
//! for every expression in the contract tree.

use crate::ast::{Expr, Predicate};
use crate::error::ContractError;
use crate::index::{check_split_amount, Index};
use std::collections::HashSet;

pub fn check_scoping(root: &Expr, idx: &Index) -> Result<(), ContractError> {
    check_expr(root, idx)
}

fn check_expr(expr: &Expr, idx: &Index) -> Result<(), ContractError> {
    match expr {
        Expr::Withdraw { participant } => idx.require_participant(participant)?,
        Expr::Auth { participant, .. } => idx.require_participant(participant)?,
        Expr::After { .. } => {}
        Expr::Choice { branches } => {
            check_arity("choice", branches.len())?;
        }
        Expr::Split { branches } => {
            check_arity("split", branches.len())?;
            for b in branches {
                check_split_amount(b.amount)?;
            }
        }
        Expr::Put { deposit_ids, .. } => {
            check_deposit_ids(expr.keyword(), deposit_ids, idx)?;
        }
        Expr::PutReveal {
            deposit_ids,
            secret_ids,
            ..
        } => {
            check_deposit_ids(expr.keyword(), deposit_ids, idx)?;
            check_secret_ids(expr.keyword(), secret_ids, idx)?;
        }
        Expr::PutRevealIf {
            deposit_ids,
            secret_ids,
            predicate,
            ..
        } => {
            check_deposit_ids(expr.keyword(), deposit_ids, idx)?;
            check_secret_ids(expr.keyword(), secret_ids, idx)?;
            check_predicate(predicate, idx)?;
        }
        Expr::RevealIf {
            secret_ids,
            predicate,
            ..
        } => {
            check_secret_ids(expr.keyword(), secret_ids, idx)?;
            check_predicate(predicate, idx)?;
        }
        Expr::Reveal { secret_ids, .. } => {
            check_secret_ids(expr.keyword(), secret_ids, idx)?;
        }
    }

    for child in expr.children() {
        check_expr(child, idx)?;
    }
    Ok(())
}

fn check_arity(kind: &'static str, found: usize) -> Result<(), ContractError> {
    if found < 2 {
        return Err(ContractError::TooFewBranches {
            kind,
            min: 2,
            found,
        });
    }
    Ok(())
}

fn check_unique(
    kind: &'static str,
    what: &'static str,
    ids: &[String],
) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ContractError::DuplicateId {
                kind,
                what,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

fn check_deposit_ids(
    kind: &'static str,
    deposit_ids: &[String],
    idx: &Index,
) -> Result<(), ContractError> {
    check_unique(kind, "volatile deposit", deposit_ids)?;
    for id in deposit_ids {
        idx.require_volatile_deposit(id)?;
    }
    Ok(())
}

fn check_secret_ids(
    kind: &'static str,
    secret_ids: &[String],
    idx: &Index,
) -> Result<(), ContractError> {
    if secret_ids.is_empty() {
        return Err(ContractError::MissingIds {
            kind,
            what: "secret",
        });
    }
    check_unique(kind, "secret", secret_ids)?;
    for id in secret_ids {
        idx.require_secret(id)?;
    }
    Ok(())
}

fn check_predicate(predicate: &Predicate, idx: &Index) -> Result<(), ContractError> {
    let mut atoms = Vec::new();
    predicate.collect_secrets(&mut atoms);
    for secret_id in atoms {
        idx.require_secret(secret_id)?;
    }
    Ok(())
}
