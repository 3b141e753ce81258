//! Guard for the contract subset the compiler can translate.

use crate::error::CompileError;
use bitmc_core::{Contract, Expr, Precondition};

/// Reject fee preconditions, predicate-guarded reveals and guards sitting
/// directly above a choice. All are valid contracts; the generated model
/// simply has no encoding for them.
pub fn check_supported(contract: &Contract) -> Result<(), CompileError> {
    if contract
        .preconditions()
        .iter()
        .any(|p| matches!(p, Precondition::Fee { .. }))
    {
        return Err(CompileError::unsupported("fee precondition"));
    }
    check_expr(contract.root(), false)
}

/// `guarded` is set while walking the branch of an `auth` or `after`.
fn check_expr(expr: &Expr, guarded: bool) -> Result<(), CompileError> {
    match expr {
        Expr::RevealIf { .. } | Expr::PutRevealIf { .. } => {
            Err(CompileError::unsupported(expr.keyword()))
        }
        Expr::Choice { .. } if guarded => Err(CompileError::unsupported(
            "authorization or timeout guard directly above a choice",
        )),
        Expr::Auth { branch, .. } | Expr::After { branch, .. } => check_expr(branch, true),
        _ => expr
            .children()
            .into_iter()
            .try_for_each(|child| check_expr(child, false)),
    }
}
