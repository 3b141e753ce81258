//! Funds bookkeeping: the contract pool, one running balance per
//! participant and a spent flag per volatile deposit.

use super::Transformer;
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::terms::{spent_var, total_deposits_var, CONTRACT_FUNDS};
use bitmc_ispl::{Cond, Expr, SystemBuilder, VarType};

pub struct Deposits;

impl Transformer for Deposits {
    fn name(&self) -> &'static str {
        "deposits"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        _opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        // Every balance is bounded by the sum of all deposits. An ISPL range
        // needs at least two values.
        let funds_type = VarType::range(0, ctx.total_deposits().max(1))?;

        b.env().add_obsvar(CONTRACT_FUNDS, funds_type.clone())?;
        b.add_initial_state(Cond::eq(
            Expr::env(CONTRACT_FUNDS),
            Expr::int(ctx.total_persistent()),
        ))?;

        for p in ctx.participants() {
            let var = total_deposits_var(p);
            b.env().add_obsvar(var.as_str(), funds_type.clone())?;
            b.add_initial_state(Cond::eq(
                Expr::env(var),
                Expr::int(ctx.volatile_total_of(p)),
            ))?;
        }

        for deposit in ctx.volatile_deposits() {
            let var = spent_var(&deposit.deposit_id);
            b.env().add_obsvar(var.as_str(), VarType::Boolean)?;
            b.add_initial_state(Cond::eq(Expr::env(var), Expr::False))?;
        }
        Ok(())
    }
}
