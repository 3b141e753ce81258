//! Contract initialization: any participant may start the contract once
//! every secret has been committed.

use super::{agent_of, Transformer};
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::objects::{
    done_is_false_seen_by_agent, initialized_is, initialized_is_seen_by_agent,
    secrets_committed_or_revealed, secrets_committed_or_revealed_seen_by_agent,
    some_scheduled_agent_takes,
};
use crate::options::CompileOptions;
use crate::terms::{CONTRACT_INITIALIZED, CONTRACT_IS_INITIALIZED, INITIALIZE_CONTRACT, NOP};
use bitmc_ispl::{Cond, Effect, Expr, Formula, SystemBuilder, VarType};

pub struct Initialization;

impl Transformer for Initialization {
    fn name(&self) -> &'static str {
        "contract-initialization"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        b.env().add_obsvar(CONTRACT_INITIALIZED, VarType::Boolean)?;
        b.env().add_evolution_rule(
            vec![Effect::new(CONTRACT_INITIALIZED, Expr::True)],
            initialized_is(false).and_opt(secrets_committed_or_revealed(ctx))
                & some_scheduled_agent_takes(ctx, INITIALIZE_CONTRACT),
        )?;

        for p in ctx.participants() {
            let condition = initialized_is_seen_by_agent(false)
                .and_opt(ctx.has_timeouts().then(|| done_is_false_seen_by_agent(p)))
                .and_opt(secrets_committed_or_revealed_seen_by_agent(ctx));
            let agent = agent_of(b, p)?;
            agent.add_action(INITIALIZE_CONTRACT)?;
            agent.add_protocol_rule(condition, [INITIALIZE_CONTRACT, NOP])?;
        }

        b.add_initial_state(Cond::eq(Expr::env(CONTRACT_INITIALIZED), Expr::False))?;
        b.add_evaluation_rule(
            CONTRACT_IS_INITIALIZED,
            Cond::eq(Expr::env(CONTRACT_INITIALIZED), Expr::True),
        )?;
        if opts.initialization_fairness {
            b.add_fair_formula(Formula::atom(CONTRACT_IS_INITIALIZED))?;
        }
        Ok(())
    }
}
