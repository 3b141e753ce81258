//! Discrete global clock, only for contracts with timeouts.
//!
//! Each participant marks itself done with the current step by taking
//! `nop` while scheduled. Once everyone is done the environment may
//! `delay`: the clock ticks and every done flag is cleared.

use super::{agent_of, Transformer};
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::objects::{all_done, done_is, scheduled_agent_takes};
use crate::options::CompileOptions;
use crate::terms::{
    action_value, done_var, timeout_expired_prop, DELAY, LAST_ACTION, NOP, TIME,
    TIME_PROGRESSES_FOREVER, TIME_REACHES_MAXIMUM,
};
use bitmc_ispl::{Cond, Effect, Expr, Formula, SystemBuilder, VarType};

pub struct TimeProgression;

impl Transformer for TimeProgression {
    fn name(&self) -> &'static str {
        "time-progression"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        _opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        let Some(max_timeout) = ctx.graph().max_timeout() else {
            return Ok(());
        };
        let max_timeout = i64::from(max_timeout);

        b.env().add_obsvar(TIME, VarType::range(0, max_timeout.max(1))?)?;
        for p in ctx.participants() {
            b.env().add_var(done_var(p), VarType::Boolean)?;
        }
        b.env().add_action(DELAY)?;
        b.env().add_to_other([DELAY])?;

        let delay_when_all_done = Cond::action(DELAY).and_opt(all_done(ctx));
        for p in ctx.participants() {
            b.env().add_evolution_rule(
                vec![Effect::new(done_var(p), Expr::False)],
                delay_when_all_done.clone(),
            )?;
        }
        for p in ctx.participants() {
            b.env().add_evolution_rule(
                vec![Effect::new(done_var(p), Expr::True)],
                scheduled_agent_takes(p, NOP) & done_is(p, false),
            )?;
        }
        b.env().add_evolution_rule(
            vec![Effect::new(TIME, Expr::id(TIME) + Expr::int(1))],
            delay_when_all_done & Cond::lt(Expr::id(TIME), Expr::int(max_timeout)),
        )?;

        b.add_initial_state(Cond::eq(Expr::env(TIME), Expr::int(0)))?;
        for p in ctx.participants() {
            b.add_initial_state(Cond::eq(Expr::env(done_var(p)), Expr::False))?;
            agent_of(b, p)?.add_lobsvar(done_var(p))?;
        }

        b.add_evaluation_rule(
            TIME_PROGRESSES_FOREVER,
            Cond::eq(Expr::env(TIME), Expr::int(max_timeout))
                | Cond::eq(Expr::env(LAST_ACTION), Expr::id(action_value(DELAY))),
        )?;
        b.add_evaluation_rule(
            TIME_REACHES_MAXIMUM,
            Cond::eq(Expr::env(TIME), Expr::int(max_timeout)),
        )?;
        for &t in ctx.graph().timeouts() {
            b.add_evaluation_rule(
                timeout_expired_prop(t),
                Cond::ge(Expr::env(TIME), Expr::int(i64::from(t))),
            )?;
        }
        for p in ctx.participants() {
            b.add_evaluation_rule(done_var(p), Cond::eq(Expr::env(done_var(p)), Expr::True))?;
        }
        b.add_fair_formula(Formula::atom(TIME_PROGRESSES_FOREVER))?;
        Ok(())
    }
}
