//! Scheduling: one agent per participant, and an environment that picks
//! exactly one participant to act in each round.

use super::Transformer;
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::objects::done_is;
use crate::options::CompileOptions;
use crate::terms::{action_value, agent_name, schedule_action, scheduled_prop, LAST_ACTION, NOP};
use bitmc_ispl::{Cond, Expr, Formula, SystemBuilder};

pub struct Scheduling;

impl Transformer for Scheduling {
    fn name(&self) -> &'static str {
        "scheduling"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        _opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        let schedule_actions: Vec<String> =
            ctx.participants().iter().map(|p| schedule_action(p)).collect();
        for action in &schedule_actions {
            b.env().add_action(action)?;
        }

        // With a clock, a participant is schedulable only until it is done
        // with the current time step.
        if ctx.has_timeouts() {
            for p in ctx.participants() {
                b.env()
                    .add_protocol_rule(done_is(p, false), [schedule_action(p)])?;
            }
        } else {
            b.env().add_to_other(schedule_actions.iter().cloned())?;
        }

        for p in ctx.participants() {
            let agent = b.add_agent(agent_name(p))?;
            agent.add_action(NOP)?;
            agent.add_to_other([NOP])?;

            let prop = scheduled_prop(p);
            b.add_evaluation_rule(
                prop.as_str(),
                Cond::eq(
                    Expr::env(LAST_ACTION),
                    Expr::id(action_value(&schedule_action(p))),
                ),
            )?;
            b.add_fair_formula(Formula::atom(prop))?;
        }
        Ok(())
    }
}
