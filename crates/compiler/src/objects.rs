//! Conditions shared by several passes.
//!
//! Functions come in two views. The environment view reads its own
//! variables by plain name and sees the scheduling choice as its own
//! `Action`. The agent view reads `Environment.<var>` and sees
//! `Environment.Action`.

use crate::context::ContractContext;
use crate::terms::{
    agent_name, done_var, public_secret_var, schedule_action, PublicSecret, CONTRACT_INITIALIZED,
    INITIALIZE_CONTRACT,
};
use bitmc_ispl::{Cond, Expr};

/// Environment view: the environment is scheduling `participant`.
pub fn scheduled(participant: &str) -> Cond {
    Cond::action(schedule_action(participant))
}

/// Agent view of [`scheduled`].
pub fn scheduled_seen_by_agent(participant: &str) -> Cond {
    Cond::env_action(schedule_action(participant))
}

/// Environment view: `participant` is scheduled and takes `action`.
pub fn scheduled_agent_takes(participant: &str, action: &str) -> Cond {
    scheduled(participant) & Cond::agent_action(agent_name(participant), action)
}

/// Some scheduled participant takes `action`.
pub fn some_scheduled_agent_takes(ctx: &ContractContext, action: &str) -> Cond {
    any_participant(ctx, |p| scheduled_agent_takes(p, action))
}

/// Disjunction over all participants. A validated contract has at least
/// one participant, since its root always references one.
pub fn any_participant(ctx: &ContractContext, f: impl Fn(&str) -> Cond) -> Cond {
    ctx.participants()
        .iter()
        .map(|p| f(p))
        .reduce(|acc, c| acc | c)
        .unwrap_or_else(|| Cond::eq(Expr::False, Expr::True))
}

pub fn done_is(participant: &str, value: bool) -> Cond {
    Cond::eq(Expr::id(done_var(participant)), Expr::bool(value))
}

/// Agent view: `participant` has not finished the current time step.
pub fn done_is_false_seen_by_agent(participant: &str) -> Cond {
    Cond::eq(Expr::env(done_var(participant)), Expr::False)
}

pub fn all_done(ctx: &ContractContext) -> Option<Cond> {
    Cond::all(ctx.participants().iter().map(|p| done_is(p, true)))
}

pub fn initialized_is(value: bool) -> Cond {
    Cond::eq(Expr::id(CONTRACT_INITIALIZED), Expr::bool(value))
}

pub fn initialized_is_seen_by_agent(value: bool) -> Cond {
    Cond::eq(Expr::env(CONTRACT_INITIALIZED), Expr::bool(value))
}

/// The contract gets initialized in this round or already was.
pub fn initialized_now_or_already(ctx: &ContractContext) -> Cond {
    some_scheduled_agent_takes(ctx, INITIALIZE_CONTRACT) | initialized_is(true)
}

fn public_secret_is(var: Expr, value: PublicSecret) -> Cond {
    Cond::eq(var, Expr::id(value.as_str()))
}

/// Every secret is committed or revealed; `None` without secrets.
pub fn secrets_committed_or_revealed(ctx: &ContractContext) -> Option<Cond> {
    Cond::all(ctx.secrets().iter().map(|s| {
        let var = || Expr::id(public_secret_var(&s.secret_id));
        public_secret_is(var(), PublicSecret::Committed)
            | public_secret_is(var(), PublicSecret::Valid)
    }))
}

/// Agent view of [`secrets_committed_or_revealed`].
pub fn secrets_committed_or_revealed_seen_by_agent(ctx: &ContractContext) -> Option<Cond> {
    Cond::all(ctx.secrets().iter().map(|s| {
        let var = || Expr::env(public_secret_var(&s.secret_id));
        public_secret_is(var(), PublicSecret::Committed)
            | public_secret_is(var(), PublicSecret::Valid)
    }))
}
