//! Two-sided secret lifecycle.
//!
//! The owner holds `private_secret_<s>` (`not_committed`, then `valid` or
//! `invalid` once committed). Everybody sees `public_secret_<s>`, which
//! moves `not_committed -> committed` on any commitment and
//! `committed -> valid` when the owner reveals. Only a valid commitment
//! can be revealed.

use super::{agent_of, Transformer};
use crate::context::{ContractContext, SecretDecl};
use crate::error::CompileError;
use crate::objects::{
    done_is_false_seen_by_agent, initialized_is_seen_by_agent, scheduled,
    scheduled_seen_by_agent,
};
use crate::options::CompileOptions;
use crate::terms::{
    agent_name, commit_invalid_action, commit_valid_action, private_secret_prop,
    private_secret_var, public_secret_prop, public_secret_var, reveal_action, PrivateSecret,
    PublicSecret, NOP,
};
use bitmc_ispl::{Cond, Effect, Expr, Formula, SystemBuilder, VarType};

pub struct Secrets;

impl Transformer for Secrets {
    fn name(&self) -> &'static str {
        "secrets"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        for secret in ctx.secrets() {
            add_public_secret(b, secret)?;
        }
        for p in ctx.participants() {
            for secret in ctx.secrets_of(p) {
                add_private_secret(ctx, b, secret)?;
            }
        }
        for secret in ctx.secrets() {
            add_evaluation_rules(b, secret)?;
        }

        if opts.secret_fairness {
            for secret in ctx.secrets() {
                b.add_fair_formula(Formula::or(
                    Formula::atom(public_secret_prop(&secret.secret_id, PublicSecret::Committed)),
                    Formula::atom(public_secret_prop(&secret.secret_id, PublicSecret::Valid)),
                ))?;
            }
        }
        Ok(())
    }
}

fn value(v: impl std::fmt::Display) -> Expr {
    Expr::id(v.to_string())
}

fn add_public_secret(b: &mut SystemBuilder, secret: &SecretDecl) -> Result<(), CompileError> {
    let id = &secret.secret_id;
    let owner = agent_name(&secret.participant);
    let public = public_secret_var(id);

    b.env().add_obsvar(
        public.as_str(),
        VarType::enumeration(PublicSecret::ALL.iter().map(|v| v.as_str()))?,
    )?;

    let committed_by_owner = Cond::agent_action(owner.as_str(), commit_valid_action(id))
        | Cond::agent_action(owner.as_str(), commit_invalid_action(id));
    b.env().add_evolution_rule(
        vec![Effect::new(public.as_str(), value(PublicSecret::Committed))],
        Cond::eq(Expr::id(public.as_str()), value(PublicSecret::NotCommitted))
            & committed_by_owner
            & scheduled(&secret.participant),
    )?;
    b.env().add_evolution_rule(
        vec![Effect::new(public.as_str(), value(PublicSecret::Valid))],
        Cond::agent_action(owner.as_str(), reveal_action(id))
            & scheduled(&secret.participant)
            & Cond::eq(Expr::id(public.as_str()), value(PublicSecret::Committed)),
    )?;

    b.add_initial_state(Cond::eq(Expr::env(public), value(PublicSecret::NotCommitted)))?;
    Ok(())
}

fn add_private_secret(
    ctx: &ContractContext,
    b: &mut SystemBuilder,
    secret: &SecretDecl,
) -> Result<(), CompileError> {
    let id = &secret.secret_id;
    let private = private_secret_var(id);
    let commit_valid = commit_valid_action(id);
    let commit_invalid = commit_invalid_action(id);
    let reveal = reveal_action(id);
    let not_done = ctx
        .has_timeouts()
        .then(|| done_is_false_seen_by_agent(&secret.participant));

    let agent = agent_of(b, &secret.participant)?;
    agent.add_var(
        private.as_str(),
        VarType::enumeration(PrivateSecret::ALL.iter().map(|v| v.as_str()))?,
    )?;
    agent.add_action(&commit_valid)?;
    agent.add_action(&commit_invalid)?;
    agent.add_action(&reveal)?;

    let is_private = |v: PrivateSecret| Cond::eq(Expr::id(private.as_str()), value(v));

    agent.add_protocol_rule(
        (initialized_is_seen_by_agent(false) & is_private(PrivateSecret::NotCommitted))
            .and_opt(not_done.clone()),
        [commit_valid.as_str(), commit_invalid.as_str(), NOP],
    )?;
    agent.add_protocol_rule(
        (is_private(PrivateSecret::Valid)
            & Cond::eq(Expr::env(public_secret_var(id)), value(PublicSecret::Committed)))
        .and_opt(not_done),
        [reveal.as_str(), NOP],
    )?;

    for (action, outcome) in [
        (&commit_valid, PrivateSecret::Valid),
        (&commit_invalid, PrivateSecret::Invalid),
    ] {
        agent.add_evolution_rule(
            vec![Effect::new(private.as_str(), value(outcome))],
            Cond::action(action.as_str())
                & is_private(PrivateSecret::NotCommitted)
                & initialized_is_seen_by_agent(false)
                & scheduled_seen_by_agent(&secret.participant),
        )?;
    }

    b.add_initial_state(Cond::eq(
        Expr::attr(agent_name(&secret.participant), private),
        value(PrivateSecret::NotCommitted),
    ))?;
    Ok(())
}

fn add_evaluation_rules(b: &mut SystemBuilder, secret: &SecretDecl) -> Result<(), CompileError> {
    let id = &secret.secret_id;
    let owner = agent_name(&secret.participant);
    for v in PrivateSecret::ALL {
        b.add_evaluation_rule(
            private_secret_prop(id, v),
            Cond::eq(Expr::attr(owner.as_str(), private_secret_var(id)), value(v)),
        )?;
    }
    for v in PublicSecret::ALL {
        b.add_evaluation_rule(
            public_secret_prop(id, v),
            Cond::eq(Expr::env(public_secret_var(id)), value(v)),
        )?;
    }
    Ok(())
}
