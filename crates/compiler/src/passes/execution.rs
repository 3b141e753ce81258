//! Contract execution: one `disabled -> enabled -> executed` state machine
//! per execution node.
//!
//! A node is enabled once its parent has executed (or the contract has
//! been initialized, for top-level nodes), its authorizations are granted,
//! its timeouts have expired, its deposits are unspent, its secrets are
//! revealed and no sibling branch of an enclosing `Choice` has executed.
//! Every condition also accepts the event happening in the current round,
//! so a chain of nodes can advance one step per round.
//!
//! `Choice` nodes carry no state. Their branches are wired directly to the
//! nearest executable ancestor, and the branches disable each other.

use super::{agent_of, Transformer};
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::graph::{Node, NodeKind};
use crate::objects::{
    done_is_false_seen_by_agent, initialized_is_seen_by_agent, initialized_now_or_already,
    scheduled_agent_takes, some_scheduled_agent_takes,
};
use crate::options::CompileOptions;
use crate::terms::{
    authorize_action, authorized_prop, authorized_var, exec_action, public_secret_var,
    reveal_action, spent_var, status_prop, status_var, total_deposits_var, NodeStatus,
    PublicSecret, CONTRACT_FUNDS, DELAY, NOP, TIME,
};
use bitmc_core::ContractError;
use bitmc_ispl::{Cond, Effect, Expr, SystemBuilder, VarType};

pub struct Execution;

impl Transformer for Execution {
    fn name(&self) -> &'static str {
        "contract-execution"
    }

    fn apply(
        &self,
        ctx: &ContractContext,
        _opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        for node in ctx.graph().nodes() {
            if node.kind.is_choice() {
                continue;
            }
            NodeRules::new(ctx, node).apply(b)?;
        }
        Ok(())
    }
}

fn status_value(status: NodeStatus) -> Expr {
    Expr::id(status.as_str())
}

/// Environment view: `node` has executed, in this round or earlier. For a
/// `Choice`, whichever branch executed.
fn executed_now_or_earlier(ctx: &ContractContext, node: &Node) -> Cond {
    if node.kind.is_choice() {
        let graph = ctx.graph();
        return node
            .children
            .iter()
            .map(|&c| executed_now_or_earlier(ctx, graph.node(c)))
            .reduce(|acc, c| acc | c)
            .unwrap_or_else(|| Cond::eq(Expr::False, Expr::True));
    }
    let full_id = node.full_id();
    Cond::eq(Expr::id(status_var(&full_id)), status_value(NodeStatus::Executed))
        | some_scheduled_agent_takes(ctx, &exec_action(&full_id))
}

struct NodeRules<'a> {
    ctx: &'a ContractContext,
    node: &'a Node,
    full_id: String,
    status: String,
    exec: String,
}

impl<'a> NodeRules<'a> {
    fn new(ctx: &'a ContractContext, node: &'a Node) -> Self {
        let full_id = node.full_id();
        NodeRules {
            ctx,
            node,
            status: status_var(&full_id),
            exec: exec_action(&full_id),
            full_id,
        }
    }

    fn apply(&self, b: &mut SystemBuilder) -> Result<(), CompileError> {
        for auth in &self.node.auths {
            b.env()
                .add_obsvar(authorized_var(&self.full_id, auth), VarType::Boolean)?;
        }
        b.env().add_obsvar(
            self.status.as_str(),
            VarType::enumeration(NodeStatus::ALL.iter().map(|s| s.as_str()))?,
        )?;

        for (effect, condition) in self.exec_effects()? {
            b.env().add_evolution_rule(vec![effect], condition)?;
        }
        for auth in &self.node.auths {
            b.env().add_evolution_rule(
                vec![Effect::new(authorized_var(&self.full_id, auth), Expr::True)],
                self.authorized_now(auth),
            )?;
        }
        b.env().add_evolution_rule(
            vec![Effect::new(self.status.as_str(), status_value(NodeStatus::Enabled))],
            self.enable_condition()?,
        )?;
        if let Some(condition) = self.sibling_executed() {
            b.env().add_evolution_rule(
                vec![Effect::new(self.status.as_str(), status_value(NodeStatus::Disabled))],
                condition,
            )?;
        }

        for status in NodeStatus::ALL {
            b.add_evaluation_rule(
                status_prop(&self.full_id, status),
                Cond::eq(Expr::env(self.status.as_str()), status_value(status)),
            )?;
        }
        for auth in &self.node.auths {
            b.add_evaluation_rule(
                authorized_prop(&self.full_id, auth),
                Cond::eq(Expr::env(authorized_var(&self.full_id, auth)), Expr::True),
            )?;
        }

        self.add_agent_actions(b)?;

        for auth in &self.node.auths {
            b.add_initial_state(Cond::eq(
                Expr::env(authorized_var(&self.full_id, auth)),
                Expr::False,
            ))?;
        }
        b.add_initial_state(Cond::eq(
            Expr::env(self.status.as_str()),
            status_value(NodeStatus::Disabled),
        ))?;
        Ok(())
    }

    /// Single-assignment effects of executing the node, each guarded by
    /// the exec action.
    fn exec_effects(&self) -> Result<Vec<(Effect, Cond)>, CompileError> {
        let fired = some_scheduled_agent_takes(self.ctx, &self.exec);
        let executed = Effect::new(self.status.as_str(), status_value(NodeStatus::Executed));
        let funds = Expr::id(CONTRACT_FUNDS);
        let mut effects = Vec::new();

        match &self.node.kind {
            NodeKind::Withdraw { participant } => {
                let amount = self.ctx.funds_of(self.node);
                let total = total_deposits_var(participant);
                effects.push(Effect::new(CONTRACT_FUNDS, funds - Expr::int(amount)));
                effects.push(Effect::new(
                    total.as_str(),
                    Expr::id(total.as_str()) + Expr::int(amount),
                ));
                effects.push(executed);
            }
            NodeKind::Split | NodeKind::Reveal { .. } => effects.push(executed),
            NodeKind::Put { deposit_ids } | NodeKind::PutReveal { deposit_ids, .. } => {
                effects.push(executed);
                let mut spent = Vec::new();
                let mut sum = 0i64;
                for id in deposit_ids {
                    let deposit = self.ctx.volatile_deposit(id).ok_or_else(|| {
                        ContractError::VolatileDepositNotDefined {
                            deposit_id: id.clone(),
                        }
                    })?;
                    sum = sum
                        .checked_add(deposit.amount)
                        .ok_or_else(|| CompileError::overflow("funds after put"))?;
                    let owner_total = total_deposits_var(&deposit.participant);
                    spent.push(Effect::new(spent_var(id), Expr::True));
                    spent.push(Effect::new(
                        owner_total.as_str(),
                        Expr::id(owner_total.as_str()) - Expr::int(deposit.amount),
                    ));
                }
                effects.push(Effect::new(CONTRACT_FUNDS, funds + Expr::int(sum)));
                effects.extend(spent);
            }
            NodeKind::Choice => {}
        }
        Ok(effects.into_iter().map(|e| (e, fired.clone())).collect())
    }

    fn authorized_now(&self, participant: &str) -> Cond {
        scheduled_agent_takes(participant, &authorize_action(&self.full_id))
    }

    /// The nearest executable ancestor has executed; for top-level nodes,
    /// the contract is initialized.
    fn parent_executed(&self) -> Cond {
        match self.ctx.graph().executable_ancestor(self.node) {
            Some(ancestor) => executed_now_or_earlier(self.ctx, ancestor),
            None => initialized_now_or_already(self.ctx),
        }
    }

    fn deposits_unspent(&self) -> Option<Cond> {
        Cond::all(
            self.node
                .kind
                .deposit_ids()
                .iter()
                .map(|id| Cond::eq(Expr::id(spent_var(id)), Expr::False)),
        )
    }

    fn secrets_revealed(&self) -> Result<Option<Cond>, CompileError> {
        let mut clauses = Vec::new();
        for id in self.node.kind.secret_ids() {
            let secret = self
                .ctx
                .secret(id)
                .ok_or_else(|| ContractError::SecretNotDefined {
                    secret_id: id.clone(),
                })?;
            let already = Cond::eq(
                Expr::id(public_secret_var(id)),
                Expr::id(PublicSecret::Valid.as_str()),
            );
            clauses.push(already | scheduled_agent_takes(&secret.participant, &reveal_action(id)));
        }
        Ok(Cond::all(clauses))
    }

    fn auths_granted(&self) -> Option<Cond> {
        Cond::all(self.node.auths.iter().map(|auth| {
            Cond::eq(Expr::id(authorized_var(&self.full_id, auth)), Expr::True)
                | self.authorized_now(auth)
        }))
    }

    /// The clock has reached the largest timeout, or reaches it now.
    fn timeouts_expired(&self) -> Option<Cond> {
        let t = i64::from(*self.node.afters.last()?);
        Some(
            Cond::ge(Expr::id(TIME), Expr::int(t))
                | (Cond::eq(Expr::id(TIME), Expr::int(t - 1)) & Cond::action(DELAY)),
        )
    }

    fn sibling_executed(&self) -> Option<Cond> {
        let siblings = self.ctx.graph().choice_siblings(self.node)?;
        Cond::any(siblings.into_iter().map(|s| executed_now_or_earlier(self.ctx, s)))
    }

    fn enable_condition(&self) -> Result<Cond, CompileError> {
        let disabled = Cond::eq(
            Expr::id(self.status.as_str()),
            status_value(NodeStatus::Disabled),
        );
        let mut condition = self.parent_executed() & disabled;
        condition = match self.node.kind {
            NodeKind::Put { .. } => condition.and_opt(self.deposits_unspent()),
            NodeKind::Reveal { .. } => condition.and_opt(self.secrets_revealed()?),
            NodeKind::PutReveal { .. } => condition
                .and_opt(self.secrets_revealed()?)
                .and_opt(self.deposits_unspent()),
            NodeKind::Withdraw { .. } | NodeKind::Split | NodeKind::Choice => condition,
        };
        let condition = condition
            .and_opt(self.auths_granted())
            .and_opt(self.timeouts_expired());
        Ok(condition.and_opt(self.sibling_executed().map(|c| !c)))
    }

    fn add_agent_actions(&self, b: &mut SystemBuilder) -> Result<(), CompileError> {
        let has_timeouts = self.ctx.has_timeouts();
        for p in self.ctx.participants() {
            let not_done = has_timeouts.then(|| done_is_false_seen_by_agent(p));
            let agent = agent_of(b, p)?;

            agent.add_action(&self.exec)?;
            agent.add_protocol_rule(
                Cond::eq(Expr::env(self.status.as_str()), status_value(NodeStatus::Enabled))
                    .and_opt(not_done.clone()),
                [self.exec.as_str(), NOP],
            )?;

            if self.node.auths.contains(p) {
                let authorize = authorize_action(&self.full_id);
                agent.add_action(&authorize)?;
                agent.add_protocol_rule(
                    (Cond::eq(Expr::env(authorized_var(&self.full_id, p)), Expr::False)
                        & initialized_is_seen_by_agent(true))
                    .and_opt(not_done),
                    [authorize.as_str(), NOP],
                )?;
            }
        }
        Ok(())
    }
}
