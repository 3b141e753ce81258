//! Per-slot grammars for boolean conditions.
//!
//! Where a condition appears (its [`Section`]) and who owns it (its
//! [`Role`]) decide which constructs it may use:
//!
//! | section        | role        | leaves                         | action tests                      |
//! |----------------|-------------|--------------------------------|-----------------------------------|
//! | protocol       | environment | own ids, literals              | none                              |
//! | protocol       | agent       | own ids, `Environment.x`, literals | none                          |
//! | evolution      | environment | own ids, literals              | `Action`, `<agent>.Action`        |
//! | evolution      | agent       | own ids, `Environment.x`, literals | `Action`, `<agent>.Action`, `Environment.Action` |
//! | initial state  | either      | `x.y = const` only             | none                              |
//!
//! Red states share the protocol grammar of their role.

use crate::error::IsplError;
use crate::expr::{Cond, Expr};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Protocol,
    Evolution,
    InitialState,
    RedStates,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Protocol => "protocol",
            Section::Evolution => "evolution",
            Section::InitialState => "initial states",
            Section::RedStates => "red states",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Environment,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Environment => "environment",
            Role::Agent => "agent",
        })
    }
}

/// What a (section, role) slot admits.
#[derive(Debug, Clone, Copy)]
struct Slot {
    env_ids: bool,
    own_action: bool,
    agent_action: bool,
    env_action: bool,
}

impl Slot {
    fn of(section: Section, role: Role) -> Slot {
        let agent = role == Role::Agent;
        match section {
            Section::Protocol | Section::RedStates | Section::InitialState => Slot {
                env_ids: agent,
                own_action: false,
                agent_action: false,
                env_action: false,
            },
            Section::Evolution => Slot {
                env_ids: agent,
                own_action: true,
                agent_action: true,
                env_action: agent,
            },
        }
    }
}

/// Check `cond` against the grammar of `(section, role)`.
///
/// The error carries the first offending subtree, rendered as ISPL text.
pub fn check_condition(section: Section, role: Role, cond: &Cond) -> Result<(), IsplError> {
    let offending = if section == Section::InitialState {
        offending_init(cond)
    } else {
        offending_cond(Slot::of(section, role), cond)
    };
    match offending {
        None => Ok(()),
        Some(offending) => Err(IsplError::Grammar {
            section,
            role,
            condition: cond.to_string(),
            offending,
        }),
    }
}

/// `true` when `cond` fits the `(section, role)` grammar.
pub fn is_valid_condition(section: Section, role: Role, cond: &Cond) -> bool {
    check_condition(section, role, cond).is_ok()
}

fn offending_cond(slot: Slot, cond: &Cond) -> Option<String> {
    match cond {
        Cond::Eq(l, r)
        | Cond::Ne(l, r)
        | Cond::Lt(l, r)
        | Cond::Le(l, r)
        | Cond::Gt(l, r)
        | Cond::Ge(l, r) => offending_expr(slot, l).or_else(|| offending_expr(slot, r)),
        Cond::Action(_) if slot.own_action => None,
        Cond::AgentAction(..) if slot.agent_action => None,
        Cond::EnvAction(_) if slot.env_action => None,
        Cond::Action(_) | Cond::AgentAction(..) | Cond::EnvAction(_) => Some(cond.to_string()),
        Cond::Not(arg) => offending_cond(slot, arg),
        Cond::And(l, r) | Cond::Or(l, r) => {
            offending_cond(slot, l).or_else(|| offending_cond(slot, r))
        }
    }
}

fn offending_expr(slot: Slot, expr: &Expr) -> Option<String> {
    match expr {
        Expr::True | Expr::False | Expr::Int(_) | Expr::Id(_) => None,
        Expr::EnvId(_) if slot.env_ids => None,
        Expr::EnvId(_) | Expr::Attr(..) => Some(expr.to_string()),
        Expr::Add(l, r)
        | Expr::Sub(l, r)
        | Expr::Mul(l, r)
        | Expr::Div(l, r)
        | Expr::BitOr(l, r)
        | Expr::BitAnd(l, r)
        | Expr::BitXor(l, r) => offending_expr(slot, l).or_else(|| offending_expr(slot, r)),
        Expr::BitNot(arg) => offending_expr(slot, arg),
    }
}

/// Initial states: `and`/`or`/`!` over `object.var = constant` equalities.
fn offending_init(cond: &Cond) -> Option<String> {
    match cond {
        Cond::Eq(l, r) => {
            let left_ok = matches!(l, Expr::Attr(..) | Expr::EnvId(_));
            let right_ok = matches!(
                r,
                Expr::Attr(..)
                    | Expr::EnvId(_)
                    | Expr::True
                    | Expr::False
                    | Expr::Int(_)
                    | Expr::Id(_)
            );
            if left_ok && right_ok {
                None
            } else {
                Some(cond.to_string())
            }
        }
        Cond::Not(arg) => offending_init(arg),
        Cond::And(l, r) | Cond::Or(l, r) => offending_init(l).or_else(|| offending_init(r)),
        _ => Some(cond.to_string()),
    }
}
