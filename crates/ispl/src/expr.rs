//! Value expressions and boolean conditions.
//!
//! `&`, `|` and `!` build conjunctions, disjunctions and negations of
//! [`Cond`]s; `+` and `-` build arithmetic [`Expr`]s. `Display` renders the
//! ISPL text form, fully parenthesised.

use crate::ids::ENVIRONMENT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops;

/// A value: literal, variable reference or arithmetic/bitwise term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    True,
    False,
    Int(i64),
    /// A variable of the enclosing agent, or an enum value.
    Id(String),
    /// `Environment.<var>`
    EnvId(String),
    /// `<object>.<var>`
    Attr(String, String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    BitOr(Box<Expr>, Box<Expr>),
    BitAnd(Box<Expr>, Box<Expr>),
    BitXor(Box<Expr>, Box<Expr>),
    BitNot(Box<Expr>),
}

impl Expr {
    pub fn id(name: impl Into<String>) -> Self {
        Expr::Id(name.into())
    }

    pub fn env(var: impl Into<String>) -> Self {
        Expr::EnvId(var.into())
    }

    pub fn attr(object: impl Into<String>, var: impl Into<String>) -> Self {
        Expr::Attr(object.into(), var.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Int(value)
    }

    pub fn bool(value: bool) -> Self {
        if value {
            Expr::True
        } else {
            Expr::False
        }
    }
}

impl ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::True => f.write_str("true"),
            Expr::False => f.write_str("false"),
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Id(id) => f.write_str(id),
            Expr::EnvId(var) => write!(f, "{ENVIRONMENT}.{var}"),
            Expr::Attr(object, var) => write!(f, "{object}.{var}"),
            Expr::Add(l, r) => write!(f, "({l} + {r})"),
            Expr::Sub(l, r) => write!(f, "({l} - {r})"),
            Expr::Mul(l, r) => write!(f, "({l} * {r})"),
            Expr::Div(l, r) => write!(f, "({l} / {r})"),
            Expr::BitOr(l, r) => write!(f, "({l} | {r})"),
            Expr::BitAnd(l, r) => write!(f, "({l} & {r})"),
            Expr::BitXor(l, r) => write!(f, "({l} ^ {r})"),
            Expr::BitNot(arg) => write!(f, "(~{arg})"),
        }
    }
}

// ──────────────────────────────────────────────
// Boolean conditions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cond {
    Eq(Expr, Expr),
    Ne(Expr, Expr),
    Lt(Expr, Expr),
    Le(Expr, Expr),
    Gt(Expr, Expr),
    Ge(Expr, Expr),
    /// `Action = a`: the enclosing agent's own action.
    Action(String),
    /// `<agent>.Action = a`
    AgentAction(String, String),
    /// `Environment.Action = a`
    EnvAction(String),
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

impl Cond {
    pub fn eq(left: Expr, right: Expr) -> Self {
        Cond::Eq(left, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Cond::Lt(left, right)
    }

    pub fn ge(left: Expr, right: Expr) -> Self {
        Cond::Ge(left, right)
    }

    pub fn action(action: impl Into<String>) -> Self {
        Cond::Action(action.into())
    }

    pub fn agent_action(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Cond::AgentAction(agent.into(), action.into())
    }

    pub fn env_action(action: impl Into<String>) -> Self {
        Cond::EnvAction(action.into())
    }

    /// Left-folded conjunction; `None` for an empty iterator.
    pub fn all(conds: impl IntoIterator<Item = Cond>) -> Option<Cond> {
        conds.into_iter().reduce(|acc, c| acc & c)
    }

    /// Left-folded disjunction; `None` for an empty iterator.
    pub fn any(conds: impl IntoIterator<Item = Cond>) -> Option<Cond> {
        conds.into_iter().reduce(|acc, c| acc | c)
    }

    /// `self & other`, or just `self` when `other` is `None`.
    pub fn and_opt(self, other: Option<Cond>) -> Cond {
        match other {
            Some(c) => self & c,
            None => self,
        }
    }
}

impl ops::BitAnd for Cond {
    type Output = Cond;

    fn bitand(self, rhs: Cond) -> Cond {
        Cond::And(Box::new(self), Box::new(rhs))
    }
}

impl ops::BitOr for Cond {
    type Output = Cond;

    fn bitor(self, rhs: Cond) -> Cond {
        Cond::Or(Box::new(self), Box::new(rhs))
    }
}

impl ops::Not for Cond {
    type Output = Cond;

    fn not(self) -> Cond {
        Cond::Not(Box::new(self))
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::Eq(l, r) => write!(f, "({l} = {r})"),
            Cond::Ne(l, r) => write!(f, "({l} != {r})"),
            Cond::Lt(l, r) => write!(f, "({l} < {r})"),
            Cond::Le(l, r) => write!(f, "({l} <= {r})"),
            Cond::Gt(l, r) => write!(f, "({l} > {r})"),
            Cond::Ge(l, r) => write!(f, "({l} >= {r})"),
            Cond::Action(a) => write!(f, "(Action = {a})"),
            Cond::AgentAction(agent, a) => write!(f, "({agent}.Action = {a})"),
            Cond::EnvAction(a) => write!(f, "({ENVIRONMENT}.Action = {a})"),
            Cond::Not(arg) => write!(f, "(!{arg})"),
            Cond::And(l, r) => write!(f, "({l} and {r})"),
            Cond::Or(l, r) => write!(f, "({l} or {r})"),
        }
    }
}
