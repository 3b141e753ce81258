//! Interpreted-system model types.
//!
//! Values here are plain data. The builders in [`crate::builder`] are the
//! only way to obtain an [`InterpretedSystem`], and they validate everything
//! on the way in.

use crate::error::IsplError;
use crate::expr::{Cond, Expr};
use crate::formula::Formula;
use crate::ids::check_id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ──────────────────────────────────────────────
// Variables
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VarType {
    Boolean,
    Range { lower: i64, upper: i64 },
    Enum { values: BTreeSet<String> },
}

impl VarType {
    /// An integer range `lower..upper`; requires `lower < upper`.
    pub fn range(lower: i64, upper: i64) -> Result<Self, IsplError> {
        if lower < upper {
            Ok(VarType::Range { lower, upper })
        } else {
            Err(IsplError::InvalidRange { lower, upper })
        }
    }

    /// An enumeration over at least one identifier.
    pub fn enumeration<I, S>(values: I) -> Result<Self, IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(IsplError::Empty {
                what: "enum type".to_owned(),
                item: "value",
            });
        }
        for v in &values {
            check_id("enum value", v)?;
        }
        Ok(VarType::Enum { values })
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Boolean => f.write_str("boolean"),
            VarType::Range { lower, upper } => write!(f, "{lower}..{upper}"),
            VarType::Enum { values } => write!(f, "{{{}}}", join_ids(values)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VarType,
}

impl fmt::Display for VarDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

// ──────────────────────────────────────────────
// Protocols and evolution
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolRule {
    pub condition: Cond,
    pub actions: BTreeSet<String>,
}

/// Guarded rules plus the `Other` fallback. An empty `other` means no
/// `Other` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Protocol {
    pub rules: Vec<ProtocolRule>,
    pub other: BTreeSet<String>,
}

impl Protocol {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.other.is_empty()
    }

    /// Every action named by a rule or by `Other`.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|r| r.actions.iter())
            .chain(self.other.iter())
            .map(String::as_str)
    }
}

/// `var = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub var: String,
    pub value: Expr,
}

impl Effect {
    pub fn new(var: impl Into<String>, value: Expr) -> Self {
        Effect {
            var: var.into(),
            value,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.var, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvolutionRule {
    pub effects: Vec<Effect>,
    pub condition: Cond,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRule {
    pub prop: String,
    pub condition: Cond,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: BTreeSet<String>,
}

// ──────────────────────────────────────────────
// Agents and the system
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub obsvars: Vec<VarDef>,
    pub vars: Vec<VarDef>,
    pub red_states: Option<Cond>,
    pub actions: BTreeSet<String>,
    pub protocol: Protocol,
    pub evolution: Vec<EvolutionRule>,
}

impl Environment {
    /// Observable and private variables, in declaration order.
    pub fn all_vars(&self) -> impl Iterator<Item = &VarDef> {
        self.obsvars.iter().chain(self.vars.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub name: String,
    /// Environment variables this agent may read locally.
    pub lobsvars: Vec<String>,
    pub vars: Vec<VarDef>,
    pub red_states: Option<Cond>,
    pub actions: BTreeSet<String>,
    pub protocol: Protocol,
    pub evolution: Vec<EvolutionRule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Semantics {
    #[default]
    SingleAssignment,
    MultiAssignment,
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Semantics::SingleAssignment => "SingleAssignment",
            Semantics::MultiAssignment => "MultiAssignment",
        })
    }
}

/// A complete, validated model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpretedSystem {
    pub(crate) semantics: Semantics,
    pub(crate) environment: Environment,
    pub(crate) agents: Vec<Agent>,
    pub(crate) evaluation: Vec<EvaluationRule>,
    pub(crate) init_states: Cond,
    pub(crate) groups: Vec<Group>,
    pub(crate) fairness: Vec<Formula>,
    pub(crate) formulae: Vec<Formula>,
}

impl InterpretedSystem {
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn evaluation(&self) -> &[EvaluationRule] {
        &self.evaluation
    }

    pub fn evaluation_rule(&self, prop: &str) -> Option<&EvaluationRule> {
        self.evaluation.iter().find(|r| r.prop == prop)
    }

    pub fn init_states(&self) -> &Cond {
        &self.init_states
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn fairness(&self) -> &[Formula] {
        &self.fairness
    }

    pub fn formulae(&self) -> &[Formula] {
        &self.formulae
    }
}

pub(crate) fn join_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    let mut sorted: Vec<&str> = ids.into_iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(", ")
}
