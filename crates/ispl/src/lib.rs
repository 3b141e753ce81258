//! bitmc-ispl: interpreted-system model for the MCMAS model checker.
//!
//! Models are assembled through [`SystemBuilder`]; every boolean condition
//! is checked against the grammar of the slot it is inserted into
//! ([`grammar`]), and [`SystemBuilder::compile`] validates the assembled
//! system as a whole. [`emit::to_ispl`] renders the result as ISPL text.

pub mod builder;
pub mod emit;
pub mod error;
pub mod expr;
pub mod formula;
pub mod grammar;
pub mod ids;
pub mod model;

// ── Convenience re-exports: key types ────────────────────────────────

pub use builder::{AgentBuilder, EnvironmentBuilder, SystemBuilder};
pub use error::IsplError;
pub use expr::{Cond, Expr};
pub use formula::Formula;
pub use grammar::{Role, Section};
pub use ids::ENVIRONMENT;
pub use model::{
    Agent, Effect, Environment, EvaluationRule, EvolutionRule, Group, InterpretedSystem,
    Protocol, ProtocolRule, Semantics, VarDef, VarType,
};

// ── Convenience re-exports: checks and output ────────────────────────

pub use emit::to_ispl;
pub use grammar::{check_condition, is_valid_condition};
