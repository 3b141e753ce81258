//! bitmc-compiler: BitML contract -> MCMAS interpreted system.
//!
//! The contract is linearised into an execution graph ([`graph`]), then a
//! fixed sequence of transformer passes ([`passes`]) builds the model:
//!
//! - scheduling -- one agent per participant, one scheduled per round
//! - time progression -- global clock, only with timeouts
//! - deposits -- contract pool and per-participant balances
//! - secrets -- commitment and reveal lifecycle
//! - contract initialization
//! - contract execution -- one state machine per execution node
//! - last action -- history variable for evaluation rules
//!
//! [`Compiler`] runs the passes, adds groups, formulae and caller-supplied
//! evaluation rules, and validates the result.

pub mod compile;
pub mod context;
pub mod error;
pub mod graph;
pub mod objects;
pub mod options;
pub mod passes;
pub mod supported;
pub mod terms;

pub use compile::{CompileJob, Compiler};
pub use context::ContractContext;
pub use error::CompileError;
pub use graph::{ExecutionGraph, Node, NodeId, NodeKind};
pub use options::CompileOptions;
pub use supported::check_supported;
