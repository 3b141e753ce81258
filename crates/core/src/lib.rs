//! bitmc-core: BitML contract model and semantic validator.
//!
//! A [`Contract`] is built from participants, preconditions and a root
//! expression, and is validated in two passes:
//!
//! - Pass 1 -- declaration index ([`build_index`]) and scoping of every
//!   identifier referenced in the tree ([`check_scoping`])
//! - Pass 2 -- symbolic funds-flow check ([`check_funds`])
//!
//! Key types are re-exported at the crate root.

pub mod ast;
pub mod contract;
pub mod error;
pub mod index;
pub mod names;
pub mod pass1_scope;
pub mod pass2_funds;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Expr, Participant, Precondition, Predicate, SplitBranch, Term, TxOutput};
pub use contract::{Contract, RawContract};
pub use error::ContractError;
pub use index::Index;

// ── Convenience re-exports: validation passes ────────────────────────

pub use index::build_index;
pub use pass1_scope::check_scoping;
pub use pass2_funds::check_funds;
