//! The validated contract.

use crate::ast::{Expr, Participant, Precondition};
use crate::error::ContractError;
use crate::index::build_index;
use crate::pass1_scope::check_scoping;
use crate::pass2_funds::check_funds;
use serde::{Deserialize, Serialize};

/// A contract that passed both validation passes.
///
/// Fields are private so that every `Contract` in existence has been
/// validated; deserialisation goes through [`Contract::new`] as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContract")]
pub struct Contract {
    participants: Vec<Participant>,
    preconditions: Vec<Precondition>,
    root: Expr,
}

/// Unvalidated wire form of a [`Contract`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawContract {
    pub participants: Vec<Participant>,
    pub preconditions: Vec<Precondition>,
    pub root: Expr,
}

impl TryFrom<RawContract> for Contract {
    type Error = ContractError;

    fn try_from(raw: RawContract) -> Result<Self, Self::Error> {
        Contract::new(raw.participants, raw.preconditions, raw.root)
    }
}

impl Contract {
    /// Validate and build a contract.
    ///
    /// Pass 1 indexes declarations and resolves every identifier in the tree;
    /// pass 2 runs the funds-flow check. The first error aborts.
    pub fn new(
        participants: Vec<Participant>,
        preconditions: Vec<Precondition>,
        root: Expr,
    ) -> Result<Self, ContractError> {
        // Pass 1: declarations, then the tree
        let idx = build_index(&participants, &preconditions)?;
        check_scoping(&root, &idx)?;

        // Pass 2: funds flow
        check_funds(&preconditions, &root)?;

        Ok(Contract {
            participants,
            preconditions,
            root,
        })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Participant identifiers in declaration order.
    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.identifier.as_str())
    }
}
