use crate::grammar::{Role, Section};

/// A malformed interpreted-system value.
///
/// Raised eagerly by the builders, so a malformed condition is reported at
/// the call that inserted it rather than when the system is rendered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IsplError {
    #[error("invalid {what} identifier \"{id}\"")]
    InvalidId { what: &'static str, id: String },

    #[error(
        "integer range type not valid: expected lower bound {lower} smaller than upper bound {upper}"
    )]
    InvalidRange { lower: i64, upper: i64 },

    /// An empty enum, action set, effect list, etc.
    #[error("{what} requires at least one {item}")]
    Empty {
        what: String,
        item: &'static str,
    },

    #[error("duplicate {what} \"{id}\" in {scope}")]
    Duplicate {
        what: &'static str,
        id: String,
        scope: String,
    },

    /// A condition uses a construct its (section, role) slot forbids.
    #[error("boolean condition {condition} is not valid in {section} of {role}: {offending} is not allowed there")]
    Grammar {
        section: Section,
        role: Role,
        condition: String,
        offending: String,
    },

    #[error("formula {formula} is not a valid fair formula: strategic operators are not allowed")]
    UnfairFormula { formula: String },

    #[error("{context} refers to unknown {what} \"{id}\"")]
    UnknownReference {
        context: String,
        what: &'static str,
        id: String,
    },
}
