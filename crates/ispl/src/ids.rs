//! ISPL identifier rules.

use crate::error::IsplError;

/// Name of the environment agent. Only valid as a group member.
pub const ENVIRONMENT: &str = "Environment";

pub const KEYWORDS: &[&str] = &[
    "A",
    "AF",
    "AG",
    "AX",
    "Action",
    "Actions",
    "DK",
    "E",
    "EF",
    "EG",
    "EX",
    ENVIRONMENT,
    "Evaluation",
    "Evolution",
    "F",
    "Fairness",
    "Formulae",
    "G",
    "GCK",
    "GK",
    "GreenStates",
    "Groups",
    "InitStates",
    "K",
    "Lobsvars",
    "MA",
    "MultiAssignment",
    "O",
    "Obsvars",
    "Other",
    "Protocol",
    "RedStates",
    "SAAgent",
    "Semantics",
    "SingleAssignment",
    "U",
    "Vars",
    "X",
    "and",
    "boolean",
    "end",
    "false",
    "if",
    "or",
    "true",
];

fn matches_pattern(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `^[A-Za-z][_A-Za-z0-9]*$`, excluding [`KEYWORDS`].
pub fn is_ispl_id(s: &str) -> bool {
    matches_pattern(s) && !KEYWORDS.contains(&s)
}

/// Like [`is_ispl_id`], but also accepts [`ENVIRONMENT`].
pub fn is_group_member(s: &str) -> bool {
    s == ENVIRONMENT || is_ispl_id(s)
}

pub(crate) fn check_id(what: &'static str, id: &str) -> Result<(), IsplError> {
    if is_ispl_id(id) {
        Ok(())
    } else {
        Err(IsplError::InvalidId {
            what,
            id: id.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids() {
        assert!(is_ispl_id("status_node_0_withdraw"));
        assert!(is_ispl_id("Agent_A"));
        assert!(!is_ispl_id("_x"));
        assert!(!is_ispl_id("0x"));
        assert!(!is_ispl_id("Other"));
        assert!(!is_ispl_id("Environment"));
    }

    #[test]
    fn environment_is_a_group_member() {
        assert!(is_group_member(ENVIRONMENT));
        assert!(is_group_member("Agent_B"));
        assert!(!is_group_member("end"));
    }
}
