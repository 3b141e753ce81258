//! Lexical rules for contract identifiers.

use crate::error::ContractError;

/// Words reserved by the contract surface syntax.
pub const KEYWORDS: &[&str] = &[
    "after",
    "and",
    "auth",
    "between",
    "check",
    "check-liquid",
    "check-query",
    "choice",
    "contract",
    "debug-mode",
    "define",
    "deposit",
    "fee",
    "or",
    "not",
    "participant",
    "pre",
    "pred",
    "put",
    "putrevealif",
    "reveal",
    "revealif",
    "secret",
    "split",
    "vol-deposit",
    "withdraw",
];

/// `^[A-Za-z_][A-Za-z0-9_]*$`, excluding [`KEYWORDS`].
pub fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&s)
}

/// `^[0-9a-f]*$`
pub fn is_hex(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

pub(crate) fn check_name(kind: &'static str, value: &str) -> Result<(), ContractError> {
    if is_name(value) {
        Ok(())
    } else {
        Err(ContractError::InvalidName {
            kind,
            value: value.to_owned(),
        })
    }
}

pub(crate) fn check_hex(kind: &'static str, value: &str) -> Result<(), ContractError> {
    if is_hex(value) {
        Ok(())
    } else {
        Err(ContractError::InvalidHex {
            kind,
            value: value.to_owned(),
        })
    }
}
