//! Compile options, loadable from TOML.

use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Switches for the optional parts of the generated model.
///
/// ```toml
/// initialization_fairness = false
/// secret_fairness = false
/// coalition_groups = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Require contract initialization to happen infinitely often on fair
    /// paths. Off by default: its interaction with the model checker's
    /// fairness handling is unsettled.
    pub initialization_fairness: bool,
    /// Require every secret to be eventually committed or revealed on fair
    /// paths. Off by default for the same reason.
    pub secret_fairness: bool,
    /// Emit one group per non-trivial coalition of participants.
    pub coalition_groups: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            initialization_fairness: false,
            secret_fairness: false,
            coalition_groups: true,
        }
    }
}

impl CompileOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, CompileError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::OptionsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
