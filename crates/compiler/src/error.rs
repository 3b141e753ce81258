use bitmc_core::ContractError;
use bitmc_ispl::IsplError;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Compilation failed.
///
/// [`CompileError::Contract`], [`CompileError::Unsupported`],
/// [`CompileError::NonIntegralAmount`] and [`CompileError::AmountOverflow`]
/// point at the input contract.
/// [`CompileError::Ispl`] reports a model the target format rejects, such
/// as a user-supplied group clashing with a generated one.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("invalid target model: {0}")]
    Ispl(#[from] IsplError),

    #[error("{construct} is not supported by the compiler")]
    Unsupported { construct: String },

    #[error("required at least one formula for the compilation")]
    NoFormulae,

    #[error("{what} amount {amount} is not an integer")]
    NonIntegralAmount { what: String, amount: Decimal },

    /// A sum of amounts does not fit the model's integer variables.
    #[error("{what} exceeds the integer range of the model")]
    AmountOverflow { what: String },

    #[error("cannot read options file {}: {source}", path.display())]
    OptionsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid compile options: {0}")]
    Options(#[from] toml::de::Error),
}

impl CompileError {
    pub(crate) fn overflow(what: impl Into<String>) -> Self {
        CompileError::AmountOverflow { what: what.into() }
    }

    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        CompileError::Unsupported {
            construct: construct.into(),
        }
    }
}
