//! Transformer passes.
//!
//! Each pass adds one concern to the model under construction. Later
//! passes rely on names registered by earlier ones, so the order returned
//! by [`pipeline`] is fixed. The action-history pass enumerates the final
//! environment action set and must stay last.

pub mod deposits;
pub mod execution;
pub mod initialization;
pub mod last_action;
pub mod scheduling;
pub mod secrets;
pub mod time_progression;

use crate::context::ContractContext;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::terms::agent_name;
use bitmc_ispl::{AgentBuilder, SystemBuilder};

pub trait Transformer {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ctx: &ContractContext,
        opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError>;
}

/// All passes, in application order.
pub fn pipeline() -> Vec<Box<dyn Transformer>> {
    vec![
        Box::new(scheduling::Scheduling),
        Box::new(time_progression::TimeProgression),
        Box::new(deposits::Deposits),
        Box::new(secrets::Secrets),
        Box::new(initialization::Initialization),
        Box::new(execution::Execution),
        Box::new(last_action::LastAction),
    ]
}

pub(crate) fn agent_of<'a>(
    b: &'a mut SystemBuilder,
    participant: &str,
) -> Result<&'a mut AgentBuilder, CompileError> {
    Ok(b.agent(&agent_name(participant))?)
}
