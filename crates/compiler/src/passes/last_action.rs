//! Remembers the environment's last action so that evaluation rules can
//! refer to it (`Environment.Action` is not visible there).

use super::Transformer;
use crate::context::ContractContext;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::terms::{action_value, LAST_ACTION, UNSET_ACTION};
use bitmc_ispl::{Cond, Effect, Expr, SystemBuilder, VarType};

pub struct LastAction;

impl Transformer for LastAction {
    fn name(&self) -> &'static str {
        "last-action"
    }

    fn apply(
        &self,
        _ctx: &ContractContext,
        _opts: &CompileOptions,
        b: &mut SystemBuilder,
    ) -> Result<(), CompileError> {
        let actions: Vec<String> = b.env().actions().iter().cloned().collect();
        let values = actions
            .iter()
            .map(|a| action_value(a))
            .chain(std::iter::once(UNSET_ACTION.to_owned()));
        b.env().add_var(LAST_ACTION, VarType::enumeration(values)?)?;

        for action in &actions {
            b.env().add_evolution_rule(
                vec![Effect::new(LAST_ACTION, Expr::id(action_value(action)))],
                Cond::action(action.as_str()),
            )?;
        }
        b.add_initial_state(Cond::eq(Expr::env(LAST_ACTION), Expr::id(UNSET_ACTION)))?;
        Ok(())
    }
}
