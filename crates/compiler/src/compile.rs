//! Pipeline orchestrator: contract in, interpreted system out.

use crate::context::ContractContext;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::passes::pipeline;
use crate::supported::check_supported;
use crate::terms::{DUMMY_VAR, ENV_GROUP, PARTICIPANTS_AND_ENV_GROUP, PARTICIPANTS_GROUP};
use bitmc_core::Contract;
use bitmc_ispl::{
    Cond, Effect, EvaluationRule, Expr, Formula, Group, InterpretedSystem, SystemBuilder,
    VarType, ENVIRONMENT,
};
use serde::Deserialize;
use tracing::info;

/// Everything a compilation needs besides options, as read from a job
/// document.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileJob {
    pub contract: Contract,
    pub formulae: Vec<Formula>,
    #[serde(default)]
    pub evaluation_rules: Vec<EvaluationRule>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone)]
pub struct Compiler {
    contract: Contract,
    formulae: Vec<Formula>,
    evaluation_rules: Vec<EvaluationRule>,
    groups: Vec<Group>,
    options: CompileOptions,
}

impl Compiler {
    /// Fails early for contracts outside the supported subset and for an
    /// empty formula list.
    pub fn new(contract: Contract, formulae: Vec<Formula>) -> Result<Self, CompileError> {
        check_supported(&contract)?;
        if formulae.is_empty() {
            return Err(CompileError::NoFormulae);
        }
        Ok(Compiler {
            contract,
            formulae,
            evaluation_rules: Vec::new(),
            groups: Vec::new(),
            options: CompileOptions::default(),
        })
    }

    pub fn from_job(job: CompileJob) -> Result<Self, CompileError> {
        Ok(Compiler::new(job.contract, job.formulae)?
            .with_evaluation_rules(job.evaluation_rules)
            .with_groups(job.groups))
    }

    /// Extra propositions, added after the generated ones.
    pub fn with_evaluation_rules(mut self, rules: Vec<EvaluationRule>) -> Self {
        self.evaluation_rules = rules;
        self
    }

    /// Extra groups, added after the generated ones.
    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn compile(&self) -> Result<InterpretedSystem, CompileError> {
        let ctx = ContractContext::new(&self.contract)?;
        let mut b = SystemBuilder::new();

        for pass in pipeline() {
            info!(pass = pass.name(), "applying transformer");
            pass.apply(&ctx, &self.options, &mut b)?;
        }

        self.add_groups(&mut b)?;
        for formula in &self.formulae {
            b.add_formula(formula.clone());
        }
        for rule in &self.evaluation_rules {
            b.add_evaluation_rule(rule.prop.as_str(), rule.condition.clone())?;
        }
        add_dummy_vars(&mut b)?;

        let system = b.compile()?;
        info!(
            agents = system.agents().len(),
            evaluation_rules = system.evaluation().len(),
            groups = system.groups().len(),
            "interpreted system compiled"
        );
        Ok(system)
    }

    fn add_groups(&self, b: &mut SystemBuilder) -> Result<(), CompileError> {
        let mut agents = b.agent_names();
        b.add_group(PARTICIPANTS_GROUP, agents.iter().cloned())?;
        b.add_group(ENV_GROUP, [ENVIRONMENT])?;
        b.add_group(
            PARTICIPANTS_AND_ENV_GROUP,
            agents.iter().cloned().chain([ENVIRONMENT.to_owned()]),
        )?;

        if self.options.coalition_groups {
            agents.sort();
            for k in 1..agents.len() {
                for coalition in combinations(&agents, k) {
                    b.add_group(coalition.join("__"), coalition)?;
                }
            }
        }

        for group in &self.groups {
            b.add_group(group.name.as_str(), group.members.iter().cloned())?;
        }
        Ok(())
    }
}

/// ISPL requires at least one variable per agent.
fn add_dummy_vars(b: &mut SystemBuilder) -> Result<(), CompileError> {
    for name in b.agent_names() {
        let agent = b.agent(&name)?;
        if agent.has_vars() {
            continue;
        }
        agent.add_var(DUMMY_VAR, VarType::Boolean)?;
        agent.add_evolution_rule(
            vec![Effect::new(DUMMY_VAR, Expr::False)],
            Cond::eq(Expr::id(DUMMY_VAR), Expr::False),
        )?;
        b.add_initial_state(Cond::eq(Expr::attr(name, DUMMY_VAR), Expr::False))?;
    }
    Ok(())
}

/// All `k`-element subsets of `items`, in lexicographic order of positions.
fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for (i, head) in items.iter().enumerate() {
        for mut tail in combinations(&items[i + 1..], k - 1) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}
