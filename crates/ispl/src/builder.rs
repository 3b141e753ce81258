//! Incremental builders for the environment, the agents and the system.
//!
//! Every insertion is checked immediately: identifiers, duplicates and the
//! (section, role) grammar of each condition. [`SystemBuilder::compile`]
//! then checks everything that can only be known once all contributions
//! are in (actions used by protocols, variables assigned by evolution
//! rules, references from formulae and groups).

use crate::error::IsplError;
use crate::expr::Cond;
use crate::formula::Formula;
use crate::grammar::{check_condition, Role, Section};
use crate::ids::{check_id, is_group_member, ENVIRONMENT};
use crate::model::{
    Agent, Effect, Environment, EvaluationRule, EvolutionRule, Group, InterpretedSystem,
    Protocol, ProtocolRule, Semantics, VarDef, VarType,
};
use std::collections::{BTreeSet, HashSet};

fn action_set<I, S>(what: &str, actions: I) -> Result<BTreeSet<String>, IsplError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = actions.into_iter().map(Into::into).collect();
    if set.is_empty() {
        return Err(IsplError::Empty {
            what: what.to_owned(),
            item: "action",
        });
    }
    for a in &set {
        check_id("action", a)?;
    }
    Ok(set)
}

fn evolution_rule(
    role: Role,
    effects: Vec<Effect>,
    condition: Cond,
) -> Result<EvolutionRule, IsplError> {
    if effects.is_empty() {
        return Err(IsplError::Empty {
            what: "evolution rule".to_owned(),
            item: "effect",
        });
    }
    for e in &effects {
        check_id("variable", &e.var)?;
    }
    check_condition(Section::Evolution, role, &condition)?;
    Ok(EvolutionRule { effects, condition })
}

/// State shared by the environment and agent builders.
#[derive(Debug, Default)]
struct Body {
    var_names: HashSet<String>,
    red_states: Option<Cond>,
    actions: BTreeSet<String>,
    protocol: Protocol,
    evolution: Vec<EvolutionRule>,
}

impl Body {
    fn declare(&mut self, owner: &str, name: &str) -> Result<(), IsplError> {
        check_id("variable", name)?;
        if !self.var_names.insert(name.to_owned()) {
            return Err(IsplError::Duplicate {
                what: "variable",
                id: name.to_owned(),
                scope: owner.to_owned(),
            });
        }
        Ok(())
    }

    fn add_action(&mut self, action: &str) -> Result<(), IsplError> {
        check_id("action", action)?;
        self.actions.insert(action.to_owned());
        Ok(())
    }

    /// Actions used by the protocol must be declared; assigned variables
    /// must be the owner's own.
    fn check_closed(&self, owner: &str) -> Result<(), IsplError> {
        for action in self.protocol.actions() {
            if !self.actions.contains(action) {
                return Err(IsplError::UnknownReference {
                    context: format!("protocol of {owner}"),
                    what: "action",
                    id: action.to_owned(),
                });
            }
        }
        for rule in &self.evolution {
            for effect in &rule.effects {
                if !self.var_names.contains(&effect.var) {
                    return Err(IsplError::UnknownReference {
                        context: format!("evolution of {owner}"),
                        what: "variable",
                        id: effect.var.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Environment
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    obsvars: Vec<VarDef>,
    vars: Vec<VarDef>,
    body: Body,
}

impl EnvironmentBuilder {
    /// Declare a variable every agent can observe.
    pub fn add_obsvar(&mut self, name: impl Into<String>, ty: VarType) -> Result<(), IsplError> {
        let name = name.into();
        self.body.declare(ENVIRONMENT, &name)?;
        self.obsvars.push(VarDef { name, ty });
        Ok(())
    }

    pub fn add_var(&mut self, name: impl Into<String>, ty: VarType) -> Result<(), IsplError> {
        let name = name.into();
        self.body.declare(ENVIRONMENT, &name)?;
        self.vars.push(VarDef { name, ty });
        Ok(())
    }

    pub fn add_action(&mut self, action: impl AsRef<str>) -> Result<(), IsplError> {
        self.body.add_action(action.as_ref())
    }

    /// Declared actions, sorted.
    pub fn actions(&self) -> &BTreeSet<String> {
        &self.body.actions
    }

    pub fn set_red_states(&mut self, condition: Cond) -> Result<(), IsplError> {
        check_condition(Section::RedStates, Role::Environment, &condition)?;
        self.body.red_states = Some(condition);
        Ok(())
    }

    pub fn add_protocol_rule<I, S>(&mut self, condition: Cond, actions: I) -> Result<(), IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        check_condition(Section::Protocol, Role::Environment, &condition)?;
        let actions = action_set("environment protocol rule", actions)?;
        self.body.protocol.rules.push(ProtocolRule { condition, actions });
        Ok(())
    }

    /// Add actions to the `Other` fallback rule.
    pub fn add_to_other<I, S>(&mut self, actions: I) -> Result<(), IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = action_set("environment Other rule", actions)?;
        self.body.protocol.other.extend(actions);
        Ok(())
    }

    pub fn add_evolution_rule(
        &mut self,
        effects: Vec<Effect>,
        condition: Cond,
    ) -> Result<(), IsplError> {
        let rule = evolution_rule(Role::Environment, effects, condition)?;
        self.body.evolution.push(rule);
        Ok(())
    }

    fn build(self) -> Result<Environment, IsplError> {
        self.body.check_closed(ENVIRONMENT)?;
        Ok(Environment {
            obsvars: self.obsvars,
            vars: self.vars,
            red_states: self.body.red_states,
            actions: self.body.actions,
            protocol: self.body.protocol,
            evolution: self.body.evolution,
        })
    }
}

// ──────────────────────────────────────────────
// Agents
// ──────────────────────────────────────────────

#[derive(Debug)]
pub struct AgentBuilder {
    name: String,
    lobsvars: Vec<String>,
    vars: Vec<VarDef>,
    body: Body,
}

impl AgentBuilder {
    fn new(name: String) -> Self {
        AgentBuilder {
            name,
            lobsvars: Vec::new(),
            vars: Vec::new(),
            body: Body::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_vars(&self) -> bool {
        !self.vars.is_empty()
    }

    pub fn add_var(&mut self, name: impl Into<String>, ty: VarType) -> Result<(), IsplError> {
        let name = name.into();
        self.body.declare(&self.name, &name)?;
        self.vars.push(VarDef { name, ty });
        Ok(())
    }

    /// Let this agent read a private environment variable.
    pub fn add_lobsvar(&mut self, name: impl Into<String>) -> Result<(), IsplError> {
        let name = name.into();
        check_id("local observable", &name)?;
        if self.lobsvars.contains(&name) {
            return Err(IsplError::Duplicate {
                what: "local observable",
                id: name,
                scope: self.name.clone(),
            });
        }
        self.lobsvars.push(name);
        Ok(())
    }

    pub fn add_action(&mut self, action: impl AsRef<str>) -> Result<(), IsplError> {
        self.body.add_action(action.as_ref())
    }

    pub fn set_red_states(&mut self, condition: Cond) -> Result<(), IsplError> {
        check_condition(Section::RedStates, Role::Agent, &condition)?;
        self.body.red_states = Some(condition);
        Ok(())
    }

    pub fn add_protocol_rule<I, S>(&mut self, condition: Cond, actions: I) -> Result<(), IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        check_condition(Section::Protocol, Role::Agent, &condition)?;
        let actions = action_set("agent protocol rule", actions)?;
        self.body.protocol.rules.push(ProtocolRule { condition, actions });
        Ok(())
    }

    pub fn add_to_other<I, S>(&mut self, actions: I) -> Result<(), IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = action_set("agent Other rule", actions)?;
        self.body.protocol.other.extend(actions);
        Ok(())
    }

    pub fn add_evolution_rule(
        &mut self,
        effects: Vec<Effect>,
        condition: Cond,
    ) -> Result<(), IsplError> {
        let rule = evolution_rule(Role::Agent, effects, condition)?;
        self.body.evolution.push(rule);
        Ok(())
    }

    fn build(self, env: &Environment) -> Result<Agent, IsplError> {
        let empty = |item| IsplError::Empty {
            what: format!("agent {}", self.name),
            item,
        };
        if self.vars.is_empty() {
            return Err(empty("variable"));
        }
        if self.body.actions.is_empty() {
            return Err(empty("action"));
        }
        if self.body.protocol.is_empty() {
            return Err(empty("protocol rule"));
        }
        for lobs in &self.lobsvars {
            if !env.all_vars().any(|v| &v.name == lobs) {
                return Err(IsplError::UnknownReference {
                    context: format!("Lobsvars of {}", self.name),
                    what: "environment variable",
                    id: lobs.clone(),
                });
            }
        }
        self.body.check_closed(&self.name)?;
        Ok(Agent {
            name: self.name,
            lobsvars: self.lobsvars,
            vars: self.vars,
            red_states: self.body.red_states,
            actions: self.body.actions,
            protocol: self.body.protocol,
            evolution: self.body.evolution,
        })
    }
}

// ──────────────────────────────────────────────
// System
// ──────────────────────────────────────────────

/// Accumulates a whole interpreted system.
///
/// Agents keep their insertion order; the emitted model lists them in
/// that order.
#[derive(Debug, Default)]
pub struct SystemBuilder {
    semantics: Semantics,
    env: EnvironmentBuilder,
    agents: Vec<AgentBuilder>,
    evaluation: Vec<EvaluationRule>,
    init_states: Vec<Cond>,
    groups: Vec<Group>,
    fairness: Vec<Formula>,
    formulae: Vec<Formula>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_semantics(semantics: Semantics) -> Self {
        SystemBuilder {
            semantics,
            ..Self::default()
        }
    }

    pub fn env(&mut self) -> &mut EnvironmentBuilder {
        &mut self.env
    }

    pub fn add_agent(&mut self, name: impl Into<String>) -> Result<&mut AgentBuilder, IsplError> {
        let name = name.into();
        check_id("agent", &name)?;
        if self.agents.iter().any(|a| a.name == name) {
            return Err(IsplError::Duplicate {
                what: "agent",
                id: name,
                scope: "interpreted system".to_owned(),
            });
        }
        self.agents.push(AgentBuilder::new(name));
        let idx = self.agents.len() - 1;
        Ok(&mut self.agents[idx])
    }

    pub fn agent(&mut self, name: &str) -> Result<&mut AgentBuilder, IsplError> {
        self.agents
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| IsplError::UnknownReference {
                context: "interpreted system".to_owned(),
                what: "agent",
                id: name.to_owned(),
            })
    }

    /// Agent names in insertion order.
    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    pub fn add_evaluation_rule(
        &mut self,
        prop: impl Into<String>,
        condition: Cond,
    ) -> Result<(), IsplError> {
        let prop = prop.into();
        check_id("proposition", &prop)?;
        if self.has_proposition(&prop) {
            return Err(IsplError::Duplicate {
                what: "proposition",
                id: prop,
                scope: "Evaluation".to_owned(),
            });
        }
        self.evaluation.push(EvaluationRule { prop, condition });
        Ok(())
    }

    pub fn has_proposition(&self, prop: &str) -> bool {
        self.evaluation.iter().any(|r| r.prop == prop)
    }

    /// Add one conjunct of the initial-states condition.
    pub fn add_initial_state(&mut self, condition: Cond) -> Result<(), IsplError> {
        check_condition(Section::InitialState, Role::Environment, &condition)?;
        self.init_states.push(condition);
        Ok(())
    }

    pub fn add_group<I, S>(&mut self, name: impl Into<String>, members: I) -> Result<(), IsplError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        check_id("group", &name)?;
        if self.groups.iter().any(|g| g.name == name) {
            return Err(IsplError::Duplicate {
                what: "group",
                id: name,
                scope: "Groups".to_owned(),
            });
        }
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(IsplError::Empty {
                what: format!("group {name}"),
                item: "member",
            });
        }
        if let Some(bad) = members.iter().find(|m| !is_group_member(m)) {
            return Err(IsplError::InvalidId {
                what: "group member",
                id: bad.clone(),
            });
        }
        self.groups.push(Group { name, members });
        Ok(())
    }

    pub fn add_fair_formula(&mut self, formula: Formula) -> Result<(), IsplError> {
        if !formula.is_fair() {
            return Err(IsplError::UnfairFormula {
                formula: formula.to_string(),
            });
        }
        self.fairness.push(formula);
        Ok(())
    }

    pub fn add_formula(&mut self, formula: Formula) {
        self.formulae.push(formula);
    }

    /// Assemble and validate the system.
    pub fn compile(self) -> Result<InterpretedSystem, IsplError> {
        let environment = self.env.build()?;
        if self.agents.is_empty() {
            return Err(IsplError::Empty {
                what: "interpreted system".to_owned(),
                item: "agent",
            });
        }
        let agents = self
            .agents
            .into_iter()
            .map(|a| a.build(&environment))
            .collect::<Result<Vec<_>, _>>()?;

        if self.evaluation.is_empty() {
            return Err(IsplError::Empty {
                what: "Evaluation".to_owned(),
                item: "rule",
            });
        }
        let init_states = Cond::all(self.init_states).ok_or_else(|| IsplError::Empty {
            what: "InitStates".to_owned(),
            item: "condition",
        })?;
        if self.groups.is_empty() {
            return Err(IsplError::Empty {
                what: "Groups".to_owned(),
                item: "group",
            });
        }

        let agent_names: HashSet<&str> = agents.iter().map(|a| a.name.as_str()).collect();
        for group in &self.groups {
            for member in &group.members {
                if member != ENVIRONMENT && !agent_names.contains(member.as_str()) {
                    return Err(IsplError::UnknownReference {
                        context: format!("group {}", group.name),
                        what: "agent",
                        id: member.clone(),
                    });
                }
            }
        }

        let props: HashSet<&str> = self.evaluation.iter().map(|r| r.prop.as_str()).collect();
        let groups: HashSet<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
        for formula in self.fairness.iter().chain(self.formulae.iter()) {
            check_formula_refs(formula, &props, &groups, &agent_names)?;
        }

        Ok(InterpretedSystem {
            semantics: self.semantics,
            environment,
            agents,
            evaluation: self.evaluation,
            init_states,
            groups: self.groups,
            fairness: self.fairness,
            formulae: self.formulae,
        })
    }
}

fn check_formula_refs(
    formula: &Formula,
    props: &HashSet<&str>,
    groups: &HashSet<&str>,
    agents: &HashSet<&str>,
) -> Result<(), IsplError> {
    let unknown = |what, id: &str| IsplError::UnknownReference {
        context: format!("formula {formula}"),
        what,
        id: id.to_owned(),
    };
    if let Some(atom) = formula.atoms().into_iter().find(|a| !props.contains(a)) {
        return Err(unknown("proposition", atom));
    }
    if let Some(group) = formula.groups().into_iter().find(|g| !groups.contains(g)) {
        return Err(unknown("group", group));
    }
    if let Some(agent) = formula.agents().into_iter().find(|a| !agents.contains(a)) {
        return Err(unknown("agent", agent));
    }
    Ok(())
}
