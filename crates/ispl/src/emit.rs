//! ISPL text emitter.

use crate::ids::ENVIRONMENT;
use crate::model::{
    join_ids, Agent, Environment, EvolutionRule, InterpretedSystem, Protocol, VarDef,
};
use crate::expr::Cond;
use crate::formula::Formula;
use std::fmt::Write as _;

const INDENT: &str = "  ";

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{INDENT}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `name:` + indented body + `end name`.
fn section(name: &str, body: &str, colon: bool) -> String {
    format!(
        "{name}{}\n{}\nend {name}",
        if colon { ":" } else { "" },
        indent(body)
    )
}

fn var_section(name: &str, vars: &[VarDef]) -> Option<String> {
    if vars.is_empty() {
        return None;
    }
    let body = vars
        .iter()
        .map(|v| format!("{v};"))
        .collect::<Vec<_>>()
        .join("\n");
    Some(section(name, &body, true))
}

fn red_states_section(red: Option<&Cond>) -> Option<String> {
    red.map(|c| section("RedStates", &format!("{c};"), true))
}

fn protocol_section(protocol: &Protocol) -> String {
    let mut lines: Vec<String> = protocol
        .rules
        .iter()
        .map(|r| format!("{}: {{{}}};", r.condition, join_ids(&r.actions)))
        .collect();
    if !protocol.other.is_empty() {
        lines.push(format!("Other: {{{}}};", join_ids(&protocol.other)));
    }
    section("Protocol", &lines.join("\n"), true)
}

fn evolution_rule(rule: &EvolutionRule) -> String {
    let effects = rule
        .effects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ");
    format!("{effects} if {};", rule.condition)
}

fn evolution_section(rules: &[EvolutionRule]) -> String {
    let body = rules.iter().map(evolution_rule).collect::<Vec<_>>().join("\n");
    section("Evolution", &body, true)
}

fn agent_block(name: &str, parts: Vec<Option<String>>) -> String {
    let body = parts.into_iter().flatten().collect::<Vec<_>>().join("\n");
    format!("Agent {name}\n{}\nend Agent", indent(&body))
}

fn environment(env: &Environment) -> String {
    agent_block(
        ENVIRONMENT,
        vec![
            var_section("Obsvars", &env.obsvars),
            var_section("Vars", &env.vars),
            red_states_section(env.red_states.as_ref()),
            Some(format!("Actions = {{{}}};", join_ids(&env.actions))),
            Some(protocol_section(&env.protocol)),
            Some(evolution_section(&env.evolution)),
        ],
    )
}

fn agent(agent: &Agent) -> String {
    let lobsvars = (!agent.lobsvars.is_empty())
        .then(|| format!("Lobsvars = {{{}}};", join_ids(&agent.lobsvars)));
    agent_block(
        &agent.name,
        vec![
            lobsvars,
            var_section("Vars", &agent.vars),
            red_states_section(agent.red_states.as_ref()),
            Some(format!("Actions = {{{}}};", join_ids(&agent.actions))),
            Some(protocol_section(&agent.protocol)),
            Some(evolution_section(&agent.evolution)),
        ],
    )
}

fn formulae_section(name: &str, formulae: &[Formula]) -> String {
    let body = formulae
        .iter()
        .map(|f| format!("{f};"))
        .collect::<Vec<_>>()
        .join("\n");
    section(name, &body, false)
}

/// Render a model as ISPL source text.
pub fn to_ispl(system: &InterpretedSystem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Semantics={};", system.semantics());
    let _ = writeln!(out, "{}", environment(system.environment()));
    for a in system.agents() {
        let _ = writeln!(out, "{}", agent(a));
    }

    let evaluation = system
        .evaluation()
        .iter()
        .map(|r| format!("{} if {}", r.prop, r.condition))
        .collect::<Vec<_>>()
        .join(";\n")
        + ";";
    let _ = writeln!(out, "{}", section("Evaluation", &evaluation, false));
    let _ = writeln!(
        out,
        "{}",
        section("InitStates", &format!("{};", system.init_states()), false)
    );

    let groups = system
        .groups()
        .iter()
        .map(|g| format!("{} = {{{}}};", g.name, join_ids(&g.members)))
        .collect::<Vec<_>>()
        .join("\n");
    let _ = writeln!(out, "{}", section("Groups", &groups, false));
    if !system.fairness().is_empty() {
        let _ = writeln!(out, "{}", formulae_section("Fairness", system.fairness()));
    }
    let _ = writeln!(out, "{}", formulae_section("Formulae", system.formulae()));
    out
}
