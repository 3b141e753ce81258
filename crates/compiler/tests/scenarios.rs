use bitmc_compiler::{CompileError, CompileJob, CompileOptions, Compiler};
use bitmc_core::{Contract, ContractError, Expr, Participant, Precondition, TxOutput};
use bitmc_ispl::{to_ispl, EvolutionRule, Formula, InterpretedSystem, VarType};
use rust_decimal::Decimal;

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

fn participants(ids: &[&str]) -> Vec<Participant> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| Participant {
            identifier: (*id).to_owned(),
            pubkey: format!("{:02x}", i + 1),
        })
        .collect()
}

fn tx(id: &str) -> TxOutput {
    TxOutput {
        tx_identifier: id.to_owned(),
        index: 0,
    }
}

fn deposit(p: &str, amount: i64, t: &str) -> Precondition {
    Precondition::Deposit {
        participant: p.to_owned(),
        amount: d(amount),
        tx: tx(t),
    }
}

fn vol(p: &str, id: &str, amount: i64, t: &str) -> Precondition {
    Precondition::VolatileDeposit {
        participant: p.to_owned(),
        deposit_id: id.to_owned(),
        amount: d(amount),
        tx: tx(t),
    }
}

fn secret(p: &str, id: &str, hash: &str) -> Precondition {
    Precondition::Secret {
        participant: p.to_owned(),
        secret_id: id.to_owned(),
        secret_hash: hash.to_owned(),
    }
}

/// `A` deposits 1 and withdraws it.
fn single_withdraw() -> Contract {
    Contract::new(participants(&["A"]), vec![deposit("A", 1, "t1")], Expr::withdraw("A")).unwrap()
}

fn compile(ids: &[&str], preconditions: Vec<Precondition>, root: Expr) -> InterpretedSystem {
    compile_with(ids, preconditions, root, CompileOptions::default())
}

fn compile_with(
    ids: &[&str],
    preconditions: Vec<Precondition>,
    root: Expr,
    options: CompileOptions,
) -> InterpretedSystem {
    let contract = Contract::new(participants(ids), preconditions, root).unwrap();
    Compiler::new(contract, vec![Formula::ef(Formula::atom("contract_is_initialized"))])
        .unwrap()
        .with_options(options)
        .compile()
        .unwrap()
}

/// Environment evolution rules assigning `var`, as `(value, condition)` text.
fn env_rules(sys: &InterpretedSystem, var: &str) -> Vec<(String, String)> {
    sys.environment()
        .evolution
        .iter()
        .filter(|r: &&EvolutionRule| r.effects.iter().any(|e| e.var == var))
        .map(|r| (r.effects[0].value.to_string(), r.condition.to_string()))
        .collect()
}

fn rule_for(sys: &InterpretedSystem, var: &str, value: &str) -> String {
    env_rules(sys, var)
        .into_iter()
        .find(|(v, _)| v == value)
        .map(|(_, c)| c)
        .unwrap_or_else(|| panic!("no rule {var} = {value}"))
}

fn has_env_var(sys: &InterpretedSystem, name: &str) -> bool {
    sys.environment().all_vars().any(|v| v.name == name)
}

// ──────────────────────────────────────────────
// Minimal withdraw
// ──────────────────────────────────────────────

#[test]
fn minimal_withdraw() {
    let sys = compile(&["A"], vec![deposit("A", 5, "t1")], Expr::withdraw("A"));
    let init = sys.init_states().to_string();
    assert!(init.contains("(Environment.status_node_0_withdraw = disabled)"));
    assert!(init.contains("(Environment.contract_funds = 5)"));
    assert!(init.contains("(Environment.part_A_total_deposits = 0)"));
    assert!(init.contains("(Environment.contract_initialized = false)"));

    // enabled once the contract is initialized
    assert_eq!(
        rule_for(&sys, "status_node_0_withdraw", "enabled"),
        "((((Action = schedule_part_A) and (Agent_A.Action = initialize_contract)) \
         or (contract_initialized = true)) and (status_node_0_withdraw = disabled))"
    );

    // executed by a scheduled participant, moving the funds
    let fired = "((Action = schedule_part_A) and (Agent_A.Action = exec_node_0_withdraw))";
    assert_eq!(rule_for(&sys, "status_node_0_withdraw", "executed"), fired);
    assert_eq!(rule_for(&sys, "contract_funds", "(contract_funds - 5)"), fired);
    assert_eq!(
        rule_for(&sys, "part_A_total_deposits", "(part_A_total_deposits + 5)"),
        fired
    );

    let agent = sys.agent("Agent_A").unwrap();
    assert!(agent.actions.contains("exec_node_0_withdraw"));
    assert!(agent.actions.contains("initialize_contract"));
    assert!(agent.protocol.rules.iter().any(|r| {
        r.condition.to_string() == "(Environment.status_node_0_withdraw = enabled)"
            && r.actions.contains("exec_node_0_withdraw")
            && r.actions.contains("nop")
    }));
    // no secrets: the placeholder variable keeps the agent well-formed
    assert_eq!(agent.vars[0].name, "dummy");
    assert!(init.contains("(Agent_A.dummy = false)"));

    assert!(!has_env_var(&sys, "time"));
    assert!(sys.environment().protocol.other.contains("schedule_part_A"));
    assert!(sys.evaluation_rule("node_0_withdraw_is_executed").is_some());
    assert!(sys.evaluation_rule("part_A_is_scheduled").is_some());

    let groups: Vec<&str> = sys.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(groups, ["Participants", "Env", "ParticipantsAndEnv"]);
}

#[test]
fn last_action_enumerates_every_environment_action() {
    let sys = compile(&["A", "B"], vec![deposit("A", 1, "t1")], Expr::withdraw("B"));
    let last = sys
        .environment()
        .vars
        .iter()
        .find(|v| v.name == "last_action")
        .unwrap();
    assert_eq!(
        last.ty.to_string(),
        "{action_schedule_part_A, action_schedule_part_B, unset}"
    );
    assert_eq!(
        rule_for(&sys, "last_action", "action_schedule_part_B"),
        "(Action = schedule_part_B)"
    );
}

// ──────────────────────────────────────────────
// Timeouts
// ──────────────────────────────────────────────

#[test]
fn timeout_gating() {
    let root = Expr::choice(vec![
        Expr::auth("B", Expr::withdraw("B")),
        Expr::after(5, Expr::withdraw("A")),
    ]);
    let sys = compile(&["A", "B"], vec![deposit("A", 2, "t1")], root);

    let time = sys.environment().obsvars.iter().find(|v| v.name == "time").unwrap();
    assert_eq!(time.ty, VarType::Range { lower: 0, upper: 5 });

    // never enabled before the clock reaches 5
    let enable = rule_for(&sys, "status_node_1_withdraw", "enabled");
    assert!(enable.contains("and ((time >= 5) or ((time = 4) and (Action = delay))))"));

    // the clock only ticks when every participant is done
    assert_eq!(
        rule_for(&sys, "time", "(time + 1)"),
        "(((Action = delay) and ((part_A_is_done = true) and (part_B_is_done = true))) \
         and (time < 5))"
    );
    assert!(sys.environment().vars.iter().any(|v| v.name == "part_A_is_done"));
    assert!(sys.environment().protocol.other.contains("delay"));
    assert!(sys
        .environment()
        .protocol
        .rules
        .iter()
        .any(|r| r.condition.to_string() == "(part_B_is_done = false)"
            && r.actions.contains("schedule_part_B")));

    let agent = sys.agent("Agent_A").unwrap();
    assert_eq!(agent.lobsvars, ["part_A_is_done"]);
    let expected = "((Environment.status_node_1_withdraw = enabled) \
                    and (Environment.part_A_is_done = false))";
    assert!(agent
        .protocol
        .rules
        .iter()
        .any(|r| r.condition.to_string() == expected));

    assert_eq!(
        sys.evaluation_rule("timeout_5_has_expired").unwrap().condition.to_string(),
        "(Environment.time >= 5)"
    );
    assert!(sys
        .fairness()
        .contains(&Formula::atom("time_progresses_forever")));
}

#[test]
fn zero_timeout_clock_has_two_values() {
    let root = Expr::after(0, Expr::withdraw("A"));
    let sys = compile(&["A"], vec![deposit("A", 1, "t1")], root);
    let time = sys.environment().obsvars.iter().find(|v| v.name == "time").unwrap();
    assert_eq!(time.ty, VarType::Range { lower: 0, upper: 1 });
}

// ──────────────────────────────────────────────
// Choice, authorization, put, reveal
// ──────────────────────────────────────────────

#[test]
fn choice_exclusivity() {
    let root = Expr::choice(vec![Expr::withdraw("A"), Expr::withdraw("B")]);
    let sys = compile(&["A", "B"], vec![deposit("A", 1, "t1")], root);

    let other_executed = "((status_node_1_withdraw = executed) or \
        (((Action = schedule_part_A) and (Agent_A.Action = exec_node_1_withdraw)) or \
        ((Action = schedule_part_B) and (Agent_B.Action = exec_node_1_withdraw))))";
    assert_eq!(rule_for(&sys, "status_node_0_withdraw", "disabled"), other_executed);
    assert!(rule_for(&sys, "status_node_0_withdraw", "enabled")
        .ends_with(&format!("and (!{other_executed}))")));

    // the choice itself has no state
    assert!(!has_env_var(&sys, "status_node_2_choice"));
    assert!(!sys.agent("Agent_A").unwrap().actions.contains("exec_node_2_choice"));
}

#[test]
fn nested_choice_refers_to_nearest_executable_ancestor() {
    let root = Expr::split(vec![
        (d(1), Expr::withdraw("A")),
        (
            d(1),
            Expr::choice(vec![
                Expr::withdraw("A"),
                Expr::choice(vec![Expr::withdraw("A"), Expr::withdraw("B")]),
            ]),
        ),
    ]);
    // 0-3 withdraw, 4 inner choice, 5 outer choice, 6 split
    let sys = compile(&["A", "B"], vec![deposit("A", 2, "t1")], root);
    let enable = rule_for(&sys, "status_node_2_withdraw", "enabled");
    assert!(enable.starts_with("((((status_node_6_split = executed)"));

    // node_1 is disabled once either branch of the inner choice executes
    let disable = rule_for(&sys, "status_node_1_withdraw", "disabled");
    assert!(disable.contains("status_node_2_withdraw = executed"));
    assert!(disable.contains("status_node_3_withdraw = executed"));

    // and the inner branches are disabled when the outer one executes
    let disable = rule_for(&sys, "status_node_2_withdraw", "disabled");
    assert!(disable.contains("status_node_3_withdraw = executed"));
    assert!(disable.contains("status_node_1_withdraw = executed"));
}

#[test]
fn authorization_flags() {
    let root = Expr::auth("B", Expr::withdraw("A"));
    let sys = compile(&["A", "B"], vec![deposit("A", 1, "t1")], root);

    assert!(has_env_var(&sys, "node_0_withdraw_authorized_by_part_B"));
    assert_eq!(
        rule_for(&sys, "node_0_withdraw_authorized_by_part_B", "true"),
        "((Action = schedule_part_B) and (Agent_B.Action = authorize_node_0_withdraw))"
    );
    assert!(rule_for(&sys, "status_node_0_withdraw", "enabled").ends_with(
        "and ((node_0_withdraw_authorized_by_part_B = true) or \
         ((Action = schedule_part_B) and (Agent_B.Action = authorize_node_0_withdraw))))"
    ));

    assert!(sys.agent("Agent_B").unwrap().actions.contains("authorize_node_0_withdraw"));
    assert!(!sys.agent("Agent_A").unwrap().actions.contains("authorize_node_0_withdraw"));
    assert!(sys.evaluation_rule("node_0_withdraw_is_authorized_by_B").is_some());
}

#[test]
fn put_spends_volatile_deposits() {
    let root = Expr::put(&["x"], Expr::withdraw("A"));
    let sys = compile(
        &["A", "B"],
        vec![deposit("A", 1, "t1"), vol("B", "x", 3, "t2")],
        root,
    );
    let init = sys.init_states().to_string();
    assert!(init.contains("(Environment.part_B_total_deposits = 3)"));
    assert!(init.contains("(Environment.spent_deposit_x = false)"));

    let fired = "(((Action = schedule_part_A) and (Agent_A.Action = exec_node_1_put)) or \
        ((Action = schedule_part_B) and (Agent_B.Action = exec_node_1_put)))";
    assert_eq!(rule_for(&sys, "contract_funds", "(contract_funds + 3)"), fired);
    assert_eq!(rule_for(&sys, "spent_deposit_x", "true"), fired);
    assert_eq!(
        rule_for(&sys, "part_B_total_deposits", "(part_B_total_deposits - 3)"),
        fired
    );
    assert!(rule_for(&sys, "status_node_1_put", "enabled")
        .ends_with("and (spent_deposit_x = false))"));

    // the withdraw below the put moves the merged funds
    assert!(env_rules(&sys, "contract_funds")
        .iter()
        .any(|(v, _)| v == "(contract_funds - 4)"));
}

#[test]
fn secrets_gate_initialization_and_reveal() {
    let root = Expr::reveal(&["s"], Expr::withdraw("A"));
    let sys = compile(
        &["A", "B"],
        vec![deposit("A", 1, "t1"), secret("B", "s", "00ff")],
        root,
    );

    assert_eq!(
        rule_for(&sys, "contract_initialized", "true"),
        "(((contract_initialized = false) and ((public_secret_s = committed) or \
         (public_secret_s = valid))) and (((Action = schedule_part_A) and \
         (Agent_A.Action = initialize_contract)) or ((Action = schedule_part_B) and \
         (Agent_B.Action = initialize_contract))))"
    );

    let owner = sys.agent("Agent_B").unwrap();
    assert_eq!(owner.vars[0].name, "private_secret_s");
    assert!(owner.actions.contains("commit_valid_secret_s"));
    assert!(owner.actions.contains("reveal_secret_s"));
    assert!(owner.evolution.iter().any(|r| {
        r.effects[0].to_string() == "private_secret_s = valid"
            && r.condition.to_string().contains("(Environment.Action = schedule_part_B)")
    }));
    assert_eq!(sys.agent("Agent_A").unwrap().vars[0].name, "dummy");

    assert_eq!(
        rule_for(&sys, "public_secret_s", "valid"),
        "(((Agent_B.Action = reveal_secret_s) and (Action = schedule_part_B)) and \
         (public_secret_s = committed))"
    );
    assert!(rule_for(&sys, "status_node_1_reveal", "enabled").contains(
        "((public_secret_s = valid) or ((Action = schedule_part_B) and \
         (Agent_B.Action = reveal_secret_s)))"
    ));
    assert!(sys.evaluation_rule("private_secret_s_is_invalid").is_some());
    assert!(sys.evaluation_rule("public_secret_s_is_committed").is_some());
}

// ──────────────────────────────────────────────
// Options, groups, jobs
// ──────────────────────────────────────────────

#[test]
fn coalition_groups_follow_option() {
    let precs = vec![deposit("A", 1, "t1")];
    let sys = compile(&["A", "B", "C"], precs.clone(), Expr::withdraw("A"));
    let names: Vec<&str> = sys.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"Agent_A__Agent_C"));
    assert!(names.contains(&"Agent_B"));

    let options = CompileOptions {
        coalition_groups: false,
        initialization_fairness: true,
        secret_fairness: true,
    };
    let sys = compile_with(&["A", "B", "C"], precs, Expr::withdraw("A"), options);
    assert_eq!(sys.groups().len(), 3);
    assert!(sys
        .fairness()
        .contains(&Formula::atom("contract_is_initialized")));
}

#[test]
fn idempotence() {
    let root = Expr::split(vec![
        (d(1), Expr::auth("A", Expr::withdraw("B"))),
        (d(2), Expr::after(3, Expr::withdraw("A"))),
    ]);
    let contract =
        Contract::new(participants(&["A", "B"]), vec![deposit("A", 3, "t1")], root).unwrap();
    let compiler =
        Compiler::new(contract, vec![Formula::atom("node_2_split_is_executed")]).unwrap();
    let first = compiler.compile().unwrap();
    let second = compiler.compile().unwrap();
    assert_eq!(first, second);
    assert_eq!(to_ispl(&first), to_ispl(&second));
}

#[test]
fn job_document_with_extra_rules_and_groups() {
    let job: CompileJob = serde_json::from_value(serde_json::json!({
        "contract": {
            "participants": [
                { "identifier": "A", "pubkey": "01" },
                { "identifier": "B", "pubkey": "02" }
            ],
            "preconditions": [
                { "kind": "deposit", "participant": "A", "amount": "3",
                  "tx": { "tx_identifier": "t1", "index": 0 } }
            ],
            "root": { "kind": "withdraw", "participant": "B" }
        },
        "formulae": [
            { "group_eventually": ["Bob", { "atom": "b_is_paid" }] }
        ],
        "evaluation_rules": [
            { "prop": "b_is_paid",
              "condition": { "eq": [{ "env_id": "part_B_total_deposits" }, { "int": 3 }] } }
        ],
        "groups": [ { "name": "Bob", "members": ["Agent_B"] } ]
    }))
    .unwrap();

    let sys = Compiler::from_job(job).unwrap().compile().unwrap();
    assert_eq!(sys.groups().last().unwrap().name, "Bob");
    assert_eq!(
        sys.evaluation().last().unwrap().condition.to_string(),
        "(Environment.part_B_total_deposits = 3)"
    );
    let text = to_ispl(&sys);
    assert!(text.contains("(<Bob>F(b_is_paid));"));
}

#[test]
fn user_group_clashing_with_generated_one() {
    let contract = single_withdraw();
    let err = Compiler::new(contract, vec![Formula::atom("contract_is_initialized")])
        .unwrap()
        .with_groups(vec![bitmc_ispl::Group {
            name: "Env".to_owned(),
            members: ["Agent_A".to_owned()].into(),
        }])
        .compile()
        .unwrap_err();
    assert!(matches!(err, CompileError::Ispl(_)));
}

// ──────────────────────────────────────────────
// Rejections
// ──────────────────────────────────────────────

#[test]
fn double_lock() {
    let err = Contract::new(
        participants(&["A", "B"]),
        vec![deposit("A", 1, "t1"), deposit("B", 1, "t1")],
        Expr::withdraw("A"),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::TxAlreadyLocked { .. }));

    let json = serde_json::json!({
        "contract": {
            "participants": [ { "identifier": "A", "pubkey": "01" } ],
            "preconditions": [
                { "kind": "deposit", "participant": "A", "amount": "1",
                  "tx": { "tx_identifier": "t1", "index": 0 } },
                { "kind": "fee", "participant": "A", "amount": "1",
                  "tx": { "tx_identifier": "t1", "index": 0 } }
            ],
            "root": { "kind": "withdraw", "participant": "A" }
        },
        "formulae": [ { "atom": "contract_is_initialized" } ]
    });
    let err = serde_json::from_value::<CompileJob>(json).unwrap_err();
    assert!(err.to_string().contains("already locked"));
}

#[test]
fn split_mismatch() {
    let root = Expr::split(vec![(d(1), Expr::withdraw("A")), (d(1), Expr::withdraw("A"))]);
    let err = Contract::new(participants(&["A"]), vec![deposit("A", 3, "t1")], root).unwrap_err();
    assert_eq!(err, ContractError::SplitMismatch { spends: d(2), receives: d(3) });
    assert_eq!(err.pass(), 2);
}

#[test]
fn unsupported_constructs() {
    let fee = Precondition::Fee {
        participant: "A".to_owned(),
        amount: d(1),
        tx: tx("f1"),
    };
    let contract = Contract::new(
        participants(&["A"]),
        vec![deposit("A", 1, "t1"), fee],
        Expr::withdraw("A"),
    )
    .unwrap();
    let err = Compiler::new(contract, vec![Formula::atom("contract_is_initialized")]).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { .. }));

    let root = Expr::after(
        1,
        Expr::choice(vec![Expr::withdraw("A"), Expr::withdraw("A")]),
    );
    let contract = Contract::new(participants(&["A"]), vec![deposit("A", 1, "t1")], root).unwrap();
    let err = Compiler::new(contract, vec![Formula::atom("contract_is_initialized")]).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn deposits_past_the_integer_range() {
    let deposit = |t: &str| Precondition::Deposit {
        participant: "A".to_owned(),
        amount: d(i64::MAX),
        tx: tx(t),
    };
    let contract = Contract::new(
        participants(&["A"]),
        vec![deposit("t1"), deposit("t2")],
        Expr::withdraw("A"),
    )
    .unwrap();
    let err = Compiler::new(contract, vec![Formula::atom("contract_is_initialized")])
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(err, CompileError::AmountOverflow { .. }));
}

#[test]
fn no_formulae() {
    let contract = single_withdraw();
    let err = Compiler::new(contract, Vec::new()).unwrap_err();
    assert_eq!(err.to_string(), "required at least one formula for the compilation");
}

#[test]
fn formula_over_unknown_proposition() {
    let contract = single_withdraw();
    let err = Compiler::new(contract, vec![Formula::atom("nobody_defines_this")])
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(err.to_string().contains("nobody_defines_this"));
}
