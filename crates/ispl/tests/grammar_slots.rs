use bitmc_ispl::{
    check_condition, is_valid_condition, Cond, Effect, Expr, IsplError, Role, Section,
    SystemBuilder, VarType,
};

fn env_action() -> Cond {
    Cond::env_action("schedule_part_A")
}

#[test]
fn action_tests_are_confined_to_evolution() {
    let own = Cond::action("delay");
    let agent = Cond::agent_action("Agent_A", "nop");

    for role in [Role::Environment, Role::Agent] {
        assert!(is_valid_condition(Section::Evolution, role, &own));
        assert!(is_valid_condition(Section::Evolution, role, &agent));
        assert!(!is_valid_condition(Section::Protocol, role, &own));
        assert!(!is_valid_condition(Section::RedStates, role, &agent));
    }

    // only agents observe what the environment did
    assert!(is_valid_condition(Section::Evolution, Role::Agent, &env_action()));
    assert!(!is_valid_condition(Section::Evolution, Role::Environment, &env_action()));
}

#[test]
fn environment_variables_are_visible_to_agents_only() {
    let read = Cond::eq(Expr::env("time"), Expr::int(0));
    assert!(is_valid_condition(Section::Protocol, Role::Agent, &read));
    assert!(!is_valid_condition(Section::Protocol, Role::Environment, &read));
}

#[test]
fn initial_states_compare_qualified_variables_to_constants() {
    let ok = Cond::eq(Expr::attr("Agent_A", "dummy"), Expr::False);
    assert!(is_valid_condition(Section::InitialState, Role::Environment, &ok));

    let unqualified = Cond::eq(Expr::id("dummy"), Expr::False);
    assert!(!is_valid_condition(Section::InitialState, Role::Environment, &unqualified));
}

#[test]
fn grammar_error_names_the_offending_subtree() {
    let cond = Cond::eq(Expr::id("x"), Expr::int(1)) & env_action();
    let err = check_condition(Section::Protocol, Role::Agent, &cond).unwrap_err();
    match &err {
        IsplError::Grammar { offending, .. } => {
            assert_eq!(offending, "(Environment.Action = schedule_part_A)")
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("protocol of agent"));
}

#[test]
fn builder_rejects_misplaced_conditions_at_insertion() {
    let mut b = SystemBuilder::new();
    b.env().add_obsvar("time", VarType::range(0, 1).unwrap()).unwrap();
    b.env().add_action("delay").unwrap();
    let err = b
        .env()
        .add_evolution_rule(
            vec![Effect::new("time", Expr::int(1))],
            Cond::env_action("delay"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        IsplError::Grammar {
            section: Section::Evolution,
            role: Role::Environment,
            ..
        }
    ));
}
