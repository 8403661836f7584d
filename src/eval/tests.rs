use crate::eval::eval_program;
use crate::parser::parse_program;
use crate::value::Value;

fn run(source: &str) -> Value {
    let program = parse_program(source).expect("parse failed");
    eval_program(&program).expect("eval failed")
}

fn run_err(source: &str) -> String {
    let program = parse_program(source).expect("parse failed");
    eval_program(&program).expect_err("expected eval failure").message
}

#[test]
fn declare_and_define_bind_values() {
    assert_eq!(run("吾有一數。曰五。名之曰「甲」。「甲」"), Value::Int(5));
}

#[test]
fn define_pads_short_initializers_with_zero_value() {
    assert_eq!(run("吾有二數。曰五。名之曰「甲」、「乙」。「乙」"), Value::Int(0));
}

#[test]
fn define_writes_its_value_to_it_directly() {
    assert_eq!(run("吾有一數。曰五。名之曰「甲」"), Value::Int(5));
}

#[test]
fn bare_declare_writes_its_value_to_it_directly() {
    assert_eq!(run("吾有一言。曰『乙』"), Value::Str("乙".to_string()));
}

#[test]
fn loop_scenario_prints_the_declared_value_via_it_each_iteration() {
    // §8 "Loop" scenario: the bare declare inside the loop body must write `其`
    // before the following statement reads it, each iteration — not just once.
    let source = "為是三遍。吾有一言。曰『乙』。云云";
    assert_eq!(run(source), Value::Str("乙".to_string()));
}

#[test]
fn assign_updates_existing_binding() {
    assert_eq!(run("吾有一數。曰五。名之曰「甲」。昔之「甲」者今九是也「甲」"), Value::Int(9));
}

#[test]
fn assign_to_undefined_variable_is_a_runtime_error() {
    assert!(run_err("昔之「甲」者今九是也").contains("undefined"));
}

#[test]
fn if_else_picks_the_matching_branch() {
    assert_eq!(run("若五等於五者。九。也其"), Value::Int(9));
}

#[test]
fn math_add_is_checked_arithmetic() {
    assert_eq!(run("加五以三"), Value::Int(8));
}

#[test]
fn math_modulo_requires_division() {
    assert_eq!(run("除五以三所餘幾何"), Value::Int(2));
}

#[test]
fn for_enum_runs_body_n_times() {
    let source = "吾有一數。曰零。名之曰「甲」。為是三遍。加「甲」以一。昔之「甲」者今其是也。云云「甲」";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn break_if_desugars_and_stops_the_loop() {
    let source = "吾有一數。曰零。名之曰「甲」。姑妄行此。加「甲」以一。昔之「甲」者今其是也。如事不諧「甲」等於三者。云云「甲」";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn function_call_binds_params_and_returns_value() {
    let source = "吾有一術。名之曰「加倍」。欲行是術。必先得一數。名之曰「甲」。乃行是術曰。加「甲」以「甲」。昔之「甲」者今其是也。乃得矣。是謂「加倍」之術也。以五「加倍」";
    assert_eq!(run(source), Value::Int(10));
}

#[test]
fn try_catch_catches_a_typed_throw() {
    let source = "如其。嗚呼『禍』之禍。豈『禍』之禍歟。九。不知何禍歟。零。也其";
    assert_eq!(run(source), Value::Int(9));
}

#[test]
fn uncaught_throw_becomes_a_runtime_error() {
    assert!(run_err("嗚呼『禍』之禍").contains("uncaught"));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert!(run_err("除五以零").contains("zero"));
}
