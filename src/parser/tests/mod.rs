use crate::ast::*;
use crate::parser::parse_program;

#[test]
fn declare_without_name_or_init() {
    let program = parse_program("吾有一數。").unwrap();
    assert!(matches!(program.statements[0], Stmt::Declare(Declare { count: 1, type_tag: TypeTag::Num, .. })));
}

#[test]
fn define_with_init_and_name() {
    let program = parse_program("吾有一數。曰五。名之曰「甲」。").unwrap();
    match &program.statements[0] {
        Stmt::Define(d) => {
            assert_eq!(d.names, vec!["甲".to_string()]);
            assert_eq!(d.declare.inits.len(), 1);
            assert_eq!(d.declare.inits[0].node, Value::Int(5));
        }
        other => panic!("expected Define, got {other:?}"),
    }
}

#[test]
fn function_def_round_trip() {
    let source = "吾有一術。名之曰「甲」。乃行是術曰。乃得矣。是謂「甲」之術也。";
    let program = parse_program(source).unwrap();
    match &program.statements[0] {
        Stmt::FunctionDef(f) => {
            assert_eq!(f.name, "甲");
            assert_eq!(f.body.len(), 1);
            assert!(matches!(f.body[0], Stmt::Return(Return::It, _)));
        }
        other => panic!("expected FunctionDef, got {other:?}"),
    }
}

#[test]
fn function_def_rejects_mismatched_closing_name() {
    let source = "吾有一術。名之曰「甲」。乃行是術曰。乃得矣。是謂「乙」之術也。";
    assert!(parse_program(source).is_err());
}

#[test]
fn declare_rejects_more_initializers_than_declared_count() {
    let source = "吾有一數。曰五。曰六。";
    assert!(parse_program(source).is_err());
}

#[test]
fn define_rejects_name_count_that_does_not_match_declared_count() {
    let source = "吾有三數。名之曰「甲」、「乙」。";
    assert!(parse_program(source).is_err());
}

#[test]
fn define_accepts_a_single_name_shorthand_for_a_multi_slot_declare() {
    let source = "吾有三數。名之曰「甲」。";
    assert!(parse_program(source).is_ok());
}

#[test]
fn function_def_with_params() {
    let source = "吾有一術。名之曰「加倍」。欲行是術。必先得一數。名之曰「甲」。乃行是術曰。乃得矣。是謂「加倍」之術也。";
    let program = parse_program(source).unwrap();
    match &program.statements[0] {
        Stmt::FunctionDef(f) => {
            assert_eq!(f.param_groups.len(), 1);
            assert_eq!(f.param_groups[0].names, vec!["甲".to_string()]);
        }
        other => panic!("expected FunctionDef, got {other:?}"),
    }
}

#[test]
fn if_then_else() {
    let source = "若五等於五者。書之。若其不然者。書之。也";
    let program = parse_program(source).unwrap();
    match &program.statements[0] {
        Stmt::If(i) => {
            assert_eq!(i.clauses.len(), 1);
            assert!(i.else_body.is_some());
        }
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn degenerate_if_true() {
    let program = parse_program("若其然者。書之。也").unwrap();
    match &program.statements[0] {
        Stmt::If(i) => assert_eq!(i.clauses[0].cond, Cond::Const(true)),
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn for_enum_loop() {
    let program = parse_program("為是三遍。書之。云云").unwrap();
    assert!(matches!(program.statements[0], Stmt::ForEnum(_)));
}

#[test]
fn for_array_loop() {
    let program = parse_program("為是「甲」中之「乙」。書之。云云").unwrap();
    match &program.statements[0] {
        Stmt::ForArr(f) => assert_eq!(f.name, "乙"),
        other => panic!("expected ForArr, got {other:?}"),
    }
}

#[test]
fn break_if_desugars_to_conditional_break() {
    let program = parse_program("姑妄行此。如事不諧五等於五者。云云").unwrap();
    match &program.statements[0] {
        Stmt::ForForever(f) => match &f.body[0] {
            Stmt::If(i) => assert!(matches!(i.clauses[0].body[0], Stmt::Break(_))),
            other => panic!("expected If, got {other:?}"),
        },
        other => panic!("expected ForForever, got {other:?}"),
    }
}

#[test]
fn try_catch_rejects_catch_all_before_typed() {
    let source = "如其。書之。不知何禍歟。書之。豈「甲」之禍歟。書之。也";
    assert!(parse_program(source).is_err());
}

#[test]
fn try_catch_accepts_typed_then_catch_all() {
    let source = "如其。書之。豈「甲」之禍歟。書之。不知何禍歟。書之。也";
    assert!(parse_program(source).is_ok());
}

#[test]
fn assign_with_new_value() {
    let program = parse_program("昔之「甲」者今五是也").unwrap();
    match &program.statements[0] {
        Stmt::Assign(a) => {
            assert_eq!(a.target, "甲");
            assert!(matches!(&a.rhs, AssignRhs::Value { value, .. } if value.node == Value::Int(5)));
        }
        other => panic!("expected Assign, got {other:?}"),
    }
}

#[test]
fn assign_delete() {
    let program = parse_program("昔之「甲」不復存矣").unwrap();
    match &program.statements[0] {
        Stmt::Assign(a) => assert!(matches!(a.rhs, AssignRhs::Delete)),
        other => panic!("expected Assign, got {other:?}"),
    }
}

#[test]
fn math_with_modulo() {
    let program = parse_program("加五以三所餘幾何").unwrap();
    match &program.statements[0] {
        Stmt::Expr(ExprStmt { expr: Expr::Math(m), .. }) => {
            assert_eq!(m.op, MathOp::Add);
            assert!(m.modulo);
        }
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn call_prefix_with_two_args() {
    let program = parse_program("施「加」於五於三").unwrap();
    match &program.statements[0] {
        Stmt::Expr(ExprStmt { expr: Expr::Call { args, .. }, .. }) => assert_eq!(args.len(), 2),
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn call_postfix_single_arg() {
    let program = parse_program("以五「加倍」").unwrap();
    match &program.statements[0] {
        Stmt::Expr(ExprStmt { expr: Expr::Call { args, .. }, .. }) => assert_eq!(args.len(), 1),
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn bare_value_statement() {
    let program = parse_program("五").unwrap();
    assert!(matches!(
        program.statements[0],
        Stmt::Expr(ExprStmt { expr: Expr::Bare(_), .. })
    ));
}

#[test]
fn logic_probe_without_then() {
    let program = parse_program("五等於五").unwrap();
    assert!(matches!(
        program.statements[0],
        Stmt::Expr(ExprStmt { expr: Expr::LogicProbe(_), .. })
    ));
}

#[test]
fn subscript_and_length() {
    let program = parse_program("「甲」之一 「甲」之長").unwrap();
    assert!(matches!(program.statements[0], Stmt::Expr(ExprStmt { expr: Expr::Subscript { .. }, .. })));
    assert!(matches!(program.statements[1], Stmt::Expr(ExprStmt { expr: Expr::Length { .. }, .. })));
}

#[test]
fn object_definition_rejects_name_count_mismatch() {
    let source = "吾有二物。名之曰「甲」。是謂「甲」。吾有一數。曰五。名之曰「乙」。之物也";
    assert!(parse_program(source).is_err());
}

#[test]
fn object_definition() {
    let source = "吾有一物。名之曰「甲」。是謂「甲」。吾有一數。曰五。名之曰「乙」。之物也";
    let program = parse_program(source).unwrap();
    match &program.statements[0] {
        Stmt::Object(o) => {
            assert_eq!(o.names, vec!["甲".to_string()]);
            assert_eq!(o.props.len(), 1);
            assert_eq!(o.props[0].0, "乙");
        }
        other => panic!("expected Object, got {other:?}"),
    }
}

#[test]
fn import_with_names() {
    let source = "吾嘗觀『math』之書。方悟「加」之義。";
    let program = parse_program(source).unwrap();
    match &program.statements[0] {
        Stmt::Import(i) => {
            assert_eq!(i.path, vec![ImportSegment::Str("math".to_string())]);
            assert_eq!(i.imported, Some(vec!["加".to_string()]));
        }
        other => panic!("expected Import, got {other:?}"),
    }
}
