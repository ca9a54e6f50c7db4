use crate::{lexer::tokens::TokenKind, Position};

use super::ast::{Ast, LeafValue, NodeKind};

fn at(line: u32) -> Position {
    Position::new(0, line)
}

#[test]
fn test_nodes_are_appended_in_order() {
    let mut ast = Ast::new();
    let one = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(1), at(1));
    let two = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(2), at(1));
    let sum = ast.binary(TokenKind::Plus, one, two, at(1));

    assert_eq!(ast.len(), 3);
    assert!(one < two && two < sum);
    assert_eq!(ast.children(sum), &[one, two]);
    assert_eq!(ast.operator(sum), Some(TokenKind::Plus));
}

#[test]
fn test_if_without_else_has_no_else_branch() {
    let mut ast = Ast::new();
    let condition = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(1), at(2));
    let then_branch = ast.block(vec![], at(2));
    let if_stmt = ast.if_stmt(condition, then_branch, None, at(2));

    let parts = ast.if_parts(if_stmt).unwrap();
    assert_eq!(parts.condition, condition);
    assert_eq!(parts.then_branch, then_branch);
    assert!(parts.else_branch.is_none());
    assert_eq!(ast.children(if_stmt).len(), 3);
}

#[test]
fn test_do_while_condition_is_a_named_slot() {
    let mut ast = Ast::new();
    let body = ast.block(vec![], at(3));
    let condition = ast.leaf(NodeKind::Identifier, LeafValue::Text("x".into()), at(3));
    let do_while = ast.do_while(body, condition, at(3));

    let parts = ast.do_while_parts(do_while).unwrap();
    assert_eq!(parts.body, body);
    assert_eq!(parts.condition, condition);
}

#[test]
fn test_view_rejects_wrong_shape() {
    let mut ast = Ast::new();
    let body = ast.block(vec![], at(4));

    let error = ast.do_while_parts(body).err().unwrap();
    assert_eq!(error.get_error_name(), "MalformedTree");
    assert_eq!(error.get_position().line, 4);
}

#[test]
fn test_for_clauses_may_be_absent() {
    let mut ast = Ast::new();
    let body = ast.block(vec![], at(5));
    let condition = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(1), at(5));
    let for_stmt = ast.for_stmt(None, Some(condition), None, body, at(5));

    let parts = ast.for_parts(for_stmt).unwrap();
    assert!(parts.init.is_none());
    assert_eq!(parts.condition, Some(condition));
    assert!(parts.increment.is_none());
    assert_eq!(parts.body, body);
}

#[test]
fn test_switch_and_case_views() {
    let mut ast = Ast::new();
    let scrutinee = ast.leaf(NodeKind::Identifier, LeafValue::Text("a".into()), at(6));
    let label = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(1), at(6));
    let brk = ast.leaf(NodeKind::Break, LeafValue::None, at(6));
    let case = ast.case(label, vec![brk], at(6));
    let default = ast.default_case(vec![], at(6));
    let switch = ast.switch(scrutinee, vec![case, default], at(6));

    let parts = ast.switch_parts(switch).unwrap();
    assert_eq!(parts.scrutinee, scrutinee);
    assert_eq!(parts.clauses, &[case, default]);

    let case_parts = ast.case_parts(case).unwrap();
    assert_eq!(case_parts.label, Some(label));
    assert_eq!(case_parts.body, &[brk]);

    let default_parts = ast.case_parts(default).unwrap();
    assert!(default_parts.label.is_none());
    assert!(default_parts.body.is_empty());
}

#[test]
fn test_function_parts_and_prototype() {
    let mut ast = Ast::new();
    let return_type = ast.type_specifier(TokenKind::Int, at(1));
    let param_type = ast.type_specifier(TokenKind::Int, at(1));
    let param = ast.parameter("n".into(), param_type, at(1));
    let prototype = ast.function("f".into(), return_type, vec![param], None, at(1));
    ast.program(vec![prototype], at(1));

    let parts = ast.function_parts(prototype).unwrap();
    assert_eq!(parts.name, "f");
    assert_eq!(parts.params, &[param]);
    assert!(parts.body.is_none());
    assert_eq!(ast.functions(), &[prototype]);
}

#[test]
fn test_display_indents_two_spaces_per_level() {
    let mut ast = Ast::new();
    let return_type = ast.type_specifier(TokenKind::Int, at(1));
    let value = ast.leaf(NodeKind::IntLiteral, LeafValue::Int(7), at(1));
    let ret = ast.return_stmt(Some(value), at(1));
    let body = ast.block(vec![ret], at(1));
    let main = ast.function("main".into(), return_type, vec![], Some(body), at(1));
    ast.program(vec![main], at(1));

    let dump = ast.to_string();
    let expected = "Program\n  Function: main\n    Type: int\n    Parameters\n    Block\n      Return\n        IntLiteral: 7\n";
    assert_eq!(dump, expected);
}

#[test]
fn test_string_literal_holds_bytes() {
    let mut ast = Ast::new();
    let literal = ast.leaf(NodeKind::StringLiteral, LeafValue::Bytes(b"hi\n".to_vec()), at(1));

    assert_eq!(ast.bytes(literal), b"hi\n");
    assert_eq!(ast.text(literal), "");
}
