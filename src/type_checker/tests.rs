use crate::{lexer::lexer::tokenize, parser::parser::parse};

use super::type_checker::type_check;

#[test]
fn test_type_check_accepts_valid_program() {
    let ast = parse(tokenize("int main() { return 0; }").unwrap()).unwrap();
    assert!(type_check(&ast).is_ok());
}

#[test]
fn test_type_check_does_not_reject_type_errors() {
    // Undeclared names are left for the code generator to report
    let ast = parse(tokenize("int main() { return missing + 1.5; }").unwrap()).unwrap();
    assert!(type_check(&ast).is_ok());
}
