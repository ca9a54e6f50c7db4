//! Unit tests for error handling.

use crate::errors::diagnostics::Diagnostics;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        Position::new(10, 2),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        Position::new(42, 3),
    );

    assert_eq!(error.get_position().offset, 42);
    assert_eq!(error.get_position().line, 3);
}

#[test]
fn test_malformed_number_tip() {
    let error = Error::new(
        ErrorImpl::MalformedNumber {
            token: "1.2.3".to_string(),
        },
        Position::new(0, 1),
    );

    assert_eq!(error.get_error_name(), "MalformedNumber");
    assert!(error.get_tip().to_string().contains("1.2.3"));
}

#[test]
fn test_argument_count_tip() {
    let error = Error::new(
        ErrorImpl::ArgumentCountMismatch {
            function: "suma".to_string(),
            expected: 2,
            received: 3,
        },
        Position::new(0, 7),
    );

    assert_eq!(error.get_tip().to_string(), "`suma` expects 2 arguments, received 3");
}

#[test]
fn test_display_includes_line() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "x".to_string(),
        },
        Position::new(5, 4),
    );

    assert_eq!(error.to_string(), "line 4: variable \"x\" not declared");
}

#[test]
fn test_display_without_position() {
    let error = Error::new(
        ErrorImpl::Linker {
            message: "ld exited with status 1".to_string(),
        },
        Position::null(),
    );

    assert_eq!(error.to_string(), "link step failed: ld exited with status 1");
    assert!(error.is_tool_error());
}

#[test]
fn test_codegen_errors_are_not_tool_errors() {
    let error = Error::new(
        ErrorImpl::TernaryTypeMismatch {
            then_type: "i32".to_string(),
            else_type: "double".to_string(),
        },
        Position::new(0, 1),
    );

    assert!(!error.is_tool_error());
}

#[test]
fn test_diagnostics_keep_order() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.push(Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "a".to_string(),
        },
        Position::new(0, 1),
    ));
    diagnostics.push(Error::new(
        ErrorImpl::FunctionNotDeclared {
            function: "f".to_string(),
        },
        Position::new(0, 2),
    ));

    assert_eq!(diagnostics.len(), 2);
    let names: Vec<&str> = diagnostics.iter().map(|e| e.get_error_name()).collect();
    assert_eq!(names, vec!["VariableNotDeclared", "FunctionNotDeclared"]);
    assert!(!diagnostics.has_tool_error());
}

#[test]
fn test_builder_failure_marks_diagnostics_as_tool_error() {
    let mut diagnostics = Diagnostics::from(Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "a".to_string(),
        },
        Position::new(0, 1),
    ));
    diagnostics.push(Error::new(
        ErrorImpl::Builder {
            message: "builder is not positioned".to_string(),
        },
        Position::null(),
    ));

    assert!(diagnostics.has_tool_error());
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.c");
    let error: Error = io.into();

    assert_eq!(error.get_error_name(), "Io");
    assert!(error.get_position().is_null());
}
