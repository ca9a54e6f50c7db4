use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::MalformedNumber { .. } => "MalformedNumber",
            ErrorImpl::UnterminatedLiteral { .. } => "UnterminatedLiteral",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnsupportedConstruct { .. } => "UnsupportedConstruct",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::TernaryTypeMismatch { .. } => "TernaryTypeMismatch",
            ErrorImpl::InvalidAssignmentTarget { .. } => "InvalidAssignmentTarget",
            ErrorImpl::InvalidOperandType { .. } => "InvalidOperandType",
            ErrorImpl::InvalidTextOutputCall { .. } => "InvalidTextOutputCall",
            ErrorImpl::MissingForClause { .. } => "MissingForClause",
            ErrorImpl::ReturnOutsideBlock => "ReturnOutsideBlock",
            ErrorImpl::JumpOutsideLoop { .. } => "JumpOutsideLoop",
            ErrorImpl::DuplicateCaseValue { .. } => "DuplicateCaseValue",
            ErrorImpl::NonConstantCaseLabel => "NonConstantCaseLabel",
            ErrorImpl::InvalidDeclarationType { .. } => "InvalidDeclarationType",
            ErrorImpl::ConflictingDeclaration { .. } => "ConflictingDeclaration",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::MalformedTree { .. } => "MalformedTree",
            ErrorImpl::Builder { .. } => "Builder",
            ErrorImpl::Backend { .. } => "Backend",
            ErrorImpl::Verification { .. } => "Verification",
            ErrorImpl::ObjectEmission { .. } => "ObjectEmission",
            ErrorImpl::Toolchain { .. } => "Toolchain",
            ErrorImpl::Linker { .. } => "Linker",
            ErrorImpl::Launch { .. } => "Launch",
            ErrorImpl::Io { .. } => "Io",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::MalformedNumber { token } => ErrorTip::Suggestion(format!(
                "Malformed number `{}`, a number takes at most one `.` and one exponent",
                token
            )),
            ErrorImpl::UnterminatedLiteral { kind } => {
                ErrorTip::Suggestion(format!("Unterminated {}", kind))
            }
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnsupportedConstruct { construct } => {
                ErrorTip::Suggestion(format!("{} is not supported", construct))
            }
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::FunctionNotDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` not declared", function))
            }
            ErrorImpl::ArgumentCountMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::TernaryTypeMismatch { then_type, else_type } => {
                ErrorTip::Suggestion(format!(
                    "Both arms of `?:` must have the same type, found `{}` and `{}`",
                    then_type, else_type
                ))
            }
            ErrorImpl::InvalidAssignmentTarget { operator } => ErrorTip::Suggestion(format!(
                "The left side of `{}` must be a variable name",
                operator
            )),
            ErrorImpl::InvalidOperandType { operator, type_ } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}`",
                operator, type_
            )),
            ErrorImpl::InvalidTextOutputCall { message } => {
                ErrorTip::Suggestion(format!("Invalid printf call, {}", message))
            }
            ErrorImpl::MissingForClause { clause } => {
                ErrorTip::Suggestion(format!("`for` loop is missing its {}", clause))
            }
            ErrorImpl::ReturnOutsideBlock => ErrorTip::Suggestion(String::from(
                "`return` reached with no basic block to terminate",
            )),
            ErrorImpl::JumpOutsideLoop { keyword } => ErrorTip::Suggestion(format!(
                "`{}` must appear inside a loop or switch",
                keyword
            )),
            ErrorImpl::DuplicateCaseValue { value } => {
                ErrorTip::Suggestion(format!("Case value `{}` appears twice", value))
            }
            ErrorImpl::NonConstantCaseLabel => ErrorTip::Suggestion(String::from(
                "Case labels must be integer or character constants",
            )),
            ErrorImpl::InvalidDeclarationType { name, type_ } => ErrorTip::Suggestion(format!(
                "`{}` cannot be declared with type `{}`",
                name, type_
            )),
            ErrorImpl::ConflictingDeclaration { function } => ErrorTip::Suggestion(format!(
                "Function `{}` is declared with different signatures",
                function
            )),
            ErrorImpl::FunctionAlreadyDefined { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", function))
            }
            ErrorImpl::MalformedTree { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::Builder { message }
            | ErrorImpl::Backend { message }
            | ErrorImpl::Verification { message }
            | ErrorImpl::ObjectEmission { message }
            | ErrorImpl::Toolchain { message }
            | ErrorImpl::Linker { message }
            | ErrorImpl::Launch { message }
            | ErrorImpl::Io { message } => ErrorTip::Suggestion(message.trim().to_string()),
        }
    }

    /// Failures of LLVM or an external tool rather than problems found in
    /// the compiled program.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::Builder { .. }
                | ErrorImpl::Backend { .. }
                | ErrorImpl::Verification { .. }
                | ErrorImpl::ObjectEmission { .. }
                | ErrorImpl::Toolchain { .. }
                | ErrorImpl::Linker { .. }
                | ErrorImpl::Launch { .. }
                | ErrorImpl::Io { .. }
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.position.is_null() {
            write!(f, "{}", self.internal_error)
        } else {
            write!(f, "line {}: {}", self.position.line, self.internal_error)
        }
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::new(
            ErrorImpl::Builder {
                message: error.to_string(),
            },
            Position::null(),
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(
            ErrorImpl::Io {
                message: error.to_string(),
            },
            Position::null(),
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("malformed number: {token:?}")]
    MalformedNumber { token: String },
    #[error("unterminated {kind}")]
    UnterminatedLiteral { kind: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("function {function:?} not declared")]
    FunctionNotDeclared { function: String },
    #[error("call to {function:?}: expected {expected} arguments, received {received}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("ternary arms differ in type: {then_type} and {else_type}")]
    TernaryTypeMismatch { then_type: String, else_type: String },
    #[error("left side of {operator:?} is not a variable")]
    InvalidAssignmentTarget { operator: String },
    #[error("operator {operator:?} cannot be applied to {type_}")]
    InvalidOperandType { operator: String, type_: String },
    #[error("invalid printf call: {message}")]
    InvalidTextOutputCall { message: String },
    #[error("for loop is missing its {clause}")]
    MissingForClause { clause: String },
    #[error("return outside of a live basic block")]
    ReturnOutsideBlock,
    #[error("{keyword:?} outside of a loop or switch")]
    JumpOutsideLoop { keyword: String },
    #[error("duplicate case value {value}")]
    DuplicateCaseValue { value: i64 },
    #[error("case label is not an integer constant")]
    NonConstantCaseLabel,
    #[error("{name:?} cannot have type {type_}")]
    InvalidDeclarationType { name: String, type_: String },
    #[error("conflicting declarations of function {function:?}")]
    ConflictingDeclaration { function: String },
    #[error("function {function:?} already defined")]
    FunctionAlreadyDefined { function: String },
    #[error("malformed syntax tree: {message}")]
    MalformedTree { message: String },
    #[error("instruction builder failed: {message}")]
    Builder { message: String },
    #[error("target backend failed: {message}")]
    Backend { message: String },
    #[error("module verification failed: {message}")]
    Verification { message: String },
    #[error("object emission failed: {message}")]
    ObjectEmission { message: String },
    #[error("toolchain discovery failed: {message}")]
    Toolchain { message: String },
    #[error("link step failed: {message}")]
    Linker { message: String },
    #[error("could not run program: {message}")]
    Launch { message: String },
    #[error("i/o error: {message}")]
    Io { message: String },
}
