//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It uses a Pratt parser for expressions
//! with C operator precedence and handles:
//!
//! - Function definitions and prototypes at the top level
//! - Statements (declarations, blocks, loops, `switch`, jumps)
//! - Expressions (assignment, ternary, binary and unary ops, calls, literals)
//! - Type specifiers made of keywords and qualifiers
//!
//! Parsing stops at the first syntax error.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
