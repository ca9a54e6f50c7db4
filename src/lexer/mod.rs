//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts C source text
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using ordered regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Line tracking for error reporting
//! - Comments, whitespace and preprocessor lines, which are skipped

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
