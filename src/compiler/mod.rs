//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that lowers the AST
//! into LLVM IR and hands the result to the target backend. It handles:
//!
//! - Mapping declared C types to machine types
//! - Per-function variable storage
//! - Expression lowering with C's implicit conversions
//! - Control flow lowering into basic blocks
//! - Object file and IR emission

pub mod backend;
pub mod builtins;
pub mod compiler;
pub mod expr;
pub mod stmt;
pub mod symbols;
pub mod types;
