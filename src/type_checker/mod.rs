//! Semantic validation stage.
//!
//! The pipeline runs a validator between parsing and code generation, but
//! no semantic rules are checked yet: [`type_checker::type_check`] always
//! succeeds. Type errors that do exist surface from the code generator as
//! diagnostics instead.

pub mod type_checker;

#[cfg(test)]
mod tests;
