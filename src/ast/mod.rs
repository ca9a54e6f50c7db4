//! AST (Abstract Syntax Tree) module.
//!
//! The tree is an arena of nodes addressed by [`ast::NodeId`]. Each node
//! carries a kind tag, an ordered child list, a leaf payload and the
//! source position it came from.
pub mod ast;

#[cfg(test)]
mod tests;
