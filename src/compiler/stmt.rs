use std::{collections::HashSet, rc::Rc};

use inkwell::{
    basic_block::BasicBlock,
    values::{BasicValueEnum, IntValue},
};
use tracing::debug;

use crate::{
    ast::ast::{Ast, LeafValue, NodeId, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

use super::{
    compiler::{Compiler, JumpTarget, Symbol},
    expr::{char_literal_value, gen_expression},
    types::{describe, CType},
};

/// Lowers every statement of a `Block` node.
///
/// A failing statement is recorded as a diagnostic and lowering moves on to
/// the next one, so one pass reports every problem in the body.
pub fn gen_block(compiler: &mut Compiler, block: NodeId) {
    let ast = Rc::clone(&compiler.ast);
    for &statement in ast.children(block) {
        gen_sequenced(compiler, statement);
    }
}

/// A branch or loop body: a block, or a single statement.
fn gen_body(compiler: &mut Compiler, body: NodeId) {
    if compiler.ast.kind(body) == NodeKind::Block {
        gen_block(compiler, body);
    } else {
        gen_sequenced(compiler, body);
    }
}

fn gen_sequenced(compiler: &mut Compiler, statement: NodeId) {
    // Code after a return or jump goes into a block nothing branches to
    if compiler.is_terminated() {
        let position = compiler.ast.position(statement);
        match compiler.append_block("unreachable", position) {
            Ok(block) => compiler.builder.position_at_end(block),
            Err(error) => {
                compiler.diagnostics.push(error);
                return;
            }
        }
    }

    if let Err(error) = gen_statement(compiler, statement) {
        debug!(line = error.get_position().line, %error, "statement failed to lower");
        compiler.diagnostics.push(error);
    }
}

pub fn gen_statement(compiler: &mut Compiler, statement: NodeId) -> Result<(), Error> {
    let ast = Rc::clone(&compiler.ast);
    let position = ast.position(statement);

    match ast.kind(statement) {
        NodeKind::Declaration => gen_declaration(compiler, &ast, statement),
        NodeKind::Block => {
            gen_block(compiler, statement);
            Ok(())
        }
        NodeKind::ExpressionStmt => {
            let Some(&expression) = ast.children(statement).first() else {
                return Err(malformed("expression statement without expression", position));
            };
            gen_expression(compiler, expression)?;
            Ok(())
        }
        NodeKind::Return => gen_return(compiler, &ast, statement),
        NodeKind::If => gen_if(compiler, &ast, statement),
        NodeKind::While => gen_while(compiler, &ast, statement),
        NodeKind::DoWhile => gen_do_while(compiler, &ast, statement),
        NodeKind::For => gen_for(compiler, &ast, statement),
        NodeKind::Switch => gen_switch(compiler, &ast, statement),
        NodeKind::Break => {
            let target = compiler.jump_targets.last().map(|target| target.break_block);
            gen_jump(compiler, target, "break", position)
        }
        NodeKind::Continue => {
            let target = compiler
                .jump_targets
                .last()
                .and_then(|target| target.continue_block);
            gen_jump(compiler, target, "continue", position)
        }
        NodeKind::Empty => Ok(()),
        other => Err(malformed(&format!("{:?} is not a statement", other), position)),
    }
}

fn malformed(message: &str, position: Position) -> Error {
    Error::new(
        ErrorImpl::MalformedTree {
            message: message.to_string(),
        },
        position,
    )
}

fn gen_declaration(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let parts = ast.declaration_parts(statement)?;
    let ctype = CType::from_token(ast.type_token(parts.type_node));

    for &declarator in parts.declarators {
        let name = ast.text(declarator);
        let position = ast.position(declarator);

        let Some(ty) = ctype.basic_type(compiler.context) else {
            return Err(Error::new(
                ErrorImpl::InvalidDeclarationType {
                    name: name.to_string(),
                    type_: String::from("void"),
                },
                position,
            ));
        };

        let pointer = compiler.entry_alloca(ty, name)?;
        compiler.symbols.put(name, Symbol { pointer, ty });

        if let Some(&initializer) = ast.children(declarator).first() {
            let value = gen_expression(compiler, initializer)?;
            let value = compiler.coerce(value, ty, position)?;
            compiler.builder.build_store(pointer, value)?;
        }
    }

    Ok(())
}

fn gen_return(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    if compiler.builder.get_insert_block().is_none() {
        return Err(Error::new(ErrorImpl::ReturnOutsideBlock, position));
    }

    let return_type = compiler.function(position)?.get_type().get_return_type();
    let value = ast.children(statement).first().copied();

    match (value, return_type) {
        (Some(value), Some(return_type)) => {
            let value = gen_expression(compiler, value)?;
            let value = compiler.coerce(value, return_type, position)?;
            compiler.builder.build_return(Some(&value))?;
        }
        (Some(value), None) => {
            gen_expression(compiler, value)?;
            compiler.builder.build_return(None)?;
        }
        (None, Some(return_type)) => {
            compiler
                .builder
                .build_return(Some(&return_type.const_zero()))?;
        }
        (None, None) => {
            compiler.builder.build_return(None)?;
        }
    }

    Ok(())
}

fn gen_condition<'a>(compiler: &Compiler<'a>, condition: NodeId) -> Result<IntValue<'a>, Error> {
    let position = compiler.ast.position(condition);
    let value: BasicValueEnum<'a> = gen_expression(compiler, condition)?;
    compiler.to_bool(value, position)
}

/// Like `gen_condition`, but a failure is recorded and stands in as false.
fn gen_recorded_condition<'a>(compiler: &mut Compiler<'a>, condition: NodeId) -> IntValue<'a> {
    match gen_condition(compiler, condition) {
        Ok(value) => value,
        Err(error) => {
            compiler.diagnostics.push(error);
            compiler.context.bool_type().const_zero()
        }
    }
}

/// Lowers an expression evaluated only for its effects, recording a failure.
fn gen_recorded_expression(compiler: &mut Compiler, expression: NodeId) {
    if let Err(error) = gen_expression(compiler, expression) {
        compiler.diagnostics.push(error);
    }
}

fn gen_if(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    let parts = ast.if_parts(statement)?;

    let condition = gen_recorded_condition(compiler, parts.condition);

    let then_block = compiler.append_block("then", position)?;
    let else_block = compiler.append_block("else", position)?;
    let merge_block = compiler.append_block("ifcont", position)?;

    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    compiler.builder.position_at_end(then_block);
    gen_body(compiler, parts.then_branch);
    compiler.branch_if_open(merge_block)?;

    compiler.builder.position_at_end(else_block);
    if let Some(else_branch) = parts.else_branch {
        gen_body(compiler, else_branch);
    }
    compiler.branch_if_open(merge_block)?;

    compiler.builder.position_at_end(merge_block);
    Ok(())
}

/// Lowers a loop body with `break`/`continue` bound to the given blocks.
fn gen_loop_body<'a>(
    compiler: &mut Compiler<'a>,
    body: NodeId,
    break_block: BasicBlock<'a>,
    continue_block: BasicBlock<'a>,
) {
    compiler.jump_targets.push(JumpTarget {
        break_block,
        continue_block: Some(continue_block),
    });
    gen_body(compiler, body);
    compiler.jump_targets.pop();
}

fn gen_while(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    let parts = ast.while_parts(statement)?;

    let cond_block = compiler.append_block("while.cond", position)?;
    let body_block = compiler.append_block("while.body", position)?;
    let end_block = compiler.append_block("while.end", position)?;

    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(cond_block);
    let condition = gen_recorded_condition(compiler, parts.condition);
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    gen_loop_body(compiler, parts.body, end_block, cond_block);
    // No back-edge when the body already returned or jumped
    compiler.branch_if_open(cond_block)?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_do_while(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    let parts = ast.do_while_parts(statement)?;

    let body_block = compiler.append_block("do_body", position)?;
    let cond_block = compiler.append_block("do_cond", position)?;
    let end_block = compiler.append_block("do_after", position)?;

    compiler.builder.build_unconditional_branch(body_block)?;

    compiler.builder.position_at_end(body_block);
    gen_loop_body(compiler, parts.body, end_block, cond_block);
    compiler.branch_if_open(cond_block)?;

    compiler.builder.position_at_end(cond_block);
    let condition = gen_recorded_condition(compiler, parts.condition);
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_for(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    let parts = ast.for_parts(statement)?;

    let missing = |clause: &str| {
        Error::new(
            ErrorImpl::MissingForClause {
                clause: clause.to_string(),
            },
            position,
        )
    };
    let init = parts.init.ok_or_else(|| missing("initializer"))?;
    let condition = parts.condition.ok_or_else(|| missing("condition"))?;
    let increment = parts.increment.ok_or_else(|| missing("increment"))?;

    gen_recorded_expression(compiler, init);

    let cond_block = compiler.append_block("for.cond", position)?;
    let body_block = compiler.append_block("for.body", position)?;
    let inc_block = compiler.append_block("for.inc", position)?;
    let end_block = compiler.append_block("for.after", position)?;

    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(cond_block);
    let condition = gen_recorded_condition(compiler, condition);
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    gen_loop_body(compiler, parts.body, end_block, inc_block);
    compiler.branch_if_open(inc_block)?;

    compiler.builder.position_at_end(inc_block);
    gen_recorded_expression(compiler, increment);
    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

/// Integer value of a `case` label: a literal, a character, or a negated one.
fn case_label_value(ast: &Ast, label: NodeId) -> Result<i64, Error> {
    let node = ast.node(label);
    match (node.kind, &node.value) {
        (NodeKind::IntLiteral, LeafValue::Int(value)) => Ok(*value),
        (NodeKind::CharLiteral, LeafValue::Text(lexeme)) => Ok(char_literal_value(lexeme)),
        (NodeKind::UnaryOp, LeafValue::Operator(TokenKind::Dash)) => {
            match ast.children(label).first() {
                Some(&operand) if ast.kind(operand) != NodeKind::UnaryOp => {
                    case_label_value(ast, operand).map(|value| -value)
                }
                _ => Err(Error::new(ErrorImpl::NonConstantCaseLabel, node.position)),
            }
        }
        _ => Err(Error::new(ErrorImpl::NonConstantCaseLabel, node.position)),
    }
}

fn gen_switch(compiler: &mut Compiler, ast: &Ast, statement: NodeId) -> Result<(), Error> {
    let position = ast.position(statement);
    let parts = ast.switch_parts(statement)?;

    let scrutinee = match gen_expression(compiler, parts.scrutinee)? {
        BasicValueEnum::IntValue(int) => compiler.widen_int(int)?,
        other => {
            return Err(Error::new(
                ErrorImpl::InvalidOperandType {
                    operator: String::from("switch"),
                    type_: describe(other.get_type()),
                },
                position,
            ))
        }
    };

    let end_block = compiler.append_block("switch.end", position)?;

    let mut seen = HashSet::new();
    let mut cases = vec![];
    let mut default_block = None;
    let mut clauses = vec![];

    for &clause in parts.clauses {
        let case = ast.case_parts(clause)?;
        match case.label {
            Some(label) => {
                // Labels compare at the scrutinee's i32 width
                let value = case_label_value(ast, label)? as i32 as i64;
                if !seen.insert(value) {
                    return Err(Error::new(
                        ErrorImpl::DuplicateCaseValue { value },
                        ast.position(clause),
                    ));
                }
                let block = compiler.append_block("switch.case", position)?;
                let label = scrutinee.get_type().const_int(value as u64, true);
                cases.push((label, block));
                clauses.push((block, case.body));
            }
            None => {
                if default_block.is_some() {
                    return Err(malformed(
                        "multiple default labels in one switch",
                        ast.position(clause),
                    ));
                }
                let block = compiler.append_block("switch.default", position)?;
                default_block = Some(block);
                clauses.push((block, case.body));
            }
        }
    }

    compiler
        .builder
        .build_switch(scrutinee, default_block.unwrap_or(end_block), &cases)?;

    // `continue` inside a switch still targets the enclosing loop
    let continue_block = compiler
        .jump_targets
        .last()
        .and_then(|target| target.continue_block);
    compiler.jump_targets.push(JumpTarget {
        break_block: end_block,
        continue_block,
    });

    let mut result = Ok(());
    for (index, (block, body)) in clauses.iter().enumerate() {
        compiler.builder.position_at_end(*block);
        for &statement in body.iter() {
            gen_sequenced(compiler, statement);
        }

        // Fall through into the next clause
        let next = clauses
            .get(index + 1)
            .map(|(next, _)| *next)
            .unwrap_or(end_block);
        result = compiler.branch_if_open(next);
        if result.is_err() {
            break;
        }
    }

    compiler.jump_targets.pop();
    result?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_jump<'a>(
    compiler: &Compiler<'a>,
    target: Option<BasicBlock<'a>>,
    keyword: &str,
    position: Position,
) -> Result<(), Error> {
    let Some(target) = target else {
        return Err(Error::new(
            ErrorImpl::JumpOutsideLoop {
                keyword: keyword.to_string(),
            },
            position,
        ));
    };

    compiler.builder.build_unconditional_branch(target)?;
    Ok(())
}
