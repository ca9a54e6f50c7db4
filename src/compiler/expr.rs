use inkwell::{
    builder::BuilderError,
    values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, IntValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::ast::{LeafValue, NodeId, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::unescape, tokens::TokenKind},
    Position,
};

use super::{
    builtins::PRINTF,
    compiler::Compiler,
    types::{describe, CType},
};

/// Generates LLVM IR for the given expression.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a>,
    node: NodeId,
) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);

    match ast.kind(node) {
        NodeKind::IntLiteral => {
            let LeafValue::Int(value) = ast.node(node).value else {
                return Err(malformed("integer literal without a value", position));
            };
            Ok(compiler
                .context
                .i32_type()
                .const_int(value as u64, true)
                .into())
        }
        NodeKind::FloatLiteral => {
            let LeafValue::Float(value) = ast.node(node).value else {
                return Err(malformed("float literal without a value", position));
            };
            Ok(compiler.context.f64_type().const_float(value).into())
        }
        NodeKind::CharLiteral => {
            let value = char_literal_value(ast.text(node));
            let Some(char_type) = CType::Int8.basic_type(compiler.context) else {
                return Err(malformed("no character type", position));
            };
            Ok(char_type
                .into_int_type()
                .const_int(value as u64, true)
                .into())
        }
        NodeKind::StringLiteral => Ok(compiler.string_literal(ast.bytes(node))?.into()),
        NodeKind::Identifier => {
            let name = ast.text(node);
            let symbol = compiler.symbols.get(name).ok_or_else(|| {
                Error::new(
                    ErrorImpl::VariableNotDeclared {
                        variable: name.to_string(),
                    },
                    position,
                )
            })?;

            Ok(compiler.builder.build_load(symbol.pointer, name)?)
        }
        NodeKind::BinaryOp => gen_binary(compiler, node),
        NodeKind::UnaryOp => gen_unary(compiler, node),
        NodeKind::Assignment => gen_assignment(compiler, node),
        NodeKind::Ternary => gen_ternary(compiler, node),
        NodeKind::Call => gen_call(compiler, node),
        other => Err(malformed(&format!("{:?} is not an expression", other), position)),
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

/// Byte value of a quoted character lexeme such as `'a'` or `'\n'`.
pub fn char_literal_value(lexeme: &str) -> i64 {
    let inner = lexeme
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(lexeme);

    unescape(inner).first().map(|&byte| byte as i8 as i64).unwrap_or(0)
}

fn operands(compiler: &Compiler, node: NodeId) -> Result<(NodeId, NodeId), Error> {
    match compiler.ast.children(node) {
        [left, right] => Ok((*left, *right)),
        _ => Err(malformed(
            "binary node without two operands",
            compiler.ast.position(node),
        )),
    }
}

fn operator_of(compiler: &Compiler, node: NodeId) -> Result<TokenKind, Error> {
    compiler
        .ast
        .operator(node)
        .ok_or_else(|| malformed("operator node without an operator", compiler.ast.position(node)))
}

fn gen_binary<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let position = compiler.ast.position(node);
    let operator = operator_of(compiler, node)?;
    let (left, right) = operands(compiler, node)?;

    // Both sides are always evaluated, there is no short circuit
    let lhs = gen_expression(compiler, left)?;
    let rhs = gen_expression(compiler, right)?;

    if matches!(operator, TokenKind::And | TokenKind::Or) {
        let lhs = compiler.to_bool(lhs, position)?;
        let rhs = compiler.to_bool(rhs, position)?;
        let result = if operator == TokenKind::And {
            compiler.builder.build_and(lhs, rhs, "and")?
        } else {
            compiler.builder.build_or(lhs, rhs, "or")?
        };
        return Ok(result.into());
    }

    apply_binary(compiler, operator, lhs, rhs, position)
}

/// Applies an arithmetic, bitwise or comparison operator after the usual
/// arithmetic conversions. Shared with compound assignment.
pub fn apply_binary<'a>(
    compiler: &Compiler<'a>,
    operator: TokenKind,
    lhs: BasicValueEnum<'a>,
    rhs: BasicValueEnum<'a>,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    let invalid = |value: BasicValueEnum<'a>| {
        Error::new(
            ErrorImpl::InvalidOperandType {
                operator: operator.symbol().to_string(),
                type_: describe(value.get_type()),
            },
            position,
        )
    };

    for value in [lhs, rhs] {
        if !value.is_int_value() && !value.is_float_value() {
            return Err(invalid(value));
        }
    }

    let (lhs, rhs) = compiler.unify_operands(lhs, rhs, position)?;

    match (lhs, rhs) {
        (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => {
            int_binary(compiler, operator, l, r).ok_or_else(|| invalid(lhs))?
        }
        (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => {
            float_binary(compiler, operator, l, r).ok_or_else(|| invalid(lhs))?
        }
        _ => Err(invalid(lhs)),
    }
}

/// `None` when the operator has no integer form.
fn int_binary<'a>(
    compiler: &Compiler<'a>,
    operator: TokenKind,
    l: IntValue<'a>,
    r: IntValue<'a>,
) -> Option<Result<BasicValueEnum<'a>, Error>> {
    let builder = &compiler.builder;
    let compare = |predicate| -> Result<BasicValueEnum<'a>, Error> {
        Ok(builder.build_int_compare(predicate, l, r, "cmp")?.into())
    };

    let result: Result<BasicValueEnum<'a>, BuilderError> = match operator {
        TokenKind::Plus => builder.build_int_add(l, r, "add").map(Into::into),
        TokenKind::Dash => builder.build_int_sub(l, r, "sub").map(Into::into),
        TokenKind::Star => builder.build_int_mul(l, r, "mul").map(Into::into),
        TokenKind::Slash => builder.build_int_signed_div(l, r, "div").map(Into::into),
        TokenKind::Percent => builder.build_int_signed_rem(l, r, "rem").map(Into::into),
        TokenKind::Ampersand => builder.build_and(l, r, "and").map(Into::into),
        TokenKind::Pipe => builder.build_or(l, r, "or").map(Into::into),
        TokenKind::Caret => builder.build_xor(l, r, "xor").map(Into::into),
        TokenKind::ShiftLeft => builder.build_left_shift(l, r, "shl").map(Into::into),
        TokenKind::ShiftRight => builder.build_right_shift(l, r, true, "shr").map(Into::into),
        TokenKind::Equals => return Some(compare(IntPredicate::EQ)),
        TokenKind::NotEquals => return Some(compare(IntPredicate::NE)),
        TokenKind::Less => return Some(compare(IntPredicate::SLT)),
        TokenKind::LessEquals => return Some(compare(IntPredicate::SLE)),
        TokenKind::Greater => return Some(compare(IntPredicate::SGT)),
        TokenKind::GreaterEquals => return Some(compare(IntPredicate::SGE)),
        _ => return None,
    };

    Some(result.map_err(Error::from))
}

/// `None` for bitwise and shift operators, which floats do not support.
fn float_binary<'a>(
    compiler: &Compiler<'a>,
    operator: TokenKind,
    l: FloatValue<'a>,
    r: FloatValue<'a>,
) -> Option<Result<BasicValueEnum<'a>, Error>> {
    let builder = &compiler.builder;
    let compare = |predicate| -> Result<BasicValueEnum<'a>, Error> {
        Ok(builder.build_float_compare(predicate, l, r, "fcmp")?.into())
    };

    let result = match operator {
        TokenKind::Plus => builder.build_float_add(l, r, "fadd"),
        TokenKind::Dash => builder.build_float_sub(l, r, "fsub"),
        TokenKind::Star => builder.build_float_mul(l, r, "fmul"),
        TokenKind::Slash => builder.build_float_div(l, r, "fdiv"),
        TokenKind::Percent => builder.build_float_rem(l, r, "frem"),
        TokenKind::Equals => return Some(compare(FloatPredicate::OEQ)),
        TokenKind::NotEquals => return Some(compare(FloatPredicate::UNE)),
        TokenKind::Less => return Some(compare(FloatPredicate::OLT)),
        TokenKind::LessEquals => return Some(compare(FloatPredicate::OLE)),
        TokenKind::Greater => return Some(compare(FloatPredicate::OGT)),
        TokenKind::GreaterEquals => return Some(compare(FloatPredicate::OGE)),
        _ => return None,
    };

    Some(result.map(Into::into).map_err(Error::from))
}

fn gen_unary<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);
    let operator = operator_of(compiler, node)?;
    let Some(&operand) = ast.children(node).first() else {
        return Err(malformed("unary node without an operand", position));
    };

    if matches!(operator, TokenKind::PlusPlus | TokenKind::MinusMinus) {
        return gen_step(compiler, operator, operand, position);
    }

    let value = gen_expression(compiler, operand)?;
    let invalid = || {
        Error::new(
            ErrorImpl::InvalidOperandType {
                operator: operator.symbol().to_string(),
                type_: describe(value.get_type()),
            },
            position,
        )
    };

    match (operator, value) {
        (TokenKind::Not, _) => {
            let truth = compiler.to_bool(value, position)?;
            let inverted = compiler.builder.build_not(truth, "not")?;
            Ok(compiler
                .builder
                .build_int_z_extend(inverted, compiler.context.i32_type(), "lnot")?
                .into())
        }
        (TokenKind::Tilde, BasicValueEnum::IntValue(int)) => {
            let int = compiler.widen_int(int)?;
            let ones = int.get_type().const_all_ones();
            Ok(compiler.builder.build_xor(int, ones, "compl")?.into())
        }
        (TokenKind::Dash, BasicValueEnum::IntValue(int)) => {
            let int = compiler.widen_int(int)?;
            Ok(compiler.builder.build_int_neg(int, "neg")?.into())
        }
        (TokenKind::Dash, BasicValueEnum::FloatValue(float)) => {
            Ok(compiler.builder.build_float_neg(float, "fneg")?.into())
        }
        (TokenKind::Plus, BasicValueEnum::IntValue(_) | BasicValueEnum::FloatValue(_)) => Ok(value),
        _ => Err(invalid()),
    }
}

/// `++x`, `x++`, `--x`, `x--`: store the stepped value and yield it.
fn gen_step<'a>(
    compiler: &Compiler<'a>,
    operator: TokenKind,
    operand: NodeId,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    if ast.kind(operand) != NodeKind::Identifier {
        return Err(Error::new(
            ErrorImpl::InvalidAssignmentTarget {
                operator: operator.symbol().to_string(),
            },
            position,
        ));
    }

    let name = ast.text(operand);
    let symbol = compiler.symbols.get(name).ok_or_else(|| {
        Error::new(
            ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            },
            position,
        )
    })?;

    let current = compiler.builder.build_load(symbol.pointer, name)?;
    let increment = operator == TokenKind::PlusPlus;

    let stepped: BasicValueEnum<'a> = match current {
        BasicValueEnum::IntValue(int) => {
            let one = int.get_type().const_int(1, false);
            if increment {
                compiler.builder.build_int_add(int, one, "inc")?.into()
            } else {
                compiler.builder.build_int_sub(int, one, "dec")?.into()
            }
        }
        BasicValueEnum::FloatValue(float) => {
            let one = float.get_type().const_float(1.0);
            if increment {
                compiler.builder.build_float_add(float, one, "inc")?.into()
            } else {
                compiler.builder.build_float_sub(float, one, "dec")?.into()
            }
        }
        other => {
            return Err(Error::new(
                ErrorImpl::InvalidOperandType {
                    operator: operator.symbol().to_string(),
                    type_: describe(other.get_type()),
                },
                position,
            ))
        }
    };

    compiler.builder.build_store(symbol.pointer, stepped)?;
    Ok(stepped)
}

/// Operator applied by a compound assignment, `None` for plain `=`.
pub fn compound_base(operator: TokenKind) -> Option<TokenKind> {
    match operator {
        TokenKind::PlusEquals => Some(TokenKind::Plus),
        TokenKind::MinusEquals => Some(TokenKind::Dash),
        TokenKind::StarEquals => Some(TokenKind::Star),
        TokenKind::SlashEquals => Some(TokenKind::Slash),
        TokenKind::PercentEquals => Some(TokenKind::Percent),
        TokenKind::AmpersandEquals => Some(TokenKind::Ampersand),
        TokenKind::PipeEquals => Some(TokenKind::Pipe),
        TokenKind::CaretEquals => Some(TokenKind::Caret),
        TokenKind::ShiftLeftEquals => Some(TokenKind::ShiftLeft),
        TokenKind::ShiftRightEquals => Some(TokenKind::ShiftRight),
        _ => None,
    }
}

fn gen_assignment<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);
    let operator = operator_of(compiler, node)?;
    let (target, value) = operands(compiler, node)?;

    if ast.kind(target) != NodeKind::Identifier {
        return Err(Error::new(
            ErrorImpl::InvalidAssignmentTarget {
                operator: operator.symbol().to_string(),
            },
            position,
        ));
    }

    let name = ast.text(target);
    let symbol = *compiler.symbols.get(name).ok_or_else(|| {
        Error::new(
            ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            },
            ast.position(target),
        )
    })?;

    let result = match compound_base(operator) {
        None => gen_expression(compiler, value)?,
        Some(base) => {
            // The old value is read before the right side runs
            let current = compiler.builder.build_load(symbol.pointer, name)?;
            let rhs = gen_expression(compiler, value)?;
            apply_binary(compiler, base, current, rhs, position)?
        }
    };

    let result = compiler.coerce(result, symbol.ty, position)?;
    compiler.builder.build_store(symbol.pointer, result)?;

    Ok(result)
}

fn gen_ternary<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);
    let [condition, then_value, else_value] = ast.children(node) else {
        return Err(malformed("ternary without three operands", position));
    };

    let condition = gen_expression(compiler, *condition)?;
    let condition = compiler.to_bool(condition, position)?;

    let then_block = compiler.append_block("ternary_then", position)?;
    let else_block = compiler.append_block("ternary_else", position)?;
    let merge_block = compiler.append_block("ternary_merge", position)?;

    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    // An arm may end in a different block than it started in
    compiler.builder.position_at_end(then_block);
    let then_result = gen_expression(compiler, *then_value)?;
    let then_end = compiler.builder.get_insert_block().unwrap_or(then_block);
    compiler.builder.build_unconditional_branch(merge_block)?;

    compiler.builder.position_at_end(else_block);
    let else_result = gen_expression(compiler, *else_value)?;
    let else_end = compiler.builder.get_insert_block().unwrap_or(else_block);
    compiler.builder.build_unconditional_branch(merge_block)?;

    if then_result.get_type() != else_result.get_type() {
        return Err(Error::new(
            ErrorImpl::TernaryTypeMismatch {
                then_type: describe(then_result.get_type()),
                else_type: describe(else_result.get_type()),
            },
            position,
        ));
    }

    compiler.builder.position_at_end(merge_block);
    let phi = compiler
        .builder
        .build_phi(then_result.get_type(), "ternary")?;
    phi.add_incoming(&[(&then_result, then_end), (&else_result, else_end)]);

    Ok(phi.as_basic_value())
}

fn gen_call<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);
    let name = ast.text(node);

    if name == PRINTF {
        return gen_printf(compiler, node);
    }

    let function = compiler.module.get_function(name).ok_or_else(|| {
        Error::new(
            ErrorImpl::FunctionNotDeclared {
                function: name.to_string(),
            },
            position,
        )
    })?;

    let arguments = ast.children(node);
    let expected = function.count_params() as usize;
    if arguments.len() != expected {
        return Err(Error::new(
            ErrorImpl::ArgumentCountMismatch {
                function: name.to_string(),
                expected,
                received: arguments.len(),
            },
            position,
        ));
    }

    let mut values: Vec<BasicMetadataValueEnum<'a>> = vec![];
    for (index, &argument) in arguments.iter().enumerate() {
        let value = gen_expression(compiler, argument)?;
        let value = match function.get_nth_param(index as u32) {
            Some(param) => compiler.coerce(value, param.get_type(), ast.position(argument))?,
            None => value,
        };
        values.push(value.into());
    }

    let returns_void = function.get_type().get_return_type().is_none();
    let call = compiler
        .builder
        .build_call(function, &values, if returns_void { "" } else { "call" })?;

    Ok(call
        .try_as_basic_value()
        .left()
        .unwrap_or_else(|| compiler.context.i32_type().const_zero().into()))
}

/// `printf(format, ...)` with C's default argument promotions.
fn gen_printf<'a>(compiler: &Compiler<'a>, node: NodeId) -> Result<BasicValueEnum<'a>, Error> {
    let ast = &compiler.ast;
    let position = ast.position(node);

    let printf = compiler.module.get_function(PRINTF).ok_or_else(|| {
        Error::new(
            ErrorImpl::FunctionNotDeclared {
                function: String::from(PRINTF),
            },
            position,
        )
    })?;

    let Some((&format, rest)) = ast.children(node).split_first() else {
        return Err(Error::new(
            ErrorImpl::InvalidTextOutputCall {
                message: String::from("missing format string"),
            },
            position,
        ));
    };

    let format = gen_expression(compiler, format)?;
    if !format.is_pointer_value() {
        return Err(Error::new(
            ErrorImpl::InvalidTextOutputCall {
                message: format!(
                    "format must be a string, found {}",
                    describe(format.get_type())
                ),
            },
            position,
        ));
    }

    let mut values: Vec<BasicMetadataValueEnum<'a>> = vec![format.into()];
    for &argument in rest {
        let value = match gen_expression(compiler, argument)? {
            BasicValueEnum::IntValue(int) => compiler.widen_int(int)?.into(),
            BasicValueEnum::FloatValue(float) if float.get_type() == compiler.context.f32_type() => {
                compiler
                    .builder
                    .build_float_ext(float, compiler.context.f64_type(), "fpext")?
                    .into()
            }
            other => other,
        };
        values.push(value.into());
    }

    let call = compiler.builder.build_call(printf, &values, "printf")?;

    Ok(call
        .try_as_basic_value()
        .left()
        .unwrap_or_else(|| compiler.context.i32_type().const_zero().into()))
}
