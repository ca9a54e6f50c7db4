use crate::{
    ast::ast::{LeafValue, NodeId, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::unescape, tokens::TokenKind},
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_handler(token_kind) else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While the next operator binds tighter than the caller, keep extending lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let Some(led) = parser.get_led_handler(token_kind) else {
            return Err(parser.unexpected("expected an operator"));
        };

        let led_bp = parser.current_binding_power();
        left = led(parser, left, led_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();

    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance().value.clone();
            let value = token.parse::<i64>().map_err(|_| {
                Error::new(ErrorImpl::NumberParseError { token }, position)
            })?;
            Ok(parser
                .ast
                .leaf(NodeKind::IntLiteral, LeafValue::Int(value), position))
        }
        TokenKind::FloatNumber => {
            let token = parser.advance().value.clone();
            let value = token.parse::<f64>().map_err(|_| {
                Error::new(ErrorImpl::NumberParseError { token }, position)
            })?;
            Ok(parser
                .ast
                .leaf(NodeKind::FloatLiteral, LeafValue::Float(value), position))
        }
        TokenKind::Identifier => {
            let name = parser.advance().value.clone();
            Ok(parser
                .ast
                .leaf(NodeKind::Identifier, LeafValue::Text(name), position))
        }
        TokenKind::String => {
            // Adjacent literals concatenate after each is decoded
            let mut bytes = vec![];
            while parser.current_token_kind() == TokenKind::String {
                bytes.extend(unescape(&parser.advance().value));
            }
            Ok(parser
                .ast
                .leaf(NodeKind::StringLiteral, LeafValue::Bytes(bytes), position))
        }
        TokenKind::Character => {
            let lexeme = parser.advance().value.clone();
            Ok(parser
                .ast
                .leaf(NodeKind::CharLiteral, LeafValue::Text(lexeme), position))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            position,
        )),
    }
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: NodeId,
    bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator = parser.advance().kind;
    let right = parse_expr(parser, bp)?;

    let position = parser.ast.position(left);
    Ok(parser.ast.binary(operator, left, right, position))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();
    let operator = parser.advance().kind;
    let operand = parse_expr(parser, BindingPower::Unary)?;

    if operator == TokenKind::Plus {
        return Ok(operand);
    }

    Ok(parser.ast.unary(operator, operand, position))
}

/// `x++` and `x--` build the same node as their prefix forms.
pub fn parse_postfix_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator = parser.advance().kind;
    let position = parser.ast.position(left);
    Ok(parser.ast.unary(operator, left, position))
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator = parser.advance().kind;
    // One level looser than assignment, so `a = b = c` groups to the right
    let value = parse_expr(parser, BindingPower::Comma)?;

    let position = parser.ast.position(left);
    Ok(parser.ast.assignment(operator, left, value, position))
}

pub fn parse_ternary_expr(
    parser: &mut Parser,
    condition: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    parser.advance();
    let then_value = parse_expr(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected `:` in conditional expression");
    parser.expect_error(TokenKind::Colon, Some(error))?;

    let else_value = parse_expr(parser, BindingPower::Assignment)?;

    let position = parser.ast.position(condition);
    Ok(parser
        .ast
        .ternary(condition, then_value, else_value, position))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected `)`");
    parser.expect_error(TokenKind::CloseParen, Some(error))?;

    Ok(expr)
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    let position = parser.ast.position(left);
    if parser.ast.kind(left) != NodeKind::Identifier {
        return Err(Error::new(
            ErrorImpl::UnsupportedConstruct {
                construct: String::from("Calling anything but a function name"),
            },
            position,
        ));
    }
    parser.advance();

    let mut arguments = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            arguments.push(parse_expr(parser, BindingPower::Default)?);

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
    }

    let error = parser.unexpected("expected `,` or `)` in argument list");
    parser.expect_error(TokenKind::CloseParen, Some(error))?;

    let callee = parser.ast.text(left).to_string();
    Ok(parser.ast.call(callee, arguments, position))
}

pub fn parse_unsupported_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let construct = match parser.current_token_kind() {
        TokenKind::Star => "Pointer dereference",
        TokenKind::Ampersand => "Taking an address",
        TokenKind::Sizeof => "`sizeof`",
        _ => "This expression",
    };

    Err(Error::new(
        ErrorImpl::UnsupportedConstruct {
            construct: String::from(construct),
        },
        parser.get_position(),
    ))
}
