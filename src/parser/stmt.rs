use crate::{
    ast::ast::{LeafValue, NodeId, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type_specifier};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    if let Some(handler) = parser.get_stmt_handler(parser.current_token_kind()) {
        return handler(parser);
    }

    let position = parser.get_position();
    let expr = parse_expr(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected `;` after expression");
    parser.expect_error(TokenKind::Semicolon, Some(error))?;

    Ok(parser.ast.expression_stmt(expr, position))
}

/// `int a, b = 2, c;`
pub fn parse_declaration_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();
    let type_node = parse_type_specifier(parser)?;

    let mut declarators = vec![];
    loop {
        let declarator_position = parser.get_position();
        let error = parser.unexpected("expected identifier in declaration");
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

        if parser.current_token_kind() == TokenKind::OpenBracket {
            return Err(Error::new(
                ErrorImpl::UnsupportedConstruct {
                    construct: String::from("Arrays"),
                },
                parser.get_position(),
            ));
        }

        let initializer = if parser.current_token_kind() == TokenKind::Assignment {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        declarators.push(parser.ast.declarator(name, initializer, declarator_position));

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    let error = parser.unexpected("expected `,` or `;` in declaration");
    parser.expect_error(TokenKind::Semicolon, Some(error))?;

    Ok(parser.ast.declaration(type_node, declarators, position))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();
    parser.expect(TokenKind::OpenCurly)?;

    let mut body = vec![];
    while parser.has_tokens() && parser.current_token_kind() != TokenKind::CloseCurly {
        body.push(parse_stmt(parser)?);
    }

    let error = parser.unexpected("expected `}` to close block");
    parser.expect_error(TokenKind::CloseCurly, Some(error))?;

    Ok(parser.ast.block(body, position))
}

fn parse_parenthesised_condition(parser: &mut Parser, keyword: &str) -> Result<NodeId, Error> {
    let error = parser.unexpected(&format!("expected `(` after `{}`", keyword));
    parser.expect_error(TokenKind::OpenParen, Some(error))?;

    let condition = parse_expr(parser, BindingPower::Default)?;

    let error = parser.unexpected(&format!("expected `)` after `{}` condition", keyword));
    parser.expect_error(TokenKind::CloseParen, Some(error))?;

    Ok(condition)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let condition = parse_parenthesised_condition(parser, "if")?;
    let then_branch = parse_stmt(parser)?;

    let else_branch = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(parse_stmt(parser)?)
    } else {
        None
    };

    Ok(parser
        .ast
        .if_stmt(condition, then_branch, else_branch, position))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let condition = parse_parenthesised_condition(parser, "while")?;
    let body = parse_stmt(parser)?;

    Ok(parser.ast.while_stmt(condition, body, position))
}

pub fn parse_do_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let body = parse_stmt(parser)?;

    let error = parser.unexpected("expected `while` after `do` body");
    parser.expect_error(TokenKind::While, Some(error))?;

    let condition = parse_parenthesised_condition(parser, "while")?;

    let error = parser.unexpected("expected `;` after `do`/`while`");
    parser.expect_error(TokenKind::Semicolon, Some(error))?;

    Ok(parser.ast.do_while(body, condition, position))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let error = parser.unexpected("expected `(` after `for`");
    parser.expect_error(TokenKind::OpenParen, Some(error))?;

    if parser.current_token_kind().starts_declaration() {
        return Err(Error::new(
            ErrorImpl::UnsupportedConstruct {
                construct: String::from("Declarations in `for` initializers"),
            },
            parser.get_position(),
        ));
    }

    let init = parse_for_clause(parser, TokenKind::Semicolon)?;
    let condition = parse_for_clause(parser, TokenKind::Semicolon)?;
    let increment = parse_for_clause(parser, TokenKind::CloseParen)?;

    let body = parse_stmt(parser)?;

    Ok(parser
        .ast
        .for_stmt(init, condition, increment, body, position))
}

fn parse_for_clause(parser: &mut Parser, terminator: TokenKind) -> Result<Option<NodeId>, Error> {
    let clause = if parser.current_token_kind() == terminator {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    let spelling = if terminator == TokenKind::Semicolon { ";" } else { ")" };
    let error = parser.unexpected(&format!("expected `{}` in `for` header", spelling));
    parser.expect_error(terminator, Some(error))?;

    Ok(clause)
}

/// `switch (x) { case 1: ... default: ... }`
///
/// Each clause owns the statements up to the next label, so fallthrough is
/// decided by the code generator, not here.
pub fn parse_switch_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let scrutinee = parse_parenthesised_condition(parser, "switch")?;

    let error = parser.unexpected("expected `{` to open `switch` body");
    parser.expect_error(TokenKind::OpenCurly, Some(error))?;

    let mut clauses = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let clause_position = parser.get_position();
        match parser.current_token_kind() {
            TokenKind::Case => {
                parser.advance();
                let label = parse_expr(parser, BindingPower::Default)?;

                let error = parser.unexpected("expected `:` after `case` label");
                parser.expect_error(TokenKind::Colon, Some(error))?;

                let body = parse_clause_body(parser)?;
                clauses.push(parser.ast.case(label, body, clause_position));
            }
            TokenKind::Default => {
                parser.advance();

                let error = parser.unexpected("expected `:` after `default`");
                parser.expect_error(TokenKind::Colon, Some(error))?;

                let body = parse_clause_body(parser)?;
                clauses.push(parser.ast.default_case(body, clause_position));
            }
            _ => return Err(parser.unexpected("expected `case` or `default`")),
        }
    }
    parser.advance();

    Ok(parser.ast.switch(scrutinee, clauses, position))
}

fn parse_clause_body(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    let mut body = vec![];
    while !matches!(
        parser.current_token_kind(),
        TokenKind::Case | TokenKind::Default | TokenKind::CloseCurly | TokenKind::EOF
    ) {
        body.push(parse_stmt(parser)?);
    }

    Ok(body)
}

/// `break;` and `continue;`
pub fn parse_jump_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();
    let kind = match parser.advance().kind {
        TokenKind::Break => NodeKind::Break,
        _ => NodeKind::Continue,
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(parser.ast.leaf(kind, LeafValue::None, position))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;

    let value = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    let error = parser.unexpected("expected `;` after `return`");
    parser.expect_error(TokenKind::Semicolon, Some(error))?;

    Ok(parser.ast.return_stmt(value, position))
}

pub fn parse_empty_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.advance().span.start;
    Ok(parser.ast.empty(position))
}

pub fn parse_unsupported_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let keyword = parser.current_token().value.clone();
    Err(Error::new(
        ErrorImpl::UnsupportedConstruct {
            construct: format!("`{}`", keyword),
        },
        parser.get_position(),
    ))
}

/// A top-level function definition or prototype.
pub fn parse_function_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();
    let return_type = parse_type_specifier(parser)?;

    let error = parser.unexpected("expected function name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    if parser.current_token_kind() != TokenKind::OpenParen {
        return Err(Error::new(
            ErrorImpl::UnsupportedConstruct {
                construct: String::from("Global variables"),
            },
            parser.get_position(),
        ));
    }
    parser.advance();

    let params = parse_parameters(parser)?;

    let body = if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        None
    } else {
        Some(parse_block_stmt(parser)?)
    };

    Ok(parser
        .ast
        .function(name, return_type, params, body, position))
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    let mut params = vec![];

    // `f(void)` takes nothing
    if parser.current_token_kind() == TokenKind::Void
        && parser.peek_kind(1) == TokenKind::CloseParen
    {
        parser.advance();
    }

    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.current_token_kind() == TokenKind::Ellipsis {
            return Err(Error::new(
                ErrorImpl::UnsupportedConstruct {
                    construct: String::from("Variadic functions"),
                },
                parser.get_position(),
            ));
        }

        let position = parser.get_position();
        let type_node = parse_type_specifier(parser)?;

        let error = parser.unexpected("expected parameter name");
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

        params.push(parser.ast.parameter(name, type_node, position));

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    let error = parser.unexpected("expected `,` or `)` in parameter list");
    parser.expect_error(TokenKind::CloseParen, Some(error))?;

    Ok(params)
}
