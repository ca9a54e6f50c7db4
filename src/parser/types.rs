use crate::{
    ast::ast::NodeId,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Parses a run of type keywords and qualifiers into one `Type` node.
///
/// `unsigned long`, `const int` and friends collapse to a single keyword:
/// `double` wins over `float`, `float` over `void`, and `void` over the
/// integer keywords. A specifier made only of qualifiers records the first
/// qualifier, which later lowers as `int`.
pub fn parse_type_specifier(parser: &mut Parser) -> Result<NodeId, Error> {
    let position = parser.get_position();

    if matches!(
        parser.current_token_kind(),
        TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Typedef
    ) {
        return Err(Error::new(
            ErrorImpl::UnsupportedConstruct {
                construct: format!("`{}`", parser.current_token().value),
            },
            position,
        ));
    }

    let mut specifiers = vec![];
    while parser.current_token_kind().starts_declaration() {
        specifiers.push(parser.advance().kind);
    }

    if specifiers.is_empty() {
        return Err(parser.unexpected("expected a type"));
    }

    if parser.current_token_kind() == TokenKind::Star {
        return Err(Error::new(
            ErrorImpl::UnsupportedConstruct {
                construct: String::from("Pointer types"),
            },
            parser.get_position(),
        ));
    }

    Ok(parser
        .ast
        .type_specifier(dominant_type(&specifiers), position))
}

fn dominant_type(specifiers: &[TokenKind]) -> TokenKind {
    for preferred in [TokenKind::Double, TokenKind::Float, TokenKind::Void] {
        if specifiers.contains(&preferred) {
            return preferred;
        }
    }

    specifiers
        .iter()
        .copied()
        .find(TokenKind::is_type_keyword)
        .unwrap_or(specifiers[0])
}
