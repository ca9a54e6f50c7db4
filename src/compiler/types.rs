use inkwell::{
    context::Context,
    types::{AnyType, BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
};
use tracing::warn;

use crate::lexer::tokens::TokenKind;

/// The machine types a declared C type can lower to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Int32,
    Int8,
    Float32,
    Double64,
    Void,
}

impl CType {
    /// Maps the keyword recorded on a `Type` node.
    ///
    /// Every integer keyword, `char` included, is a 32-bit slot; only
    /// character literals are 8-bit. Anything unrecognised falls back to
    /// `Int32` with a warning.
    pub fn from_token(token: Option<TokenKind>) -> CType {
        match token {
            Some(
                TokenKind::Int
                | TokenKind::Short
                | TokenKind::Long
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Char,
            ) => CType::Int32,
            Some(TokenKind::Float) => CType::Float32,
            Some(TokenKind::Double) => CType::Double64,
            Some(TokenKind::Void) => CType::Void,
            other => {
                warn!(token = ?other, "unmapped type specifier, falling back to int");
                CType::Int32
            }
        }
    }

    /// `None` for `void`, which has no storage.
    pub fn basic_type<'a>(self, context: &'a Context) -> Option<BasicTypeEnum<'a>> {
        match self {
            CType::Int32 => Some(context.i32_type().into()),
            CType::Int8 => Some(context.i8_type().into()),
            CType::Float32 => Some(context.f32_type().into()),
            CType::Double64 => Some(context.f64_type().into()),
            CType::Void => None,
        }
    }

    pub fn fn_type<'a>(
        self,
        context: &'a Context,
        params: &[BasicMetadataTypeEnum<'a>],
    ) -> FunctionType<'a> {
        match self.basic_type(context) {
            Some(return_type) => return_type.fn_type(params, false),
            None => context.void_type().fn_type(params, false),
        }
    }
}

/// IR spelling of a type, for diagnostics.
pub fn describe(type_: BasicTypeEnum) -> String {
    type_.print_to_string().to_string()
}
