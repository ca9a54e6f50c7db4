use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

fn pattern(regex: &str, handler: RegexHandler) -> RegexPattern {
    RegexPattern {
        regex: Regex::new(regex).expect("token patterns are valid regular expressions"),
        handler,
    }
}

lazy_static! {
    // Tried in order, first match wins: longer operators precede their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern(r"^\s+", skip_handler),
        pattern(r"^#[^\n]*", skip_handler),
        pattern(r"^//[^\n]*", skip_handler),
        pattern(r"(?s)^/\*.*?\*/", skip_handler),
        pattern(r"^/\*", unterminated_comment_handler),
        pattern(r"^[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        pattern(r"^0[xX][0-9a-fA-F]+", hex_handler),
        pattern(r"^[0-9](?:[0-9.]|[eE][+-]?)*", number_handler),
        pattern(r#"^"(?:[^"\\]|\\.)*""#, string_handler),
        pattern(r#"^""#, unterminated_string_handler),
        pattern(r"^'(?:[^'\\\n]|\\.)+'", character_handler),
        pattern(r"^'", unterminated_character_handler),
        pattern(r"^\.\.\.", MK_DEFAULT_HANDLER!(TokenKind::Ellipsis, "...")),
        pattern(r"^<<=", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeftEquals, "<<=")),
        pattern(r"^>>=", MK_DEFAULT_HANDLER!(TokenKind::ShiftRightEquals, ">>=")),
        pattern(r"^\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
        pattern(r"^\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
        pattern(r"^\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        pattern(r"^\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        pattern(r"^\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        pattern(r"^\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        pattern(r"^==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        pattern(r"^!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        pattern(r"^!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        pattern(r"^=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        pattern(r"^<<", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeft, "<<")),
        pattern(r"^>>", MK_DEFAULT_HANDLER!(TokenKind::ShiftRight, ">>")),
        pattern(r"^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        pattern(r"^<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        pattern(r"^>=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        pattern(r"^>", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        pattern(r"^\|\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        pattern(r"^&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        pattern(r"^\|=", MK_DEFAULT_HANDLER!(TokenKind::PipeEquals, "|=")),
        pattern(r"^&=", MK_DEFAULT_HANDLER!(TokenKind::AmpersandEquals, "&=")),
        pattern(r"^\^=", MK_DEFAULT_HANDLER!(TokenKind::CaretEquals, "^=")),
        pattern(r"^\|", MK_DEFAULT_HANDLER!(TokenKind::Pipe, "|")),
        pattern(r"^&", MK_DEFAULT_HANDLER!(TokenKind::Ampersand, "&")),
        pattern(r"^\^", MK_DEFAULT_HANDLER!(TokenKind::Caret, "^")),
        pattern(r"^~", MK_DEFAULT_HANDLER!(TokenKind::Tilde, "~")),
        pattern(r"^->", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->")),
        pattern(r"^\+\+", MK_DEFAULT_HANDLER!(TokenKind::PlusPlus, "++")),
        pattern(r"^--", MK_DEFAULT_HANDLER!(TokenKind::MinusMinus, "--")),
        pattern(r"^\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
        pattern(r"^-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
        pattern(r"^\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
        pattern(r"^/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
        pattern(r"^%=", MK_DEFAULT_HANDLER!(TokenKind::PercentEquals, "%=")),
        pattern(r"^\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        pattern(r"^;", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        pattern(r"^:", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        pattern(r"^\?", MK_DEFAULT_HANDLER!(TokenKind::Question, "?")),
        pattern(r"^,", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        pattern(r"^\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        pattern(r"^-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        pattern(r"^/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        pattern(r"^\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
        pattern(r"^%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
    ];
}

pub struct Lexer<'s> {
    tokens: Vec<Token>,
    source: &'s str,
    pos: usize,
    line: u32,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Lexer<'s> {
        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
        }
    }

    /// Moves past `n` bytes, counting the newlines crossed.
    pub fn advance_n(&mut self, n: usize) {
        let end = (self.pos + n).min(self.source.len());
        self.line += self.source[self.pos..end].matches('\n').count() as u32;
        self.pos = end;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &'s str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self) -> Position {
        Position::new(self.pos as u32, self.line)
    }

    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position::new((self.pos + len) as u32, self.line),
        }
    }

    fn matched(&self, regex: &Regex) -> &'s str {
        regex.find(self.remainder()).map_or("", |m| m.as_str())
    }

    fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position())
    }
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex).len();
    lexer.advance_n(matched);
    Ok(())
}

fn unterminated_comment_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    Err(lexer.error(ErrorImpl::UnterminatedLiteral {
        kind: String::from("block comment"),
    }))
}

fn unterminated_string_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    Err(lexer.error(ErrorImpl::UnterminatedLiteral {
        kind: String::from("string literal"),
    }))
}

fn unterminated_character_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    Err(lexer.error(ErrorImpl::UnterminatedLiteral {
        kind: String::from("character literal"),
    }))
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = lexer.matched(regex);
    let kind = RESERVED_LOOKUP
        .get(value)
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push(MK_TOKEN!(kind, String::from(value), lexer.span_of(value.len())));
    lexer.advance_n(value.len());
    Ok(())
}

fn hex_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    let value = i64::from_str_radix(&matched[2..], 16).map_err(|_| {
        lexer.error(ErrorImpl::NumberParseError {
            token: matched.to_string(),
        })
    })?;

    lexer.push(MK_TOKEN!(
        TokenKind::Number,
        value.to_string(),
        lexer.span_of(matched.len())
    ));
    lexer.advance_n(matched.len());
    Ok(())
}

/// Integer when neither `.` nor an exponent appears; float when there is at
/// most one of each and the exponent comes last; malformed otherwise.
fn classify_number(text: &str) -> Option<TokenKind> {
    let dot = text.find('.');
    let exponent = text.find(['e', 'E']);
    let dots = text.matches('.').count();
    let exponents = text.matches(['e', 'E']).count();

    match (dot, exponent) {
        (None, None) => Some(TokenKind::Number),
        _ if dots > 1 || exponents > 1 => None,
        (Some(dot), Some(exponent)) if dot > exponent => None,
        _ if text.parse::<f64>().is_ok() => Some(TokenKind::FloatNumber),
        _ => None,
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);

    let kind = classify_number(matched).ok_or_else(|| {
        lexer.error(ErrorImpl::MalformedNumber {
            token: matched.to_string(),
        })
    })?;

    if kind == TokenKind::Number && matched.parse::<i64>().is_err() {
        return Err(lexer.error(ErrorImpl::NumberParseError {
            token: matched.to_string(),
        }));
    }

    lexer.push(MK_TOKEN!(kind, matched.to_string(), lexer.span_of(matched.len())));
    lexer.advance_n(matched.len());
    Ok(())
}

/// Decodes the escape sequences of a string or character literal body.
///
/// `\xHH` yields the raw byte, so the result is not always valid UTF-8.
pub fn unescape(literal: &str) -> Vec<u8> {
    let mut result = vec![];
    let mut chars = literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buffer = [0; 4];
            result.extend_from_slice(ch.encode_utf8(&mut buffer).as_bytes());
            continue;
        }

        let byte = match chars.peek().copied() {
            Some('n') => b'\n',
            Some('t') => b'\t',
            Some('r') => b'\r',
            Some('\\') => b'\\',
            Some('"') => b'"',
            Some('\'') => b'\'',
            Some('0') => 0,
            Some('x') => {
                chars.next();
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(digit) if digit.is_ascii_hexdigit() => {
                            hex.push(*digit);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => result.push(byte),
                    Err(_) => result.extend_from_slice(b"\\x"),
                }
                continue;
            }
            // Unknown escape: keep the backslash
            _ => {
                result.push(b'\\');
                continue;
            }
        };

        result.push(byte);
        chars.next();
    }

    result
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    // The body stays escaped until the parser decodes it
    let body = matched[1..matched.len() - 1].to_string();

    lexer.push(MK_TOKEN!(TokenKind::String, body, lexer.span_of(matched.len())));
    lexer.advance_n(matched.len());
    Ok(())
}

fn character_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);

    lexer.push(MK_TOKEN!(
        TokenKind::Character,
        matched.to_string(),
        lexer.span_of(matched.len())
    ));
    lexer.advance_n(matched.len());
    Ok(())
}

/// Splits `source` into tokens, ending the stream with an `EOF` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let remainder = lex.remainder();
        let Some(pattern) = PATTERNS.iter().find(|p| p.regex.is_match(remainder)) else {
            return Err(lex.error(ErrorImpl::UnrecognisedToken {
                token: lex.at().to_string(),
            }));
        };

        (pattern.handler)(&mut lex, &pattern.regex)?;
    }

    let eof = MK_TOKEN!(TokenKind::EOF, String::from("EOF"), lex.span_of(0));
    lex.push(eof);

    debug!(tokens = lex.tokens.len() - 1, lines = lex.line, "tokenized source");
    Ok(lex.tokens)
}
