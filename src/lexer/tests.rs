//! Unit tests for the lexer module.

use super::{
    lexer::{tokenize, unescape},
    tokens::TokenKind,
};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = kinds("int float char void double if else while do for switch case default break continue return");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Int,
            TokenKind::Float,
            TokenKind::Char,
            TokenKind::Void,
            TokenKind::Double,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::For,
            TokenKind::Switch,
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Return,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo bar_1 _tmp integer").unwrap();

    assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(tokens[3].value, "integer");
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 1e5 2.5E-3 7.").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::FloatNumber);
    assert_eq!(tokens[2].kind, TokenKind::FloatNumber);
    assert_eq!(tokens[3].kind, TokenKind::FloatNumber);
    assert_eq!(tokens[3].value, "2.5E-3");
    assert_eq!(tokens[4].kind, TokenKind::FloatNumber);
}

#[test]
fn test_tokenize_hex_number() {
    let tokens = tokenize("0xFF").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "255");
}

#[test]
fn test_malformed_numbers() {
    for source in ["1.2.3", "1e5e2", "1e5.2", "3e"] {
        let error = tokenize(source).unwrap_err();
        assert_eq!(error.get_error_name(), "MalformedNumber", "source: {}", source);
    }
}

#[test]
fn test_malformed_number_reports_line() {
    let error = tokenize("int a;\nint b;\nb = 1.2.3;").unwrap_err();

    assert_eq!(error.get_error_name(), "MalformedNumber");
    assert_eq!(error.get_position().line, 3);
}

#[test]
fn test_integer_overflow() {
    let error = tokenize("99999999999999999999").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}

#[test]
fn test_tokenize_strings() {
    let tokens = tokenize(r#""hello\n" "tab\there" "quote\"d""#).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, r"hello\n");
    assert_eq!(tokens[1].value, r"tab\there");
    assert_eq!(tokens[2].value, r#"quote\"d"#);
}

#[test]
fn test_tokenize_characters() {
    let tokens = tokenize(r"'a' '\n'").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Character);
    assert_eq!(tokens[0].value, "'a'");
    assert_eq!(tokens[1].value, r"'\n'");
}

#[test]
fn test_longest_operator_wins() {
    let tokens = kinds("<<= >>= << >> <= >= == != && || ++ -- += -= *= /= %= &= |= ^=");

    assert_eq!(
        tokens,
        vec![
            TokenKind::ShiftLeftEquals,
            TokenKind::ShiftRightEquals,
            TokenKind::ShiftLeft,
            TokenKind::ShiftRight,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::PlusEquals,
            TokenKind::MinusEquals,
            TokenKind::StarEquals,
            TokenKind::SlashEquals,
            TokenKind::PercentEquals,
            TokenKind::AmpersandEquals,
            TokenKind::PipeEquals,
            TokenKind::CaretEquals,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_single_character_operators() {
    let tokens = kinds("+ - * / % & | ^ ~ ! < > = ? : ; , ( ) { }");

    assert_eq!(tokens.len(), 22);
    assert_eq!(tokens[6], TokenKind::Pipe);
    assert_eq!(tokens[8], TokenKind::Tilde);
    assert_eq!(tokens[13], TokenKind::Question);
}

#[test]
fn test_comments_and_preprocessor_lines_are_skipped() {
    let source = "#include <stdio.h>\n// line comment\nint /* block\ncomment */ x;";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].kind, TokenKind::Int);
    assert_eq!(tokens[1].value, "x");
    assert_eq!(tokens[1].span.start.line, 4);
}

#[test]
fn test_unterminated_comment() {
    let error = tokenize("int x; /* never closed").unwrap_err();
    assert_eq!(error.get_error_name(), "UnterminatedLiteral");
}

#[test]
fn test_unterminated_string() {
    let error = tokenize("\"open").unwrap_err();
    assert_eq!(error.get_error_name(), "UnterminatedLiteral");
}

#[test]
fn test_unrecognised_token() {
    let error = tokenize("int a = 1;\na = @;").unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().line, 2);
    assert_eq!(error.get_position().offset, 15);
}

#[test]
fn test_line_numbers() {
    let tokens = tokenize("int\nmain\n\n(").unwrap();

    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[1].span.start.line, 2);
    assert_eq!(tokens[2].span.start.line, 4);
}

#[test]
fn test_empty_source_yields_eof() {
    let tokens = tokenize("   \n").unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::EOF);
}

#[test]
fn test_unescape_hex() {
    assert_eq!(unescape(r"\x41\x42"), b"AB");
    assert_eq!(unescape(r"a\qb"), br"a\qb");
}

#[test]
fn test_unescape_common_escapes() {
    assert_eq!(unescape(r#"a\n\t\"\0"#), b"a\n\t\"\0");
    assert_eq!(unescape("ñ"), "ñ".as_bytes());
}

#[test]
fn test_unescape_high_hex_is_one_byte() {
    assert_eq!(unescape(r"\xff"), [0xff]);
    assert_eq!(unescape(r"\x80z"), [0x80, b'z']);

    let tokens = tokenize(r#"'\xff' "\x80""#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Character);
    assert_eq!(tokens[0].value, r"'\xff'");
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, r"\x80");
}
