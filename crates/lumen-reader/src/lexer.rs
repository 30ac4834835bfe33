//! Hand-written lexer.

use lumen_ast::{Diagnostics, Location, Span, System};

use crate::token::{Keyword, Token, TokenKind};

/// Splits `source` into tokens.
///
/// The result always ends with an [`TokenKind::Eof`] token placed just
/// after the last character. Scanning stops at the first malformed token,
/// which is reported to `diagnostics` and emitted as [`TokenKind::Error`].
pub fn tokenize(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        match lexer.next_token() {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => break,
            Err((span, message)) => {
                diagnostics.add_error(System::Lexer, span, message);
                tokens.push(Token {
                    kind: TokenKind::Error,
                    span,
                });
                break;
            }
        }
    }
    let end = lexer.location();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });
    tokens
}

type LexResult<T> = Result<T, (Span, String)>;

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Block comments nest.
    fn skip_block_comment(&mut self) -> LexResult<()> {
        let begin = self.location();
        self.bump();
        self.bump();
        let mut depth = 1u32;
        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.bump();
                    self.bump();
                    depth -= 1;
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => {
                    return Err((
                        Span::new(begin, self.location()),
                        "unterminated block comment".to_owned(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> LexResult<Option<Token>> {
        self.skip_trivia()?;
        let begin = self.location();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = if c.is_ascii_alphabetic() || c == '_' {
            self.ident_or_keyword()
        } else if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            self.number(begin)?
        } else {
            self.punct(begin)?
        };
        Ok(Some(Token {
            kind,
            span: Span::new(begin, self.location()),
        }))
    }

    fn ident_or_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            text.push(c);
            self.bump();
        }
        if text == "_" {
            return TokenKind::Underscore;
        }
        match Keyword::from_ident(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(text),
        }
    }

    fn number(&mut self, begin: Location) -> LexResult<TokenKind> {
        let mut text = String::new();

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                text.push(c);
                self.bump();
            }
            if text.is_empty() {
                return Err((
                    Span::new(begin, self.location()),
                    "expected hexadecimal digits after '0x'".to_owned(),
                ));
            }
            let value = u64::from_str_radix(&text, 16).ok();
            return self.integer(begin, format!("0x{text}"), value);
        }

        let mut is_float = false;
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
        if self.peek() == Some('.') && !self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                text.push(c);
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    text.push(c);
                    self.bump();
                }
            }
        }
        if self.peek() == Some('f') {
            self.bump();
            is_float = true;
        }

        if is_float {
            return match text.parse::<f32>() {
                Ok(value) => Ok(TokenKind::Float(value)),
                Err(_) => Err((
                    Span::new(begin, self.location()),
                    format!("invalid floating point literal ({text})"),
                )),
            };
        }
        let value = text.parse::<u64>().ok();
        self.integer(begin, text, value)
    }

    fn integer(&mut self, begin: Location, text: String, value: Option<u64>) -> LexResult<TokenKind> {
        let suffix = match self.peek() {
            Some(s @ ('u' | 'i')) => {
                self.bump();
                Some(s)
            }
            _ => None,
        };
        let too_large = || {
            (
                Span::new(begin, self.location()),
                format!("integer literal ({text}) too large"),
            )
        };
        match suffix {
            Some('u') => value
                .and_then(|v| u32::try_from(v).ok())
                .map(TokenKind::IntU32)
                .ok_or_else(too_large),
            _ if value == Some(1 << 31) && !text.starts_with("0x") => {
                Ok(TokenKind::I32MinMagnitude)
            }
            _ => value
                .and_then(|v| i32::try_from(v).ok())
                .map(TokenKind::IntI32)
                .ok_or_else(too_large),
        }
    }

    fn punct(&mut self, begin: Location) -> LexResult<TokenKind> {
        let c = self.peek().unwrap_or('\0');
        let next = self.peek_at(1);
        let (kind, len) = match (c, next) {
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('<', Some('<')) => (TokenKind::ShiftLeft, 2),
            ('>', Some('>')) => (TokenKind::ShiftRight, 2),
            ('<', Some('=')) => (TokenKind::LessThanEqual, 2),
            ('>', Some('=')) => (TokenKind::GreaterThanEqual, 2),
            ('=', Some('=')) => (TokenKind::EqualEqual, 2),
            ('!', Some('=')) => (TokenKind::NotEqual, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('@', _) => (TokenKind::At, 1),
            ('(', _) => (TokenKind::ParenLeft, 1),
            (')', _) => (TokenKind::ParenRight, 1),
            ('{', _) => (TokenKind::BraceLeft, 1),
            ('}', _) => (TokenKind::BraceRight, 1),
            ('[', _) => (TokenKind::BracketLeft, 1),
            (']', _) => (TokenKind::BracketRight, 1),
            ('<', _) => (TokenKind::LessThan, 1),
            ('>', _) => (TokenKind::GreaterThan, 1),
            ('=', _) => (TokenKind::Equal, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('~', _) => (TokenKind::Tilde, 1),
            ('&', _) => (TokenKind::And, 1),
            ('|', _) => (TokenKind::Or, 1),
            ('^', _) => (TokenKind::Xor, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('.', _) => (TokenKind::Period, 1),
            _ => {
                let end = Location::new(begin.line, begin.column + 1);
                return Err((Span::new(begin, end), "invalid character found".to_owned()));
            }
        };
        for _ in 0..len {
            self.bump();
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut diags = Diagnostics::new();
        let tokens = tokenize(source, &mut diags);
        assert!(!diags.contains_errors(), "{diags}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_idents_and_punct() {
        assert_eq!(
            kinds("fn main() -> f32 { _ = x; }"),
            vec![
                TokenKind::Keyword(Keyword::Fn),
                TokenKind::Ident("main".into()),
                TokenKind::ParenLeft,
                TokenKind::ParenRight,
                TokenKind::Arrow,
                TokenKind::Ident("f32".into()),
                TokenKind::BraceLeft,
                TokenKind::Underscore,
                TokenKind::Equal,
                TokenKind::Ident("x".into()),
                TokenKind::Semicolon,
                TokenKind::BraceRight,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 2u 3i 0x10 1.5 2.0f 3f 1e2"),
            vec![
                TokenKind::IntI32(1),
                TokenKind::IntU32(2),
                TokenKind::IntI32(3),
                TokenKind::IntI32(16),
                TokenKind::Float(1.5),
                TokenKind::Float(2.0),
                TokenKind::Float(3.0),
                TokenKind::Float(100.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn eof_sits_after_last_character() {
        let mut diags = Diagnostics::new();
        let tokens = tokenize("texture_1d", &mut diags);
        let eof = tokens.last().expect("eof token");
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span.begin, Location::new(1, 11));
    }

    #[test]
    fn tracks_lines_and_nested_comments() {
        let mut diags = Diagnostics::new();
        let tokens = tokenize("/* a /* b */ c */\n  // line\n  x", &mut diags);
        assert!(!diags.contains_errors());
        assert_eq!(tokens[0].kind, TokenKind::Ident("x".into()));
        assert_eq!(tokens[0].span.begin, Location::new(3, 3));
    }

    #[test]
    fn lexer_errors() {
        let mut diags = Diagnostics::new();
        tokenize("let a = $;", &mut diags);
        assert_eq!(diags.to_string(), "1:9: invalid character found");

        let mut diags = Diagnostics::new();
        tokenize("/* open", &mut diags);
        assert_eq!(diags.to_string(), "1:1: unterminated block comment");

        let mut diags = Diagnostics::new();
        tokenize("4294967296u", &mut diags);
        assert_eq!(diags.to_string(), "1:1: integer literal (4294967296) too large");

        let mut diags = Diagnostics::new();
        tokenize("let a = 0x;", &mut diags);
        assert_eq!(diags.to_string(), "1:9: expected hexadecimal digits after '0x'");

        let mut diags = Diagnostics::new();
        tokenize("2147483649", &mut diags);
        assert_eq!(diags.to_string(), "1:1: integer literal (2147483649) too large");
    }

    #[test]
    fn i32_min_magnitude_is_its_own_token() {
        assert_eq!(
            kinds("-2147483648 2147483648i 2147483648u"),
            vec![
                TokenKind::Minus,
                TokenKind::I32MinMagnitude,
                TokenKind::I32MinMagnitude,
                TokenKind::IntU32(2147483648),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn member_access_on_integer_is_not_a_float() {
        assert_eq!(
            kinds("v.x"),
            vec![
                TokenKind::Ident("v".into()),
                TokenKind::Period,
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }
}
