//! Token definitions.

use std::fmt;

use lumen_ast::Span;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Keyword {
    Fn,
    Var,
    Let,
    Type,
    Struct,
    Return,
    If,
    Else,
    Loop,
    Continuing,
    For,
    Break,
    Continue,
    Discard,
    True,
    False,
    Bitcast,
}

impl Keyword {
    pub fn from_ident(text: &str) -> Option<Self> {
        Some(match text {
            "fn" => Self::Fn,
            "var" => Self::Var,
            "let" => Self::Let,
            "type" => Self::Type,
            "struct" => Self::Struct,
            "return" => Self::Return,
            "if" => Self::If,
            "else" => Self::Else,
            "loop" => Self::Loop,
            "continuing" => Self::Continuing,
            "for" => Self::For,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "discard" => Self::Discard,
            "true" => Self::True,
            "false" => Self::False,
            "bitcast" => Self::Bitcast,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fn => "fn",
            Self::Var => "var",
            Self::Let => "let",
            Self::Type => "type",
            Self::Struct => "struct",
            Self::Return => "return",
            Self::If => "if",
            Self::Else => "else",
            Self::Loop => "loop",
            Self::Continuing => "continuing",
            Self::For => "for",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Discard => "discard",
            Self::True => "true",
            Self::False => "false",
            Self::Bitcast => "bitcast",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    /// Integer literal without suffix, or with `i`.
    IntI32(i32),
    /// Integer literal with `u`.
    IntU32(u32),
    /// `2147483648` without a `u` suffix. Only valid right after a unary
    /// `-`, where it spells `i32::MIN`.
    I32MinMagnitude,
    Float(f32),
    At,
    ParenLeft,
    ParenRight,
    BraceLeft,
    BraceRight,
    BracketLeft,
    BracketRight,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    ShiftLeft,
    ShiftRight,
    Equal,
    EqualEqual,
    NotEqual,
    Bang,
    Tilde,
    And,
    AndAnd,
    Or,
    OrOr,
    Xor,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Comma,
    Semicolon,
    Colon,
    Period,
    Arrow,
    Underscore,
    /// A malformed token; the lexer has already reported it.
    Error,
    Eof,
}

impl TokenKind {
    /// The punctuation text of this token, if it is punctuation.
    pub fn punct(&self) -> Option<&'static str> {
        Some(match self {
            Self::At => "@",
            Self::ParenLeft => "(",
            Self::ParenRight => ")",
            Self::BraceLeft => "{",
            Self::BraceRight => "}",
            Self::BracketLeft => "[",
            Self::BracketRight => "]",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEqual => "<=",
            Self::GreaterThanEqual => ">=",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Equal => "=",
            Self::EqualEqual => "==",
            Self::NotEqual => "!=",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::And => "&",
            Self::AndAnd => "&&",
            Self::Or => "|",
            Self::OrOr => "||",
            Self::Xor => "^",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Period => ".",
            Self::Arrow => "->",
            Self::Underscore => "_",
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Self::IntI32(v) => write!(f, "{v}"),
            Self::IntU32(v) => write!(f, "{v}u"),
            Self::I32MinMagnitude => write!(f, "2147483648"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Error => write!(f, "<error>"),
            Self::Eof => write!(f, "<eof>"),
            other => write!(f, "{}", other.punct().unwrap_or("?")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
