//! Tokenizer for the C# subset

use crate::error::ParseError;
use crate::syntax::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Using,
    Namespace,
    Class,
    Public,
    Private,
    Protected,
    Internal,
    Static,
    Void,
    Int,
    Double,
    Bool,
    String,
    If,
    Else,
    While,
    For,
    Return,
    True,
    False,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        Some(match word {
            "using" => Keyword::Using,
            "namespace" => Keyword::Namespace,
            "class" => Keyword::Class,
            "public" => Keyword::Public,
            "private" => Keyword::Private,
            "protected" => Keyword::Protected,
            "internal" => Keyword::Internal,
            "static" => Keyword::Static,
            "void" => Keyword::Void,
            "int" => Keyword::Int,
            "double" => Keyword::Double,
            "bool" => Keyword::Bool,
            "string" => Keyword::String,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "return" => Keyword::Return,
            "true" => Keyword::True,
            "false" => Keyword::False,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Int,
    Double,
    Str,
    Keyword(Keyword),
    /// Punctuation and operators, by spelling
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// Longest spellings first so that `<=` wins over `<`.
const PUNCTUATION: &[&str] = &[
    "++", "--", "+=", "-=", "*=", "/=", "%=", "==", "!=", "<=", ">=", "&&", "||", "{", "}", "(", ")",
    ";", ",", ".", "+", "-", "*", "/", "%", "=", "<", ">", "!",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if source[pos..].starts_with("//") {
            pos = source[pos..].find('\n').map_or(bytes.len(), |n| pos + n);
            continue;
        }

        if source[pos..].starts_with("/*") {
            let Some(close) = source[pos + 2..].find("*/") else {
                return Err(ParseError::at(source, pos, "unterminated block comment"));
            };
            pos += close + 4;
            continue;
        }

        let start = pos;
        let kind = if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            Keyword::lookup(&source[start..pos]).map_or(TokenKind::Ident, TokenKind::Keyword)
        } else if c.is_ascii_digit() {
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit() {
                pos += 1;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                TokenKind::Double
            } else {
                TokenKind::Int
            }
        } else if c == b'"' {
            pos += 1;
            loop {
                match bytes.get(pos) {
                    None | Some(b'\n') => {
                        return Err(ParseError::at(source, start, "unterminated string literal"));
                    }
                    Some(b'\\') => pos += 2,
                    Some(b'"') => {
                        pos += 1;
                        break;
                    }
                    Some(_) => pos += 1,
                }
            }
            TokenKind::Str
        } else if let Some(punct) = PUNCTUATION.iter().find(|p| source[pos..].starts_with(*p)) {
            pos += punct.len();
            TokenKind::Punct(punct)
        } else {
            let ch = source[pos..].chars().next().unwrap_or('?');
            return Err(ParseError::at(source, pos, format!("unexpected character `{ch}`")));
        };

        tokens.push(Token {
            kind,
            span: Span::new(start, pos),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(bytes.len(), bytes.len()),
    });
    Ok(tokens)
}
