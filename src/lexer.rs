use std::iter::Peekable;
use std::str::CharIndices;

use crate::limits::CompilerLimits;

// Token types

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Typedef,
    Struct,
    Union,
    Void,
    Char,
    Int,
    Unsigned,
    Long,
    Float,
    Double,
    Short,
    Const,
    Volatile,

    // Identifiers and literals
    Ident,
    IntLiteral,

    // Punctuation
    Semicolon, // ;
    Comma,     // ,
    Star,      // *
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]

    // Special
    Error,
    Eof,
}

/// Byte range of a token within the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start as usize..self.end as usize]
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// A single lexical token. Tokens are small value types; spellings are
/// recovered from the source buffer by span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub pos: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Lexical error at byte {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for LexError {}

// Lexer

/// One-token-per-call tokenizer for the C declaration subset.
///
/// The lexer never aborts mid-stream: unrecognized characters and limit
/// violations are surfaced as [`TokenKind::Error`] tokens so the consumer
/// can treat them like any other token kind.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    limits: CompilerLimits,
    token_count: usize,
    limit_hit: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, limits: &CompilerLimits) -> Result<Self, LexError> {
        // Check input size limit
        if source.len() > limits.max_input_size {
            return Err(LexError {
                message: format!(
                    "Input too large: {} bytes (max: {} bytes)",
                    source.len(),
                    limits.max_input_size
                ),
                pos: 0,
            });
        }

        Ok(Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            limits: limits.clone(),
            token_count: 0,
            limit_hit: false,
        })
    }

    // Character navigation methods

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn consume_char(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn consume_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(c) = self.peek_char() {
            if predicate(c) {
                self.consume_char();
            } else {
                break;
            }
        }
    }

    /// Skip whitespace and `//` / `/* */` comments. Returns the span of an
    /// unterminated block comment, which the caller turns into an error
    /// token.
    fn skip_trivia(&mut self) -> Option<Span> {
        loop {
            self.consume_while(|c| c.is_whitespace());

            if self.peek_char() != Some('/') {
                return None;
            }

            let start = self.pos;
            let mut lookahead = self.chars.clone();
            lookahead.next();
            match lookahead.peek().map(|(_, c)| *c) {
                Some('/') => {
                    // Line comment
                    self.consume_while(|c| c != '\n');
                }
                Some('*') => {
                    self.consume_char(); // '/'
                    self.consume_char(); // '*'
                    let mut prev = '\0';
                    let mut closed = false;
                    while let Some(c) = self.consume_char() {
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Some(Span::new(start, self.pos));
                    }
                }
                _ => return None, // a lone '/' is handled as a token
            }
        }
    }

    // Main tokenization method

    /// Produce the next token. After end of input this keeps returning
    /// `Eof` tokens, so callers may pull past the end freely.
    pub fn next_token(&mut self) -> Token {
        if self.limit_hit {
            return Token {
                kind: TokenKind::Eof,
                span: Span::new(self.pos, self.pos),
            };
        }

        if let Some(span) = self.skip_trivia() {
            return Token {
                kind: TokenKind::Error,
                span,
            };
        }

        // Check token count limit before producing a new token. The
        // remaining input is abandoned; the stream ends after this token.
        if self.token_count >= self.limits.max_token_count && self.peek_char().is_some() {
            self.limit_hit = true;
            return Token {
                kind: TokenKind::Error,
                span: Span::new(self.pos, self.pos),
            };
        }

        let start = self.pos;
        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) if is_ident_start(c) => self.lex_ident_or_keyword(start),
            Some(c) if c.is_ascii_digit() => {
                self.consume_while(|c| c.is_ascii_digit());
                TokenKind::IntLiteral
            }
            Some(';') => self.punct(TokenKind::Semicolon),
            Some(',') => self.punct(TokenKind::Comma),
            Some('*') => self.punct(TokenKind::Star),
            Some('(') => self.punct(TokenKind::LParen),
            Some(')') => self.punct(TokenKind::RParen),
            Some('{') => self.punct(TokenKind::LBrace),
            Some('}') => self.punct(TokenKind::RBrace),
            Some('[') => self.punct(TokenKind::LBracket),
            Some(']') => self.punct(TokenKind::RBracket),
            Some(_) => {
                self.consume_char();
                TokenKind::Error
            }
        };

        if kind != TokenKind::Eof {
            self.token_count += 1;
        }

        Token {
            kind,
            span: Span::new(start, self.pos),
        }
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char();
        kind
    }

    // Identifier and keyword lexing

    fn lex_ident_or_keyword(&mut self, start: usize) -> TokenKind {
        self.consume_char();
        self.consume_while(is_ident_continue);

        let text = &self.source[start..self.pos];

        // Check identifier length
        if text.len() > self.limits.max_identifier_length {
            return TokenKind::Error;
        }

        // Keywords are at most 8 characters in this subset
        if text.len() > 8 {
            return TokenKind::Ident;
        }

        match text {
            "typedef" => TokenKind::Typedef,
            "struct" => TokenKind::Struct,
            "union" => TokenKind::Union,
            "void" => TokenKind::Void,
            "char" => TokenKind::Char,
            "int" => TokenKind::Int,
            "unsigned" => TokenKind::Unsigned,
            "long" => TokenKind::Long,
            "float" => TokenKind::Float,
            "double" => TokenKind::Double,
            "short" => TokenKind::Short,
            "const" => TokenKind::Const,
            "volatile" => TokenKind::Volatile,
            _ => TokenKind::Ident,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Human-readable description of a token for error messages.
pub fn describe_token(token: &Token, source: &str) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Ident => format!("identifier '{}'", token.text(source)),
        TokenKind::IntLiteral => format!("integer '{}'", token.text(source)),
        TokenKind::Error => {
            if token.span.start == token.span.end {
                "invalid input".to_string()
            } else {
                format!("unrecognized input '{}'", token.text(source))
            }
        }
        _ => format!("'{}'", token.text(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let limits = CompilerLimits::default();
        let mut lexer = Lexer::new(source, &limits).unwrap();
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            lex_all("typedef unsigned count"),
            vec![
                TokenKind::Typedef,
                TokenKind::Unsigned,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            lex_all("struct S { int x; };"),
            vec![
                TokenKind::Struct,
                TokenKind::Ident,
                TokenKind::LBrace,
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            lex_all("int /* inner */ x; // trailing\n"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unrecognized_char_is_error_token() {
        let limits = CompilerLimits::default();
        let mut lexer = Lexer::new("$ int", &limits).unwrap();
        let bad = lexer.next_token();
        assert_eq!(bad.kind, TokenKind::Error);
        assert_eq!(bad.text("$ int"), "$");
        assert_eq!(lexer.next_token().kind, TokenKind::Int);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(
            lex_all("int x /* oops"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Error,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_ranges() {
        let limits = CompilerLimits::default();
        let source = "int value;";
        let mut lexer = Lexer::new(source, &limits).unwrap();
        let int_tok = lexer.next_token();
        let ident = lexer.next_token();
        assert_eq!(int_tok.text(source), "int");
        assert_eq!(ident.text(source), "value");
        assert_eq!(ident.span.range(), 4..9);
    }

    #[test]
    fn test_input_size_limit() {
        let mut limits = CompilerLimits::default();
        limits.max_input_size = 4;
        assert!(Lexer::new("int x;", &limits).is_err());
    }

    #[test]
    fn test_token_count_limit_ends_stream() {
        let mut limits = CompilerLimits::default();
        limits.max_token_count = 2;
        let mut lexer = Lexer::new("int x y z", &limits).unwrap();
        assert_eq!(lexer.next_token().kind, TokenKind::Int);
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_eof_is_repeatable() {
        let limits = CompilerLimits::default();
        let mut lexer = Lexer::new("", &limits).unwrap();
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
