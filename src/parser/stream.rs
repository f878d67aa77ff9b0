use crate::lexer::{Lexer, Token, TokenKind};

/// Pushback buffer layered over the one-shot lexer.
///
/// `pop` consumes the most recently pushed-back token, falling through to
/// `Lexer::next_token` when the buffer is empty. `push` returns a token to
/// the front of future pops, so the buffer is a LIFO stack and lookahead
/// of any depth is just pop-then-push. A balanced sequence of pops and
/// pushes is invisible to the underlying stream.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    pushback: Vec<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            pushback: Vec::new(),
        }
    }

    /// Take the next token: buffered first, then the lexer.
    pub fn pop(&mut self) -> Token {
        match self.pushback.pop() {
            Some(token) => token,
            None => self.lexer.next_token(),
        }
    }

    /// Return a token to the stream. The last token pushed is the first
    /// one popped.
    pub fn push(&mut self, token: Token) {
        if self.pushback.len() == self.pushback.capacity() {
            let target = self.pushback.capacity() / 2 + self.pushback.capacity() + 16;
            self.pushback.reserve_exact(target - self.pushback.len());
        }
        self.pushback.push(token);
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let token = self.pop();
        self.push(token);
        token
    }

    pub fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    /// Consume the next token only if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.pop();
        if token.kind == kind {
            Some(token)
        } else {
            self.push(token);
            None
        }
    }
}
