// Parser module - splits the parser into logical components
mod decl;
mod error;
mod stream;
mod types;

// Public exports
pub use error::{Note, ParseError};
pub use stream::TokenStream;

use rustc_hash::FxHashSet;

use crate::ast::{Ast, DeclKind};
use crate::lexer::{LexError, Lexer, Token, TokenKind};
use crate::limits::CompilerLimits;

/// The "is this identifier a known type name" query.
///
/// Classification of a declaration is purely syntactic; whether an
/// identifier in type position actually names a type is answered here.
pub trait TypeNames {
    fn is_type_name(&self, name: &str) -> bool;
}

/// Typedef names seen so far in this parse session.
#[derive(Debug, Default)]
pub struct TypedefTable {
    names: FxHashSet<String>,
}

impl TypedefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}

impl TypeNames for TypedefTable {
    fn is_type_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

// Parser structure
//
// One parse session: owns the token stream, the growing Ast (nodes plus
// the text arena), and the typedef table. Single-threaded by design -
// parallel parsing means one Parser per translation unit.
pub struct Parser<'src> {
    source: &'src str,
    stream: TokenStream<'src>,
    ast: Ast,
    limits: CompilerLimits,
    typedefs: TypedefTable,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, limits: &CompilerLimits) -> Result<Self, LexError> {
        let lexer = Lexer::new(source, limits)?;

        Ok(Self {
            source,
            stream: TokenStream::new(lexer),
            ast: Ast::with_limits(limits),
            limits: limits.clone(),
            typedefs: TypedefTable::new(),
        })
    }

    /// Start a session with pre-seeded type names, e.g. aliases declared
    /// by an earlier translation unit.
    pub fn with_typedefs(
        source: &'src str,
        limits: &CompilerLimits,
        typedefs: TypedefTable,
    ) -> Result<Self, LexError> {
        let mut parser = Self::new(source, limits)?;
        parser.typedefs = typedefs;
        Ok(parser)
    }

    pub fn at_eof(&mut self) -> bool {
        self.stream.peek_kind() == TokenKind::Eof
    }

    pub fn into_ast(self) -> Ast {
        self.ast
    }

    pub fn typedefs(&self) -> &TypedefTable {
        &self.typedefs
    }

    // Helper: Get the spelling of a token
    pub(super) fn token_text(&self, token: &Token) -> &'src str {
        token.text(self.source)
    }

    // Helper: Check type nesting depth limit
    pub(super) fn check_depth(&mut self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.limits.max_type_depth {
            let token = self.stream.peek();
            return Err(ParseError::new(
                format!(
                    "Type nesting too deep: {} levels (max {})",
                    depth, self.limits.max_type_depth
                ),
                token.span,
            ));
        }
        Ok(())
    }

    /// Helper: Consume a token of the given kind or error. The offending
    /// token is left in the stream.
    pub(super) fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.stream.peek();
        if token.kind != kind {
            return Err(ParseError::unexpected_token(expected, &token, self.source));
        }
        Ok(self.stream.pop())
    }
}

/// Leading tokens that commit the parser to a type-led declaration.
pub(super) fn starts_declaration(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Typedef
            | TokenKind::Struct
            | TokenKind::Union
            | TokenKind::Void
            | TokenKind::Char
            | TokenKind::Int
            | TokenKind::Unsigned
            | TokenKind::Long
            | TokenKind::Float
            | TokenKind::Double
            | TokenKind::Short
    )
}

// Public API function
//
// Drives one whole translation unit: collects every declaration,
// resynchronizing between error-kind nodes, so one bad construct never
// hides the errors (or the declarations) after it.
pub fn parse(source: &str, limits: &CompilerLimits) -> Result<Ast, LexError> {
    let mut parser = Parser::new(source, limits)?;

    let mut decls = 0usize;
    while !parser.at_eof() {
        let id = parser.parse_global_decl();
        decls += 1;
        if matches!(parser.ast.decl(id).kind, DeclKind::Error(_)) {
            parser.recover();
        }
    }

    tracing::debug!(decls, "parsed translation unit");
    Ok(parser.into_ast())
}

impl<'src> Parser<'src> {
    /// Skip to a plausible declaration boundary after a failed construct.
    /// Consumes up to and including the next `;` or `}`, stopping early
    /// at end of input or a token that can start a declaration.
    fn recover(&mut self) {
        // The offending token itself is still unconsumed in the
        // unrecognized-token case; drop it first.
        match self.stream.peek_kind() {
            TokenKind::Eof => return,
            TokenKind::Semicolon | TokenKind::RBrace => {
                self.stream.pop();
                return;
            }
            _ => {
                self.stream.pop();
            }
        }

        loop {
            match self.stream.peek_kind() {
                TokenKind::Eof => return,
                kind if starts_declaration(kind) => return,
                TokenKind::Semicolon | TokenKind::RBrace => {
                    self.stream.pop();
                    return;
                }
                _ => {
                    self.stream.pop();
                }
            }
        }
    }
}
