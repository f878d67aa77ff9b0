use super::{ParseError, Parser, starts_declaration};
use crate::ast::{Decl, DeclId, DeclKind, TypeKind, VarDeclarator};
use crate::lexer::{Token, TokenKind};

// Global declaration parsing
impl<'src> Parser<'src> {
    /// Parse one top-level construct.
    ///
    /// Always returns a node: a failed parse becomes an error-kind
    /// declaration carrying its diagnostic, so the caller can keep
    /// collecting declarations after a bad one.
    pub fn parse_global_decl(&mut self) -> DeclId {
        let lead = self.stream.peek();

        // Classification is lookahead-1: one token decides the branch.
        // `typedef` flags the alias path but dispatches like any other
        // type-led declaration.
        if !starts_declaration(lead.kind) {
            // The offending token stays in the stream; resynchronization
            // is the caller's job.
            let err = ParseError::new("found unrecognized token", lead.span).with_note(
                lead.span,
                "this token is not allowed in the global context",
            );
            return self.ast.add_decl(Decl {
                kind: DeclKind::Error(err),
                span: lead.span,
            });
        }

        let result = if lead.kind == TokenKind::Typedef {
            self.stream.pop(); // consume 'typedef'
            self.parse_typedef(&lead)
        } else {
            self.parse_type_led(&lead)
        };

        match result {
            Ok(id) => id,
            Err(err) => {
                let span = err.span;
                self.ast.add_decl(Decl {
                    kind: DeclKind::Error(err),
                    span,
                })
            }
        }
    }

    /// Parse the remainder of `typedef type declarator ;` and register
    /// the alias name for later type-position lookups.
    fn parse_typedef(&mut self, lead: &Token) -> Result<DeclId, ParseError> {
        let base = self.parse_type_prefix(0)?;
        let declarator = self.parse_declarator(base, 0)?;
        let end = self.expect(TokenKind::Semicolon, "';' after typedef")?;

        let spelling = declarator.name_span.text(self.source);
        self.typedefs.define(spelling);

        Ok(self.ast.add_decl(Decl {
            kind: DeclKind::Typedef {
                name: declarator.name,
                ty: declarator.ty,
            },
            span: lead.span.to(end.span),
        }))
    }

    /// Parse a non-typedef declaration: a standalone struct/union
    /// declaration, or a declarator list.
    fn parse_type_led(&mut self, lead: &Token) -> Result<DeclId, ParseError> {
        let base = self.parse_type_prefix(0)?;

        // `struct S { ... };` or `union U;` with no declarator
        if self.stream.peek_kind() == TokenKind::Semicolon {
            let end = self.stream.pop();
            let span = lead.span.to(end.span);
            if matches!(self.ast.ty(base).kind, TypeKind::Record { .. }) {
                return Ok(self.ast.add_decl(Decl {
                    kind: DeclKind::Record(base),
                    span,
                }));
            }
            return Err(ParseError::new("declaration declares nothing", span));
        }

        let mut vars = Vec::new();
        loop {
            let declarator = self.parse_declarator(base, 0)?;
            vars.push(VarDeclarator {
                name: declarator.name,
                ty: declarator.ty,
                span: declarator.name_span,
            });

            if self.stream.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::Semicolon, "';' after declaration")?;

        Ok(self.ast.add_decl(Decl {
            kind: DeclKind::Variables { vars },
            span: lead.span.to(end.span),
        }))
    }
}
