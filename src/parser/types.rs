use super::{ParseError, Parser, TypeNames};
use crate::arena::TextRef;
use crate::ast::{Member, MemberId, Primitive, Qualifiers, RecordKind, Type, TypeId, TypeKind};
use crate::lexer::{Span, TokenKind};

/// One parsed declarator: the declared name and the type derived by
/// wrapping the base type in the declarator's pointer/array shape.
pub(super) struct Declarator {
    pub name: TextRef,
    pub name_span: Span,
    pub ty: TypeId,
}

// Type parsing
impl<'src> Parser<'src> {
    /// Parse a type prefix: struct/union, primitive keyword(s), or a
    /// typedef name, plus any trailing qualifier keywords.
    pub(super) fn parse_type_prefix(&mut self, depth: usize) -> Result<TypeId, ParseError> {
        self.check_depth(depth)?;

        let token = self.stream.pop();
        let mut end = token.span;
        let kind = match token.kind {
            TokenKind::Struct => self.parse_record_type(RecordKind::Struct, depth)?,
            TokenKind::Union => self.parse_record_type(RecordKind::Union, depth)?,
            TokenKind::Void => primitive(Primitive::Void),
            TokenKind::Char => primitive(Primitive::Char),
            TokenKind::Int => primitive(Primitive::Int),
            TokenKind::Float => primitive(Primitive::Float),
            TokenKind::Double => primitive(Primitive::Double),
            TokenKind::Unsigned => self.parse_unsigned(&mut end),
            TokenKind::Long => self.parse_long(&mut end),
            TokenKind::Short => {
                // `short int` and plain `short` mean the same thing
                if let Some(t) = self.stream.eat(TokenKind::Int) {
                    end = t.span;
                }
                primitive(Primitive::Short)
            }
            TokenKind::Ident => {
                let name = self.token_text(&token);
                if !self.typedefs.is_type_name(name) {
                    return Err(ParseError::new(
                        format!("unknown type name '{}'", name),
                        token.span,
                    ));
                }
                TypeKind::Named(self.ast.intern(name))
            }
            _ => {
                return Err(ParseError::unexpected_token("a type", &token, self.source));
            }
        };

        let (quals, end) = self.parse_qualifiers(end);
        Ok(self.ast.add_type(Type {
            kind,
            quals,
            span: token.span.to(end),
        }))
    }

    /// One extra keyword may follow `unsigned`; bare `unsigned` is
    /// `unsigned int`.
    fn parse_unsigned(&mut self, end: &mut Span) -> TypeKind {
        let followers = [
            (TokenKind::Char, Primitive::Char),
            (TokenKind::Short, Primitive::Short),
            (TokenKind::Int, Primitive::Int),
            (TokenKind::Long, Primitive::Long),
        ];
        for (kind, prim) in followers {
            if let Some(t) = self.stream.eat(kind) {
                *end = t.span;
                return TypeKind::Primitive {
                    prim,
                    unsigned: true,
                };
            }
        }
        TypeKind::Primitive {
            prim: Primitive::Int,
            unsigned: true,
        }
    }

    fn parse_long(&mut self, end: &mut Span) -> TypeKind {
        let prim = if let Some(t) = self.stream.eat(TokenKind::Long) {
            *end = t.span;
            Primitive::LongLong
        } else if let Some(t) = self.stream.eat(TokenKind::Double) {
            *end = t.span;
            Primitive::LongDouble
        } else if let Some(t) = self.stream.eat(TokenKind::Int) {
            *end = t.span;
            Primitive::Long
        } else {
            Primitive::Long
        };
        primitive(prim)
    }

    /// Parse the rest of a struct/union type after its keyword: optional
    /// tag, optional `{ members }`. At least one of the two must appear.
    fn parse_record_type(
        &mut self,
        kind: RecordKind,
        depth: usize,
    ) -> Result<TypeKind, ParseError> {
        let tag = match self.stream.eat(TokenKind::Ident) {
            Some(token) => {
                let text = self.token_text(&token);
                Some(self.ast.intern(text))
            }
            None => None,
        };

        let members = if self.stream.eat(TokenKind::LBrace).is_some() {
            Some(self.parse_member_list(depth + 1)?)
        } else {
            None
        };

        if tag.is_none() && members.is_none() {
            let token = self.stream.peek();
            return Err(ParseError::unexpected_token(
                "a tag or '{'",
                &token,
                self.source,
            ));
        }

        Ok(TypeKind::Record { kind, tag, members })
    }

    /// Parse `type declarator ;` members until the closing brace.
    fn parse_member_list(&mut self, depth: usize) -> Result<Vec<MemberId>, ParseError> {
        let mut members = Vec::new();

        loop {
            if self.stream.eat(TokenKind::RBrace).is_some() {
                break;
            }

            // Unclosed body
            if self.stream.peek_kind() == TokenKind::Eof {
                let token = self.stream.peek();
                return Err(ParseError::unexpected_token("'}'", &token, self.source));
            }

            let base = self.parse_type_prefix(depth + 1)?;
            let declarator = self.parse_declarator(base, depth + 1)?;
            self.expect(TokenKind::Semicolon, "';' after member declaration")?;

            members.push(self.ast.add_member(Member {
                name: declarator.name,
                ty: declarator.ty,
                span: declarator.name_span,
            }));
        }

        Ok(members)
    }

    /// Parse one declarator: leading `*`s (each with optional
    /// qualifiers), the declared name, then array suffixes.
    ///
    /// On a missing name nothing is consumed, so the caller's diagnostic
    /// points at the token that should have been the name and no suffix
    /// tokens are eaten.
    pub(super) fn parse_declarator(
        &mut self,
        base: TypeId,
        depth: usize,
    ) -> Result<Declarator, ParseError> {
        self.check_depth(depth)?;

        let mut ty = base;
        while let Some(star) = self.stream.eat(TokenKind::Star) {
            let (quals, end) = self.parse_qualifiers(star.span);
            ty = self.ast.add_type(Type {
                kind: TypeKind::Pointer(ty),
                quals,
                span: star.span.to(end),
            });
        }

        let name_token = self.stream.peek();
        if name_token.kind != TokenKind::Ident {
            return Err(ParseError::unexpected_token(
                "an identifier",
                &name_token,
                self.source,
            ));
        }
        self.stream.pop();
        let name_text = self.token_text(&name_token);
        let name = self.ast.intern(name_text);

        let mut dims = Vec::new();
        while let Some(open) = self.stream.eat(TokenKind::LBracket) {
            if let Some(close) = self.stream.eat(TokenKind::RBracket) {
                dims.push((None, open.span.to(close.span)));
                continue;
            }

            let size_token = self.expect(TokenKind::IntLiteral, "an array size")?;
            let size: u64 = self.token_text(&size_token).parse().map_err(|_| {
                ParseError::new(
                    format!(
                        "array size '{}' is out of range",
                        size_token.span.text(self.source)
                    ),
                    size_token.span,
                )
            })?;
            let close = self.expect(TokenKind::RBracket, "']' after array size")?;
            dims.push((Some(size), open.span.to(close.span)));
        }

        // `int a[2][3]` is an array of 2 arrays of 3 ints: wrap from the
        // innermost (last) dimension outward.
        for (size, span) in dims.into_iter().rev() {
            ty = self.ast.add_type(Type {
                kind: TypeKind::Array(ty, size),
                quals: Qualifiers::empty(),
                span,
            });
        }

        // Function declarators are outside this grammar.
        let next = self.stream.peek();
        if next.kind == TokenKind::LParen {
            return Err(ParseError::new(
                "function declarators are not supported",
                next.span,
            ));
        }

        Ok(Declarator {
            name,
            name_span: name_token.span,
            ty,
        })
    }

    /// Consume a run of qualifier keywords. Returns the flags and the end
    /// of the last qualifier (or `fallback` when none appear).
    fn parse_qualifiers(&mut self, fallback: Span) -> (Qualifiers, Span) {
        let mut quals = Qualifiers::empty();
        let mut end = fallback;
        loop {
            if let Some(token) = self.stream.eat(TokenKind::Const) {
                quals |= Qualifiers::CONST;
                end = token.span;
            } else if let Some(token) = self.stream.eat(TokenKind::Volatile) {
                quals |= Qualifiers::VOLATILE;
                end = token.span;
            } else {
                break;
            }
        }
        (quals, end)
    }
}

fn primitive(prim: Primitive) -> TypeKind {
    TypeKind::Primitive {
        prim,
        unsigned: false,
    }
}
