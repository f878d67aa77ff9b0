use std::fmt;

use bitflags::bitflags;

use crate::arena::{Arena, TextRef};
use crate::lexer::Span;
use crate::limits::CompilerLimits;
use crate::parser::ParseError;

// AST with index-handle storage: nodes live in vectors owned by the Ast,
// variable-length payloads (identifier spellings) live in the session
// arena. Handles are Copy and stay valid for the Ast's lifetime.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(u32);

bitflags! {
    /// C type qualifiers attached to a type or pointer level.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Qualifiers: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    LongDouble,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "Void",
            Primitive::Char => "Char",
            Primitive::Short => "Short",
            Primitive::Int => "Int",
            Primitive::Long => "Long",
            Primitive::LongLong => "LongLong",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::LongDouble => "LongDouble",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Struct => "Struct",
            RecordKind::Union => "Union",
        }
    }
}

// Type nodes

#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive {
        prim: Primitive,
        unsigned: bool,
    },
    /// struct/union with optional tag and optional member list.
    /// `members: None` means the body was not written (a reference or
    /// forward declaration), `Some(vec)` means a defined body.
    Record {
        kind: RecordKind,
        tag: Option<TextRef>,
        members: Option<Vec<MemberId>>,
    },
    /// A typedef name used as a type.
    Named(TextRef),
    Pointer(TypeId),
    /// Element type plus optional constant size; `None` is an unsized `[]`.
    Array(TypeId, Option<u64>),
}

#[derive(Debug, Clone)]
pub struct Type {
    pub kind: TypeKind,
    pub quals: Qualifiers,
    pub span: Span,
}

/// One struct/union member: `type declarator ;`
#[derive(Debug, Clone)]
pub struct Member {
    pub name: TextRef,
    pub ty: TypeId,
    pub span: Span,
}

/// One declared name in a variable declaration, with its derived type.
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: TextRef,
    pub ty: TypeId,
    pub span: Span,
}

// Declaration nodes

#[derive(Debug, Clone)]
pub enum DeclKind {
    /// A failed parse of one top-level construct. The diagnostic rides in
    /// the tree so callers keep collecting subsequent declarations.
    Error(ParseError),
    Typedef {
        name: TextRef,
        ty: TypeId,
    },
    /// A standalone `struct S { ... };` or `union U;`
    Record(TypeId),
    Variables {
        vars: Vec<VarDeclarator>,
    },
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

/// Parse tree for one translation unit.
///
/// The Ast owns every node and the arena holding their text payloads;
/// dropping the Ast frees the whole session in one sweep.
#[derive(Debug)]
pub struct Ast {
    decls: Vec<Decl>,
    types: Vec<Type>,
    members: Vec<Member>,
    text: Arena,
}

impl Ast {
    pub fn new() -> Self {
        Self::with_limits(&CompilerLimits::default())
    }

    pub fn with_limits(limits: &CompilerLimits) -> Self {
        Self {
            decls: Vec::new(),
            types: Vec::new(),
            members: Vec::new(),
            text: Arena::with_bucket_bytes(limits.arena_bucket_bytes),
        }
    }

    // Node construction

    pub fn add_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn add_member(&mut self, member: Member) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        self.members.push(member);
        id
    }

    /// Copy a spelling into the session arena.
    pub fn intern(&mut self, s: &str) -> TextRef {
        self.text.alloc_str(s)
    }

    // Node access

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.0 as usize]
    }

    pub fn text(&self, r: TextRef) -> &str {
        self.text.text(r)
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.decls.len()).map(|i| DeclId(i as u32))
    }

    /// Collect every diagnostic embedded in the tree, in declaration
    /// order. There is no hidden error list; this walk is how consumers
    /// decide whether the parse succeeded.
    pub fn errors(&self) -> Vec<&ParseError> {
        self.decls
            .iter()
            .filter_map(|decl| match &decl.kind {
                DeclKind::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

// Tree printing, used by golden tests and the CLI

impl Ast {
    fn fmt_decl(&self, f: &mut fmt::Formatter, decl: &Decl, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match &decl.kind {
            DeclKind::Error(err) => writeln!(f, "{}Error \"{}\"", pad, err.message),
            DeclKind::Typedef { name, ty } => {
                writeln!(f, "{}Typedef '{}'", pad, self.text(*name))?;
                self.fmt_type(f, *ty, indent + 1)
            }
            DeclKind::Record(ty) => {
                writeln!(f, "{}RecordDecl", pad)?;
                self.fmt_type(f, *ty, indent + 1)
            }
            DeclKind::Variables { vars } => {
                writeln!(f, "{}VarDecl", pad)?;
                for var in vars {
                    writeln!(f, "{}  Var '{}'", pad, self.text(var.name))?;
                    self.fmt_type(f, var.ty, indent + 2)?;
                }
                Ok(())
            }
        }
    }

    fn fmt_type(&self, f: &mut fmt::Formatter, id: TypeId, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        let ty = self.ty(id);
        let quals = fmt_quals(ty.quals);

        match &ty.kind {
            TypeKind::Primitive { prim, unsigned } => {
                let prefix = if *unsigned { "Unsigned" } else { "" };
                writeln!(f, "{}{}{}{}", pad, prefix, prim.name(), quals)
            }
            TypeKind::Record { kind, tag, members } => {
                match tag {
                    Some(tag) => writeln!(f, "{}{} '{}'{}", pad, kind.name(), self.text(*tag), quals)?,
                    None => writeln!(f, "{}{}{}", pad, kind.name(), quals)?,
                }
                if let Some(members) = members {
                    for member_id in members {
                        let member = self.member(*member_id);
                        writeln!(f, "{}  Member '{}'", pad, self.text(member.name))?;
                        self.fmt_type(f, member.ty, indent + 2)?;
                    }
                }
                Ok(())
            }
            TypeKind::Named(name) => writeln!(f, "{}Typename '{}'{}", pad, self.text(*name), quals),
            TypeKind::Pointer(inner) => {
                writeln!(f, "{}Pointer{}", pad, quals)?;
                self.fmt_type(f, *inner, indent + 1)
            }
            TypeKind::Array(element, size) => {
                match size {
                    Some(size) => writeln!(f, "{}Array {}{}", pad, size, quals)?,
                    None => writeln!(f, "{}Array{}", pad, quals)?,
                }
                self.fmt_type(f, *element, indent + 1)
            }
        }
    }
}

fn fmt_quals(quals: Qualifiers) -> String {
    let mut out = String::new();
    if quals.contains(Qualifiers::CONST) {
        out.push_str(" const");
    }
    if quals.contains(Qualifiers::VOLATILE) {
        out.push_str(" volatile");
    }
    out
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Program")?;
        for decl in &self.decls {
            self.fmt_decl(f, decl, 1)?;
        }
        Ok(())
    }
}
