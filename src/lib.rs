//! minic - the front end of a small C toolchain.
//!
//! Source text goes through a one-token-per-call lexer, a pushback
//! lookahead buffer, and a recursive-descent declaration parser into an
//! arena-backed AST. Parse failures become error-kind nodes carrying
//! position-tagged diagnostics, so one bad declaration never stops the
//! rest of the file from being parsed.

pub mod arena;
pub mod ast;
pub mod cli;
pub mod lexer;
pub mod limits;
pub mod parser;
