//! Shader source reader for lumen.
//!
//! Tokenizes and parses source text into a [`lumen_ast::Program`]. Syntax
//! errors do not abort: they are collected as diagnostics on the returned
//! program, which is then marked invalid.

mod lexer;
mod parser;
mod token;

use std::path::Path;

use lumen_ast::{Handle, Program, ProgramBuilder, Type};

pub use lexer::tokenize;
pub use parser::MAX_ERRORS;
pub use token::{Keyword, Token, TokenKind};

/// Parse source text into a program.
///
/// The result is resolved when parsing succeeded. Check
/// [`Program::is_valid`] or [`Program::ensure_valid`] before using it.
pub fn parse(source: &str) -> Program {
    let program = parser::Parser::new(source).translation_unit().build();
    log::debug!(
        "parsed {} global declaration(s), valid: {}",
        program.globals().len(),
        program.is_valid()
    );
    program
}

/// Like [`parse`], recording `name` as the program's source name.
pub fn parse_named(name: &str, source: &str) -> Program {
    let mut builder = parser::Parser::new(source).translation_unit();
    builder.set_source_name(name);
    let program = builder.build();
    log::debug!(
        "parsed '{name}': {} global declaration(s), valid: {}",
        program.globals().len(),
        program.is_valid()
    );
    program
}

/// Read and parse a source file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Program, ReadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_named(&path.display().to_string(), &source))
}

/// Parse a single type, e.g. `texture_storage_2d<rgba8unorm, write>`.
///
/// Returns the type (if one was parsed) together with the builder that
/// owns it and any diagnostics.
pub fn parse_type(source: &str) -> (Option<Handle<Type>>, ProgramBuilder) {
    parser::Parser::new(source).standalone_type()
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
