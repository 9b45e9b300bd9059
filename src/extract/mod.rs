/// Type extraction from Go source text.
///
/// Parses one source unit with Tree-sitter and describes its package name,
/// import list and plain struct declarations.
pub mod go_parser;
pub mod grammar;

pub use go_parser::{TypeExtractor, parse};

use thiserror::Error;

/// Errors that can occur while extracting types from a source unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error(
        "malformed field in struct {struct_name} at line {line}: expected exactly one field name, found {found}"
    )]
    MalformedField {
        struct_name: String,
        line: usize,
        found: usize,
    },

    #[error("grammar setup failed: {0}")]
    Grammar(String),
}

/// One struct type found in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDescriptor {
    pub name: String,
    /// Exported field names in declaration order.
    pub fields: Vec<String>,
}

/// Structural description of one parsed source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub package_name: String,
    pub imports: Vec<String>,
    pub structs: Vec<StructDescriptor>,
}

impl ParseResult {
    /// Look up a struct by its declared name.
    #[must_use]
    pub fn find_struct(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.iter().find(|s| s.name == name)
    }
}

/// Go's export rule: the identifier starts with an upper-case letter.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
