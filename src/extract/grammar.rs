use tree_sitter::{Language, Query};

use super::ExtractError;

const STRUCT_QUERY: &str = r#"
(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (struct_type) @struct))
"#;

const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package)
"#;

const IMPORT_QUERY: &str = r#"
(import_spec
  name: (_)? @alias
  path: (_) @import)
"#;

const REFERENCE_QUERY: &str = r#"
(qualified_type
  package: (package_identifier) @package)
(selector_expression
  operand: (identifier) @package)
"#;

/// Compiled Go grammar and the queries the generator runs against it.
pub struct GoGrammar {
    pub language: Language,
    pub structs: Query,
    pub package: Query,
    pub imports: Query,
    pub references: Query,
}

impl GoGrammar {
    pub fn new() -> Result<Self, ExtractError> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let compile = |src: &str| {
            Query::new(&language, src).map_err(|e| ExtractError::Grammar(e.to_string()))
        };

        Ok(Self {
            structs: compile(STRUCT_QUERY)?,
            package: compile(PACKAGE_QUERY)?,
            imports: compile(IMPORT_QUERY)?,
            references: compile(REFERENCE_QUERY)?,
            language,
        })
    }
}
