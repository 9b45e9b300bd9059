use std::collections::HashSet;

use tree_sitter::{Node, Parser, QueryCursor, StreamingIterator, Tree};

use super::grammar::GoGrammar;
use super::{ExtractError, ParseResult, StructDescriptor, is_exported};

/// One `import` line: optional local alias plus the unquoted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

/// Extracts struct declarations from Go source.
///
/// Holds the compiled queries; every call to [`TypeExtractor::parse`] builds
/// its own parser, so one extractor can be shared across threads.
pub struct TypeExtractor {
    grammar: GoGrammar,
}

impl TypeExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            grammar: GoGrammar::new()?,
        })
    }

    /// Parse `source` into a syntax tree.
    ///
    /// Tree-sitter recovers from errors; any ERROR or MISSING node in the
    /// result is reported as a syntax error at its position.
    pub fn parse_tree(&self, source: &str) -> Result<Tree, ExtractError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar.language)
            .map_err(|e| ExtractError::Grammar(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Grammar("parser produced no tree".to_string()))?;

        if let Some(node) = first_error(tree.root_node()) {
            return Err(syntax_error(node, source.as_bytes()));
        }

        Ok(tree)
    }

    /// Describe the package, imports and struct types declared in `source`.
    pub fn parse(&self, source: &str) -> Result<ParseResult, ExtractError> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let package_name = self.package_name(root, bytes).ok_or(ExtractError::Syntax {
            line: 1,
            column: 1,
            message: "expected 'package' clause".to_string(),
        })?;

        Ok(ParseResult {
            package_name,
            imports: self
                .import_specs(root, bytes)
                .into_iter()
                .map(|spec| spec.path)
                .collect(),
            structs: self.structs(root, bytes)?,
        })
    }

    pub fn package_name(&self, root: Node, source: &[u8]) -> Option<String> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.grammar.package, root, source);
        while let Some(m) = matches.next() {
            if let Some(cap) = m.captures.first() {
                return Some(node_text(cap.node, source).to_string());
            }
        }
        None
    }

    pub fn import_specs(&self, root: Node, source: &[u8]) -> Vec<ImportSpec> {
        let query = &self.grammar.imports;
        let mut cursor = QueryCursor::new();
        let mut specs = Vec::new();

        let mut matches = cursor.matches(query, root, source);
        while let Some(m) = matches.next() {
            let mut alias = None;
            let mut path = None;
            for cap in m.captures {
                match query.capture_names()[cap.index as usize] {
                    "alias" => alias = Some(node_text(cap.node, source).to_string()),
                    "import" => path = Some(unquote(node_text(cap.node, source))),
                    _ => {}
                }
            }
            if let Some(path) = path {
                specs.push(ImportSpec { alias, path });
            }
        }

        specs
    }

    /// Identifiers used as the package side of `pkg.Name` expressions or types.
    ///
    /// Selector operands are not resolved, so local variables show up here
    /// too; callers only compare the set against import names.
    pub fn referenced_packages(&self, root: Node, source: &[u8]) -> HashSet<String> {
        let mut cursor = QueryCursor::new();
        let mut names = HashSet::new();

        let mut matches = cursor.matches(&self.grammar.references, root, source);
        while let Some(m) = matches.next() {
            for cap in m.captures {
                names.insert(node_text(cap.node, source).to_string());
            }
        }

        names
    }

    fn structs(&self, root: Node, source: &[u8]) -> Result<Vec<StructDescriptor>, ExtractError> {
        let query = &self.grammar.structs;
        let mut cursor = QueryCursor::new();
        let mut structs = Vec::new();

        let mut matches = cursor.matches(query, root, source);
        while let Some(m) = matches.next() {
            let mut name_node = None;
            let mut body_node = None;
            for cap in m.captures {
                match query.capture_names()[cap.index as usize] {
                    "name" => name_node = Some(cap.node),
                    "struct" => body_node = Some(cap.node),
                    _ => {}
                }
            }

            let (Some(name_node), Some(body_node)) = (name_node, body_node) else {
                continue;
            };
            if !is_top_level(body_node) {
                continue;
            }

            let name = node_text(name_node, source).to_string();
            let fields = exported_fields(&name, body_node, source)?;
            structs.push(StructDescriptor { name, fields });
        }

        Ok(structs)
    }
}

/// Parse a single source unit with a fresh extractor.
pub fn parse(source: &str) -> Result<ParseResult, ExtractError> {
    TypeExtractor::new()?.parse(source)
}

fn exported_fields(
    struct_name: &str,
    body: Node,
    source: &[u8],
) -> Result<Vec<String>, ExtractError> {
    let mut fields = Vec::new();

    let mut cursor = body.walk();
    let Some(list) = body
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Ok(fields);
    };

    let mut list_cursor = list.walk();
    for decl in list.named_children(&mut list_cursor) {
        if decl.kind() != "field_declaration" {
            continue;
        }

        let mut name_cursor = decl.walk();
        let names: Vec<Node> = decl
            .children_by_field_name("name", &mut name_cursor)
            .collect();
        if names.len() != 1 {
            return Err(ExtractError::MalformedField {
                struct_name: struct_name.to_string(),
                line: decl.start_position().row + 1,
                found: names.len(),
            });
        }

        let name = node_text(names[0], source);
        if is_exported(name) {
            fields.push(name.to_string());
        }
    }

    Ok(fields)
}

// struct_type -> type_spec -> type_declaration -> source_file
fn is_top_level(struct_node: Node) -> bool {
    struct_node
        .parent()
        .and_then(|spec| spec.parent())
        .and_then(|decl| decl.parent())
        .is_some_and(|file| file.kind() == "source_file")
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

fn syntax_error(node: Node, source: &[u8]) -> ExtractError {
    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let snippet: String = node_text(node, source)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(24)
            .collect();
        format!("unexpected {snippet:?}")
    };

    ExtractError::Syntax {
        line: pos.row + 1,
        column: pos.column + 1,
        message,
    }
}

fn node_text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

fn unquote(literal: &str) -> String {
    literal.trim_matches(|c| c == '"' || c == '`').to_string()
}
