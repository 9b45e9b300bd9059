use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::TemplateError;
use crate::extract::TypeExtractor;
use crate::extract::go_parser::ImportSpec;

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Rewrite the imports of generated Go source to the ones it actually uses.
///
/// Unused imports are dropped. A package that is referenced but not imported
/// is added when one of `candidates` provides it. The result is one
/// declaration right after the package clause: standard library first, then a
/// blank line and everything else, each group sorted by path.
pub fn normalize_imports(
    extractor: &TypeExtractor,
    source: &str,
    candidates: &[String],
) -> Result<String, TemplateError> {
    let tree = extractor.parse_tree(source)?;
    let root = tree.root_node();
    let bytes = source.as_bytes();

    let mut cursor = root.walk();
    let mut decls: Vec<Range<usize>> = Vec::new();
    let mut package_end = None;
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "import_declaration" => decls.push(node.byte_range()),
            "package_clause" => package_end = Some(node.end_byte()),
            _ => {}
        }
    }

    let used = extractor.referenced_packages(root, bytes);
    let mut kept: Vec<ImportSpec> = Vec::new();
    for spec in extractor.import_specs(root, bytes) {
        if kept.contains(&spec) {
            continue;
        }
        let keep = match spec.alias.as_deref() {
            Some("_" | ".") => true,
            Some(alias) => used.contains(alias),
            None => used.contains(local_name(&spec.path)),
        };
        if keep {
            kept.push(spec);
        } else {
            debug!("Dropping unused import {:?}", spec.path);
        }
    }

    for path in candidates {
        let name = local_name(path);
        if !used.contains(name) || kept.iter().any(|spec| spec_name(spec) == name) {
            continue;
        }
        debug!("Adding missing import {path:?}");
        kept.push(ImportSpec {
            alias: None,
            path: path.clone(),
        });
    }

    let mut out = String::with_capacity(source.len());
    match (decls.first(), package_end) {
        (Some(first), _) => {
            out.push_str(&source[..first.start]);
            out.push_str(&render_imports(&kept));
            let mut tail = first.end;
            for decl in &decls[1..] {
                out.push_str(&source[tail..decl.start]);
                tail = decl.end;
            }
            out.push_str(&source[tail..]);
        }
        (None, Some(end)) if !kept.is_empty() => {
            out.push_str(&source[..end]);
            out.push_str("\n\n");
            out.push_str(&render_imports(&kept));
            out.push_str(&source[end..]);
        }
        _ => return Ok(source.to_string()),
    }

    Ok(BLANK_RUN.replace_all(&out, "\n\n").into_owned())
}

fn spec_name(spec: &ImportSpec) -> &str {
    spec.alias.as_deref().unwrap_or_else(|| local_name(&spec.path))
}

/// Identifier an unaliased import is referred to by.
///
/// Follows goimports' guess: last path element, skipping a `/vN` major
/// version suffix, without a `go-` prefix, cut at the first character that
/// can't appear in an identifier (`yaml.v3` → `yaml`).
pub fn local_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let mut base = segments.next().unwrap_or(path);
    if is_major_version(base) {
        if let Some(previous) = segments.next() {
            base = previous;
        }
    }

    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    &base[..end]
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn is_std(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

fn import_line(spec: &ImportSpec) -> String {
    match &spec.alias {
        Some(alias) => format!("{alias} \"{}\"", spec.path),
        None => format!("\"{}\"", spec.path),
    }
}

fn render_imports(specs: &[ImportSpec]) -> String {
    match specs {
        [] => String::new(),
        [single] => format!("import {}", import_line(single)),
        _ => {
            let (mut std, mut other): (Vec<&ImportSpec>, Vec<&ImportSpec>) =
                specs.iter().partition(|s| is_std(&s.path));
            std.sort_by(|a, b| a.path.cmp(&b.path));
            other.sort_by(|a, b| a.path.cmp(&b.path));

            let mut block = String::from("import (\n");
            for spec in &std {
                block.push_str(&format!("\t{}\n", import_line(spec)));
            }
            if !std.is_empty() && !other.is_empty() {
                block.push('\n');
            }
            for spec in &other {
                block.push_str(&format!("\t{}\n", import_line(spec)));
            }
            block.push(')');
            block
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(source: &str) -> String {
        let extractor = TypeExtractor::new().unwrap();
        normalize_imports(&extractor, source, &[]).unwrap()
    }

    #[test]
    fn test_unused_imports_dropped_and_grouped() {
        let source = r#"package memory

import (
	"hex-microservice/lookup"
	"hex-microservice/adder"
	"hex-microservice/deleter"
	"time"
	"fmt"
)

func fromRedirectToLookupRedirectStorage(i redirect) lookup.RedirectStorage {
	return lookup.RedirectStorage{
		Code: i.Code,
	}
}

func stamp(i adder.RedirectStorage) string {
	return fmt.Sprint(i.Code)
}
"#;
        let expected = r#"package memory

import (
	"fmt"
	"hex-microservice/adder"
	"hex-microservice/lookup"
)

func fromRedirectToLookupRedirectStorage(i redirect) lookup.RedirectStorage {
	return lookup.RedirectStorage{
		Code: i.Code,
	}
}

func stamp(i adder.RedirectStorage) string {
	return fmt.Sprint(i.Code)
}
"#;
        assert_eq!(normalize(source), expected);
    }

    #[test]
    fn test_third_party_group_separated() {
        let source = "package p\n\nimport (\n\t\"github.com/x/y\"\n\t\"fmt\"\n\t\"hex-microservice/lookup\"\n)\n\nvar _ = y.New(fmt.Sprint(lookup.Code))\n";
        let expected = "package p\n\nimport (\n\t\"fmt\"\n\t\"hex-microservice/lookup\"\n\n\t\"github.com/x/y\"\n)\n\nvar _ = y.New(fmt.Sprint(lookup.Code))\n";
        assert_eq!(normalize(source), expected);
    }

    #[test]
    fn test_missing_import_added_after_package_clause() {
        let extractor = TypeExtractor::new().unwrap();
        let source = "package memory\n\nfunc f(i redirect) lookup.RedirectStorage {\n\treturn lookup.RedirectStorage{}\n}\n";
        let candidates = vec![
            "hex-microservice/deleter".to_string(),
            "hex-microservice/lookup".to_string(),
        ];

        let out = normalize_imports(&extractor, source, &candidates).unwrap();
        assert_eq!(
            out,
            "package memory\n\nimport \"hex-microservice/lookup\"\n\nfunc f(i redirect) lookup.RedirectStorage {\n\treturn lookup.RedirectStorage{}\n}\n"
        );
    }

    #[test]
    fn test_missing_import_merged_into_existing() {
        let extractor = TypeExtractor::new().unwrap();
        let source = "package memory\n\nimport \"fmt\"\n\nfunc f(i adder.RedirectStorage) string { return fmt.Sprint(i) }\n";
        let candidates = vec!["hex-microservice/adder".to_string(), "fmt".to_string()];

        let out = normalize_imports(&extractor, source, &candidates).unwrap();
        assert!(out.starts_with("package memory\n\nimport (\n\t\"fmt\"\n\t\"hex-microservice/adder\"\n)\n\nfunc"));
        assert_eq!(out.matches("\"fmt\"").count(), 1);
    }

    #[test]
    fn test_all_imports_unused() {
        let source = "package memory\n\nimport (\n\t\"fmt\"\n)\n\nfunc f() {}\n";
        assert_eq!(normalize(source), "package memory\n\nfunc f() {}\n");
    }

    #[test]
    fn test_single_import_and_merge() {
        let source = "package p\n\nimport \"fmt\"\nimport \"fmt\"\nimport \"os\"\n\nfunc f() { fmt.Println() }\n";
        assert_eq!(
            normalize(source),
            "package p\n\nimport \"fmt\"\n\nfunc f() { fmt.Println() }\n"
        );
    }

    #[test]
    fn test_aliases_blank_and_dot_imports() {
        let source = "package p\n\nimport (\n\tstore \"hex/repository\"\n\tx \"hex/unused\"\n\t_ \"embed\"\n)\n\nvar s store.Repo\n";
        let out = normalize(source);
        assert!(out.contains("\t_ \"embed\"\n"));
        assert!(out.contains("\tstore \"hex/repository\"\n"));
        assert!(!out.contains("hex/unused"));
    }

    #[test]
    fn test_no_imports_unchanged() {
        let source = "package p\n\nfunc f() {}\n";
        assert_eq!(normalize(source), source);
    }

    #[test]
    fn test_invalid_go_is_an_error() {
        let extractor = TypeExtractor::new().unwrap();
        let err = normalize_imports(&extractor, "package p\n\nfunc f( {\n", &[]).unwrap_err();
        assert!(matches!(err, TemplateError::Normalize(_)));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("fmt"), "fmt");
        assert_eq!(local_name("hex-microservice/lookup"), "lookup");
        assert_eq!(local_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(local_name("github.com/go-logr/logr"), "logr");
        assert_eq!(local_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(local_name("github.com/x/go-redis"), "redis");
    }
}
