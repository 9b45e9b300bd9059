/// Rendering generation jobs into Go source files.
pub mod imports;
pub mod template;

pub use imports::normalize_imports;
pub use template::{Template, TemplateError};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::GenError;
use crate::extract::TypeExtractor;
use crate::mapping::GenerationJob;

/// Template used by jobs that don't name one.
pub const BUILTIN_TEMPLATE: &str = include_str!("../../templates/mapping.tmpl");
pub const BUILTIN_TEMPLATE_NAME: &str = "builtin:mapping.tmpl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Normalize imports and write the output file.
    Write,
    /// Return the rendered text; the filesystem is not touched.
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitResult {
    Written { path: PathBuf, bytes: usize },
    Rendered(String),
}

pub struct Emitter<'a> {
    root: &'a Path,
    extractor: &'a TypeExtractor,
}

impl<'a> Emitter<'a> {
    pub fn new(root: &'a Path, extractor: &'a TypeExtractor) -> Self {
        Self { root, extractor }
    }

    pub fn emit(
        &self,
        job: &GenerationJob,
        template: &Template,
        mode: EmitMode,
    ) -> Result<EmitResult, GenError> {
        let rendered = template
            .render(job)
            .map_err(|e| GenError::template(template.name(), e))?;

        if mode == EmitMode::DryRun {
            return Ok(EmitResult::Rendered(rendered));
        }

        let normalized = normalize_imports(self.extractor, &rendered, &job.imports)
            .map_err(|e| GenError::template(template.name(), e))?;

        let path = self.root.join(&job.output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
        }
        fs::write(&path, &normalized).map_err(|e| GenError::io(&path, e))?;

        info!(
            "Wrote {} ({} conversion(s), {} bytes)",
            path.display(),
            job.conversions.len(),
            normalized.len()
        );
        Ok(EmitResult::Written {
            path,
            bytes: normalized.len(),
        })
    }
}

/// Load a template file, or the built-in template when `path` is `None`.
pub fn load_template(root: &Path, path: Option<&Path>) -> Result<Template, GenError> {
    match path {
        Some(path) => {
            let full = root.join(path);
            let text = fs::read_to_string(&full).map_err(|e| GenError::io(&full, e))?;
            let name = path.display().to_string();
            Template::parse(&name, &text).map_err(|e| GenError::template(name, e))
        }
        None => Template::parse(BUILTIN_TEMPLATE_NAME, BUILTIN_TEMPLATE)
            .map_err(|e| GenError::template(BUILTIN_TEMPLATE_NAME, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ConversionSpec, FieldCorrespondence};
    use tempfile::tempdir;

    fn job() -> GenerationJob {
        let field = |name: &str| FieldCorrespondence {
            from: name.to_string(),
            to: name.to_string(),
        };
        GenerationJob {
            output_path: "memory/converter_gen.go".into(),
            package_name: "memory".into(),
            imports: vec![
                "hex-microservice/deleter".into(),
                "hex-microservice/lookup".into(),
            ],
            conversions: vec![ConversionSpec {
                method_name: "fromRedirectToLookupRedirectStorage".into(),
                from_type: "redirect".into(),
                to_type: "lookup.RedirectStorage".into(),
                fields: vec![field("Code"), field("URL")],
            }],
        }
    }

    #[test]
    fn test_builtin_template_dry_run() {
        let dir = tempdir().unwrap();
        let extractor = TypeExtractor::new().unwrap();
        let emitter = Emitter::new(dir.path(), &extractor);
        let template = load_template(dir.path(), None).unwrap();

        let result = emitter.emit(&job(), &template, EmitMode::DryRun).unwrap();
        let EmitResult::Rendered(text) = result else {
            panic!("dry run should return text");
        };

        let expected = r#"package memory

// Code generated by structmap. DO NOT EDIT.

import (
	"hex-microservice/deleter"
	"hex-microservice/lookup"
)

func fromRedirectToLookupRedirectStorage(i redirect) lookup.RedirectStorage {
	return lookup.RedirectStorage{
		Code: i.Code,
		URL: i.URL,
	}
}
"#;
        assert_eq!(text, expected);
        assert!(!dir.path().join("memory").exists());
    }

    #[test]
    fn test_write_normalizes_imports() {
        let dir = tempdir().unwrap();
        let extractor = TypeExtractor::new().unwrap();
        let emitter = Emitter::new(dir.path(), &extractor);
        let template = load_template(dir.path(), None).unwrap();

        let result = emitter.emit(&job(), &template, EmitMode::Write).unwrap();
        let path = dir.path().join("memory/converter_gen.go");
        assert!(matches!(result, EmitResult::Written { path: ref p, .. } if *p == path));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("import \"hex-microservice/lookup\"\n"));
        assert!(!written.contains("deleter"));
    }

    #[test]
    fn test_write_adds_import_the_template_left_out() {
        let dir = tempdir().unwrap();
        let extractor = TypeExtractor::new().unwrap();
        let emitter = Emitter::new(dir.path(), &extractor);
        let template = Template::parse(
            "bare.tmpl",
            "package {{.Package}}\n{{range .Conversions}}\nfunc {{.MethodName}}(i {{.FromTypeName}}) {{.ToTypeName}} {\n\treturn {{.ToTypeName}}{}\n}\n{{end}}",
        )
        .unwrap();

        emitter.emit(&job(), &template, EmitMode::Write).unwrap();
        let written = fs::read_to_string(dir.path().join("memory/converter_gen.go")).unwrap();
        assert!(
            written.starts_with("package memory\n\nimport \"hex-microservice/lookup\"\n\nfunc "),
            "got: {written}"
        );
    }

    #[test]
    fn test_template_missing_field() {
        let dir = tempdir().unwrap();
        let extractor = TypeExtractor::new().unwrap();
        let emitter = Emitter::new(dir.path(), &extractor);
        let template = Template::parse("bad.tmpl", "package {{.Pkg}}\n").unwrap();

        let err = emitter.emit(&job(), &template, EmitMode::DryRun).unwrap_err();
        match err {
            GenError::Template { template, source } => {
                assert_eq!(template, "bad.tmpl");
                assert!(matches!(source, TemplateError::MissingField { ref field, .. } if field == "Pkg"));
            }
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn test_template_rendering_invalid_go() {
        let dir = tempdir().unwrap();
        let extractor = TypeExtractor::new().unwrap();
        let emitter = Emitter::new(dir.path(), &extractor);
        let template = Template::parse("broken.tmpl", "package {{.Package}}\n\nfunc (\n").unwrap();

        let err = emitter.emit(&job(), &template, EmitMode::Write).unwrap_err();
        assert!(matches!(
            err,
            GenError::Template {
                source: TemplateError::Normalize(_),
                ..
            }
        ));
        assert!(!dir.path().join("memory/converter_gen.go").exists());
    }

    #[test]
    fn test_load_template_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_template(dir.path(), Some(Path::new("nope.tmpl"))).unwrap_err();
        assert!(matches!(err, GenError::Io { .. }));
    }
}
