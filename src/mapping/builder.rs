use std::path::Path;

use tracing::debug;

use super::lister::{FieldLister, Resolver};
use super::matcher::match_fields;
use super::naming::derive_name;
use super::registry::TypeRegistry;
use super::{ConversionSpec, GenerationJob};
use crate::config::{JobConfig, TypeRefConfig};
use crate::error::GenError;
use crate::extract::TypeExtractor;

/// Build the generation job for one configured output file.
///
/// Source files are parsed at most once per call; the cache does not outlive
/// the job.
pub fn build(
    job: &JobConfig,
    root: &Path,
    extractor: &TypeExtractor,
    registry: &TypeRegistry,
) -> Result<GenerationJob, GenError> {
    let mut resolver = Resolver::new(root, extractor, registry);
    build_with(job, &mut resolver)
}

/// Like [`build`], with the field lister supplied by the caller.
pub fn build_with(
    job: &JobConfig,
    lister: &mut dyn FieldLister,
) -> Result<GenerationJob, GenError> {
    let mut imports = job.imports.clone();
    let mut conversions = Vec::with_capacity(job.conversions.len());

    for pair in &job.conversions {
        let from = pair.from.resolve(&job.source);
        let to = pair.to.resolve(&job.source);

        let from_fields = lister.field_names(&from)?;
        let to_fields = lister.field_names(&to)?;
        let fields = match_fields(&from_fields, &to_fields);

        for side in [&from, &to] {
            if let Some(path) = lister.import_path(side) {
                if !imports.contains(&path) {
                    imports.push(path);
                }
            }
        }

        let method_name = derive_name(from.name(), to.name());
        debug!(
            "{method_name}: {} of {} field(s) matched",
            fields.len(),
            from_fields.len()
        );

        conversions.push(ConversionSpec {
            method_name,
            from_type: from.name().to_string(),
            to_type: to.name().to_string(),
            fields,
        });
    }

    let names_source = job.conversions.iter().any(|pair| {
        matches!(pair.from, TypeRefConfig::Local(_)) || matches!(pair.to, TypeRefConfig::Local(_))
    });
    let package_name = match &job.package {
        Some(package) => package.clone(),
        None if names_source => match lister.package_of(&job.source)? {
            Some(package) => package,
            None => package_from_output(&job.output),
        },
        None => package_from_output(&job.output),
    };

    Ok(GenerationJob {
        output_path: job.output.clone(),
        package_name,
        imports,
        conversions,
    })
}

// Go convention: the package is named after its directory.
fn package_from_output(output: &Path) -> String {
    output
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "main".to_string())
}
