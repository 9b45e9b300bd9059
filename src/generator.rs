/// Batch driver: builds and emits every configured job in order.
///
/// Jobs are independent. A failing job is logged and recorded in the
/// report, and the remaining jobs still run.
use std::path::PathBuf;

use tracing::{error, info};

use crate::config::JobConfig;
use crate::emit::{EmitMode, EmitResult, Emitter, load_template};
use crate::error::GenError;
use crate::extract::{ExtractError, TypeExtractor};
use crate::mapping::{TypeRegistry, build};

#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub output: PathBuf,
    pub result: Result<EmitResult, GenError>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<JobOutcome>,
}

impl GenerationReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Dry-run output of the successful jobs, in job order.
    #[must_use]
    pub fn rendered(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(EmitResult::Rendered(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&JobOutcome, &GenError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }
}

pub struct Generator<'r> {
    root: PathBuf,
    extractor: TypeExtractor,
    registry: &'r TypeRegistry,
}

impl<'r> Generator<'r> {
    /// Paths in job configurations are resolved against `root`.
    pub fn new(root: impl Into<PathBuf>, registry: &'r TypeRegistry) -> Result<Self, ExtractError> {
        Ok(Self {
            root: root.into(),
            extractor: TypeExtractor::new()?,
            registry,
        })
    }

    pub fn run(&self, jobs: &[JobConfig], mode: EmitMode) -> GenerationReport {
        let mut report = GenerationReport::default();

        for job in jobs {
            let name = job.display_name();
            let result = self.run_job(job, mode);

            match &result {
                Ok(EmitResult::Written { path, .. }) => info!("Job {name}: wrote {}", path.display()),
                Ok(EmitResult::Rendered(text)) => info!("Job {name}: rendered {} bytes", text.len()),
                Err(e) => error!("Job {name} ({}) failed: {e}", job.output.display()),
            }

            report.outcomes.push(JobOutcome {
                name,
                output: job.output.clone(),
                result,
            });
        }

        info!(
            "Generation finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Build and emit a single job.
    pub fn run_job(&self, job: &JobConfig, mode: EmitMode) -> Result<EmitResult, GenError> {
        let template = load_template(&self.root, job.template.as_deref())?;
        let generation = build(job, &self.root, &self.extractor, self.registry)?;
        Emitter::new(&self.root, &self.extractor).emit(&generation, &template, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversionConfig, TypeRefConfig};
    use crate::mapping::RuntimeType;
    use std::fs;
    use tempfile::tempdir;

    const REDIRECT: &str = "package memory\n\ntype redirect struct {\n\tCode  string\n\tURL   string\n\tToken string\n\tcount int\n}\n";

    fn registry() -> TypeRegistry {
        TypeRegistry::new([RuntimeType::record(
            "lookup.RedirectStorage",
            Some("hex-microservice/lookup"),
            &["Code", "URL", "CreatedAt"],
        )])
    }

    fn job(name: &str, source: &str, output: &str) -> JobConfig {
        JobConfig {
            name: Some(name.to_string()),
            source: source.into(),
            output: output.into(),
            conversions: vec![ConversionConfig::new(
                TypeRefConfig::Local("redirect".into()),
                TypeRefConfig::External {
                    external: "lookup.RedirectStorage".into(),
                },
            )],
            ..JobConfig::default()
        }
    }

    #[test]
    fn test_failed_job_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("memory")).unwrap();
        fs::write(dir.path().join("memory/redirect.go"), REDIRECT).unwrap();

        let registry = registry();
        let generator = Generator::new(dir.path(), &registry).unwrap();
        let jobs = [
            job("broken", "missing/redirect.go", "missing/converter_gen.go"),
            job("memory", "memory/redirect.go", "memory/converter_gen.go"),
        ];

        let report = generator.run(&jobs, EmitMode::Write);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.has_failures());

        let (failed, err) = report.failures().next().unwrap();
        assert_eq!(failed.name, "broken");
        assert!(matches!(err, GenError::Io { .. }));

        let written = fs::read_to_string(dir.path().join("memory/converter_gen.go")).unwrap();
        assert!(written.starts_with("package memory\n"));
        assert!(written.contains("\t\tCode: i.Code,\n\t\tURL: i.URL,\n"));
        assert!(!written.contains("Token"));
    }

    #[test]
    fn test_dry_run_collects_rendered_text() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("memory")).unwrap();
        fs::write(dir.path().join("memory/redirect.go"), REDIRECT).unwrap();

        let registry = registry();
        let generator = Generator::new(dir.path(), &registry).unwrap();
        let report = generator.run(
            &[job("memory", "memory/redirect.go", "memory/converter_gen.go")],
            EmitMode::DryRun,
        );

        assert!(!report.has_failures());
        let rendered = report.rendered();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("func fromRedirectToLookupRedirectStorage(i redirect) lookup.RedirectStorage {"));
        assert!(!dir.path().join("memory/converter_gen.go").exists());
    }

    #[test]
    fn test_unknown_runtime_type_reported() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("memory")).unwrap();
        fs::write(dir.path().join("memory/redirect.go"), REDIRECT).unwrap();

        let registry = TypeRegistry::new(Vec::<RuntimeType>::new());
        let generator = Generator::new(dir.path(), &registry).unwrap();
        let report = generator.run(
            &[job("memory", "memory/redirect.go", "memory/converter_gen.go")],
            EmitMode::Write,
        );

        let (_, err) = report.failures().next().unwrap();
        assert!(matches!(err, GenError::TypeNotFound { name, .. } if name == "lookup.RedirectStorage"));
        assert!(report.rendered().is_empty());
    }
}
