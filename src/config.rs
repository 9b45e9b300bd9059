/// Configuration module for structmap.
///
/// Describes the generation jobs to run and the runtime types they may
/// reference. The built-in defaults generate the in-memory repository
/// converters and the adder service converter; a JSON or TOML file can
/// replace them.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mapping::{RuntimeType, TypeRef, TypeRegistry};

// ── Default value functions ──────────────────────────────────────────

fn default_source() -> PathBuf {
    PathBuf::from("repository/memory/redirect.go")
}

fn default_output() -> PathBuf {
    PathBuf::from("repository/memory/converter_gen.go")
}

fn default_types() -> Vec<RuntimeType> {
    vec![
        RuntimeType::record(
            "adder.RedirectStorage",
            Some("hex-microservice/adder"),
            &["Code", "URL", "Token", "ClientInfo", "CreatedAt"],
        ),
        RuntimeType::record(
            "lookup.RedirectStorage",
            Some("hex-microservice/lookup"),
            &["Code", "URL", "CreatedAt"],
        ),
        RuntimeType::record(
            "deleter.RedirectStorage",
            Some("hex-microservice/deleter"),
            &["Code", "Token"],
        ),
    ]
}

// ── Config structs ───────────────────────────────────────────────────

/// One side of a conversion as written in configuration.
///
/// A bare string names a struct in the job's own source file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TypeRefConfig {
    Local(String),
    External { external: String },
    File { name: String, path: PathBuf },
}

impl TypeRefConfig {
    /// Resolve against the source file of the job this reference belongs to.
    #[must_use]
    pub fn resolve(&self, job_source: &Path) -> TypeRef {
        match self {
            TypeRefConfig::Local(name) => TypeRef::Source {
                path: job_source.to_path_buf(),
                name: name.clone(),
            },
            TypeRefConfig::External { external } => TypeRef::Runtime {
                name: external.clone(),
            },
            TypeRefConfig::File { name, path } => TypeRef::Source {
                path: path.clone(),
                name: name.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    pub from: TypeRefConfig,
    pub to: TypeRefConfig,
}

impl ConversionConfig {
    pub fn new(from: TypeRefConfig, to: TypeRefConfig) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct JobConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Template file; the built-in mapping template when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Package clause of the generated file; taken from `source` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default)]
    pub imports: Vec<String>,

    #[serde(default)]
    pub conversions: Vec<ConversionConfig>,
}

impl JobConfig {
    /// Name used in logs and reports.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.output.display().to_string())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub types: Vec<RuntimeType>,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: None,
            template: None,
            source: default_source(),
            output: default_output(),
            package: None,
            imports: Vec::new(),
            conversions: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let local = |name: &str| TypeRefConfig::Local(name.to_string());
        let external = |name: &str| TypeRefConfig::External {
            external: name.to_string(),
        };

        Self {
            types: default_types(),
            jobs: vec![
                JobConfig {
                    name: Some("memory-repository".to_string()),
                    package: Some("memory".to_string()),
                    conversions: vec![
                        ConversionConfig::new(local("redirect"), external("lookup.RedirectStorage")),
                        ConversionConfig::new(external("adder.RedirectStorage"), local("redirect")),
                        ConversionConfig::new(local("redirect"), external("deleter.RedirectStorage")),
                    ],
                    ..JobConfig::default()
                },
                // Service layer: storage view to result, package taken from the source.
                JobConfig {
                    name: Some("adder-service".to_string()),
                    source: PathBuf::from("adder/redirect.go"),
                    output: PathBuf::from("adder/converter_gen.go"),
                    conversions: vec![ConversionConfig::new(
                        local("RedirectStorage"),
                        local("RedirectResult"),
                    )],
                    ..JobConfig::default()
                },
            ],
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a `.json` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&data)
                .with_context(|| format!("invalid TOML in {}", path.display()))?,
            _ => serde_json::from_str(&data)
                .with_context(|| format!("invalid JSON in {}", path.display()))?,
        };

        info!(
            "Loaded configuration from {}: {} job(s), {} runtime type(s)",
            path.display(),
            cfg.jobs.len(),
            cfg.types.len()
        );
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to marshal config")
    }

    /// Validate job definitions before anything is generated.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.jobs.is_empty(), "at least one job must be configured");

        let mut outputs = HashSet::new();
        let mut names = HashSet::new();
        for job in &self.jobs {
            let name = job.display_name();
            anyhow::ensure!(
                !job.source.as_os_str().is_empty(),
                "job {name}: source must not be empty"
            );
            anyhow::ensure!(
                !job.output.as_os_str().is_empty(),
                "job {name}: output must not be empty"
            );
            anyhow::ensure!(
                !job.conversions.is_empty(),
                "job {name}: at least one conversion must be configured"
            );
            anyhow::ensure!(
                outputs.insert(job.output.clone()),
                "job {name}: output {} is generated by more than one job",
                job.output.display()
            );
            anyhow::ensure!(names.insert(name.clone()), "job name {name} is used twice");
        }
        Ok(())
    }

    /// Build the runtime type registry shared by all jobs.
    #[must_use]
    pub fn registry(&self) -> TypeRegistry {
        TypeRegistry::new(self.types.iter().cloned())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
