//! Crate-level error type for building and emitting generation jobs.
use std::path::PathBuf;

use thiserror::Error;

use crate::emit::TemplateError;
use crate::extract::ExtractError;

#[derive(Error, Debug)]
pub enum GenError {
    /// The source file failed to parse, or one of its structs is malformed.
    #[error("{}: {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("type {name} not found in {location}")]
    TypeNotFound { name: String, location: String },

    #[error("type {name} is not a record type (found {kind})")]
    NotARecord { name: String, kind: String },

    #[error("template {template}: {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template(template: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            template: template.into(),
            source,
        }
    }
}
