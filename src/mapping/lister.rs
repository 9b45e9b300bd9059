use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::registry::TypeRegistry;
use crate::error::GenError;
use crate::extract::{ParseResult, TypeExtractor};

/// A conversion side, resolved to where its fields come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A struct declared in a Go file, relative to the generator root.
    Source { path: PathBuf, name: String },
    /// A type described by the runtime [`TypeRegistry`].
    Runtime { name: String },
}

impl TypeRef {
    /// The type name as it is written in generated code.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Source { name, .. } | TypeRef::Runtime { name } => name,
        }
    }
}

/// Lists the exported field names of a record type, in declaration order.
pub trait FieldLister {
    fn field_names(&mut self, type_ref: &TypeRef) -> Result<Vec<String>, GenError>;

    /// Package declared by a source file, if this lister reads source.
    fn package_of(&mut self, _path: &Path) -> Result<Option<String>, GenError> {
        Ok(None)
    }

    /// Import path needed to reference `type_ref` from generated code.
    fn import_path(&self, _type_ref: &TypeRef) -> Option<String> {
        None
    }
}

/// Reads fields by parsing Go files, parsing each path at most once.
pub struct SourceLister<'e> {
    root: PathBuf,
    extractor: &'e TypeExtractor,
    cache: HashMap<PathBuf, ParseResult>,
    parses: usize,
}

impl<'e> SourceLister<'e> {
    pub fn new(root: impl Into<PathBuf>, extractor: &'e TypeExtractor) -> Self {
        Self {
            root: root.into(),
            extractor,
            cache: HashMap::new(),
            parses: 0,
        }
    }

    /// Number of times a file was actually read and parsed.
    #[must_use]
    pub fn parse_count(&self) -> usize {
        self.parses
    }

    /// Parse result for `path`, from the cache when available.
    pub fn parsed(&mut self, path: &Path) -> Result<&ParseResult, GenError> {
        let slot = match self.cache.entry(path.to_path_buf()) {
            Entry::Occupied(cached) => return Ok(cached.into_mut()),
            Entry::Vacant(slot) => slot,
        };

        let full = self.root.join(path);
        let text = fs::read_to_string(&full).map_err(|e| GenError::io(&full, e))?;

        self.parses += 1;
        let result = self
            .extractor
            .parse(&text)
            .map_err(|source| GenError::Extract {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            "Parsed {}: package {}, {} struct(s)",
            path.display(),
            result.package_name,
            result.structs.len()
        );

        Ok(slot.insert(result))
    }
}

impl FieldLister for SourceLister<'_> {
    fn field_names(&mut self, type_ref: &TypeRef) -> Result<Vec<String>, GenError> {
        let TypeRef::Source { path, name } = type_ref else {
            return Err(GenError::TypeNotFound {
                name: type_ref.name().to_string(),
                location: "source files".to_string(),
            });
        };

        let parsed = self.parsed(path)?;
        parsed
            .find_struct(name)
            .map(|s| s.fields.clone())
            .ok_or_else(|| GenError::TypeNotFound {
                name: name.clone(),
                location: path.display().to_string(),
            })
    }

    fn package_of(&mut self, path: &Path) -> Result<Option<String>, GenError> {
        Ok(Some(self.parsed(path)?.package_name.clone()))
    }
}

/// Reads fields from registered runtime type descriptors.
pub struct RuntimeLister<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> RuntimeLister<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }
}

impl FieldLister for RuntimeLister<'_> {
    fn field_names(&mut self, type_ref: &TypeRef) -> Result<Vec<String>, GenError> {
        match type_ref {
            TypeRef::Runtime { name } => self.registry.record_fields(name),
            TypeRef::Source { name, .. } => Err(GenError::TypeNotFound {
                name: name.clone(),
                location: "type registry".to_string(),
            }),
        }
    }

    fn import_path(&self, type_ref: &TypeRef) -> Option<String> {
        match type_ref {
            TypeRef::Runtime { name } => self.registry.get(name)?.import_path.clone(),
            TypeRef::Source { .. } => None,
        }
    }
}

/// Sends each reference to the lister that can resolve it.
pub struct Resolver<'a> {
    pub source: SourceLister<'a>,
    pub runtime: RuntimeLister<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &Path, extractor: &'a TypeExtractor, registry: &'a TypeRegistry) -> Self {
        Self {
            source: SourceLister::new(root, extractor),
            runtime: RuntimeLister::new(registry),
        }
    }
}

impl FieldLister for Resolver<'_> {
    fn field_names(&mut self, type_ref: &TypeRef) -> Result<Vec<String>, GenError> {
        match type_ref {
            TypeRef::Source { .. } => self.source.field_names(type_ref),
            TypeRef::Runtime { .. } => self.runtime.field_names(type_ref),
        }
    }

    fn package_of(&mut self, path: &Path) -> Result<Option<String>, GenError> {
        self.source.package_of(path)
    }

    fn import_path(&self, type_ref: &TypeRef) -> Option<String> {
        self.runtime.import_path(type_ref)
    }
}
