/// Runtime type descriptors for types whose source is not parsed.
///
/// A conversion side can name a type owned by another, already built
/// package. Its shape is described here instead of being read from text;
/// the registry is built once at startup and only read afterwards.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GenError;
use crate::extract::is_exported;

/// Underlying shape of a registered type, after Go's `reflect.Kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeShape {
    Struct { fields: Vec<String> },
    Pointer { elem: Box<TypeShape> },
    Interface,
    Func,
    /// A named type defined as another registered type.
    Alias { target: String },
}

impl TypeShape {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TypeShape::Struct { .. } => "struct",
            TypeShape::Pointer { .. } => "pointer",
            TypeShape::Interface => "interface",
            TypeShape::Func => "func",
            TypeShape::Alias { .. } => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeType {
    /// Package-qualified name as written in generated code, e.g. `lookup.RedirectStorage`.
    pub name: String,

    /// Import path that brings the type's package into scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,

    #[serde(flatten)]
    pub shape: TypeShape,
}

impl RuntimeType {
    /// Describe a plain struct type.
    pub fn record(name: &str, import_path: Option<&str>, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            import_path: import_path.map(str::to_string),
            shape: TypeShape::Struct {
                fields: fields.iter().map(|f| f.to_string()).collect(),
            },
        }
    }
}

/// Immutable lookup table of runtime types, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, RuntimeType>,
}

impl TypeRegistry {
    pub fn new(types: impl IntoIterator<Item = RuntimeType>) -> Self {
        let mut map = BTreeMap::new();
        for ty in types {
            if let Some(previous) = map.insert(ty.name.clone(), ty) {
                warn!("Type {} registered twice, keeping the last one", previous.name);
            }
        }
        Self { types: map }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuntimeType> {
        self.types.get(name)
    }

    /// Exported field names of a registered record type.
    ///
    /// Pointers are dereferenced and aliases followed; any other shape is
    /// not a record and fails with [`GenError::NotARecord`].
    pub fn record_fields(&self, name: &str) -> Result<Vec<String>, GenError> {
        let mut shape = &self.lookup(name)?.shape;
        let mut followed = HashSet::new();

        loop {
            match shape {
                TypeShape::Struct { fields } => {
                    return Ok(fields.iter().filter(|f| is_exported(f)).cloned().collect());
                }
                TypeShape::Pointer { elem } => shape = &**elem,
                TypeShape::Alias { target } => {
                    if !followed.insert(target.as_str()) {
                        return Err(GenError::NotARecord {
                            name: name.to_string(),
                            kind: format!("alias cycle through {target}"),
                        });
                    }
                    shape = &self.lookup(target)?.shape;
                }
                other => {
                    return Err(GenError::NotARecord {
                        name: name.to_string(),
                        kind: other.kind().to_string(),
                    });
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<&RuntimeType, GenError> {
        self.get(name).ok_or_else(|| GenError::TypeNotFound {
            name: name.to_string(),
            location: "type registry".to_string(),
        })
    }
}
