/// Field mapping between a "from" and a "to" type.
///
/// Resolves field lists through [`FieldLister`] implementations, pairs them
/// by name and names the resulting conversion functions.
pub mod builder;
pub mod lister;
pub mod matcher;
pub mod naming;
pub mod registry;

pub use builder::{build, build_with};
pub use lister::{FieldLister, Resolver, RuntimeLister, SourceLister, TypeRef};
pub use matcher::{FieldCorrespondence, match_fields};
pub use naming::derive_name;
pub use registry::{RuntimeType, TypeRegistry, TypeShape};

use std::path::PathBuf;

use serde::Serialize;

/// One generated conversion function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSpec {
    #[serde(rename = "MethodName")]
    pub method_name: String,
    #[serde(rename = "FromTypeName")]
    pub from_type: String,
    #[serde(rename = "ToTypeName")]
    pub to_type: String,
    #[serde(rename = "Fields")]
    pub fields: Vec<FieldCorrespondence>,
}

/// Everything a template needs to render one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    #[serde(rename = "Path")]
    pub output_path: PathBuf,
    #[serde(rename = "Package")]
    pub package_name: String,
    #[serde(rename = "Imports")]
    pub imports: Vec<String>,
    #[serde(rename = "Conversions")]
    pub conversions: Vec<ConversionSpec>,
}
