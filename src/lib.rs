//! # structmap — struct-mapping code generator
//!
//! Reads Go struct declarations from source text, pairs the fields of a
//! "from" and a "to" type by name, and renders field-copy conversion
//! functions through a text template.
//!
//! ## Architecture
//!
//! - **[`extract`]** — Tree-sitter Go parsing: package, imports, exported struct fields
//! - **[`mapping`]** — Field listers (source / runtime registry), matching, naming, job building
//! - **[`emit`]** — Template engine, import normalization, output writing
//! - **[`generator`]** — Batch driver with per-job isolation and reporting
//! - **[`config`]** — Built-in jobs and JSON/TOML configuration files

pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod generator;
pub mod mapping;

pub use error::GenError;
