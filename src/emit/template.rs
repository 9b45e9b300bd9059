/// Go `text/template` rendering through `gtmpl`.
///
/// Data is anything `Serialize`; fields are looked up by their serialized
/// names. A field the data doesn't supply is an error, not `<no value>`.
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

use gtmpl::Value;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::extract::ExtractError;

static MISSING_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:no field|can't evaluate field|no entry for key) "?([A-Za-z_][A-Za-z0-9_]*)"#)
        .unwrap()
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("field {field} is not supplied")]
    MissingField { field: String },

    #[error("render error: {message}")]
    Render { message: String },

    #[error("import normalization failed: {0}")]
    Normalize(#[from] ExtractError),
}

/// A checked template, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    text: String,
}

impl Template {
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, TemplateError> {
        let mut checked = gtmpl::Template::default();
        checked.parse(text).map_err(|e| TemplateError::Parse {
            message: e.to_string(),
        })?;

        Ok(Self {
            name: name.into(),
            text: text.to_string(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let json = serde_json::to_value(data).map_err(|e| TemplateError::Render {
            message: e.to_string(),
        })?;
        gtmpl::template(&self.text, to_value(json)).map_err(|e| exec_error(&e))
    }
}

fn exec_error(err: &impl Display) -> TemplateError {
    let message = err.to_string();
    match MISSING_FIELD.captures(&message) {
        Some(caps) => TemplateError::MissingField {
            field: caps[1].to_string(),
        },
        None => TemplateError::Render { message },
    }
}

// Objects become `Value::Object` so that a missing key fails the render.
fn to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::from(u)
            } else if let Some(i) = n.as_i64() {
                Value::from(i)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(to_value).collect()),
        serde_json::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, to_value(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}
