//! Export/import document format.
//!
//! Export always writes the wrapped envelope. Import accepts the envelope or
//! a bare array, and every element must be a JSON object.

use crate::config::RecordDefaults;
use crate::model::article::{normalize_record, Article};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wrapped export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    pub export_date: String,
    pub articles: Vec<Article>,
}

/// Rejected import payload.
#[derive(Debug)]
pub enum ImportError {
    Parse(serde_json::Error),
    Shape(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "import is not valid json: {err}"),
            Self::Shape(message) => write!(f, "import has unexpected shape: {message}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Shape(_) => None,
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Parses an import payload into normalized articles without touching storage.
pub fn parse_import_payload(
    json: &str,
    defaults: &RecordDefaults,
    now: &str,
) -> Result<Vec<Article>, ImportError> {
    let document: Value = serde_json::from_str(json)?;
    let records = match &document {
        Value::Array(records) => records,
        Value::Object(object) => match object.get("articles") {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(ImportError::Shape(
                    "`articles` must be an array".to_string(),
                ))
            }
            None => {
                return Err(ImportError::Shape(
                    "object is missing `articles`".to_string(),
                ))
            }
        },
        _ => {
            return Err(ImportError::Shape(
                "expected an array or an export envelope".to_string(),
            ))
        }
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            normalize_record(record, defaults, now)
                .ok_or_else(|| ImportError::Shape(format!("record {index} is not an object")))
        })
        .collect()
}
