//! Decoders for stored article lists, current and legacy layouts.
//!
//! Migration walks the primary key, then `StoreConfig::legacy_sources` in
//! order, and keeps the first source whose decoder yields a non-empty list. Records are normalized on
//! the way in; entries that are not JSON objects are dropped.

use crate::config::{LegacyFormat, RecordDefaults};
use crate::model::article::{normalize_record, Article};
use log::warn;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why one stored location could not be decoded.
#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    Shape(&'static str),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid json: {err}"),
            Self::Shape(expected) => write!(f, "unexpected shape: expected {expected}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Shape(_) => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Extracts the raw record array from a parsed document.
pub type Decoder = fn(&Value) -> Result<&Vec<Value>, DecodeError>;

/// Returns the decoder for one storage layout.
pub fn decoder_for(format: LegacyFormat) -> Decoder {
    match format {
        LegacyFormat::BareArray => decode_bare_array,
        LegacyFormat::Wrapped => decode_wrapped,
    }
}

/// Parses `raw` with the layout's decoder and normalizes every record.
pub fn decode_articles(
    raw: &str,
    format: LegacyFormat,
    defaults: &RecordDefaults,
    now: &str,
) -> Result<Vec<Article>, DecodeError> {
    let document: Value = serde_json::from_str(raw)?;
    let records = decoder_for(format)(&document)?;

    let articles: Vec<Article> = records
        .iter()
        .filter_map(|record| normalize_record(record, defaults, now))
        .collect();
    let dropped = records.len() - articles.len();
    if dropped > 0 {
        warn!("event=articles_decode module=store status=partial dropped_records={dropped}");
    }
    Ok(articles)
}

fn decode_bare_array(document: &Value) -> Result<&Vec<Value>, DecodeError> {
    document
        .as_array()
        .ok_or(DecodeError::Shape("a json array"))
}

fn decode_wrapped(document: &Value) -> Result<&Vec<Value>, DecodeError> {
    document
        .get("articles")
        .and_then(Value::as_array)
        .ok_or(DecodeError::Shape("an object with an `articles` array"))
}

#[cfg(test)]
mod tests {
    use super::{decode_articles, DecodeError};
    use crate::config::{LegacyFormat, RecordDefaults};

    const NOW: &str = "2024-01-01T00:00:00.000Z";

    #[test]
    fn bare_array_drops_non_object_entries() {
        let articles = decode_articles(
            r#"[{"title":"One"}, 42, {"title":"Two"}]"#,
            LegacyFormat::BareArray,
            &RecordDefaults::default(),
            NOW,
        )
        .unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].slug, "two");
    }

    #[test]
    fn wrapped_layout_requires_articles_field() {
        let defaults = RecordDefaults::default();
        let articles = decode_articles(
            r#"{"version":"1.0","articles":[{"title":"Wrapped"}]}"#,
            LegacyFormat::Wrapped,
            &defaults,
            NOW,
        )
        .unwrap();
        assert_eq!(articles[0].title, "Wrapped");

        let err = decode_articles("[]", LegacyFormat::Wrapped, &defaults, NOW).unwrap_err();
        assert!(matches!(err, DecodeError::Shape(_)));
    }

    #[test]
    fn corrupted_text_is_a_json_error() {
        let err = decode_articles(
            "[{\"title\":",
            LegacyFormat::BareArray,
            &RecordDefaults::default(),
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
