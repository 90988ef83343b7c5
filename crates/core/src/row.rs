//! Dynamically typed rows as read from the legacy source.
//!
//! Extraction queries differ per schema version, so rows are materialised as
//! column-name keyed maps rather than fixed structs. Accessors apply the
//! defaulting rules shared by every mapper: absent or NULL strings become
//! empty, absent or blank numerics become zero.

use std::collections::HashMap;

use crate::types::ExternalId;

/// Status value marking a legacy record as active.
pub const ACTIVE_STATUS: &str = "A";

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SourceValue {
    /// Textual rendering, `None` for NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::UInt(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl From<&str> for SourceValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SourceValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SourceValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One extracted row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: HashMap<String, SourceValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, column: &str, value: impl Into<SourceValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<SourceValue>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&SourceValue> {
        self.columns.get(column)
    }

    /// Non-empty trimmed text, `None` when absent, NULL or blank.
    pub fn opt_text(&self, column: &str) -> Option<String> {
        self.get(column)
            .and_then(SourceValue::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Text with the empty-string default.
    pub fn text(&self, column: &str) -> String {
        self.opt_text(column).unwrap_or_default()
    }

    /// Integer identifier. Zero and NULL are "no reference", matching the
    /// legacy convention for root categories.
    pub fn reference(&self, column: &str) -> Result<Option<ExternalId>, String> {
        let id = match self.get(column) {
            None | Some(SourceValue::Null) => return Ok(None),
            Some(SourceValue::Int(v)) => *v,
            Some(SourceValue::UInt(v)) => {
                i64::try_from(*v).map_err(|_| format!("{column} out of range: {v}"))?
            }
            Some(other) => {
                let raw = other.as_text().unwrap_or_default();
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(None);
                }
                raw.parse::<i64>()
                    .map_err(|_| format!("{column} is not an integer: '{raw}'"))?
            }
        };
        Ok((id != 0).then_some(id))
    }

    /// The mandatory external identifier of the row.
    pub fn external_id(&self, column: &str) -> Result<ExternalId, String> {
        self.reference(column)?
            .ok_or_else(|| format!("missing external identifier ({column})"))
    }

    /// Numeric value; absent, NULL and blank parse as zero.
    pub fn number(&self, column: &str) -> Result<f64, String> {
        match self.get(column) {
            None | Some(SourceValue::Null) => Ok(0.0),
            Some(SourceValue::Int(v)) => Ok(*v as f64),
            Some(SourceValue::UInt(v)) => Ok(*v as f64),
            Some(SourceValue::Float(v)) => Ok(*v),
            Some(other) => {
                let raw = other.as_text().unwrap_or_default();
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(0.0);
                }
                raw.parse::<f64>()
                    .map_err(|_| format!("{column} is not numeric: '{raw}'"))
            }
        }
    }

    /// Status check against [`ACTIVE_STATUS`]. A query that does not select
    /// the column at all counts as active; a NULL status does not.
    pub fn is_active(&self, column: &str) -> bool {
        match self.get(column) {
            None => true,
            Some(value) => value.as_text().is_some_and(|s| s.trim() == ACTIVE_STATUS),
        }
    }
}

impl FromIterator<(String, SourceValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, SourceValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
