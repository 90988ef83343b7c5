//! Row extraction: run one registered query and materialise every row.

use async_trait::async_trait;
use cartshift_core::query_registry::QuerySpec;
use cartshift_core::row::{RawRow, SourceValue};
use sqlx::mysql::MySqlRow;
use sqlx::types::BigDecimal;
use sqlx::{Column, Row, TypeInfo};

use crate::connection::{connect, release};
use crate::descriptor::SourceDescriptor;
use crate::error::SourceError;

/// Produces the raw rows of a phase.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn extract(&self, spec: &QuerySpec, language_code: &str)
        -> Result<Vec<RawRow>, SourceError>;
}

/// [`RowSource`] backed by a live legacy database.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    descriptor: SourceDescriptor,
}

impl MySqlSource {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl RowSource for MySqlSource {
    async fn extract(
        &self,
        spec: &QuerySpec,
        language_code: &str,
    ) -> Result<Vec<RawRow>, SourceError> {
        extract(&self.descriptor, spec, language_code).await
    }
}

/// Open a connection, drain the query into memory and close the connection.
///
/// The connection is released on the error path as well.
pub async fn extract(
    descriptor: &SourceDescriptor,
    spec: &QuerySpec,
    language_code: &str,
) -> Result<Vec<RawRow>, SourceError> {
    let mut conn = connect(descriptor).await?;

    let mut query = sqlx::query(spec.sql);
    if spec.requires_language {
        query = query.bind(language_code);
    }
    let result = query.fetch_all(&mut conn).await;
    release(conn).await;

    let rows = result?;
    tracing::debug!(
        rows = rows.len(),
        version = %spec.registered_for,
        "Extracted source rows"
    );
    Ok(rows.iter().map(decode_row).collect())
}

// ---------------------------------------------------------------------------
// Dynamic decoding
// ---------------------------------------------------------------------------

fn decode_row(row: &MySqlRow) -> RawRow {
    row.columns()
        .iter()
        .map(|col| {
            let value = decode_value(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

/// Decode one column by its reported MySQL type name. Values that cannot be
/// decoded as their declared type fall back to raw bytes.
fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> SourceValue {
    let decoded = match type_name {
        "NULL" => Some(SourceValue::Null),
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, SourceValue::Int)),
        t if t.ends_with("UNSIGNED") => row
            .try_get::<Option<u64>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, SourceValue::UInt)),
        "DECIMAL" => row
            .try_get::<Option<BigDecimal>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, |d| SourceValue::Text(d.to_string()))),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, SourceValue::Float)),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, |d| SourceValue::Text(d.to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, |d| SourceValue::Text(d.to_string()))),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .map(|v| v.map_or(SourceValue::Null, SourceValue::Text)),
    };

    decoded.unwrap_or_else(|| {
        match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => SourceValue::Bytes(bytes),
            Ok(None) => SourceValue::Null,
            Err(e) => {
                tracing::debug!(column = idx, type_name, error = %e, "Undecodable source column");
                SourceValue::Null
            }
        }
    })
}
