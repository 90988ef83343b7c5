//! Schema version resolution.
//!
//! Methods are tried in order and the first that matches wins: the version
//! setting, the multi-vendor tables, a column introduced in 4.10, and
//! finally the baseline. A probe that errors counts as "did not match";
//! only failing to connect at all is reported to the caller.

use async_trait::async_trait;
use cartshift_core::schema_version::{parse_settings_version, DeclaredVersion, SchemaVersion};

use crate::descriptor::SourceDescriptor;
use crate::error::SourceError;
use crate::extract::MySqlSource;
use crate::probe::{MySqlProbe, SchemaProbe};

const COMPANIES_TABLE: &str = "cscart_companies";
const VENDOR_TABLES: &str = "cscart\\_vendor\\_%";
const PRODUCTS_TABLE: &str = "cscart_products";
const LATE_REVISION_COLUMN: &str = "detailed_params";

/// Run the detection chain against an open probe.
pub async fn probe_version<P: SchemaProbe + ?Sized>(probe: &mut P) -> SchemaVersion {
    match probe.settings_version().await {
        Ok(Some(raw)) => {
            if let Some(version) = parse_settings_version(&raw) {
                tracing::debug!(raw = %raw, %version, "Version resolved from settings");
                return version;
            }
            tracing::debug!(raw = %raw, "Version setting did not match a known tag");
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "Version setting unreadable"),
    }

    let companies = probe.table_exists(COMPANIES_TABLE).await;
    let vendors = probe.table_exists(VENDOR_TABLES).await;
    if matches!((companies, vendors), (Ok(true), Ok(true))) {
        return SchemaVersion::Mve;
    }

    if let Ok(true) = probe.column_exists(PRODUCTS_TABLE, LATE_REVISION_COLUMN).await {
        return SchemaVersion::V4_10Plus;
    }

    SchemaVersion::BASELINE
}

/// Connect and detect the version of a live source.
pub async fn detect_version(descriptor: &SourceDescriptor) -> Result<SchemaVersion, SourceError> {
    let mut probe = MySqlProbe::open(descriptor).await?;
    let version = probe_version(&mut probe).await;
    probe.close().await;
    Ok(version)
}

/// The dialect a run will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: SchemaVersion,
    /// `true` when the version came from probing rather than configuration.
    pub detected: bool,
}

/// Resolve the version a descriptor declares; only `auto` touches the source.
pub async fn resolve_declared(descriptor: &SourceDescriptor) -> Result<ResolvedVersion, SourceError> {
    match descriptor.declared_version {
        DeclaredVersion::Fixed(version) => Ok(ResolvedVersion {
            version,
            detected: false,
        }),
        DeclaredVersion::Auto => Ok(ResolvedVersion {
            version: detect_version(descriptor).await?,
            detected: true,
        }),
    }
}

/// Something that can tell which schema dialect it speaks.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn resolve_version(&self) -> Result<ResolvedVersion, SourceError>;
}

#[async_trait]
impl VersionSource for MySqlSource {
    async fn resolve_version(&self) -> Result<ResolvedVersion, SourceError> {
        resolve_declared(self.descriptor()).await
    }
}
