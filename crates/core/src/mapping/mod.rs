//! Entity mappers: raw legacy rows to target value objects.
//!
//! Mappers never write to the target store. Every reference to another
//! target record is resolved through lookup tables prepared by the runner
//! ([`IdentityMap`] for migrated entities, [`GeoIndex`] for reference data).

pub mod category;
pub mod partner;
pub mod product;

use std::collections::HashMap;

use crate::migration::{describe_external_id, MigrationError};
use crate::row::RawRow;
use crate::types::{DbId, ExternalId};

pub use category::{CategoryMapper, CategoryRecord};
pub use partner::{CustomerMapper, PartnerRecord, SupplierMapper};
pub use product::{ProductMapper, ProductRecord};

// ---------------------------------------------------------------------------
// Mapper seam
// ---------------------------------------------------------------------------

/// A mapped value carrying its idempotency key.
pub trait MappedRecord {
    fn external_id(&self) -> ExternalId;
}

/// Transforms one raw row of an entity type into its target value object.
pub trait EntityMapper {
    type Record: MappedRecord + Send + Sync;

    /// Column holding the source primary key.
    const ID_COLUMN: &'static str;

    fn map(row: &RawRow, ctx: &MappingContext<'_>) -> Result<Self::Record, MigrationError>;

    /// Best-effort identifier for error reporting.
    fn describe_row(row: &RawRow) -> String {
        describe_external_id(row.external_id(Self::ID_COLUMN).ok())
    }
}

/// Read the mandatory external id, as a record error when absent.
pub(crate) fn require_external_id(row: &RawRow, column: &str) -> Result<ExternalId, MigrationError> {
    row.external_id(column)
        .map_err(|msg| MigrationError::record(describe_external_id(None), msg))
}

// ---------------------------------------------------------------------------
// Identity map
// ---------------------------------------------------------------------------

/// `external_id -> internal id` for one entity type, owned by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: HashMap<ExternalId, DbId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, external_id: ExternalId, id: DbId) {
        self.entries.insert(external_id, id);
    }

    pub fn get(&self, external_id: ExternalId) -> Option<DbId> {
        self.entries.get(&external_id).copied()
    }

    pub fn contains(&self, external_id: ExternalId) -> bool {
        self.entries.contains_key(&external_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExternalId, DbId)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

impl Extend<(ExternalId, DbId)> for IdentityMap {
    fn extend<I: IntoIterator<Item = (ExternalId, DbId)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<(ExternalId, DbId)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (ExternalId, DbId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Geographic reference data
// ---------------------------------------------------------------------------

/// Country and state lookup prepared before the customer phase.
#[derive(Debug, Clone, Default)]
pub struct GeoIndex {
    countries: HashMap<String, DbId>,
    /// Per country: lower-cased state name to id.
    states: HashMap<DbId, HashMap<String, DbId>>,
}

impl GeoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_country(&mut self, code: &str, id: DbId) {
        self.countries.insert(code.trim().to_uppercase(), id);
    }

    pub fn add_state(&mut self, country_id: DbId, name: &str, id: DbId) {
        self.states
            .entry(country_id)
            .or_default()
            .insert(name.trim().to_lowercase(), id);
    }

    /// Exact code match, case-insensitive on the input.
    pub fn country(&self, code: &str) -> Option<DbId> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.countries.get(&code.to_uppercase()).copied()
    }

    /// Case-insensitive name match scoped to one country. States of other
    /// countries are never considered.
    pub fn state(&self, name: &str, country_id: DbId) -> Option<DbId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.states
            .get(&country_id)?
            .get(&name.to_lowercase())
            .copied()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Lookup tables visible to a mapper while it handles one row.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    /// Category mapping: in flight during the category phase, complete
    /// afterwards.
    pub categories: &'a IdentityMap,
    /// Target of products whose category is unknown.
    pub catch_all_category: Option<DbId>,
    pub geo: &'a GeoIndex,
}

impl<'a> MappingContext<'a> {
    pub fn new(categories: &'a IdentityMap, geo: &'a GeoIndex) -> Self {
        Self {
            categories,
            catch_all_category: None,
            geo,
        }
    }

    pub fn with_catch_all(mut self, id: DbId) -> Self {
        self.catch_all_category = Some(id);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
