//! Category rows.

use serde::Serialize;

use super::{require_external_id, EntityMapper, MappedRecord, MappingContext};
use crate::migration::MigrationError;
use crate::row::RawRow;
use crate::types::{DbId, ExternalId};

pub const UNNAMED_CATEGORY: &str = "Unnamed Category";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub external_id: ExternalId,
    pub parent_external_id: Option<ExternalId>,
    /// Set only when the parent was already migrated when this row was read.
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl MappedRecord for CategoryRecord {
    fn external_id(&self) -> ExternalId {
        self.external_id
    }
}

pub struct CategoryMapper;

impl EntityMapper for CategoryMapper {
    type Record = CategoryRecord;
    const ID_COLUMN: &'static str = "category_id";

    fn map(row: &RawRow, ctx: &MappingContext<'_>) -> Result<CategoryRecord, MigrationError> {
        let external_id = require_external_id(row, Self::ID_COLUMN)?;
        let parent_external_id = row
            .reference("parent_id")
            .map_err(|msg| MigrationError::record(external_id, msg))?;
        let parent_id = parent_external_id.and_then(|p| ctx.categories.get(p));

        let name = row
            .opt_text("category")
            .or_else(|| row.opt_text("name"))
            .unwrap_or_else(|| UNNAMED_CATEGORY.to_string());

        Ok(CategoryRecord {
            external_id,
            parent_external_id,
            parent_id,
            name,
            description: row.text("description"),
            active: row.is_active("status"),
        })
    }
}
