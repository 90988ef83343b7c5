//! Product rows.

use serde::Serialize;

use super::{require_external_id, EntityMapper, MappedRecord, MappingContext};
use crate::migration::MigrationError;
use crate::row::RawRow;
use crate::types::{DbId, ExternalId};

pub const UNNAMED_PRODUCT: &str = "Unnamed Product";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub external_id: ExternalId,
    pub category_external_id: Option<ExternalId>,
    pub category_id: DbId,
    pub name: String,
    pub default_code: String,
    pub description: String,
    pub description_sale: String,
    pub list_price: f64,
    pub standard_price: f64,
    pub weight: f64,
    pub volume: f64,
    pub active: bool,
    pub sale_ok: bool,
    pub purchase_ok: bool,
}

impl MappedRecord for ProductRecord {
    fn external_id(&self) -> ExternalId {
        self.external_id
    }
}

pub struct ProductMapper;

impl EntityMapper for ProductMapper {
    type Record = ProductRecord;
    const ID_COLUMN: &'static str = "product_id";

    fn map(row: &RawRow, ctx: &MappingContext<'_>) -> Result<ProductRecord, MigrationError> {
        let external_id = require_external_id(row, Self::ID_COLUMN)?;
        let field = |msg: String| MigrationError::record(external_id, msg);

        let category_external_id = row.reference("category_id").map_err(field)?;
        let category_id = match category_external_id.and_then(|c| ctx.categories.get(c)) {
            Some(id) => id,
            None => ctx
                .catch_all_category
                .ok_or_else(|| field("catch-all category is not available".to_string()))?,
        };

        let name = row
            .opt_text("product")
            .or_else(|| row.opt_text("name"))
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string());

        // Volume only makes sense with all three dimensions present.
        let length = row.number("length").map_err(field)?;
        let width = row.number("width").map_err(field)?;
        let height = row.number("height").map_err(field)?;

        Ok(ProductRecord {
            external_id,
            category_external_id,
            category_id,
            name,
            default_code: row.text("product_code"),
            description: row.text("full_description"),
            description_sale: row.text("short_description"),
            list_price: row.number("list_price").map_err(field)?,
            standard_price: row.number("price").map_err(field)?,
            weight: row.number("weight").map_err(field)?,
            volume: length * width * height,
            active: row.is_active("status"),
            sale_ok: true,
            purchase_ok: true,
        })
    }
}
