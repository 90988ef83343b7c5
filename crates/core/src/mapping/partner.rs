//! Customer and supplier rows. Both come from the legacy user table and land
//! in the same partner table, distinguished by their role ranks.

use serde::Serialize;

use super::{require_external_id, EntityMapper, GeoIndex, MappedRecord, MappingContext};
use crate::migration::MigrationError;
use crate::row::RawRow;
use crate::types::{DbId, ExternalId};

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const UNKNOWN_SUPPLIER: &str = "Unknown Supplier";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerRecord {
    pub external_id: ExternalId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    pub country_id: Option<DbId>,
    pub state_id: Option<DbId>,
    pub company_name: String,
    pub customer_rank: i32,
    pub supplier_rank: i32,
    pub is_company: bool,
    pub active: bool,
}

impl MappedRecord for PartnerRecord {
    fn external_id(&self) -> ExternalId {
        self.external_id
    }
}

/// Contact and address fields shared by both roles.
fn base_record(row: &RawRow, external_id: ExternalId, geo: &GeoIndex) -> PartnerRecord {
    let country_id = row.opt_text("country").and_then(|code| geo.country(&code));
    let state_id = match (row.opt_text("state"), country_id) {
        (Some(name), Some(country)) => geo.state(&name, country),
        _ => None,
    };

    PartnerRecord {
        external_id,
        name: String::new(),
        email: row.text("email"),
        phone: row.text("phone"),
        mobile: row.text("fax"),
        street: row.text("address"),
        city: row.text("city"),
        zip: row.text("zipcode"),
        country_id,
        state_id,
        company_name: row.text("company"),
        customer_rank: 0,
        supplier_rank: 0,
        is_company: false,
        active: row.is_active("status"),
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

pub struct CustomerMapper;

impl EntityMapper for CustomerMapper {
    type Record = PartnerRecord;
    const ID_COLUMN: &'static str = "user_id";

    fn map(row: &RawRow, ctx: &MappingContext<'_>) -> Result<PartnerRecord, MigrationError> {
        let external_id = require_external_id(row, Self::ID_COLUMN)?;
        let mut rec = base_record(row, external_id, ctx.geo);

        let full_name = format!("{} {}", row.text("firstname"), row.text("lastname"))
            .trim()
            .to_string();
        rec.name = row
            .opt_text("company")
            .or_else(|| (!full_name.is_empty()).then_some(full_name))
            .or_else(|| row.opt_text("email"))
            .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());

        rec.customer_rank = 1;
        rec.supplier_rank = 0;
        rec.is_company = !rec.company_name.is_empty();
        Ok(rec)
    }
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

pub struct SupplierMapper;

impl EntityMapper for SupplierMapper {
    type Record = PartnerRecord;
    const ID_COLUMN: &'static str = "user_id";

    fn map(row: &RawRow, ctx: &MappingContext<'_>) -> Result<PartnerRecord, MigrationError> {
        let external_id = require_external_id(row, Self::ID_COLUMN)?;
        let mut rec = base_record(row, external_id, ctx.geo);

        rec.name = row
            .opt_text("vendor_name")
            .or_else(|| row.opt_text("company"))
            .unwrap_or_else(|| UNKNOWN_SUPPLIER.to_string());
        rec.customer_rank = 0;
        rec.supplier_rank = 1;
        rec.is_company = true;
        Ok(rec)
    }
}
