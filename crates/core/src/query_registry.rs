//! Extraction queries keyed by `(schema version, entity type)`.
//!
//! Lookup walks a fixed chain: the exact version, then the `4.0` baseline,
//! then an explicit [`MigrationError::QueryResolution`]. The SQL text is the
//! contract against the legacy table surface; placeholders use the MySQL
//! `?` form and at most one parameter (the language code) is ever bound.

use crate::migration::{EntityType, MigrationError};
use crate::schema_version::SchemaVersion;

/// A registered extraction query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySpec {
    pub sql: &'static str,
    /// The query joins per-language description tables and expects the
    /// language code as its single bound parameter.
    pub requires_language: bool,
    /// The version the query was registered under. Differs from the
    /// requested version when the baseline fallback was taken.
    pub registered_for: SchemaVersion,
}

impl QuerySpec {
    /// Whether the lookup fell back from `requested` to another version.
    pub fn is_fallback_for(&self, requested: SchemaVersion) -> bool {
        self.registered_for != requested
    }
}

// ---------------------------------------------------------------------------
// SQL templates
// ---------------------------------------------------------------------------

const CATEGORIES_INLINE: &str = "\
SELECT category_id, parent_id, category, description, position, status
FROM cscart_categories
WHERE status = 'A'
ORDER BY parent_id, position";

const CATEGORIES_DESCRIBED: &str = "\
SELECT c.category_id, c.parent_id, cd.category, cd.description, c.position, c.status
FROM cscart_categories c
LEFT JOIN cscart_category_descriptions cd
    ON c.category_id = cd.category_id AND cd.lang_code = ?
WHERE c.status = 'A'
ORDER BY c.parent_id, c.position";

const PRODUCTS_INLINE: &str = "\
SELECT p.product_id, p.product_code, p.product,
       p.full_description, p.short_description, p.status,
       p.list_price, p.price, p.amount, p.weight,
       p.length, p.width, p.height, p.timestamp,
       pc.category_id
FROM cscart_products p
LEFT JOIN cscart_products_categories pc ON p.product_id = pc.product_id
WHERE p.status = 'A'";

const PRODUCTS_DESCRIBED: &str = "\
SELECT p.product_id, p.product_code, pd.product,
       pd.full_description, pd.short_description, p.status,
       p.list_price, p.price, p.amount, p.weight,
       p.length, p.width, p.height, p.timestamp,
       pi.detailed_id AS image_id, pi.image_path,
       pc.category_id
FROM cscart_products p
LEFT JOIN cscart_product_descriptions pd
    ON p.product_id = pd.product_id AND pd.lang_code = ?
LEFT JOIN cscart_images pi
    ON p.product_id = pi.object_id AND pi.object_type = 'product'
LEFT JOIN cscart_products_categories pc
    ON p.product_id = pc.product_id AND pc.link_type = 'M'
WHERE p.status = 'A'";

const CUSTOMERS: &str = "\
SELECT u.user_id, u.email, u.firstname, u.lastname,
       u.phone, u.fax, u.company, u.address, u.city,
       u.state, u.country, u.zipcode, u.status,
       u.timestamp, u.user_type
FROM cscart_users u
WHERE u.user_type = 'C' AND u.status = 'A'
ORDER BY u.user_id";

const SUPPLIERS: &str = "\
SELECT u.user_id, u.email, u.firstname, u.lastname,
       u.phone, u.fax, u.company, u.address, u.city,
       u.state, u.country, u.zipcode, u.status,
       c.company AS vendor_name, c.status AS vendor_status
FROM cscart_users u
LEFT JOIN cscart_companies c ON u.company_id = c.company_id
WHERE u.user_type = 'V' AND u.status = 'A'";

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Exact registration for a pair, without fallback.
fn registered(version: SchemaVersion, entity_type: EntityType) -> Option<QuerySpec> {
    let (sql, requires_language) = match (entity_type, version) {
        (EntityType::Category, SchemaVersion::V4_0) => (CATEGORIES_INLINE, false),
        (EntityType::Product, SchemaVersion::V4_0) => (PRODUCTS_INLINE, false),
        (EntityType::Customer, SchemaVersion::V4_0) => (CUSTOMERS, false),
        (EntityType::Category, v) if v.uses_description_tables() => (CATEGORIES_DESCRIBED, true),
        (EntityType::Product, v) if v.uses_description_tables() => (PRODUCTS_DESCRIBED, true),
        (EntityType::Supplier, SchemaVersion::Mve) => (SUPPLIERS, false),
        _ => return None,
    };
    Some(QuerySpec {
        sql,
        requires_language,
        registered_for: version,
    })
}

/// Resolve the extraction query for a phase.
///
/// Failure is phase-fatal: no row of the phase can be read without a query.
pub fn resolve(
    version: SchemaVersion,
    entity_type: EntityType,
) -> Result<QuerySpec, MigrationError> {
    registered(version, entity_type)
        .or_else(|| registered(SchemaVersion::BASELINE, entity_type))
        .ok_or(MigrationError::QueryResolution {
            version,
            entity_type,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
