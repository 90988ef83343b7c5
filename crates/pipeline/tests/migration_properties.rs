//! Properties every migration must hold, checked against the in-memory
//! store and source.

mod common;

use std::collections::BTreeSet;

use cartshift_core::migration::{EntityType, RunStatus, SessionState};
use cartshift_core::row::{RawRow, SourceValue};
use cartshift_core::schema_version::SchemaVersion;
use cartshift_pipeline::run_session;
use common::{category, customer, plan, product, supplier, MemorySource, MemoryStore};

const ALL_BUT_SUPPLIERS: [EntityType; 3] =
    [EntityType::Category, EntityType::Product, EntityType::Customer];

fn shop_source() -> MemorySource {
    MemorySource::new(SchemaVersion::V4_0)
        .with_rows(
            EntityType::Category,
            vec![category(1, 0, "Shoes"), category(2, 1, "Boots")],
        )
        .with_rows(
            EntityType::Product,
            vec![product(10, 1, "Sneaker"), product(11, 2, "Chelsea")],
        )
        .with_rows(
            EntityType::Customer,
            vec![customer(100, "Ada", "Lovelace"), customer(101, "Alan", "Turing")],
        )
}

// ---------------------------------------------------------------------------
// Test: idempotence without updates
// ---------------------------------------------------------------------------

/// A second pass with `update_existing = false` writes nothing and leaves
/// the same external id set behind.
#[tokio::test]
async fn repeated_run_without_update_is_a_no_op() {
    let store = MemoryStore::with_geo(common::geo());
    let source = shop_source();
    let plan = plan(&ALL_BUT_SUPPLIERS, 100, false);

    run_session(&store, &source, &plan).await.unwrap();
    let writes_after_first = store.writes();
    let first_ids: BTreeSet<_> = store.products().iter().map(|(_, p)| p.external_id).collect();
    let first_categories = store.categories().len();

    let outcome = run_session(&store, &source, &plan).await.unwrap();

    assert_eq!(outcome.state, SessionState::Completed);
    assert_eq!(store.writes(), writes_after_first);
    assert_eq!(store.categories().len(), first_categories);
    let second_ids: BTreeSet<_> = store.products().iter().map(|(_, p)| p.external_id).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(store.partners().len(), 2);
}

/// With `update_existing = true` every pass writes, and the store converges
/// to the latest mapped values without duplicating records.
#[tokio::test]
async fn repeated_run_with_update_replaces_values() {
    let store = MemoryStore::new();
    let plan = plan(&[EntityType::Category], 100, true);

    let first = MemorySource::new(SchemaVersion::V4_0)
        .with_rows(EntityType::Category, vec![category(1, 0, "Shoes")]);
    run_session(&store, &first, &plan).await.unwrap();

    let second = MemorySource::new(SchemaVersion::V4_0)
        .with_rows(EntityType::Category, vec![category(1, 0, "Footwear")]);
    run_session(&store, &second, &plan).await.unwrap();

    assert_eq!(store.categories().len(), 1);
    assert_eq!(store.category(1).unwrap().name, "Footwear");
    assert_eq!(store.writes(), 2);
}

// ---------------------------------------------------------------------------
// Test: counter invariant and status derivation
// ---------------------------------------------------------------------------

/// Bad rows are counted, logged with their id and never stop the loop.
#[tokio::test]
async fn record_errors_make_a_partial_run() {
    let store = MemoryStore::new();
    let rows = vec![
        product(1, 0, "Fine"),
        product(2, 0, "Broken price").with("price", "n/a"),
        RawRow::new().with("product", "No id"),
        product(4, 0, "Also fine"),
    ];
    let source = MemorySource::new(SchemaVersion::V4_0).with_rows(EntityType::Product, rows);

    let outcome = run_session(&store, &source, &plan(&[EntityType::Product], 100, true))
        .await
        .unwrap();

    assert_eq!(outcome.state, SessionState::Completed);
    let run = store.run(EntityType::Product).unwrap();
    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.counters.total, 4);
    assert_eq!(run.counters.successful, 2);
    assert_eq!(run.counters.failed, 2);
    assert!(run.counters.is_balanced());

    let log = run.error_log.unwrap();
    assert!(log.contains("Record ID: 2\nError:"));
    assert!(log.contains("Record ID: unknown\nError:"));
    assert_eq!(run.details.as_deref(), Some("Successfully migrated 2 products"));
    assert_eq!(store.imported(EntityType::Product), 2);
}

/// A run where every row fails without a phase-fatal error is partial.
#[tokio::test]
async fn all_rows_failing_is_partial_not_failed() {
    let store = MemoryStore::new();
    let rows = vec![RawRow::new().with("product", "x"), RawRow::new().with("product", "y")];
    let source = MemorySource::new(SchemaVersion::V4_0).with_rows(EntityType::Product, rows);

    run_session(&store, &source, &plan(&[EntityType::Product], 100, true))
        .await
        .unwrap();

    let run = store.run(EntityType::Product).unwrap();
    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!((run.counters.successful, run.counters.failed), (0, 2));
}

/// No failed rows means completed, an empty row set included.
#[tokio::test]
async fn clean_and_empty_runs_complete() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_0)
        .with_rows(EntityType::Category, vec![category(1, 0, "Shoes")]);

    run_session(
        &store,
        &source,
        &plan(&[EntityType::Category, EntityType::Product], 100, true),
    )
    .await
    .unwrap();

    let categories = store.run(EntityType::Category).unwrap();
    assert_eq!(categories.status, RunStatus::Completed);
    assert!(categories.counters.is_balanced());

    let products = store.run(EntityType::Product).unwrap();
    assert_eq!(products.status, RunStatus::Completed);
    assert_eq!(products.counters.total, 0);
}

/// A failed extraction is phase-fatal: the run fails with the cause.
#[tokio::test]
async fn extraction_failure_fails_the_run() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_0).breaking(EntityType::Category);

    let outcome = run_session(&store, &source, &plan(&[EntityType::Category], 100, true))
        .await
        .unwrap();

    assert_eq!(outcome.state, SessionState::Failed);
    let run = store.run(EntityType::Category).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error_log.unwrap().starts_with("Unexpected error:"));
    assert_eq!(run.details, None);
}

// ---------------------------------------------------------------------------
// Test: batch-size independence
// ---------------------------------------------------------------------------

/// Checkpoint cadence changes how often counters are saved, never the
/// final counts.
#[tokio::test]
async fn batch_size_does_not_change_final_counts() {
    let mut rows: Vec<RawRow> = (1..=250).map(|i| product(i, 0, "Item")).collect();
    rows[17] = rows[17].clone().with("price", "bad");
    rows[201] = rows[201].clone().with("weight", "bad");

    let mut finals = Vec::new();
    let mut checkpoints = Vec::new();
    for batch_size in [1, 100, 1000] {
        let store = MemoryStore::new();
        let source =
            MemorySource::new(SchemaVersion::V4_0).with_rows(EntityType::Product, rows.clone());
        run_session(&store, &source, &plan(&[EntityType::Product], batch_size, true))
            .await
            .unwrap();
        let run = store.run(EntityType::Product).unwrap();
        finals.push((run.status, run.counters));
        checkpoints.push(run.checkpoints);
    }

    assert!(finals.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(finals[0].1.total, 250);
    assert_eq!(finals[0].1.failed, 2);
    // One checkpoint with the extracted total, then one per full batch.
    assert_eq!(checkpoints, vec![251, 3, 1]);
}

// ---------------------------------------------------------------------------
// Test: order-dependent tree resolution
// ---------------------------------------------------------------------------

/// Parents seen before their children link up into a chain.
#[tokio::test]
async fn parents_first_builds_the_whole_chain() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_0).with_rows(
        EntityType::Category,
        vec![category(1, 0, "A"), category(2, 1, "B"), category(3, 2, "C")],
    );

    run_session(&store, &source, &plan(&[EntityType::Category], 100, true))
        .await
        .unwrap();

    let a = store.category_id(1).unwrap();
    let b = store.category_id(2).unwrap();
    assert_eq!(store.category(1).unwrap().parent_id, None);
    assert_eq!(store.category(2).unwrap().parent_id, Some(a));
    assert_eq!(store.category(3).unwrap().parent_id, Some(b));
}

/// Children seen before their parents keep a null parent.
#[tokio::test]
async fn children_first_leaves_early_parents_unresolved() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_0).with_rows(
        EntityType::Category,
        vec![category(3, 2, "C"), category(2, 1, "B"), category(1, 0, "A")],
    );

    run_session(&store, &source, &plan(&[EntityType::Category], 100, true))
        .await
        .unwrap();

    let c = store.category(3).unwrap();
    assert_eq!(c.parent_external_id, Some(2));
    assert_eq!(c.parent_id, None);
    assert_eq!(store.category(2).unwrap().parent_id, None);
    assert_eq!(store.run(EntityType::Category).unwrap().status, RunStatus::Completed);
}

// ---------------------------------------------------------------------------
// Test: version gating
// ---------------------------------------------------------------------------

/// Suppliers on a single-vendor schema are skipped: no run, no error.
#[tokio::test]
async fn suppliers_are_skipped_without_multi_vendor() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_10)
        .with_rows(EntityType::Supplier, vec![supplier(5, "Vendor Ltd")]);

    let outcome = run_session(
        &store,
        &source,
        &plan(&[EntityType::Category, EntityType::Supplier], 100, true),
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, SessionState::Completed);
    assert_eq!(outcome.skipped, vec![EntityType::Supplier]);
    assert!(store.run(EntityType::Supplier).is_none());
    assert_eq!(store.imported(EntityType::Supplier), 0);
    assert!(store.partners().is_empty());
    assert!(store
        .session_log()
        .contains("Skipped suppliers: schema version 4.10 has no multi-vendor tables"));
    // The skipped phase is not part of the progress denominator.
    assert_eq!(store.progress_history(), vec![0.0, 100.0]);
}

/// On the multi-vendor schema suppliers land as organisations.
#[tokio::test]
async fn suppliers_run_on_multi_vendor() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::Mve)
        .with_rows(EntityType::Supplier, vec![supplier(5, "Vendor Ltd")]);

    run_session(&store, &source, &plan(&[EntityType::Supplier], 100, true))
        .await
        .unwrap();

    let partners = store.partners();
    assert_eq!(partners.len(), 1);
    let (_, vendor) = &partners[0];
    assert_eq!(vendor.name, "Vendor Ltd");
    assert_eq!((vendor.customer_rank, vendor.supplier_rank), (0, 1));
    assert!(vendor.is_company);
    assert_eq!(store.imported(EntityType::Supplier), 1);
    assert!(store.session_log().contains("- Suppliers: 1\n"));
}

// ---------------------------------------------------------------------------
// Test: catch-all scenario
// ---------------------------------------------------------------------------

/// Three products, one with an unknown category: all succeed, the unknown
/// one lands in the catch-all category.
#[tokio::test]
async fn unmapped_category_product_goes_to_catch_all() {
    let store = MemoryStore::new();
    let source = MemorySource::new(SchemaVersion::V4_0)
        .with_rows(
            EntityType::Category,
            vec![category(1, 0, "Shoes"), category(2, 0, "Hats")],
        )
        .with_rows(
            EntityType::Product,
            vec![
                product(10, 1, "Sneaker"),
                product(11, 2, "Fedora"),
                product(12, 99, "Mystery"),
            ],
        );

    run_session(
        &store,
        &source,
        &plan(&[EntityType::Category, EntityType::Product], 100, true),
    )
    .await
    .unwrap();

    let run = store.run(EntityType::Product).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.counters.successful, 3);

    let products = store.products();
    let category_of = |ext: i64| {
        products
            .iter()
            .find(|(_, p)| p.external_id == ext)
            .map(|(_, p)| p.category_id)
            .unwrap()
    };
    assert_eq!(category_of(10), store.category_id(1).unwrap());
    assert_eq!(category_of(11), store.category_id(2).unwrap());
    assert_eq!(category_of(12), store.catch_all().unwrap());
}

/// Categories migrated by an earlier session still resolve for products.
#[tokio::test]
async fn products_resolve_categories_from_earlier_sessions() {
    let store = MemoryStore::new();
    let categories = MemorySource::new(SchemaVersion::V4_0)
        .with_rows(EntityType::Category, vec![category(1, 0, "Shoes")]);
    run_session(&store, &categories, &plan(&[EntityType::Category], 100, true))
        .await
        .unwrap();

    let products = MemorySource::new(SchemaVersion::V4_0).with_rows(
        EntityType::Product,
        vec![product(10, 1, "Sneaker").with("category_id", SourceValue::Int(1))],
    );
    run_session(&store, &products, &plan(&[EntityType::Product], 100, true))
        .await
        .unwrap();

    assert_eq!(store.products()[0].1.category_id, store.category_id(1).unwrap());
}
