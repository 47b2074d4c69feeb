//! Integration tests for multi-source aggregation.
//!
//! Data sources live in an in-memory catalog; the composite statement is run
//! against a separate in-memory database holding the report data.

use serde_json::{json, Value};
use sqljson::backend::SqliteBackend;
use sqljson::catalog::{CatalogError, SqliteCatalog};
use sqljson::executor::QueryExecutor;
use sqljson::model::{DataSource, DataSourceId, ParameterList, ParameterValue};
use sqljson::rewrite::RewriteError;
use sqljson::{Aggregator, Dialect, JsonRewriter};

fn backend() -> SqliteBackend {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .connection()
        .execute_batch(
            "
            CREATE TABLE emp (id INTEGER, name TEXT, dept INTEGER);
            INSERT INTO emp VALUES (1, 'King', 10);
            INSERT INTO emp VALUES (2, 'Ward', 20);
            CREATE TABLE sales (region TEXT, amount INTEGER);
            INSERT INTO sales VALUES ('north', 100);
            INSERT INTO sales VALUES ('south', 250);
            ",
        )
        .unwrap();
    backend
}

fn catalog() -> SqliteCatalog {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    for source in [
        DataSource::new(1, "Staff", "SELECT name FROM emp WHERE dept = #P1# ORDER BY id"),
        DataSource::new(2, "Sales", "SELECT region, amount FROM sales ORDER BY region"),
        DataSource::new(3, "totals", "SELECT sum(amount) AS total FROM sales"),
        DataSource::new(4, "regions", "SELECT region FROM sales ORDER BY region -- for the map"),
        DataSource::new(7, "broken", "SELECT missing FROM nowhere"),
    ] {
        catalog.register_datasource(&source).unwrap();
    }
    catalog
}

fn ids(ids: &[i64]) -> Vec<DataSourceId> {
    ids.iter().copied().map(DataSourceId).collect()
}

fn dept(n: i64) -> ParameterList {
    ParameterList::from(vec![ParameterValue::number(n)])
}

// ============================================================================
// Composite documents
// ============================================================================

#[test]
fn test_composite_document_executes() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let composite = aggregator.aggregate(&ids(&[2, 1]), &dept(10)).unwrap();
    let document: Value = serde_json::from_str(&backend.fetch_json(&composite).unwrap()).unwrap();

    assert_eq!(
        document,
        json!({
            "filename": "report",
            "data": [{
                "staff": [{"name": "King"}],
                "sales": [
                    {"region": "north", "amount": 100},
                    {"region": "south", "amount": 250},
                ],
            }],
        })
    );
}

#[test]
fn test_keys_follow_id_order() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let composite = aggregator.aggregate(&ids(&[3, 2, 1]), &dept(20)).unwrap();
    let document = backend.fetch_json(&composite).unwrap();

    let staff = document.find(r#""staff""#).unwrap();
    let sales = document.find(r#""sales""#).unwrap();
    let totals = document.find(r#""totals""#).unwrap();
    assert!(staff < sales && sales < totals, "unexpected order: {}", document);
    assert!(document.contains(r#""totals":[{"total":350}]"#));
}

#[test]
fn test_filename_marker_is_configurable() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite))
        .with_filename_marker("monthly");

    let composite = aggregator.aggregate(&ids(&[3]), &ParameterList::new()).unwrap();
    assert_eq!(
        backend.fetch_json(&composite).unwrap(),
        r#"{"filename":"monthly","data":[{"totals":[{"total":350}]}]}"#
    );
}

#[test]
fn test_empty_filter_yields_empty_data_object() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let composite = aggregator.aggregate(&[], &ParameterList::new()).unwrap();
    assert_eq!(
        backend.fetch_json(&composite).unwrap(),
        r#"{"filename":"report","data":[{}]}"#
    );
}

#[test]
fn test_source_ending_in_comment_executes() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let composite = aggregator.aggregate(&ids(&[4]), &ParameterList::new()).unwrap();
    assert_eq!(
        backend.fetch_json(&composite).unwrap(),
        r#"{"filename":"report","data":[{"regions":[{"region":"north"},{"region":"south"}]}]}"#
    );
}

#[test]
fn test_fragments_joined_with_single_separators() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let fragments = vec!["F1".to_string(), "F2".to_string(), "F3".to_string()];
    assert_eq!(
        aggregator.envelope(&fragments),
        "SELECT json_object('filename', 'report', 'data', json_array(json_object(F1, F2, F3)))"
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unknown_ids_are_reported_sorted() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let err = aggregator
        .aggregate(&ids(&[9, 1, 4]), &ParameterList::new())
        .unwrap_err();
    match err {
        RewriteError::Catalog(CatalogError::UnknownDataSource(missing)) => {
            assert_eq!(missing, ids(&[4, 9]));
        }
        other => panic!("expected unknown data source, got {:?}", other),
    }
}

#[test]
fn test_one_invalid_source_fails_the_whole_document() {
    let backend = backend();
    let catalog = catalog();
    let aggregator = Aggregator::new(&catalog, JsonRewriter::new(&backend, Dialect::Sqlite));

    let err = aggregator
        .aggregate(&ids(&[1, 7]), &dept(10))
        .unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {}", err);
}
