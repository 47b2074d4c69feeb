//! Integration tests for query introspection.
//!
//! Both introspectors are exercised with the same queries: the live SQLite
//! backend and the parser-only fallback.

use sqljson::backend::SqliteBackend;
use sqljson::introspect::{IntrospectError, ParsedIntrospector, SchemaIntrospector};
use sqljson::model::ColumnDescriptor;
use sqljson::Dialect;

fn backend() -> SqliteBackend {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .connection()
        .execute_batch(
            "
            CREATE TABLE emp (id INTEGER, name TEXT, dept INTEGER, salary REAL);
            INSERT INTO emp VALUES (1, 'King', 10, 5000);
            ",
        )
        .unwrap();
    backend
}

fn names(columns: &[ColumnDescriptor]) -> Vec<&str> {
    columns.iter().map(|c| c.name.as_str()).collect()
}

// ============================================================================
// Live backend
// ============================================================================

#[test]
fn test_live_columns_in_select_order() {
    let columns = backend()
        .describe("SELECT salary, id AS emp_id, name FROM emp")
        .unwrap();

    assert_eq!(names(&columns), vec!["salary", "emp_id", "name"]);
    let ordinals: Vec<usize> = columns.iter().map(|c| c.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
    assert!(columns.iter().all(|c| !c.synthetic));
}

#[test]
fn test_live_describe_with_empty_result() {
    let columns = backend()
        .describe("SELECT id, name FROM emp WHERE 1 = 0")
        .unwrap();
    assert_eq!(names(&columns), vec!["id", "name"]);
}

#[test]
fn test_live_unknown_column_is_parse_error() {
    let err = backend().describe("SELECT bogus FROM emp").unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {}", err);
}

#[test]
fn test_live_syntax_error_reports_position() {
    let err = backend()
        .describe("SELECT id\nFROM emp\nWHERE AND id = 1")
        .unwrap_err();

    match err {
        IntrospectError::QueryParse { position, .. } => {
            let position = position.expect("position recovered from engine message");
            assert_eq!(position.line, 3);
            assert_eq!(position.column, 7);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

// ============================================================================
// Parsed fallback
// ============================================================================

#[test]
fn test_parsed_unnamed_column_is_synthetic() {
    let introspector = ParsedIntrospector::new(Dialect::Sqlite);
    let columns = introspector
        .describe("SELECT dept, count(*) FROM emp GROUP BY dept")
        .unwrap();

    assert_eq!(names(&columns), vec!["dept", "COL_2"]);
    assert!(!columns[0].synthetic);
    assert!(columns[1].synthetic);
    assert_eq!(columns[1].ordinal, 2);
}

#[test]
fn test_parsed_matches_live_for_plain_columns() {
    let sql = "SELECT e.id, e.name AS who FROM emp e ORDER BY e.id";
    let live = backend().describe(sql).unwrap();
    let parsed = ParsedIntrospector::new(Dialect::Sqlite).describe(sql).unwrap();
    assert_eq!(live, parsed);
}

#[test]
fn test_parsed_rejects_malformed_sql() {
    let err = ParsedIntrospector::new(Dialect::Oracle)
        .describe("SELECT id FROM emp WHERE")
        .unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn test_introspectors_behind_trait_objects() {
    let live = backend();
    let parsed = ParsedIntrospector::new(Dialect::Sqlite);
    let introspectors: Vec<&dyn SchemaIntrospector> = vec![&live, &parsed];

    for introspector in introspectors {
        let columns = introspector.describe("SELECT 1 AS one").unwrap();
        assert_eq!(columns, vec![ColumnDescriptor::named("one", 1)]);
    }
}
