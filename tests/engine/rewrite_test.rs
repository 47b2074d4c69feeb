//! Integration tests for the JSON rewriter.
//!
//! Rewritten SQLite statements are executed in memory and the returned
//! document is compared with the rows the original query produces.

use serde_json::{json, Value};
use sqljson::backend::SqliteBackend;
use sqljson::executor::QueryExecutor;
use sqljson::introspect::ParsedIntrospector;
use sqljson::model::{ParameterList, ParameterValue};
use sqljson::rewrite::RewriteError;
use sqljson::{Dialect, JsonRewriter};

fn backend() -> SqliteBackend {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .connection()
        .execute_batch(
            "
            CREATE TABLE emp (id INTEGER, name TEXT, dept INTEGER);
            INSERT INTO emp VALUES (1, 'King', 10);
            INSERT INTO emp VALUES (2, 'O''Brien', 20);
            INSERT INTO emp VALUES (3, 'Smith', 10);
            CREATE TABLE dept (id INTEGER, title TEXT);
            INSERT INTO dept VALUES (10, 'Accounting');
            ",
        )
        .unwrap();
    backend
}

fn run(backend: &SqliteBackend, sql: &str, params: &ParameterList) -> String {
    let rewritten = JsonRewriter::new(backend, Dialect::Sqlite)
        .to_json_query(sql, params)
        .unwrap();
    backend.fetch_json(&rewritten).unwrap()
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_single_row_single_column() {
    let backend = backend();
    let document = run(&backend, "SELECT 1 AS X", &ParameterList::new());
    assert_eq!(document, r#"[{"X":1}]"#);
}

#[test]
fn test_rows_and_keys_follow_query_order() {
    let backend = backend();
    let document = run(
        &backend,
        "SELECT id, name, dept FROM emp ORDER BY id",
        &ParameterList::new(),
    );

    assert!(document.starts_with(r#"[{"id":1,"name":"King","dept":10},"#));
    let rows: Value = serde_json::from_str(&document).unwrap();
    assert_eq!(
        rows,
        json!([
            {"id": 1, "name": "King", "dept": 10},
            {"id": 2, "name": "O'Brien", "dept": 20},
            {"id": 3, "name": "Smith", "dept": 10},
        ])
    );
}

#[test]
fn test_bound_parameters_filter_rows() {
    let backend = backend();
    let params = ParameterList::from(vec![ParameterValue::number(10)]);
    let document = run(
        &backend,
        "SELECT name FROM emp WHERE dept = #P1# ORDER BY id",
        &params,
    );
    assert_eq!(document, r#"[{"name":"King"},{"name":"Smith"}]"#);
}

#[test]
fn test_zero_rows_yield_empty_array() {
    let backend = backend();
    let document = run(&backend, "SELECT id FROM emp WHERE 1 = 0", &ParameterList::new());
    assert_eq!(document, "[]");
}

#[test]
fn test_trailing_terminator_is_tolerated() {
    let backend = backend();
    let document = run(&backend, "SELECT id FROM emp WHERE id = 2;\n", &ParameterList::new());
    assert_eq!(document, r#"[{"id":2}]"#);
}

#[test]
fn test_trailing_line_comment_is_tolerated() {
    let backend = backend();
    let document = run(
        &backend,
        "SELECT id FROM emp WHERE id = 2 -- single employee",
        &ParameterList::new(),
    );
    assert_eq!(document, r#"[{"id":2}]"#);
}

#[test]
fn test_quoted_alias_survives_as_key() {
    let backend = backend();
    let document = run(
        &backend,
        r#"SELECT name AS "Emp Name" FROM emp WHERE id = 1"#,
        &ParameterList::new(),
    );
    assert_eq!(document, r#"[{"Emp Name":"King"}]"#);
}

#[test]
fn test_unnamed_columns_execute_through_cte() {
    let backend = backend();
    let introspector = ParsedIntrospector::new(Dialect::Sqlite);
    let rewritten = JsonRewriter::new(&introspector, Dialect::Sqlite)
        .to_json_query(
            "SELECT dept, count(*) FROM emp GROUP BY dept",
            &ParameterList::new(),
        )
        .unwrap();
    assert!(rewritten.starts_with(r#"WITH t ("c1", "c2") AS ("#));

    let rows: Value = serde_json::from_str(&backend.fetch_json(&rewritten).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&json!({"dept": 10, "COL_2": 2})));
    assert!(rows.contains(&json!({"dept": 20, "COL_2": 1})));
}

#[test]
fn test_keys_differing_only_by_case_keep_their_values() {
    let backend = backend();
    let document = run(
        &backend,
        r#"SELECT e.name AS "Name", d.title AS "name" FROM emp e JOIN dept d ON d.id = e.dept WHERE e.id = 1"#,
        &ParameterList::new(),
    );
    assert_eq!(document, r#"[{"Name":"King","name":"Accounting"}]"#);
}

// ============================================================================
// Rejected queries
// ============================================================================

#[test]
fn test_join_with_repeated_column_name_is_rejected() {
    let backend = backend();
    let err = JsonRewriter::new(&backend, Dialect::Sqlite)
        .to_json_query(
            "SELECT e.id, d.id FROM emp e JOIN dept d ON d.id = e.dept",
            &ParameterList::new(),
        )
        .unwrap_err();
    match err {
        RewriteError::DuplicateColumn { name, first, second } => {
            assert_eq!(name, "id");
            assert_eq!((first, second), (1, 2));
        }
        other => panic!("expected duplicate column, got {:?}", other),
    }
}

#[test]
fn test_live_backend_rejects_foreign_dialect() {
    let backend = backend();
    let err = JsonRewriter::new(&backend, Dialect::default())
        .to_json_query("SELECT id FROM emp", &ParameterList::new())
        .unwrap_err();
    assert!(
        matches!(
            err,
            RewriteError::DialectMismatch {
                engine: Dialect::Sqlite,
                ..
            }
        ),
        "unexpected error: {}",
        err
    );
}

// ============================================================================
// Generated text
// ============================================================================

#[test]
fn test_oracle_rewrite_with_parameter() {
    let introspector = ParsedIntrospector::new(Dialect::Oracle);
    let params = ParameterList::from(vec![ParameterValue::number(10)]);
    let rewritten = JsonRewriter::new(&introspector, Dialect::Oracle)
        .to_json_query("SELECT ename FROM emp WHERE deptno = #P1#", &params)
        .unwrap();

    assert_eq!(
        rewritten,
        "SELECT COALESCE(JSON_ARRAYAGG(JSON_OBJECT(KEY 'ENAME' VALUE t.\"ENAME\" RETURNING CLOB) RETURNING CLOB), TO_CLOB('[]')) \
         FROM (SELECT ename FROM emp WHERE deptno = 10\n) t"
    );
}

#[test]
fn test_invalid_query_fails_with_parse_error() {
    let backend = backend();
    let err = JsonRewriter::new(&backend, Dialect::Sqlite)
        .to_json_query("SELECT nope FROM emp", &ParameterList::new())
        .unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {}", err);
}
