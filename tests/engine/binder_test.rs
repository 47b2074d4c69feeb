//! Integration tests for placeholder binding.
//!
//! Bound text is executed against an in-memory SQLite database where the
//! outcome depends on the literal actually reaching the engine.

use chrono::NaiveDate;
use rusqlite::Connection;
use sqljson::binder::{bind, has_placeholders, placeholder_indices};
use sqljson::model::{ParameterError, ParameterList, ParameterValue, RawParameter};
use sqljson::Dialect;

fn params(values: Vec<ParameterValue>) -> ParameterList {
    ParameterList::from(values)
}

fn emp_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "
        CREATE TABLE emp (id INTEGER, name TEXT, dept INTEGER, hired TEXT);
        INSERT INTO emp VALUES (1, 'King', 10, '2020-01-15 00:00:00');
        INSERT INTO emp VALUES (2, 'O''Brien', 20, '2021-06-01 09:30:00');
        INSERT INTO emp VALUES (3, 'Smith', 10, '2022-03-10 00:00:00');
        ",
    )
    .unwrap();
    conn
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

// ============================================================================
// Substitution
// ============================================================================

#[test]
fn test_every_resolvable_placeholder_is_replaced() {
    let sql = "SELECT id FROM emp WHERE dept = #P1# AND name <> #P2# OR id = #P1#";
    let bound = bind(
        sql,
        &params(vec![ParameterValue::number(10), ParameterValue::text("x")]),
        Dialect::Sqlite,
    );

    assert!(!has_placeholders(&bound));
    assert_eq!(
        bound,
        "SELECT id FROM emp WHERE dept = 10 AND name <> 'x' OR id = 10"
    );
}

#[test]
fn test_out_of_range_placeholder_passes_through() {
    let bound = bind(
        "SELECT #P1#, #P3#",
        &params(vec![ParameterValue::number(7)]),
        Dialect::Postgres,
    );
    assert_eq!(bound, "SELECT 7, #P3#");
    assert_eq!(placeholder_indices(&bound), vec![3]);
}

#[test]
fn test_no_parameters_is_a_no_op() {
    let sql = "SELECT #P1# FROM dual";
    assert_eq!(bind(sql, &ParameterList::new(), Dialect::Oracle), sql);
}

#[test]
fn test_binding_is_idempotent() {
    let values = params(vec![ParameterValue::number(1), ParameterValue::text("a")]);
    let once = bind("SELECT #P1#, #P2#", &values, Dialect::Oracle).into_owned();
    let twice = bind(&once, &values, Dialect::Oracle).into_owned();
    assert_eq!(once, twice);
}

#[test]
fn test_rendered_literal_is_not_rescanned() {
    let values = params(vec![ParameterValue::text("#P2#"), ParameterValue::number(2)]);
    let bound = bind("SELECT #P1#, #P2#", &values, Dialect::Oracle);
    assert_eq!(bound, "SELECT '#P2#', 2");
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_quoted_text_matches_exactly() {
    let conn = emp_db();
    let bound = bind(
        "SELECT count(*) FROM emp WHERE name = #P1#",
        &params(vec![ParameterValue::text("O'Brien")]),
        Dialect::Sqlite,
    );
    assert_eq!(count(&conn, &bound), 1);
}

#[test]
fn test_injection_attempt_stays_inside_literal() {
    let conn = emp_db();
    let bound = bind(
        "SELECT count(*) FROM emp WHERE name = #P1#",
        &params(vec![ParameterValue::text("x' OR '1'='1")]),
        Dialect::Sqlite,
    );
    assert_eq!(count(&conn, &bound), 0);
}

#[test]
fn test_number_and_date_parameters() {
    let conn = emp_db();
    let hired_after = NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bound = bind(
        "SELECT count(*) FROM emp WHERE dept = #P1# AND hired > #P2#",
        &params(vec![
            ParameterValue::number(10),
            ParameterValue::date(hired_after),
        ]),
        Dialect::Sqlite,
    );
    assert_eq!(count(&conn, &bound), 1);
}

#[test]
fn test_null_parameter_renders_sql_null() {
    let conn = emp_db();
    let bound = bind(
        "SELECT count(*) FROM emp WHERE #P1# IS NULL",
        &params(vec![ParameterValue::Null]),
        Dialect::Sqlite,
    );
    assert_eq!(bound, "SELECT count(*) FROM emp WHERE NULL IS NULL");
    assert_eq!(count(&conn, &bound), 3);
}

// ============================================================================
// Wire-form parameters
// ============================================================================

#[test]
fn test_raw_parameters_from_json() {
    let raw: Vec<RawParameter> =
        serde_json::from_str(r#"[{"number": "10"}, {"text": "IT"}, {}]"#).unwrap();
    let list = ParameterList::from_raw(raw).unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(list.get(2), Some(&ParameterValue::text("IT")));
    assert_eq!(list.get(3), Some(&ParameterValue::Null));
}

#[test]
fn test_raw_parameter_with_two_values_rejected() {
    let raw = vec![
        RawParameter::default(),
        RawParameter {
            number: Some(1.into()),
            text: Some("1".into()),
            date: None,
        },
    ];
    let err = ParameterList::from_raw(raw).unwrap_err();
    assert_eq!(
        err,
        ParameterError::InvalidParameter {
            position: 2,
            populated: 2
        }
    );
}
