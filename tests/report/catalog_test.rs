//! Integration tests for the on-disk SQLite catalog.

use std::time::Duration;

use sqljson::catalog::{Catalog, CatalogError, SqliteCatalog};
use sqljson::model::{DataSource, DataSourceId, ReportDefinition, TemplateDefinition, TemplateId};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

fn template() -> TemplateDefinition {
    TemplateDefinition {
        id: TemplateId(11),
        output_type: "xlsx".into(),
        template_query_text: "SELECT body FROM templates WHERE id = 11".into(),
    }
}

fn report(ids: &[i64]) -> ReportDefinition {
    ReportDefinition {
        name: "monthly_sales".into(),
        template_id: TemplateId(11),
        datasource_ids: ids.iter().copied().map(DataSourceId).collect(),
    }
}

fn seeded(dir: &TempDir) -> SqliteCatalog {
    let catalog = SqliteCatalog::open(dir.path().join("catalog.db"), TIMEOUT).unwrap();
    catalog
        .register_datasource(&DataSource::new(2, "Sales", "SELECT * FROM sales"))
        .unwrap();
    catalog
        .register_datasource(&DataSource::new(1, "Staff", "SELECT * FROM emp"))
        .unwrap();
    catalog.register_template(&template()).unwrap();
    catalog.register_report(&report(&[2, 1])).unwrap();
    catalog
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_definitions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    drop(seeded(&dir));

    let catalog = SqliteCatalog::open(dir.path().join("catalog.db"), TIMEOUT).unwrap();
    let report = catalog.lookup_report("monthly_sales").unwrap();
    assert_eq!(report.template_id, TemplateId(11));
    assert_eq!(report.datasource_ids, vec![DataSourceId(1), DataSourceId(2)]);

    assert_eq!(catalog.lookup_template(TemplateId(11)).unwrap(), template());
}

#[test]
fn test_lookup_returns_sources_ordered_by_id() {
    let dir = TempDir::new().unwrap();
    let catalog = seeded(&dir);

    let sources = catalog
        .lookup_datasources(&[DataSourceId(2), DataSourceId(1)])
        .unwrap();
    assert_eq!(
        sources,
        vec![
            DataSource::new(1, "Staff", "SELECT * FROM emp"),
            DataSource::new(2, "Sales", "SELECT * FROM sales"),
        ]
    );
}

#[test]
fn test_reregistering_replaces_links() {
    let dir = TempDir::new().unwrap();
    let catalog = seeded(&dir);

    catalog.register_report(&report(&[2])).unwrap();
    let report = catalog.lookup_report("monthly_sales").unwrap();
    assert_eq!(report.datasource_ids, vec![DataSourceId(2)]);
}

#[test]
fn test_report_without_sources() {
    let dir = TempDir::new().unwrap();
    let catalog = seeded(&dir);

    catalog.register_report(&report(&[])).unwrap();
    assert!(catalog
        .lookup_report("monthly_sales")
        .unwrap()
        .datasource_ids
        .is_empty());
}

// ============================================================================
// Missing definitions
// ============================================================================

#[test]
fn test_unknown_report_and_template() {
    let dir = TempDir::new().unwrap();
    let catalog = seeded(&dir);

    let err = catalog.lookup_report("weekly").unwrap_err();
    assert_eq!(err.to_string(), "Unknown report: weekly");

    let err = catalog.lookup_template(TemplateId(99)).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownTemplate(TemplateId(99))));
}

#[test]
fn test_unknown_data_source_message() {
    let err = CatalogError::UnknownDataSource(vec![DataSourceId(4), DataSourceId(9)]);
    assert_eq!(err.to_string(), "Unknown data source(s): 4, 9");
}
