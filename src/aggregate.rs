//! Multi-source aggregation.
//!
//! Each requested data source is rewritten into a JSON array query and
//! embedded under its lower-cased key in one composite statement:
//!
//! ```text
//! {"filename": "<marker>", "data": [{"<key_1>": [...], "<key_2>": [...]}]}
//! ```
//!
//! The catalog is consulted once per request. Every requested id must
//! resolve; a missing id fails the whole request rather than producing a
//! partial document. Two sources whose keys lower-case to the same text are
//! rejected, since one would silently shadow the other. An empty id list is not an error and yields
//! `"data": [{}]`.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::catalog::{Catalog, CatalogError};
use crate::model::{DataSource, DataSourceId, ParameterList};
use crate::rewrite::{JsonRewriter, RewriteResult};
use crate::sql::JsonDialect;

/// Default value of the envelope's `filename` field.
pub const DEFAULT_FILENAME_MARKER: &str = "report";

/// Composes per-source JSON queries into one document statement.
pub struct Aggregator<'a> {
    catalog: &'a dyn Catalog,
    rewriter: JsonRewriter<'a>,
    filename_marker: String,
}

impl<'a> Aggregator<'a> {
    pub fn new(catalog: &'a dyn Catalog, rewriter: JsonRewriter<'a>) -> Self {
        Self {
            catalog,
            rewriter,
            filename_marker: DEFAULT_FILENAME_MARKER.to_string(),
        }
    }

    pub fn with_filename_marker(mut self, marker: impl Into<String>) -> Self {
        self.filename_marker = marker.into();
        self
    }

    /// Build the composite statement for `filter_ids`.
    pub fn aggregate(
        &self,
        filter_ids: &[DataSourceId],
        params: &ParameterList,
    ) -> RewriteResult<String> {
        let sources = self.catalog.lookup_datasources(filter_ids)?;
        check_all_found(filter_ids, &sources)?;
        check_unique_keys(&sources)?;

        let fragments = sources
            .iter()
            .map(|source| self.fragment(source, params))
            .collect::<RewriteResult<Vec<_>>>()?;

        debug!(
            sources = fragments.len(),
            dialect = %self.rewriter.dialect(),
            "aggregated data sources"
        );
        Ok(self.envelope(&fragments))
    }

    /// One `'<key>' -> (<rewritten query>)` entry of the data object.
    pub fn fragment(&self, source: &DataSource, params: &ParameterList) -> RewriteResult<String> {
        let dialect = self.rewriter.dialect();
        let rewritten = self.rewriter.to_json_query(&source.raw_query, params)?;
        Ok(dialect.object_entry(&source.json_key(), &dialect.nested_json(&rewritten)))
    }

    /// Wrap fragments in the `filename`/`data` document.
    pub fn envelope(&self, fragments: &[String]) -> String {
        let dialect = self.rewriter.dialect();

        let data = dialect.array_of(&dialect.object(&fragments.join(", ")));
        let entries = [
            dialect.object_entry("filename", &dialect.quote_string(&self.filename_marker)),
            dialect.object_entry("data", &data),
        ]
        .join(", ");

        let select = format!("SELECT {}", dialect.object(&entries));
        match dialect.dual_table() {
            Some(dual) => format!("{} FROM {}", select, dual),
            None => select,
        }
    }
}

fn check_all_found(requested: &[DataSourceId], found: &[DataSource]) -> Result<(), CatalogError> {
    let found: BTreeSet<DataSourceId> = found.iter().map(|source| source.id).collect();
    let missing: BTreeSet<DataSourceId> = requested
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::UnknownDataSource(missing.into_iter().collect()))
    }
}

fn check_unique_keys(sources: &[DataSource]) -> Result<(), CatalogError> {
    let mut seen: HashMap<String, DataSourceId> = HashMap::new();
    for source in sources {
        if let Some(&first) = seen.get(&source.json_key()) {
            return Err(CatalogError::DuplicateKey {
                key: source.json_key(),
                first,
                second: source.id,
            });
        }
        seen.insert(source.json_key(), source.id);
    }
    Ok(())
}
