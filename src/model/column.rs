//! Output column descriptors produced by introspection.

use serde::{Deserialize, Serialize};

/// One output column of a described query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name; never empty.
    pub name: String,
    /// 1-based position in the SELECT list.
    pub ordinal: usize,
    /// True when the engine reported no name and `COL_<ordinal>` was used.
    #[serde(default)]
    pub synthetic: bool,
}

impl ColumnDescriptor {
    /// Build a descriptor, substituting `COL_<ordinal>` for a missing or blank name.
    pub fn new(name: Option<&str>, ordinal: usize) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(_) => Self {
                // Keep the engine's spelling; only blank names are replaced.
                name: name.unwrap_or_default().to_string(),
                ordinal,
                synthetic: false,
            },
            None => Self {
                name: synthetic_name(ordinal),
                ordinal,
                synthetic: true,
            },
        }
    }

    pub fn named(name: impl Into<String>, ordinal: usize) -> Self {
        let name = name.into();
        Self::new(Some(name.as_str()), ordinal)
    }
}

/// Synthetic name for an unnamed column.
pub fn synthetic_name(ordinal: usize) -> String {
    format!("COL_{}", ordinal)
}
