//! Typed query parameters and their SQL literal rendering.
//!
//! A parameter arrives from the outside world as a [`RawParameter`]: three
//! optional slots of which at most one may be populated. Converting it into a
//! [`ParameterValue`] enforces that invariant once, so everything downstream
//! works with a value that cannot be ambiguous.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sql::dialect::{Dialect, JsonDialect};

/// Canonical timestamp layout handed to the dialect's date constructor.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while building parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("Invalid parameter at position {position}: {populated} values populated, at most one allowed")]
    InvalidParameter { position: usize, populated: usize },

    #[error("Malformed parameter '{0}': expected number:<n>, text:<s>, date:<YYYY-MM-DD[ HH:MM:SS]> or null")]
    Malformed(String),
}

pub type ParameterResult<T> = Result<T, ParameterError>;

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterValue {
    Number(Decimal),
    Text(String),
    Date(NaiveDateTime),
    /// No variant populated; substitutes as SQL `NULL`.
    Null,
}

impl ParameterValue {
    pub fn number(n: impl Into<Decimal>) -> Self {
        ParameterValue::Number(n.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        ParameterValue::Text(s.into())
    }

    pub fn date(d: NaiveDateTime) -> Self {
        ParameterValue::Date(d)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }
}

/// Render a parameter as a SQL literal for the given dialect.
///
/// Text is always quoted with embedded quotes doubled, so a parameter can
/// never terminate its own literal.
pub fn render_literal(value: &ParameterValue, dialect: Dialect) -> String {
    match value {
        ParameterValue::Number(n) => n.normalize().to_string(),
        ParameterValue::Text(s) => dialect.quote_string(s),
        ParameterValue::Date(d) => {
            dialect.format_timestamp_literal(&d.format(TIMESTAMP_LAYOUT).to_string())
        }
        ParameterValue::Null => dialect.format_null().to_string(),
    }
}

impl FromStr for ParameterValue {
    type Err = ParameterError;

    /// Parse `number:<n>`, `text:<s>`, `date:<d>` or `null`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("null") {
            return Ok(ParameterValue::Null);
        }

        let malformed = || ParameterError::Malformed(s.to_string());
        let (kind, value) = s.split_once(':').ok_or_else(malformed)?;

        match kind.to_lowercase().as_str() {
            "number" | "n" => Decimal::from_str(value.trim())
                .or_else(|_| Decimal::from_scientific(value.trim()))
                .map(ParameterValue::Number)
                .map_err(|_| malformed()),
            "text" | "t" => Ok(ParameterValue::Text(value.to_string())),
            "date" | "d" => parse_timestamp(value.trim())
                .map(ParameterValue::Date)
                .ok_or_else(malformed),
            _ => Err(malformed()),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: [&str; 3] = [TIMESTAMP_LAYOUT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(n) => write!(f, "number:{}", n.normalize()),
            ParameterValue::Text(s) => write!(f, "text:{}", s),
            ParameterValue::Date(d) => write!(f, "date:{}", d.format(TIMESTAMP_LAYOUT)),
            ParameterValue::Null => write!(f, "null"),
        }
    }
}

/// Wire form of a parameter: one optional slot per variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParameter {
    #[serde(default)]
    pub number: Option<Decimal>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
}

impl RawParameter {
    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        [
            self.number.is_some(),
            self.text.is_some(),
            self.date.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count()
    }

    /// Convert into a typed value; `position` is 1-based and only used for
    /// error reporting.
    pub fn into_value(self, position: usize) -> ParameterResult<ParameterValue> {
        let populated = self.populated();
        if populated > 1 {
            return Err(ParameterError::InvalidParameter {
                position,
                populated,
            });
        }

        Ok(match self {
            RawParameter {
                number: Some(n), ..
            } => ParameterValue::Number(n),
            RawParameter { text: Some(s), .. } => ParameterValue::Text(s),
            RawParameter { date: Some(d), .. } => ParameterValue::Date(d),
            _ => ParameterValue::Null,
        })
    }
}

/// Ordered parameters; insertion order is the 1-based placeholder index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    values: Vec<ParameterValue>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from wire-form slots, rejecting any slot with more than one value.
    pub fn from_raw<I>(raw: I) -> ParameterResult<Self>
    where
        I: IntoIterator<Item = RawParameter>,
    {
        raw.into_iter()
            .enumerate()
            .map(|(i, p)| p.into_value(i + 1))
            .collect::<ParameterResult<Vec<_>>>()
            .map(|values| Self { values })
    }

    pub fn push(&mut self, value: ParameterValue) -> &mut Self {
        self.values.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a parameter by its 1-based position.
    pub fn get(&self, position: usize) -> Option<&ParameterValue> {
        position
            .checked_sub(1)
            .and_then(|index| self.values.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterValue> {
        self.values.iter()
    }
}

impl From<Vec<ParameterValue>> for ParameterList {
    fn from(values: Vec<ParameterValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<ParameterValue> for ParameterList {
    fn from_iter<T: IntoIterator<Item = ParameterValue>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
