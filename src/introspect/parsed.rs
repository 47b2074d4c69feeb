//! Offline introspection from query text.
//!
//! Column names come from the SELECT list of the leading query term:
//! aliases win, bare and qualified column references use their final
//! identifier folded the way the engine folds unquoted names, and any other
//! expression is unnamed. `*` cannot be expanded without a catalog and is
//! rejected.

use sqlparser::ast::{Expr, Ident, Query, SelectItem, SetExpr, Statement};
use sqlparser::parser::Parser;
use tracing::debug;

use super::{IntrospectError, IntrospectResult, SchemaIntrospector};
use crate::model::ColumnDescriptor;
use crate::sql::{Dialect, JsonDialect};

/// Introspector that parses query text instead of consulting an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedIntrospector {
    dialect: Dialect,
}

impl ParsedIntrospector {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn projection<'q>(&self, query: &'q Query) -> IntrospectResult<&'q [SelectItem]> {
        leading_projection(&query.body).ok_or_else(|| {
            IntrospectError::parse("query has no SELECT list to describe", None)
        })
    }

    fn item_name(&self, item: &SelectItem) -> IntrospectResult<Option<String>> {
        match item {
            SelectItem::ExprWithAlias { alias, .. } => Ok(Some(self.ident_name(alias))),
            SelectItem::UnnamedExpr(Expr::Identifier(ident)) => Ok(Some(self.ident_name(ident))),
            SelectItem::UnnamedExpr(Expr::CompoundIdentifier(parts)) => {
                Ok(parts.last().map(|ident| self.ident_name(ident)))
            }
            SelectItem::UnnamedExpr(_) => Ok(None),
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                Err(IntrospectError::parse(
                    "wildcard projection cannot be described without a database connection",
                    None,
                ))
            }
        }
    }

    fn ident_name(&self, ident: &Ident) -> String {
        match ident.quote_style {
            Some(_) => ident.value.clone(),
            None => self.dialect.fold_identifier(&ident.value),
        }
    }
}

fn leading_projection(body: &SetExpr) -> Option<&[SelectItem]> {
    match body {
        SetExpr::Select(select) => Some(&select.projection),
        SetExpr::Query(query) => leading_projection(&query.body),
        // UNION / INTERSECT / EXCEPT take their column names from the left term
        SetExpr::SetOperation { left, .. } => leading_projection(left),
        _ => None,
    }
}

impl SchemaIntrospector for ParsedIntrospector {
    fn describe(&self, sql: &str) -> IntrospectResult<Vec<ColumnDescriptor>> {
        let statements = Parser::parse_sql(&*self.dialect.parser_dialect(), sql)
            .map_err(IntrospectError::from_parser)?;

        let query = match statements.as_slice() {
            [Statement::Query(query)] => query,
            [_] => {
                return Err(IntrospectError::parse(
                    "statement is not a query",
                    None,
                ))
            }
            _ => {
                return Err(IntrospectError::parse(
                    format!("expected exactly one statement, found {}", statements.len()),
                    None,
                ))
            }
        };

        let columns = self
            .projection(query)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.item_name(item)
                    .map(|name| ColumnDescriptor::new(name.as_deref(), i + 1))
            })
            .collect::<IntrospectResult<Vec<_>>>()?;

        debug!(columns = columns.len(), dialect = %self.dialect, "described query offline");
        Ok(columns)
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(self.dialect)
    }
}
