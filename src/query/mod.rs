//! # Filter Expression Builder
//!
//! [`Builder`] accumulates filters, sorts and a field projection and compiles
//! them into the remote service's textual filter grammar on demand:
//!
//! ```rust
//! use remote_model::query::Builder;
//!
//! let builder = Builder::new()
//!     .contains("@name", "Smith")
//!     .filter_group(|b| b.starts_with("@name", "Jane").or_starts_with("@name", "John"));
//!
//! assert_eq!(
//!     builder.to_filter_expression(),
//!     r#"contains(@name, "Smith") and (starts-with(@name, "Jane") or starts-with(@name, "John"))"#
//! );
//! ```
//!
//! Building never performs I/O. A builder obtained from a [`Record`] (for
//! example through [`Record::has_many`]) is bound to that record's type and can
//! also execute itself with [`Builder::find`].

pub mod value;

pub use value::FilterValue;

use crate::collection::KeyCollection;
use crate::error::{Error, Result};
use crate::record::{Attributes, Record};
use crate::service::FindRequest;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Page size used when none is given.
pub const DEFAULT_PER_PAGE: usize = 25;

/// Comparison operators and the two filter functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Contains,
    StartsWith,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts-with",
        }
    }

    /// Functions compile as `fn(field, value)` rather than `field op value`.
    pub fn is_function(self) -> bool {
        matches!(self, Operator::Contains | Operator::StartsWith)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::LtEq),
            ">=" => Ok(Operator::GtEq),
            "contains" => Ok(Operator::Contains),
            "starts-with" => Ok(Operator::StartsWith),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connective joining a filter to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Filter {
    Condition {
        field: String,
        operator: Operator,
        value: FilterValue,
        boolean: Boolean,
    },
    Nested {
        builder: Builder,
        boolean: Boolean,
    },
}

impl Filter {
    fn compile(&self) -> String {
        match self {
            Filter::Condition {
                field,
                operator,
                value,
                boolean,
            } if operator.is_function() => format!("{boolean} {operator}({field}, {value})"),
            Filter::Condition {
                field,
                operator,
                value,
                boolean,
            } => format!("{boolean} {field} {operator} {value}"),
            Filter::Nested { builder, boolean } => {
                format!("{boolean} ({})", builder.to_filter_expression())
            }
        }
    }
}

/// One sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    #[serde(rename = "xpath")]
    pub field: String,
    pub descending: bool,
}

/// Ordered sorts in the envelope the service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortDirective {
    #[serde(rename = "XPathDataSort")]
    pub sorts: Vec<Sort>,
}

/// A named field path to load with find results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "xpath")]
    pub path: String,
}

/// Input to [`Builder::load`]: a bare path (`@description`, named `description`)
/// or an explicit `(name, path)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    name: String,
    path: String,
}

impl From<&str> for Projection {
    fn from(path: &str) -> Self {
        Self {
            name: path.trim_start_matches('@').to_string(),
            path: path.to_string(),
        }
    }
}

impl From<String> for Projection {
    fn from(path: String) -> Self {
        Projection::from(path.as_str())
    }
}

impl From<(&str, &str)> for Projection {
    fn from((name, path): (&str, &str)) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Fluent filter/sort/projection builder.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    record: Option<Record>,
    filters: Vec<Filter>,
    sorts: Vec<Sort>,
    fields: Vec<FieldDescriptor>,
    offset: usize,
    limit: Option<usize>,
}

impl Builder {
    /// A builder that only compiles expressions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that can execute against `record`'s type.
    pub fn bound(record: Record) -> Self {
        Self {
            record: Some(record),
            ..Self::default()
        }
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Add a filter with an explicit operator and connective.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
        boolean: Boolean,
    ) -> Self {
        self.filters.push(Filter::Condition {
            field: field.into(),
            operator,
            value: value.into(),
            boolean,
        });
        self
    }

    /// `field = value`.
    pub fn filter(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::Eq, value, Boolean::And)
    }

    /// `or field = value`.
    pub fn or_filter(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::Eq, value, Boolean::Or)
    }

    /// Add a filter using an operator token; unknown tokens fail immediately.
    pub fn filter_op(
        self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let operator = operator.parse()?;
        Ok(self.condition(field, operator, value, Boolean::And))
    }

    pub fn or_filter_op(
        self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let operator = operator.parse()?;
        Ok(self.condition(field, operator, value, Boolean::Or))
    }

    /// Add a parenthesised group built by `callback`.
    ///
    /// `boolean` joins the group to the preceding filters; the group's own
    /// first connective is dropped like any other leading connective.
    pub fn nested<F>(mut self, callback: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        let builder = callback(Builder::new());
        self.filters.push(Filter::Nested { builder, boolean });
        self
    }

    pub fn filter_group<F>(self, callback: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.nested(callback, Boolean::And)
    }

    pub fn or_filter_group<F>(self, callback: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.nested(callback, Boolean::Or)
    }

    pub fn contains(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::Contains, value, Boolean::And)
    }

    pub fn or_contains(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::Contains, value, Boolean::Or)
    }

    pub fn starts_with(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::StartsWith, value, Boolean::And)
    }

    pub fn or_starts_with(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(field, Operator::StartsWith, value, Boolean::Or)
    }

    /// `(field = v1 or field = v2 ...)` joined with `boolean`.
    pub fn filter_in_with<I, V>(self, field: impl Into<String>, values: I, boolean: Boolean) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let field = field.into();
        self.nested(
            |group| {
                values.into_iter().fold(group, |group, value| {
                    group.condition(field.clone(), Operator::Eq, value, Boolean::Or)
                })
            },
            boolean,
        )
    }

    pub fn filter_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        self.filter_in_with(field, values, Boolean::And)
    }

    pub fn or_filter_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        self.filter_in_with(field, values, Boolean::Or)
    }

    /// Append a sort; sorts apply in the order they were added.
    pub fn sort(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            descending,
        });
        self
    }

    /// Request partial loading of the given fields.
    ///
    /// Loading a name twice replaces its path but keeps its original position.
    pub fn load<I, P>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        for projection in fields {
            let Projection { name, path } = projection.into();
            match self.fields.iter_mut().find(|field| field.name == name) {
                Some(existing) => existing.path = path,
                None => self.fields.push(FieldDescriptor { name, path }),
            }
        }
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 1-based pagination; pages below 1 are treated as page 1.
    pub fn paginate(self, page: usize, per_page: usize) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.offset(offset).limit(per_page)
    }

    /// Compile the filters into the service's filter grammar.
    pub fn to_filter_expression(&self) -> String {
        let compiled = self
            .filters
            .iter()
            .map(Filter::compile)
            .collect::<Vec<_>>()
            .join(" ");

        strip_leading_boolean(&compiled).to_string()
    }

    pub fn to_sort_directive(&self) -> Option<SortDirective> {
        if self.sorts.is_empty() {
            return None;
        }
        Some(SortDirective {
            sorts: self.sorts.clone(),
        })
    }

    pub fn to_field_projection(&self) -> Vec<FieldDescriptor> {
        self.fields.clone()
    }

    /// The offset, unless it was never moved from zero.
    pub fn get_offset(&self) -> Option<usize> {
        (self.offset > 0).then_some(self.offset)
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Everything `find` sends to the service.
    pub fn to_find_request(&self) -> FindRequest {
        FindRequest {
            filter: self.to_filter_expression(),
            sort: self.to_sort_directive(),
            offset: self.get_offset(),
            limit: self.limit,
            fields: self.to_field_projection(),
        }
    }

    /// Execute the query, returning the matching keys.
    pub async fn find(&self) -> Result<KeyCollection> {
        let record = self.record.as_ref().ok_or(Error::Detached)?;
        let request = self.to_find_request();
        debug!(type_name = %record.type_name(), filter = %request.filter, "Executing builder");
        record.find_with(request).await
    }

    /// Alias for [`Builder::find`].
    pub async fn get(&self) -> Result<KeyCollection> {
        self.find().await
    }

    pub async fn first(&self) -> Result<Option<Record>> {
        self.find().await?.first().await
    }

    pub async fn first_or_fail(&self) -> Result<Record> {
        match self.first().await? {
            Some(record) => Ok(record),
            None => Err(Error::NoResults {
                type_name: self.record.as_ref().map(|r| r.type_name().to_string()).unwrap_or_default(),
            }),
        }
    }

    /// The first match, or an unsaved instance of the bound type.
    pub async fn first_or_new(&self) -> Result<Record> {
        let record = self.record.as_ref().ok_or(Error::Detached)?;
        match self.first().await? {
            Some(found) => Ok(found),
            None => Ok(record.new_instance(Attributes::new())),
        }
    }
}

/// The first filter has no left operand, so its connective is dropped.
fn strip_leading_boolean(expression: &str) -> &str {
    expression
        .strip_prefix("and ")
        .or_else(|| expression.strip_prefix("or "))
        .unwrap_or(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_simple_filters() {
        assert_eq!(Builder::new().filter("@id", 99).to_filter_expression(), "@id = 99");
        assert_eq!(
            Builder::new().filter("@active", true).to_filter_expression(),
            "@active = 'true'"
        );
        assert_eq!(
            Builder::new().filter("@job", "99999").to_filter_expression(),
            "@job = \"99999\""
        );
    }

    #[test]
    fn test_date_filter() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_eq!(
            Builder::new().filter_op("@orderDate", ">=", date).unwrap().to_filter_expression(),
            "@orderDate >= date(2016, 2, 1)"
        );
    }

    #[test]
    fn test_operators() {
        let builder = Builder::new()
            .filter_op("@total", ">", 100)
            .unwrap()
            .or_filter_op("@total", "<=", 5)
            .unwrap()
            .filter_op("@status", "!=", "C")
            .unwrap();
        assert_eq!(
            builder.to_filter_expression(),
            "@total > 100 or @total <= 5 and @status != \"C\""
        );
    }

    #[test]
    fn test_unsupported_operator_fails_eagerly() {
        let result = Builder::new().filter_op("@total", "<>", 5);
        assert!(matches!(result, Err(Error::UnsupportedOperator(op)) if op == "<>"));
    }

    #[test]
    fn test_function_filters() {
        let builder = Builder::new()
            .contains("@description", "Widget")
            .or_starts_with("@job", "123");
        assert_eq!(
            builder.to_filter_expression(),
            "contains(@description, \"Widget\") or starts-with(@job, \"123\")"
        );

        let builder = Builder::new().filter_op("@name", "contains", "Smith").unwrap();
        assert_eq!(builder.to_filter_expression(), "contains(@name, \"Smith\")");
    }

    #[test]
    fn test_nested_filter() {
        let builder = Builder::new()
            .contains("@name", "Smith")
            .filter_group(|b| b.starts_with("@name", "Jane").or_starts_with("@name", "John"));
        assert_eq!(
            builder.to_filter_expression(),
            r#"contains(@name, "Smith") and (starts-with(@name, "Jane") or starts-with(@name, "John"))"#
        );
    }

    #[test]
    fn test_or_nested_filter() {
        let builder = Builder::new()
            .filter("@active", true)
            .or_filter_group(|b| b.filter("@id", 1).filter("@id", 2));
        assert_eq!(
            builder.to_filter_expression(),
            "@active = 'true' or (@id = 1 and @id = 2)"
        );
    }

    #[test]
    fn test_in_filter() {
        let builder = Builder::new().filter_in("@id", [1, 2, 5, 10]);
        assert_eq!(
            builder.to_filter_expression(),
            "(@id = 1 or @id = 2 or @id = 5 or @id = 10)"
        );

        let builder = Builder::new()
            .filter("@active", true)
            .or_filter_in("@job", ["1", "2"]);
        assert_eq!(
            builder.to_filter_expression(),
            "@active = 'true' or (@job = \"1\" or @job = \"2\")"
        );
    }

    #[test]
    fn test_sorts_accumulate_in_order() {
        assert_eq!(Builder::new().to_sort_directive(), None);

        let directive = Builder::new()
            .sort("@customer", false)
            .sort("@dateSetup", true)
            .to_sort_directive()
            .unwrap();
        assert_eq!(
            directive.sorts,
            vec![
                Sort { field: "@customer".to_string(), descending: false },
                Sort { field: "@dateSetup".to_string(), descending: true },
            ]
        );
        assert_eq!(
            serde_json::to_value(&directive).unwrap(),
            serde_json::json!({"XPathDataSort": [
                {"xpath": "@customer", "descending": false},
                {"xpath": "@dateSetup", "descending": true},
            ]})
        );
    }

    #[test]
    fn test_load_fields() {
        let builder = Builder::new()
            .load(["@description"])
            .load([("customerName", "@customer/@custName")]);
        assert_eq!(
            builder.to_field_projection(),
            vec![
                FieldDescriptor { name: "description".to_string(), path: "@description".to_string() },
                FieldDescriptor { name: "customerName".to_string(), path: "@customer/@custName".to_string() },
            ]
        );
    }

    #[test]
    fn test_paginate() {
        let builder = Builder::new().paginate(3, 10);
        assert_eq!(builder.get_offset(), Some(20));
        assert_eq!(builder.get_limit(), Some(10));

        let builder = Builder::new().paginate(0, DEFAULT_PER_PAGE);
        assert_eq!(builder.get_offset(), None);
        assert_eq!(builder.get_limit(), Some(25));
    }

    #[test]
    fn test_paginate_saturates_offset() {
        let builder = Builder::new().paginate(usize::MAX, 25);
        assert_eq!(builder.get_offset(), Some(usize::MAX));
        assert_eq!(builder.get_limit(), Some(25));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(Builder::new().to_filter_expression(), "");
    }

    #[tokio::test]
    async fn test_unbound_builder_cannot_execute() {
        let result = Builder::new().filter("@id", 1).find().await;
        assert!(matches!(result, Err(Error::Detached)));
    }
}
