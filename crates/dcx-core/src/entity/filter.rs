//! Filter-expression DSL that lowers to query-string parameters.

use std::collections::HashMap;

/// Operators supported when filtering entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "",
            Self::Ne => "__ne",
            Self::Gt => "__gt",
            Self::Gte => "__gte",
            Self::Lt => "__lt",
            Self::Lte => "__lte",
            Self::Contains => "__contains",
            Self::StartsWith => "__startswith",
            Self::EndsWith => "__endswith",
            Self::In => "__in",
            Self::IsNull => "__isnull",
            Self::IsNotNull => "__isnotnull",
        }
    }
}

/// A single filter condition: a field, an operator, and (for most
/// operators) a value.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Option<String>,
    pub values: Vec<String>,
}

impl FilterExpression {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_list(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::In,
            value: None,
            values,
        }
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::IsNull,
            value: None,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::IsNotNull,
            value: None,
            values: Vec::new(),
        }
    }

    /// Render as the single `(param_name, param_value)` pair this
    /// expression contributes to a query string.
    #[must_use]
    pub fn to_param(&self) -> (String, String) {
        let param_name = format!("{}{}", self.field, self.operator.suffix());
        let value = match self.operator {
            FilterOperator::IsNull | FilterOperator::IsNotNull => "true".to_string(),
            FilterOperator::In => self.values.join(","),
            _ => self.value.clone().unwrap_or_default(),
        };
        (param_name, value)
    }
}

/// A collection of filter expressions, combined with AND semantics by the
/// receiving API. Later `add`s of the same param name overwrite earlier
/// ones, matching how a plain dict of query params would merge.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    expressions: Vec<FilterExpression>,
}

impl EntityFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, expression: FilterExpression) -> Self {
        self.expressions.push(expression);
        self
    }

    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Eq, value))
    }

    #[must_use]
    pub fn ne(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Ne, value))
    }

    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Gt, value))
    }

    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Gte, value))
    }

    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Lt, value))
    }

    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Lte, value))
    }

    #[must_use]
    pub fn contains(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::Contains, value))
    }

    #[must_use]
    pub fn starts_with(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::StartsWith, value))
    }

    #[must_use]
    pub fn ends_with(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(FilterExpression::new(field, FilterOperator::EndsWith, value))
    }

    #[must_use]
    pub fn in_list(self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.add(FilterExpression::in_list(field, values))
    }

    #[must_use]
    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.add(FilterExpression::is_null(field))
    }

    #[must_use]
    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.add(FilterExpression::is_not_null(field))
    }

    #[must_use]
    pub fn to_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        for expr in &self.expressions {
            let (name, value) = expr.to_param();
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_has_no_suffix() {
        let params = EntityFilter::new().eq("status", "active").to_params();
        assert_eq!(params.get("status").unwrap(), "active");
    }

    #[test]
    fn in_list_joins_with_commas() {
        let params = EntityFilter::new()
            .in_list("id", vec!["1".to_string(), "2".to_string()])
            .to_params();
        assert_eq!(params.get("id__in").unwrap(), "1,2");
    }

    #[test]
    fn is_null_and_is_not_null_always_render_true() {
        let params = EntityFilter::new()
            .is_null("deleted_at")
            .is_not_null("owner")
            .to_params();
        assert_eq!(params.get("deleted_at__isnull").unwrap(), "true");
        assert_eq!(params.get("owner__isnotnull").unwrap(), "true");
    }

    #[test]
    fn full_round_trip_matches_expected_shape() {
        let params = EntityFilter::new()
            .eq("a", "1")
            .in_list("b", vec!["1".to_string(), "2".to_string()])
            .is_null("c")
            .to_params();
        assert_eq!(params.get("a").unwrap(), "1");
        assert_eq!(params.get("b__in").unwrap(), "1,2");
        assert_eq!(params.get("c__isnull").unwrap(), "true");
    }

    #[test]
    fn later_add_of_same_field_overwrites_earlier() {
        let params = EntityFilter::new().eq("status", "draft").eq("status", "active").to_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("status").unwrap(), "active");
    }
}
