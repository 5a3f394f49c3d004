//! Sort-expression DSL that lowers to `sort`/`order` query parameters.

use std::collections::HashMap;

/// Ascending or descending, serialized exactly as `"asc"`/`"desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single field/direction pair.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    #[must_use]
    pub fn to_params(&self) -> HashMap<String, String> {
        HashMap::from([
            ("sort".to_string(), self.field.clone()),
            ("order".to_string(), self.direction.as_str().to_string()),
        ])
    }
}

/// Sorts by multiple fields at once, joining field names and directions
/// each with commas into a single `sort`/`order` pair.
#[derive(Debug, Clone, Default)]
pub struct MultiFieldSorter {
    specs: Vec<SortSpec>,
}

impl MultiFieldSorter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.specs.push(SortSpec::new(field, direction));
        self
    }

    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.add(field, SortDirection::Asc)
    }

    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.add(field, SortDirection::Desc)
    }

    #[must_use]
    pub fn to_params(&self) -> HashMap<String, String> {
        if self.specs.is_empty() {
            return HashMap::new();
        }
        let fields: Vec<&str> = self.specs.iter().map(|s| s.field.as_str()).collect();
        let directions: Vec<&str> = self.specs.iter().map(|s| s.direction.as_str()).collect();
        HashMap::from([
            ("sort".to_string(), fields.join(",")),
            ("order".to_string(), directions.join(",")),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sort_renders_sort_and_order() {
        let params = SortSpec::new("created_at", SortDirection::Desc).to_params();
        assert_eq!(params.get("sort").unwrap(), "created_at");
        assert_eq!(params.get("order").unwrap(), "desc");
    }

    #[test]
    fn empty_multi_sorter_renders_nothing() {
        assert!(MultiFieldSorter::new().to_params().is_empty());
    }

    #[test]
    fn multi_sorter_joins_fields_and_directions_with_commas() {
        let params = MultiFieldSorter::new().asc("name").desc("created_at").to_params();
        assert_eq!(params.get("sort").unwrap(), "name,created_at");
        assert_eq!(params.get("order").unwrap(), "asc,desc");
    }
}
