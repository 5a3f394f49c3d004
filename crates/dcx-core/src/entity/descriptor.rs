//! Per-resource configuration: what an entity type is called, which fields
//! it can be filtered/sorted by, and how it paginates.

use crate::pagination::PaginationConfig;

use super::sort::SortDirection;

/// Static description of one resource family, analogous to the class-level
/// configuration a `BaseEntity` subclass carried.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub resource_name: String,
    pub id_field: String,
    pub filterable_fields: Vec<String>,
    pub sortable_fields: Vec<String>,
    pub default_sort_field: Option<String>,
    pub default_sort_direction: SortDirection,
    pub pagination: PaginationConfig,
}

impl EntityDescriptor {
    #[must_use]
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            id_field: "id".to_string(),
            filterable_fields: Vec::new(),
            sortable_fields: Vec::new(),
            default_sort_field: None,
            default_sort_direction: SortDirection::Asc,
            pagination: PaginationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    #[must_use]
    pub fn with_filterable_fields(mut self, fields: Vec<String>) -> Self {
        self.filterable_fields = fields;
        self
    }

    #[must_use]
    pub fn with_sortable_fields(mut self, fields: Vec<String>) -> Self {
        self.sortable_fields = fields;
        self
    }

    #[must_use]
    pub fn with_default_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort_field = Some(field.into());
        self.default_sort_direction = direction;
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }
}
