//! Generic, typed CRUD over a configured REST resource, with filtering,
//! sorting, and pagination baked into the same `Entity<T>` handle.

pub mod descriptor;
pub mod filter;
pub mod manager;
pub mod sort;

pub use descriptor::EntityDescriptor;
pub use filter::{EntityFilter, FilterExpression, FilterOperator};
pub use manager::{Entity, EntityManager, ListOptions, PaginateOptions};
pub use sort::{MultiFieldSorter, SortDirection, SortSpec};
