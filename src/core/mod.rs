//! Core module containing list-query types, validation and errors

pub mod error;
pub mod query;
pub mod validation;

pub use error::{ConfigError, QueryError, QueryResult, QueryViolation, ValidationError};
pub use query::{
    PaginatedResponse, PaginationMeta, RawQueryParams, RawValue, Sort, SortDirection,
    ValidatedQueryOptions,
};
pub use validation::{ListQuery, ListQueryValidator, ListResource, validate};
