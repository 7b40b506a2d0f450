//! # list-query
//!
//! Whitelist-driven validation of list-request query parameters for REST
//! backends.
//!
//! Each resource declares which fields may be sorted on, filtered on and
//! included. Incoming `page`, `per_page`, `sort`, `search`, `filter[...]` and
//! `include` parameters are checked against that whitelist and turned into a
//! [`ValidatedQueryOptions`](core::query::ValidatedQueryOptions) for the
//! data-access layer, or rejected with every violation listed.
//!
//! ## Features
//!
//! - **Whitelists**: sort keys (`name` / `-name`), filter fields and include relations
//! - **Aggregated errors**: one response lists every bad parameter
//! - **Bracket encoding**: `filter[car_id]=3`, `include[]=car`, `include=car,owner`
//! - **Composable rules**: pagination, search, sort, filter and include fragments
//! - **Configuration-Based**: whitelists in code or YAML
//! - **Axum integration**: `ListQuery<R>` extractor with `422` rejections
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use list_query::prelude::*;
//!
//! async fn list_modifications(query: ListQuery<Modifications>) -> Json<Value> {
//!     let options = query.into_inner();
//!     // options.sort, options.filters, options.offset(), ...
//! }
//!
//! let app = ListRouterBuilder::new()
//!     .list::<Modifications, _, _>(list_modifications)
//!     .build();
//! ```

pub mod config;
pub mod core;
pub mod resources;
pub mod server;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Query types ===
    pub use crate::core::query::{
        PaginatedResponse, PaginationMeta, RawQueryParams, RawValue, Sort, SortDirection,
        ValidatedQueryOptions,
    };

    // === Validation ===
    pub use crate::core::validation::{
        ListQuery, ListQueryValidator, ListResource, Rule, rules, validate,
    };

    // === Errors ===
    pub use crate::core::error::{
        ConfigError, ErrorResponse, FieldError, QueryError, QueryResult, QueryViolation,
        ValidationError,
    };

    // === Config ===
    pub use crate::config::{ParamNames, QueryOptionsConfig, ResourcesConfig};

    // === Resources ===
    pub use crate::resources::{Cars, Modifications};

    // === Server ===
    pub use crate::server::{ListRouterBuilder, init_tracing};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{Json, Router, extract::State};
}
