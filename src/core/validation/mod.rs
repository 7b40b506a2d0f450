//! List-query validation
//!
//! Small rule fragments (pagination, search, sort, filter, include) composed
//! by a validator that checks raw list parameters against a resource
//! whitelist and aggregates every violation.

pub mod extractor;
pub mod rules;
pub mod validator;

pub use extractor::{ListQuery, ListResource};
pub use rules::Rule;
pub use validator::{ListQueryValidator, validate};
