//! Axum extractor for validated list queries
//!
//! This module provides the `ListQuery<R>` extractor that validates the
//! request's query string against a resource whitelist before the handler
//! runs.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::validator::validate;
use crate::config::QueryOptionsConfig;
use crate::core::error::QueryError;
use crate::core::query::{RawQueryParams, ValidatedQueryOptions};

/// A resource that can be listed over HTTP
pub trait ListResource: Send + Sync + 'static {
    /// Route segment, e.g. `"modifications"`
    const NAME: &'static str;

    /// The resource's whitelist
    fn query_config() -> Arc<QueryOptionsConfig>;
}

/// Axum extractor yielding validated list options
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn list_modifications(
///     query: ListQuery<Modifications>,
/// ) -> Json<PaginatedResponse<Modification>> {
///     let options = query.into_inner();
///     // every sort/filter/include in `options` is whitelisted
/// }
/// ```
///
/// Rejections render as `422 Unprocessable Entity` listing every bad field.
pub struct ListQuery<R>(pub ValidatedQueryOptions, PhantomData<R>);

impl<R> ListQuery<R> {
    pub fn new(options: ValidatedQueryOptions) -> Self {
        Self(options, PhantomData)
    }

    pub fn into_inner(self) -> ValidatedQueryOptions {
        self.0
    }
}

impl<R> std::ops::Deref for ListQuery<R> {
    type Target = ValidatedQueryOptions;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<R> std::fmt::Debug for ListQuery<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ListQuery").field(&self.0).finish()
    }
}

impl<S, R> FromRequestParts<S> for ListQuery<R>
where
    S: Send + Sync,
    R: ListResource,
{
    type Rejection = QueryError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = RawQueryParams::parse(parts.uri.query().unwrap_or_default());
        let config = R::query_config();

        match validate(&raw, &config) {
            Ok(options) => {
                tracing::debug!(resource = R::NAME, page = options.page, "list query accepted");
                Ok(Self::new(options))
            }
            Err(err) => {
                tracing::debug!(resource = R::NAME, "list query rejected");
                Err(err.into())
            }
        }
    }
}
