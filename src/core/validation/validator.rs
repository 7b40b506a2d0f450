//! Whitelist-driven list-query validator
//!
//! All rule fragments run on every request and their violations are
//! aggregated, so the client learns about every bad parameter at once.

use std::sync::Arc;

use super::rules::{DEFAULT_RULES, Rule};
use crate::config::QueryOptionsConfig;
use crate::core::error::ValidationError;
use crate::core::query::{RawQueryParams, ValidatedQueryOptions};

/// Validate raw list parameters against a resource whitelist
///
/// Runs pagination, search, sort, filter and include rules.
///
/// # Example
/// ```
/// use list_query::config::QueryOptionsConfig;
/// use list_query::core::query::{RawQueryParams, Sort};
/// use list_query::core::validation::validate;
///
/// let config = QueryOptionsConfig::new()
///     .with_sorts(["name", "installation_date"])
///     .with_filters(["car_id", "is_active"]);
/// let raw = RawQueryParams::parse("sort=-installation_date&filter[car_id]=7&page=2");
///
/// let options = validate(&raw, &config).unwrap();
/// assert_eq!(options.page, 2);
/// assert_eq!(options.sort, Some(Sort::desc("installation_date")));
/// assert_eq!(options.filter("car_id"), Some("7"));
/// ```
pub fn validate(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
) -> Result<ValidatedQueryOptions, ValidationError> {
    apply(&DEFAULT_RULES, raw, config)
}

fn apply(
    rules: &[Rule],
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
) -> Result<ValidatedQueryOptions, ValidationError> {
    let mut options = ValidatedQueryOptions::defaults(config);
    let violations: Vec<_> = rules
        .iter()
        .flat_map(|rule| rule(raw, config, &mut options))
        .collect();

    match ValidationError::from_violations(violations) {
        None => Ok(options),
        Some(err) => {
            tracing::debug!(
                violations = err.len(),
                fields = ?err.violations().iter().map(|v| v.field()).collect::<Vec<_>>(),
                "list query rejected"
            );
            Err(err)
        }
    }
}

/// A resource whitelist bound to a set of rule fragments
///
/// Cheap to clone; the whitelist is shared.
///
/// # Example
///
/// ```rust,ignore
/// let validator = ListQueryValidator::empty(config)
///     .with_rule(rules::paginated)
///     .with_rule(rules::sortable);
/// let options = validator.validate_query("sort=-name&page=2")?;
/// ```
#[derive(Clone)]
pub struct ListQueryValidator {
    config: Arc<QueryOptionsConfig>,
    rules: Vec<Rule>,
}

impl ListQueryValidator {
    /// Validator running every rule fragment
    pub fn new(config: impl Into<Arc<QueryOptionsConfig>>) -> Self {
        Self {
            config: config.into(),
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Validator with no rules: only defaults come out until rules are added
    pub fn empty(config: impl Into<Arc<QueryOptionsConfig>>) -> Self {
        Self {
            config: config.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(&self) -> &QueryOptionsConfig {
        &self.config
    }

    pub fn validate(&self, raw: &RawQueryParams) -> Result<ValidatedQueryOptions, ValidationError> {
        apply(&self.rules, raw, &self.config)
    }

    /// Parse a query string, then validate it
    pub fn validate_query(&self, query: &str) -> Result<ValidatedQueryOptions, ValidationError> {
        self.validate(&RawQueryParams::parse(query))
    }
}

impl std::fmt::Debug for ListQueryValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListQueryValidator")
            .field("config", &self.config)
            .field("rules", &self.rules.len())
            .finish()
    }
}
