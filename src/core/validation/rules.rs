//! Reusable list-query rule fragments
//!
//! Each fragment reads the parameters it owns, writes its part of the
//! [`ValidatedQueryOptions`] and returns the violations it found. Fragments
//! never look at each other's parameters, so they can be composed in any
//! subset by [`ListQueryValidator`](super::ListQueryValidator).

use crate::config::QueryOptionsConfig;
use crate::core::error::QueryViolation;
use crate::core::query::{RawQueryParams, RawValue, Sort, ValidatedQueryOptions};

/// A composable rule fragment
pub type Rule =
    fn(&RawQueryParams, &QueryOptionsConfig, &mut ValidatedQueryOptions) -> Vec<QueryViolation>;

/// Fragment order used by the default validator
pub const DEFAULT_RULES: [Rule; 5] = [paginated, searchable, sortable, filterable, includable];

fn invalid_type(field: &str, expected: &'static str) -> QueryViolation {
    QueryViolation::InvalidType {
        field: field.to_string(),
        expected,
    }
}

/// Rule: `page` and `per_page` are positive integers, `per_page` is bounded
pub fn paginated(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
    options: &mut ValidatedQueryOptions,
) -> Vec<QueryViolation> {
    let mut violations = Vec::new();
    let names = &config.params;

    if let Some(page) = positive_integer(raw, &names.page, &mut violations) {
        options.page = page;
    }

    if let Some(per_page) = positive_integer(raw, &names.per_page, &mut violations) {
        if per_page > config.max_per_page {
            violations.push(QueryViolation::InvalidPagination {
                field: names.per_page.clone(),
                value: per_page.to_string(),
                message: format!("must not be greater than {}", config.max_per_page),
            });
        } else {
            options.per_page = per_page;
        }
    }

    violations
}

fn positive_integer(
    raw: &RawQueryParams,
    field: &str,
    violations: &mut Vec<QueryViolation>,
) -> Option<u64> {
    let value = raw.get_present(field)?;
    let Some(text) = value.as_text() else {
        violations.push(invalid_type(field, "a positive integer"));
        return None;
    };

    match text.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            violations.push(QueryViolation::InvalidPagination {
                field: field.to_string(),
                value: text.to_string(),
                message: "must be a positive integer".to_string(),
            });
            None
        }
    }
}

/// Rule: `search` is a string no longer than the configured maximum
///
/// Length is counted in characters, not bytes.
pub fn searchable(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
    options: &mut ValidatedQueryOptions,
) -> Vec<QueryViolation> {
    let field = &config.params.search;
    let Some(value) = raw.get_present(field) else {
        return Vec::new();
    };
    let Some(text) = value.as_text() else {
        return vec![invalid_type(field, "a string")];
    };

    let actual = text.chars().count();
    if actual > config.max_search_length {
        return vec![QueryViolation::FieldTooLong {
            field: field.clone(),
            max: config.max_search_length,
            actual,
        }];
    }

    options.search = Some(text.to_string());
    Vec::new()
}

/// Rule: `sort` is one whitelisted field, optionally prefixed with `-`
pub fn sortable(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
    options: &mut ValidatedQueryOptions,
) -> Vec<QueryViolation> {
    let field = &config.params.sort;
    let Some(value) = raw.get_present(field) else {
        return Vec::new();
    };
    let Some(text) = value.as_text() else {
        return vec![invalid_type(field, "a string")];
    };

    let allowed = config.sort_values();
    if !allowed.iter().any(|candidate| candidate == text) {
        return vec![QueryViolation::InvalidEnumValue {
            field: field.clone(),
            value: text.to_string(),
            allowed,
        }];
    }

    options.sort = Some(Sort::from_param(text));
    Vec::new()
}

/// Rule: `filter` maps whitelisted field names to string values
///
/// Unknown fields reject the request; values pass through untouched.
pub fn filterable(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
    options: &mut ValidatedQueryOptions,
) -> Vec<QueryViolation> {
    let param = &config.params.filter;
    let Some(value) = raw.get_present(param) else {
        return Vec::new();
    };
    let RawValue::Map(filters) = value else {
        return vec![invalid_type(param, "a map of field names to values")];
    };

    let mut violations = Vec::new();
    for (name, value) in filters {
        if !config.allowed_filters.contains(name) {
            violations.push(QueryViolation::UnknownFilterField {
                param: param.clone(),
                name: name.clone(),
                allowed: config.allowed_filters.iter().cloned().collect(),
            });
            continue;
        }
        match value {
            RawValue::Text(text) => {
                options.filters.insert(name.clone(), text.clone());
            }
            _ => violations.push(invalid_type(&format!("{}[{}]", param, name), "a string")),
        }
    }
    violations
}

/// Rule: `include` lists whitelisted relation names
///
/// Accepts either a list (`include[]=car`) or a comma-separated string
/// (`include=car,owner`).
pub fn includable(
    raw: &RawQueryParams,
    config: &QueryOptionsConfig,
    options: &mut ValidatedQueryOptions,
) -> Vec<QueryViolation> {
    let param = &config.params.include;
    let Some(value) = raw.get_present(param) else {
        return Vec::new();
    };

    let requested: Vec<&str> = match value {
        RawValue::Text(text) => text.split(',').map(str::trim).collect(),
        RawValue::List(items) => items.iter().map(|s| s.trim()).collect(),
        RawValue::Map(_) | RawValue::Conflict(_) => {
            return vec![invalid_type(param, "a list of strings")];
        }
    };

    let mut violations = Vec::new();
    for relation in requested.into_iter().filter(|r| !r.is_empty()) {
        if config.allowed_includes.contains(relation) {
            options.includes.insert(relation.to_string());
        } else {
            violations.push(QueryViolation::UnknownIncludeValue {
                param: param.clone(),
                value: relation.to_string(),
                allowed: config.allowed_includes.iter().cloned().collect(),
            });
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryOptionsConfig {
        QueryOptionsConfig::modifications()
    }

    fn run(rule: Rule, query: &str) -> (ValidatedQueryOptions, Vec<QueryViolation>) {
        let config = config();
        let raw = RawQueryParams::parse(query);
        let mut options = ValidatedQueryOptions::defaults(&config);
        let violations = rule(&raw, &config, &mut options);
        (options, violations)
    }

    // === paginated() ===

    #[test]
    fn test_paginated_defaults() {
        let (options, violations) = run(paginated, "");
        assert!(violations.is_empty());
        assert_eq!(options.page, 1);
        assert_eq!(options.per_page, 15);
    }

    #[test]
    fn test_paginated_reads_values() {
        let (options, violations) = run(paginated, "page=3&per_page=50");
        assert!(violations.is_empty());
        assert_eq!(options.page, 3);
        assert_eq!(options.per_page, 50);
    }

    #[test]
    fn test_paginated_zero_page_rejected() {
        let (_, violations) = run(paginated, "page=0");
        assert!(matches!(
            violations.as_slice(),
            [QueryViolation::InvalidPagination { field, .. }] if field == "page"
        ));
    }

    #[test]
    fn test_paginated_non_numeric_rejected() {
        let (_, violations) = run(paginated, "page=two&per_page=-5");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_paginated_per_page_above_max_rejected() {
        let (options, violations) = run(paginated, "per_page=101");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("100"));
        assert_eq!(options.per_page, 15);
    }

    #[test]
    fn test_paginated_list_is_invalid_type() {
        let (_, violations) = run(paginated, "page[]=1");
        assert!(matches!(violations[0], QueryViolation::InvalidType { .. }));
    }

    // === searchable() ===

    #[test]
    fn test_searchable_at_limit_ok() {
        let query = format!("search={}", "a".repeat(255));
        let (options, violations) = run(searchable, &query);
        assert!(violations.is_empty());
        assert_eq!(options.search.map(|s| s.len()), Some(255));
    }

    #[test]
    fn test_searchable_over_limit_rejected() {
        let query = format!("search={}", "a".repeat(256));
        let (options, violations) = run(searchable, &query);
        assert!(matches!(
            violations.as_slice(),
            [QueryViolation::FieldTooLong { max: 255, actual: 256, .. }]
        ));
        assert!(options.search.is_none());
    }

    #[test]
    fn test_searchable_counts_characters() {
        // 255 two-byte characters
        let query = format!("search={}", "é".repeat(255));
        let (_, violations) = run(searchable, &query);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_searchable_empty_is_absent() {
        let (options, violations) = run(searchable, "search=");
        assert!(violations.is_empty());
        assert!(options.search.is_none());
    }

    #[test]
    fn test_searchable_list_rejected() {
        let (_, violations) = run(searchable, "search[]=turbo");
        assert!(matches!(violations[0], QueryViolation::InvalidType { .. }));
    }

    // === sortable() ===

    #[test]
    fn test_sortable_ascending() {
        let (options, violations) = run(sortable, "sort=name");
        assert!(violations.is_empty());
        assert_eq!(options.sort, Some(Sort::asc("name")));
    }

    #[test]
    fn test_sortable_descending() {
        let (options, violations) = run(sortable, "sort=-installation_date");
        assert!(violations.is_empty());
        assert_eq!(options.sort, Some(Sort::desc("installation_date")));
    }

    #[test]
    fn test_sortable_unknown_field_rejected() {
        let (_, violations) = run(sortable, "sort=price");
        let [QueryViolation::InvalidEnumValue { value, allowed, .. }] = violations.as_slice() else {
            panic!("expected one InvalidEnumValue, got {:?}", violations);
        };
        assert_eq!(value, "price");
        assert!(allowed.contains(&"-name".to_string()));
    }

    #[test]
    fn test_sortable_double_dash_rejected() {
        let (_, violations) = run(sortable, "sort=--name");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_sortable_multiple_values_rejected() {
        let (_, violations) = run(sortable, "sort=name&sort=-name");
        assert!(matches!(violations[0], QueryViolation::InvalidType { .. }));
    }

    // === filterable() ===

    #[test]
    fn test_filterable_passes_values_through() {
        let (options, violations) = run(filterable, "filter[car_id]=7&filter[is_active]=true");
        assert!(violations.is_empty());
        assert_eq!(options.filter("car_id"), Some("7"));
        assert_eq!(options.filter("is_active"), Some("true"));
    }

    #[test]
    fn test_filterable_unknown_field_rejected() {
        let (options, violations) = run(filterable, "filter[unknown_field]=x&filter[car_id]=1");
        let [QueryViolation::UnknownFilterField { name, .. }] = violations.as_slice() else {
            panic!("expected one UnknownFilterField, got {:?}", violations);
        };
        assert_eq!(name, "unknown_field");
        assert_eq!(options.filter("car_id"), Some("1"));
    }

    #[test]
    fn test_filterable_plain_string_rejected() {
        let (_, violations) = run(filterable, "filter=car_id");
        assert!(matches!(
            violations.as_slice(),
            [QueryViolation::InvalidType { field, .. }] if field == "filter"
        ));
    }

    #[test]
    fn test_filterable_nested_value_rejected() {
        let (_, violations) = run(filterable, "filter[car_id][]=1");
        assert_eq!(violations[0].field(), "filter[car_id]");
    }

    // === includable() ===

    #[test]
    fn test_includable_comma_separated() {
        let config = QueryOptionsConfig::new().with_includes(["car", "owner"]);
        let raw = RawQueryParams::parse("include=car,owner,car");
        let mut options = ValidatedQueryOptions::defaults(&config);
        let violations = includable(&raw, &config, &mut options);
        assert!(violations.is_empty());
        assert_eq!(options.includes.len(), 2);
    }

    #[test]
    fn test_includable_list() {
        let (options, violations) = run(includable, "include[]=car");
        assert!(violations.is_empty());
        assert!(options.includes("car"));
    }

    #[test]
    fn test_includable_unknown_relation_rejected() {
        let (_, violations) = run(includable, "include=car,driver");
        let [QueryViolation::UnknownIncludeValue { value, .. }] = violations.as_slice() else {
            panic!("expected one UnknownIncludeValue, got {:?}", violations);
        };
        assert_eq!(value, "driver");
    }

    #[test]
    fn test_includable_map_rejected() {
        let (_, violations) = run(includable, "include[car]=1");
        assert!(matches!(violations[0], QueryViolation::InvalidType { .. }));
    }
}
