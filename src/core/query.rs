//! Raw list parameters, validated query options and pagination utilities

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

use crate::config::{ParamNames, QueryOptionsConfig};

/// One untrusted parameter value as decoded from a query string
///
/// Bracket keys fold into nested shapes:
/// - `sort=name` → `Text("name")`
/// - `include[]=car` or a repeated `include=car&include=owner` → `List`
/// - `filter[car_id]=3` → `Map { "car_id": Text("3") }`
///
/// A key sent in two incompatible shapes (`filter=x&filter[car_id]=3`)
/// keeps every part as a `Conflict`, which no rule accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Map(IndexMap<String, RawValue>),
    Conflict(Vec<RawValue>),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.is_empty())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Untrusted list parameters of a single request
///
/// Keys keep the order in which they first appeared.
///
/// # Example
/// ```
/// use list_query::core::query::{RawQueryParams, RawValue};
///
/// let raw = RawQueryParams::parse("sort=-installation_date&filter[car_id]=3&include=car");
/// assert_eq!(raw.get("sort").and_then(RawValue::as_text), Some("-installation_date"));
/// assert!(matches!(raw.get("filter"), Some(RawValue::Map(_))));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQueryParams(IndexMap<String, RawValue>);

impl RawQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    /// Build from already-decoded key/value pairs, folding bracket keys
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key.as_ref(), value.into());
        }
        params
    }

    /// Add one decoded pair, e.g. `("filter[car_id]", "3")`
    pub fn push(&mut self, key: &str, value: String) {
        let (base, segments) = split_key(key);
        let previous = self
            .0
            .get_mut(base)
            .map(|slot| std::mem::replace(slot, RawValue::List(Vec::new())));
        let merged = merge(previous, &segments, value);
        self.0.insert(base.to_string(), merged);
    }

    /// Set a whole value, replacing what was there
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    /// Like [`get`](Self::get), but an empty string counts as absent
    pub fn get_present(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key).filter(|value| !value.is_blank())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.0.iter()
    }

    /// Flatten back to decoded key/value pairs in bracket notation
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.0 {
            flatten(key.clone(), value, &mut pairs);
        }
        pairs
    }

    /// Encode as an `application/x-www-form-urlencoded` query string
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_pairs())
            .finish()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawQueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Split `filter[car_id][]` into `("filter", ["car_id", ""])`
///
/// Keys with unbalanced brackets are taken literally.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 {
        return (key, Vec::new());
    }

    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return (key, Vec::new());
        };
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    (&key[..open], segments)
}

fn merge(slot: Option<RawValue>, segments: &[&str], value: String) -> RawValue {
    match (slot, segments.split_first()) {
        (Some(RawValue::Conflict(mut parts)), _) => {
            parts.push(merge(None, segments, value));
            RawValue::Conflict(parts)
        }
        (None, None) => RawValue::Text(value),
        (None, Some((&"", _))) => RawValue::List(vec![value]),
        (Some(RawValue::Text(prev)), None | Some((&"", _))) => RawValue::List(vec![prev, value]),
        (Some(RawValue::List(mut items)), None | Some((&"", _))) => {
            items.push(value);
            RawValue::List(items)
        }
        (None, Some((key, rest))) => merge_named(IndexMap::new(), key, rest, value),
        (Some(RawValue::Map(map)), Some((key, rest))) => merge_named(map, key, rest, value),
        (Some(prev), _) => RawValue::Conflict(vec![prev, merge(None, segments, value)]),
    }
}

fn merge_named(
    mut map: IndexMap<String, RawValue>,
    key: &str,
    rest: &[&str],
    value: String,
) -> RawValue {
    let previous = map
        .get_mut(key)
        .map(|inner| std::mem::replace(inner, RawValue::List(Vec::new())));
    let merged = merge(previous, rest, value);
    map.insert(key.to_string(), merged);
    RawValue::Map(map)
}

fn flatten(prefix: String, value: &RawValue, out: &mut Vec<(String, String)>) {
    match value {
        RawValue::Text(s) => out.push((prefix, s.clone())),
        RawValue::List(items) => {
            for item in items {
                out.push((format!("{}[]", prefix), item.clone()));
            }
        }
        RawValue::Map(map) => {
            for (key, inner) in map {
                flatten(format!("{}[{}]", prefix, key), inner, out);
            }
        }
        RawValue::Conflict(parts) => {
            for part in parts {
                flatten(prefix.clone(), part, out);
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A whitelisted sort key with its direction
///
/// # Format
/// - `field` ascending
/// - `-field` descending
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Read the signed form, stripping at most one leading `-`
    pub fn from_param(value: &str) -> Self {
        match value.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(value),
        }
    }

    /// The signed form used on the wire
    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

/// Normalized list parameters, ready for the data-access layer
///
/// Every sort key, filter name and include here is a member of the
/// resource's whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedQueryOptions {
    /// Page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub per_page: u64,

    pub sort: Option<Sort>,

    pub search: Option<String>,

    /// Allowed filter field → opaque value, in request order
    pub filters: IndexMap<String, String>,

    /// Relations to load alongside each item
    pub includes: IndexSet<String>,
}

impl ValidatedQueryOptions {
    /// Options for a request that sent no list parameters at all
    pub fn defaults(config: &QueryOptionsConfig) -> Self {
        Self {
            page: 1,
            per_page: config.default_per_page,
            sort: None,
            search: None,
            filters: IndexMap::new(),
            includes: IndexSet::new(),
        }
    }

    /// Number of items to skip
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }

    /// Number of items to fetch
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn filter(&self, field: &str) -> Option<&str> {
        self.filters.get(field).map(String::as_str)
    }

    pub fn includes(&self, relation: &str) -> bool {
        self.includes.contains(relation)
    }

    /// Serialize back to raw parameters under the given names
    ///
    /// Validating the result against the same config yields `self` again.
    pub fn to_raw(&self, names: &ParamNames) -> RawQueryParams {
        let mut raw = RawQueryParams::new();
        raw.insert(names.page.clone(), self.page.to_string());
        raw.insert(names.per_page.clone(), self.per_page.to_string());
        if let Some(sort) = &self.sort {
            raw.insert(names.sort.clone(), sort.to_param());
        }
        if let Some(search) = &self.search {
            raw.insert(names.search.clone(), search.clone());
        }
        if !self.filters.is_empty() {
            let filters = self
                .filters
                .iter()
                .map(|(k, v)| (k.clone(), RawValue::Text(v.clone())))
                .collect();
            raw.insert(names.filter.clone(), RawValue::Map(filters));
        }
        if !self.includes.is_empty() {
            raw.insert(
                names.include.clone(),
                RawValue::List(self.includes.iter().cloned().collect()),
            );
        }
        raw
    }

    /// Shorthand for `to_raw(names).to_query_string()`
    pub fn to_query_string(&self, names: &ParamNames) -> String {
        self.to_raw(names).to_query_string()
    }
}

/// Paginated response structure
///
/// Wraps one page of data with metadata about pagination state.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, options: &ValidatedQueryOptions, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(options.page, options.per_page, total),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub per_page: u64,

    /// Total number of items (after filters)
    pub total: u64,

    /// Total number of pages
    pub total_pages: u64,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        // Keep per_page at least 1 to avoid division by zero
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(per_page);
        let start = (page - 1).saturating_mul(per_page);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: start.saturating_add(per_page) < total,
            has_prev: page > 1,
        }
    }
}
