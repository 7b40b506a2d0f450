//! Resource whitelist configuration loading and management

use crate::core::error::ConfigError;
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use validator::Validate;

/// Default maximum length of the `search` parameter
pub const DEFAULT_MAX_SEARCH_LENGTH: usize = 255;

/// Default page size when the client sends no `per_page`
pub const DEFAULT_PER_PAGE: u64 = 15;

/// Default upper bound for `per_page`
pub const DEFAULT_MAX_PER_PAGE: u64 = 100;

static FIELD_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn field_name_regex() -> &'static Regex {
    FIELD_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("field name pattern is valid")
    })
}

/// Query-string names of the list parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamNames {
    pub page: String,
    pub per_page: String,
    pub sort: String,
    pub search: String,
    pub filter: String,
    pub include: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            per_page: "per_page".to_string(),
            sort: "sort".to_string(),
            search: "search".to_string(),
            filter: "filter".to_string(),
            include: "include".to_string(),
        }
    }
}

/// Whitelist of list parameters for one resource
///
/// Built once per resource type and shared read-only between requests.
///
/// # Example
/// ```
/// use list_query::config::QueryOptionsConfig;
///
/// let config = QueryOptionsConfig::new()
///     .with_sorts(["name", "installation_date"])
///     .with_filters(["car_id", "is_active"])
///     .with_includes(["car"]);
/// assert!(config.check("modifications").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueryOptionsConfig {
    /// Fields the client may sort by (either direction)
    pub allowed_sorts: IndexSet<String>,

    /// Fields the client may filter on
    pub allowed_filters: IndexSet<String>,

    /// Relations the client may ask to include
    pub allowed_includes: IndexSet<String>,

    #[validate(range(min = 1))]
    pub max_search_length: usize,

    #[validate(range(min = 1))]
    pub default_per_page: u64,

    #[validate(range(min = 1))]
    pub max_per_page: u64,

    pub params: ParamNames,
}

impl Default for QueryOptionsConfig {
    fn default() -> Self {
        Self {
            allowed_sorts: IndexSet::new(),
            allowed_filters: IndexSet::new(),
            allowed_includes: IndexSet::new(),
            max_search_length: DEFAULT_MAX_SEARCH_LENGTH,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            params: ParamNames::default(),
        }
    }
}

impl QueryOptionsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sorts<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sorts.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_filters<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_filters.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_includes<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_includes.extend(relations.into_iter().map(Into::into));
        self
    }

    pub fn with_max_search_length(mut self, max: usize) -> Self {
        self.max_search_length = max;
        self
    }

    /// Set the default and maximum page size
    pub fn with_per_page(mut self, default: u64, max: u64) -> Self {
        self.default_per_page = default;
        self.max_per_page = max;
        self
    }

    pub fn with_params(mut self, params: ParamNames) -> Self {
        self.params = params;
        self
    }

    /// Every accepted `sort` value: each field, plain and `-` prefixed
    pub fn sort_values(&self) -> Vec<String> {
        self.allowed_sorts
            .iter()
            .flat_map(|field| [field.clone(), format!("-{}", field)])
            .collect()
    }

    /// Check that the whitelist itself is usable
    ///
    /// `resource` only labels the error.
    pub fn check(&self, resource: &str) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: String| ConfigError::InvalidValue {
            resource: resource.to_string(),
            field: field.to_string(),
            message,
        };

        self.validate()
            .map_err(|errors| invalid("limits", errors.to_string()))?;

        if self.default_per_page > self.max_per_page {
            return Err(invalid(
                "default_per_page",
                format!(
                    "{} is greater than max_per_page ({})",
                    self.default_per_page, self.max_per_page
                ),
            ));
        }

        let lists = [
            ("allowed_sorts", &self.allowed_sorts),
            ("allowed_filters", &self.allowed_filters),
            ("allowed_includes", &self.allowed_includes),
        ];
        for (list, names) in lists {
            if let Some(bad) = names.iter().find(|n| !field_name_regex().is_match(n)) {
                return Err(invalid(list, format!("'{}' is not a valid field name", bad)));
            }
        }

        let params = [
            &self.params.page,
            &self.params.per_page,
            &self.params.sort,
            &self.params.search,
            &self.params.filter,
            &self.params.include,
        ];
        if let Some(bad) = params.iter().find(|n| !field_name_regex().is_match(n)) {
            return Err(invalid("params", format!("'{}' is not a valid parameter name", bad)));
        }
        for (i, name) in params.iter().enumerate() {
            if params[..i].contains(name) {
                return Err(invalid("params", format!("'{}' is used for two parameters", name)));
            }
        }

        Ok(())
    }

    /// Whitelist of the `cars` resource
    pub fn cars() -> Self {
        Self::new()
            .with_sorts(["name", "brand", "model", "year", "created_at"])
            .with_filters(["brand", "model", "year"])
            .with_includes(["modifications"])
    }

    /// Whitelist of the `modifications` resource
    pub fn modifications() -> Self {
        Self::new()
            .with_sorts(["name", "installation_date", "created_at"])
            .with_filters(["car_id", "is_active"])
            .with_includes(["car"])
    }
}

/// Whitelists of every list resource, keyed by resource name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub resources: IndexMap<String, QueryOptionsConfig>,
}

impl ResourcesConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.to_string(),
                }
                .into());
            }
            Err(e) => return Err(ConfigError::from(e).into()),
        };

        let config = Self::parse(&content).map_err(|err| match err {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                file: Some(path.to_string()),
                message,
            },
            other => other,
        })?;

        tracing::debug!(path, resources = config.resources.len(), "loaded list query config");
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml).context("invalid list query configuration")
    }

    fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        for (name, resource) in &config.resources {
            resource.check(name)?;
        }
        Ok(config)
    }

    /// Merge several configurations
    ///
    /// A resource defined in more than one config takes the last definition.
    pub fn merge(configs: Vec<ResourcesConfig>) -> Self {
        let mut merged = Self::default();
        for config in configs {
            for (name, resource) in config.resources {
                if merged.resources.contains_key(&name) {
                    tracing::warn!(
                        resource = %name,
                        "list query config overridden by later config"
                    );
                }
                merged.resources.insert(name, resource);
            }
        }
        merged
    }

    pub fn with_resource(mut self, name: impl Into<String>, config: QueryOptionsConfig) -> Self {
        self.resources.insert(name.into(), config);
        self
    }

    pub fn get(&self, name: &str) -> Option<&QueryOptionsConfig> {
        self.resources.get(name)
    }

    /// Like [`get`](Self::get), but a missing resource is an error
    pub fn require(&self, name: &str) -> Result<&QueryOptionsConfig, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownResource {
            name: name.to_string(),
        })
    }

    /// The `cars` and `modifications` resources of the admin backend
    pub fn default_config() -> Self {
        Self::default()
            .with_resource("cars", QueryOptionsConfig::cars())
            .with_resource("modifications", QueryOptionsConfig::modifications())
    }
}
