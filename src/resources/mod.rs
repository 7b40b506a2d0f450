//! List resources of the automobile admin backend

use std::sync::{Arc, OnceLock};

use crate::config::QueryOptionsConfig;
use crate::core::validation::ListResource;

/// Automobile records
pub struct Cars;

/// Modifications installed on a car
pub struct Modifications;

impl ListResource for Cars {
    const NAME: &'static str = "cars";

    fn query_config() -> Arc<QueryOptionsConfig> {
        static CONFIG: OnceLock<Arc<QueryOptionsConfig>> = OnceLock::new();
        CONFIG
            .get_or_init(|| Arc::new(QueryOptionsConfig::cars()))
            .clone()
    }
}

impl ListResource for Modifications {
    const NAME: &'static str = "modifications";

    fn query_config() -> Arc<QueryOptionsConfig> {
        static CONFIG: OnceLock<Arc<QueryOptionsConfig>> = OnceLock::new();
        CONFIG
            .get_or_init(|| Arc::new(QueryOptionsConfig::modifications()))
            .clone()
    }
}
