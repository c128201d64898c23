use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the foodgram module (`modules.foodgram`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoodgramConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// e.g. `https://foodgram.example.org`; request host is used when unset.
    #[serde(default)]
    pub short_link_origin: Option<String>,
}

impl Default for FoodgramConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            short_link_origin: None,
        }
    }
}

fn default_page_size() -> u64 {
    6
}

fn default_max_page_size() -> u64 {
    100
}

impl From<FoodgramConfig> for ServiceConfig {
    fn from(c: FoodgramConfig) -> Self {
        Self {
            default_page_size: c.default_page_size,
            max_page_size: c.max_page_size.max(1),
            short_link_origin: c.short_link_origin,
        }
    }
}
