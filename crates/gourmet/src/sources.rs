//! External data sources the tools call out to.
//!
//! Both are behind traits so the agent can be exercised without network access.
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::location::LocationContext;

pub mod forecast;
pub mod hotpepper;

/// A restaurant as reported by the search source, before the model reduces it
/// to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Free-text weather forecast for a fixed region
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn overview(&self) -> Result<String>;
}

/// Restaurant search around a point
#[async_trait]
pub trait RestaurantSource: Send + Sync {
    async fn search(&self, location: LocationContext, count: u32) -> Result<Vec<Venue>>;
}
