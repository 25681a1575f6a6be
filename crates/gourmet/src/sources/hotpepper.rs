use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{RestaurantSource, Venue};
use crate::location::LocationContext;

pub const HOTPEPPER_HOST: &str = "http://webservice.recruit.co.jp";
/// Largest page the gourmet search API will return
pub const MAX_COUNT: u32 = 100;

#[derive(Debug, Clone)]
pub struct HotPepperConfig {
    pub host: String,
    pub api_key: String,
}

// Only the fields we pass on to the model; the API returns many more.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    shop: Vec<Shop>,
    #[serde(default)]
    error: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Shop {
    name: String,
    #[serde(default)]
    catch: Option<String>,
    #[serde(default)]
    genre: Option<Genre>,
    #[serde(default)]
    budget: Option<Budget>,
    #[serde(default)]
    open: Option<String>,
    #[serde(default)]
    photo: Option<Photo>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    urls: Option<Urls>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Budget {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    average: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    pc: Option<PhotoSizes>,
}

#[derive(Debug, Deserialize)]
struct PhotoSizes {
    #[serde(default)]
    l: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Urls {
    #[serde(default)]
    pc: Option<String>,
}

impl From<Shop> for Venue {
    fn from(shop: Shop) -> Self {
        let budget = shop.budget.and_then(|b| {
            let average = b.average.filter(|a| !a.is_empty());
            average.or(b.name).filter(|s| !s.is_empty())
        });
        Venue {
            name: shop.name,
            catch: shop.catch.filter(|s| !s.is_empty()),
            genre: shop.genre.and_then(|g| g.name),
            budget,
            open: shop.open,
            photo: shop.photo.and_then(|p| p.pc).and_then(|p| p.l),
            address: shop.address,
            access: shop.access,
            url: shop.urls.and_then(|u| u.pc),
        }
    }
}

/// Client for the Recruit Hot Pepper gourmet search API
pub struct HotPepper {
    client: Client,
    config: HotPepperConfig,
}

impl HotPepper {
    pub fn new(config: HotPepperConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl RestaurantSource for HotPepper {
    async fn search(&self, location: LocationContext, count: u32) -> Result<Vec<Venue>> {
        let url = format!(
            "{}/hotpepper/gourmet/v1/",
            self.config.host.trim_end_matches('/')
        );
        let count = count.clamp(1, MAX_COUNT).to_string();
        let lat = location.latitude().to_string();
        let lng = location.longitude().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lng", lng.as_str()),
                ("count", count.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(anyhow!("Restaurant search failed: {}", status));
        }

        let body: SearchResponse = response.json().await?;
        if let Some(error) = body.results.error.first() {
            return Err(anyhow!(
                "Restaurant search rejected ({}): {}",
                error.code.unwrap_or_default(),
                error.message
            ));
        }

        Ok(body.results.shop.into_iter().map(Venue::from).collect())
    }
}
