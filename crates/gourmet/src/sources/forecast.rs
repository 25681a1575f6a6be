use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::ForecastSource;

pub const JMA_HOST: &str = "https://www.jma.go.jp";
/// Tokyo
pub const JMA_AREA: &str = "130000";

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub host: String,
    pub area: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            host: JMA_HOST.to_string(),
            area: JMA_AREA.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverviewForecast {
    text: String,
}

/// Overview forecasts published by the Japan Meteorological Agency
pub struct JmaForecast {
    client: Client,
    config: ForecastConfig,
}

impl JmaForecast {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ForecastSource for JmaForecast {
    async fn overview(&self) -> Result<String> {
        let url = format!(
            "{}/bosai/forecast/data/overview_forecast/{}.json",
            self.config.host.trim_end_matches('/'),
            self.config.area
        );

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let forecast: OverviewForecast = response.json().await?;
                Ok(forecast.text)
            }
            status => Err(anyhow!("Forecast request failed: {}", status)),
        }
    }
}
