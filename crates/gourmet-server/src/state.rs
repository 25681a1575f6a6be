use anyhow::Result;
use gourmet::{
    agent::Agent,
    concierge::Concierge,
    providers::openai::OpenAiProvider,
    sources::{forecast::JmaForecast, hotpepper::HotPepper},
    tools::ToolRegistry,
};
use std::sync::Arc;

use crate::configuration::Settings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub concierge: Arc<Concierge>,
}

impl AppState {
    pub fn new(concierge: Concierge) -> Self {
        Self {
            concierge: Arc::new(concierge),
        }
    }

    /// Wire the provider, data sources and tools described by `settings`
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let provider = OpenAiProvider::new(settings.provider.into_config())?;
        let forecast = JmaForecast::new(settings.forecast.into_config())?;
        let count = settings.hotpepper.count;
        let restaurants = HotPepper::new(settings.hotpepper.into_config())?;

        let registry =
            ToolRegistry::with_builtins(Arc::new(forecast), Arc::new(restaurants), count)?;
        let agent = Agent::new(Box::new(provider), registry)
            .with_config(settings.agent.into_config());

        Ok(Self::new(Concierge::new(
            agent,
            settings.retry.into_config(),
        )))
    }
}
