use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use gourmet::{
    agent::AgentConfig,
    concierge::RetryConfig,
    providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL},
    sources::{
        forecast::{ForecastConfig, JMA_AREA, JMA_HOST},
        hotpepper::{HotPepperConfig, HOTPEPPER_HOST, MAX_COUNT},
    },
};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served for any path that is not an API route
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HotPepperSettings {
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    pub count: u32,
}

impl HotPepperSettings {
    pub fn into_config(self) -> HotPepperConfig {
        HotPepperConfig {
            host: self.host,
            api_key: self.api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastSettings {
    pub host: String,
    pub area: String,
}

impl ForecastSettings {
    pub fn into_config(self) -> ForecastConfig {
        ForecastConfig {
            host: self.host,
            area: self.area,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    pub max_tool_rounds: usize,
    pub model_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub recommendations: usize,
    #[serde(default)]
    pub system_prompt: Option<PathBuf>,
}

impl AgentSettings {
    pub fn into_config(self) -> AgentConfig {
        AgentConfig {
            max_tool_rounds: self.max_tool_rounds,
            model_timeout: Duration::from_secs(self.model_timeout_secs),
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            recommendations: self.recommendations,
            system_prompt: self.system_prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_secs: u64,
}

impl RetrySettings {
    pub fn into_config(self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_backoff_ms: self.base_backoff_ms,
            max_backoff_secs: self.max_backoff_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub hotpepper: HotPepperSettings,
    pub forecast: ForecastSettings,
    pub agent: AgentSettings,
    pub retry: RetrySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let agent = AgentConfig::default();
        let retry = RetryConfig::default();

        let config = Config::builder()
            // Server defaults
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // Provider defaults
            .set_default("provider.host", OPENAI_HOST)?
            .set_default("provider.model", OPENAI_MODEL)?
            // Data source defaults
            .set_default("hotpepper.host", HOTPEPPER_HOST)?
            .set_default("hotpepper.count", MAX_COUNT as u64)?
            .set_default("forecast.host", JMA_HOST)?
            .set_default("forecast.area", JMA_AREA)?
            // Conversation defaults
            .set_default("agent.max_tool_rounds", agent.max_tool_rounds as u64)?
            .set_default("agent.model_timeout_secs", agent.model_timeout.as_secs())?
            .set_default("agent.tool_timeout_secs", agent.tool_timeout.as_secs())?
            .set_default("agent.recommendations", agent.recommendations as u64)?
            .set_default("retry.max_retries", retry.max_retries as u64)?
            .set_default("retry.base_backoff_ms", retry.base_backoff_ms)?
            .set_default("retry.max_backoff_secs", retry.max_backoff_secs)?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("GOURMET")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // The conventional variables win over everything else
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("provider.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option(
                "hotpepper.api_key",
                std::env::var("HOTPEPPER_API_KEY").ok(),
            )?
            .build()?;

        let settings: Self = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // Extract field name from error message "missing field `host`"
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                } else if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                return Err(ConfigError::Other(err));
            }
        };

        if settings.provider.api_key.is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: "OPENAI_API_KEY".to_string(),
            });
        }
        if settings.hotpepper.api_key.is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: "HOTPEPPER_API_KEY".to_string(),
            });
        }
        Ok(settings)
    }
}
