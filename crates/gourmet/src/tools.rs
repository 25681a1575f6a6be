use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::location::LocationContext;
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::sources::{ForecastSource, RestaurantSource};

mod definition;
pub mod schema;

pub use definition::{ToolDefinition, ToolName};

/// The tools the model may call, registered once at startup
#[derive(Clone, Default)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the arithmetic, forecast and restaurant search tools
    pub fn with_builtins(
        forecast: Arc<dyn ForecastSource>,
        restaurants: Arc<dyn RestaurantSource>,
        restaurant_count: u32,
    ) -> AgentResult<Self> {
        let mut registry = Self::new();
        registry.register(ToolDefinition::Add)?;
        registry.register(ToolDefinition::Multiply)?;
        registry.register(ToolDefinition::Forecast(forecast))?;
        registry.register(ToolDefinition::RestaurantSearch {
            source: restaurants,
            count: restaurant_count,
        })?;
        Ok(registry)
    }

    pub fn register(&mut self, definition: ToolDefinition) -> AgentResult<()> {
        if self.get(definition.name()).is_some() {
            return Err(AgentError::DuplicateTool(definition.name().to_string()));
        }
        self.definitions.push(definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    /// Declarations for the model, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.definitions.iter().map(|d| d.declaration()).collect()
    }

    /// Resolve, validate and run one tool call.
    ///
    /// Unknown tools and bad arguments are errors and nothing is executed. A
    /// failure inside the tool itself still produces a tool result message,
    /// carrying the failure, so the model can react to it.
    pub async fn invoke(
        &self,
        request_id: &str,
        call: &ToolCall,
        location: &LocationContext,
    ) -> AgentResult<Message> {
        let definition = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        definition.schema().validate(&call.arguments)?;

        let result = match definition.execute(&call.arguments, location).await {
            Err(e @ AgentError::InvalidParameters(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool execution failed");
                Err(e)
            }
            Ok(contents) => Ok(contents),
        };

        Ok(Message::tool().with_tool_response(request_id, &call.name, result))
    }
}
