use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use super::schema::{ParamKind, ParameterSchema};
use crate::errors::{AgentError, AgentResult};
use crate::location::LocationContext;
use crate::models::content::Content;
use crate::models::tool::Tool;
use crate::sources::{ForecastSource, RestaurantSource};
use crate::sources::hotpepper::MAX_COUNT;

/// Names the model uses to call the built-in tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum ToolName {
    Add,
    Multiply,
    GetForecast,
    GetRestaurant,
}

/// One callable tool.
///
/// The set of tools is closed: each variant carries whatever collaborators it
/// needs and declares its own parameters.
#[derive(Clone)]
pub enum ToolDefinition {
    Add,
    Multiply,
    Forecast(Arc<dyn ForecastSource>),
    RestaurantSearch {
        source: Arc<dyn RestaurantSource>,
        count: u32,
    },
}

#[derive(Debug, Deserialize)]
struct BinaryArgs {
    a: f64,
    b: f64,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(default)]
    count: Option<f64>,
}

impl ToolDefinition {
    pub fn kind(&self) -> ToolName {
        match self {
            ToolDefinition::Add => ToolName::Add,
            ToolDefinition::Multiply => ToolName::Multiply,
            ToolDefinition::Forecast(_) => ToolName::GetForecast,
            ToolDefinition::RestaurantSearch { .. } => ToolName::GetRestaurant,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().into()
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolDefinition::Add => "Adds a and b.",
            ToolDefinition::Multiply => "Multiplies a and b.",
            ToolDefinition::Forecast(_) => "Gets the current weather forecast for Tokyo.",
            ToolDefinition::RestaurantSearch { .. } => {
                "Gets restaurants around the user's current location."
            }
        }
    }

    pub fn schema(&self) -> ParameterSchema {
        match self {
            ToolDefinition::Add | ToolDefinition::Multiply => ParameterSchema::new()
                .required("a", ParamKind::Number, "The first operand")
                .required("b", ParamKind::Number, "The second operand"),
            ToolDefinition::Forecast(_) => ParameterSchema::new(),
            ToolDefinition::RestaurantSearch { .. } => ParameterSchema::new().optional(
                "count",
                ParamKind::Integer,
                "How many restaurants to fetch, at most 100",
            ),
        }
    }

    /// How many times the tool may run within one request, if limited
    pub fn call_limit(&self) -> Option<usize> {
        match self {
            ToolDefinition::RestaurantSearch { .. } => Some(1),
            _ => None,
        }
    }

    /// The declaration sent to the model
    pub fn declaration(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.schema().to_json_schema())
    }

    /// Run the tool. Arguments must already have passed schema validation.
    ///
    /// Failures of the underlying source come back as `ExecutionError`.
    pub(crate) async fn execute(
        &self,
        arguments: &Value,
        location: &LocationContext,
    ) -> AgentResult<Vec<Content>> {
        match self {
            ToolDefinition::Add => {
                let args: BinaryArgs = parse_arguments(arguments)?;
                Ok(vec![Content::text((args.a + args.b).to_string())])
            }
            ToolDefinition::Multiply => {
                let args: BinaryArgs = parse_arguments(arguments)?;
                Ok(vec![Content::text((args.a * args.b).to_string())])
            }
            ToolDefinition::Forecast(source) => {
                let text = source
                    .overview()
                    .await
                    .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
                Ok(vec![Content::text(text)])
            }
            ToolDefinition::RestaurantSearch { source, count } => {
                let args: SearchArgs = parse_arguments(arguments)?;
                let count = args
                    .count
                    .map(|c| c.clamp(1.0, MAX_COUNT as f64) as u32)
                    .unwrap_or(*count);

                let venues = source
                    .search(*location, count)
                    .await
                    .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
                if venues.is_empty() {
                    return Ok(vec![Content::text(
                        "No restaurants were found near the user.",
                    )]);
                }
                let value = serde_json::to_value(venues)
                    .map_err(|e| AgentError::Internal(e.to_string()))?;
                Ok(vec![Content::json(value)])
            }
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: &Value) -> AgentResult<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| AgentError::InvalidParameters(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tool_names() {
        let names: Vec<String> = ToolName::iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["add", "multiply", "getForecast", "getRestaurant"]);
        assert_eq!(ToolName::from_str("getRestaurant").unwrap(), ToolName::GetRestaurant);
    }

    #[test]
    fn test_declaration() {
        let tool = ToolDefinition::Add.declaration();
        assert_eq!(tool.name, "add");
        assert_eq!(tool.description, "Adds a and b.");
        assert_eq!(tool.input_schema["required"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_arithmetic_formats_results() {
        let location = LocationContext::new(Some(0.0), Some(0.0)).unwrap();
        let sum = ToolDefinition::Add
            .execute(&serde_json::json!({"a": 1.5, "b": 1}), &location)
            .await
            .unwrap();
        assert_eq!(sum, vec![Content::text("2.5")]);
    }
}
