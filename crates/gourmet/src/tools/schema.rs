use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Number,
    Integer,
    String,
    Boolean,
}

impl ParamKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|v| v.fract() == 0.0)
            }
            ParamKind::String => value.is_string(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

/// The declared shape of a tool's arguments.
///
/// Rendered as JSON Schema for the model and used to check the arguments the
/// model sends back before anything is executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    parameters: Vec<Parameter>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.with(Parameter {
            name,
            kind,
            required: true,
            description,
        })
    }

    pub fn optional(self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.with(Parameter {
            name,
            kind,
            required: false,
            description,
        })
    }

    fn with(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.parameters {
            properties.insert(
                p.name.to_string(),
                json!({ "type": p.kind, "description": p.description }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check `arguments` against the declared parameters.
    ///
    /// `null` is treated as an empty object. Fields the schema doesn't mention are ignored.
    pub fn validate(&self, arguments: &Value) -> AgentResult<()> {
        let empty = Map::new();
        let fields = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(AgentError::InvalidParameters(format!(
                    "arguments must be a JSON object, got {}",
                    other
                )))
            }
        };

        for p in &self.parameters {
            match fields.get(p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(AgentError::InvalidParameters(format!(
                        "missing required parameter '{}'",
                        p.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(value) if !p.kind.accepts(value) => {
                    return Err(AgentError::InvalidParameters(format!(
                        "parameter '{}' must be of type {:?}, got {}",
                        p.name, p.kind, value
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
