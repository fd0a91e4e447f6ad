use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use agentdesk_llm_api::ToolDefinition;

use crate::tool_context::ToolContext;

/// Arguments of one tool call, as the model sent them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParameters {
    values: Map<String, Value>,
}

impl ToolParameters {
    /// Parse a model's argument string. Blank input and `null` both mean "no arguments".
    pub fn from_json(arguments: &str) -> Result<Self> {
        let arguments = arguments.trim();
        if arguments.is_empty() {
            return Ok(Self::default());
        }
        Self::from_value(serde_json::from_str(arguments)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => bail!("Tool arguments must be a JSON object, got: {}", other),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn get_required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .lookup(key)
            .ok_or_else(|| anyhow!("Required parameter '{}' missing", key))?;
        decode(key, value)
    }

    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.lookup(key).map(|value| decode(key, value)).transpose()
    }

    // explicit nulls count as absent
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    T::deserialize(value).with_context(|| format!("Invalid value for parameter '{}'", key))
}

/// Outcome of a tool call. A tool never fails the agent loop; errors go back to the model as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Text handed back to the model as the tool message
    pub fn to_message(&self) -> String {
        match &self.error {
            Some(error) => format!("Error: {}", error),
            None => self.content.clone(),
        }
    }
}

/// JSON schema type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterDefinition {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn property(&self) -> Value {
        let mut property = json!({ "type": self.kind, "description": self.description });
        if let Some(default) = &self.default {
            property["default"] = default.clone();
        }
        property
    }
}

/// Build the object schema for a parameter list. Properties and `required`
/// are ordered by name so the prompt is identical between calls.
pub fn object_schema(parameters: &[ParameterDefinition]) -> Value {
    let mut sorted: Vec<&ParameterDefinition> = parameters.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let properties: Map<String, Value> = sorted
        .iter()
        .map(|p| (p.name.clone(), p.property()))
        .collect();
    let required: Vec<&str> = sorted
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    json!({ "type": "object", "properties": properties, "required": required })
}

/// Something an agent can call during its tool loop
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> Vec<ParameterDefinition>;

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: object_schema(&self.parameters()),
        }
    }
}

/// Shorthand for a [`ParameterDefinition`]:
/// `param!("path", String, "desc", required)`, `param!("n", Integer, "desc", optional)`
/// or `param!("n", Integer, "desc", default = 5)`.
#[macro_export]
macro_rules! param {
    ($name:expr, $kind:ident, $desc:expr, required) => {
        $crate::ParameterDefinition::required($name, $crate::ParamKind::$kind, $desc)
    };
    ($name:expr, $kind:ident, $desc:expr, optional) => {
        $crate::ParameterDefinition::optional($name, $crate::ParamKind::$kind, $desc)
    };
    ($name:expr, $kind:ident, $desc:expr, default = $default:expr) => {
        $crate::ParameterDefinition::optional($name, $crate::ParamKind::$kind, $desc)
            .with_default($default)
    };
}
