use serde::{Deserialize, Serialize};

/// Declaration of a function the model can call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the function parameters
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Create a tool declaration
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
        }
    }
}

/// A model-issued function invocation
///
/// The id is stable for the life of a response and correlates subsequent
/// `tool_result` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Stable identifier
    pub id: String,
    /// Function name
    pub name: String,
    /// Parsed JSON arguments
    pub input: serde_json::Value,
}
