//! Tool System Module
//!
//! Every server operation is exposed as a stateless tool with a JSON schema
//! for its parameters and a JSON-serializable [`ToolOutput`].

mod cells;
mod chores;
mod cubes;
mod dimensions;
mod procedures;
mod query;

pub use cells::{WriteBulkTool, WriteCellTool};
pub use chores::ChoreTool;
pub use cubes::CubeTool;
pub use dimensions::DimensionTool;
pub use procedures::{ProcedureSectionTool, ProcedureTool};
pub use query::QueryTool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{CellWriter, CubeSchemaResolver, DimensionMembershipOracle, MetadataService, ProcedureStore};
use crate::cells::{BulkWriteBatcher, CellWriteEngine};
use crate::error::{Result, Tm1Error};
use crate::procedures::ProcedureSectionEditor;

/// Output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    /// Whether the tool execution was successful
    pub success: bool,
    /// The output data (can be string, JSON object, etc.)
    pub data: Value,
    /// Human-readable summary of the output
    pub summary: String,
    /// Optional error message if success is false
    pub error: Option<String>,
}

impl ToolOutput {
    /// Create a successful output
    pub fn success(data: impl Into<Value>, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            data: data.into(),
            summary: summary.into(),
            error: None,
        }
    }

    /// Create a failed output
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            data: Value::Null,
            summary: format!("Error: {}", error),
            error: Some(error),
        }
    }

    /// A failed output that still carries diagnostic data
    pub fn failure_with(data: impl Into<Value>, error: impl Into<String>) -> Self {
        let mut output = Self::failure(error);
        output.data = data.into();
        output
    }
}

/// A tool call request from the external caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Name of the tool to call
    pub name: String,
    /// Parameters for the tool
    #[serde(default)]
    pub parameters: Value,
    /// Caller-chosen correlation id, echoed back with the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            parameters,
            id: None,
        }
    }
}

/// An action the external caller can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of the tool
    fn name(&self) -> String;

    /// Get a description of what the tool does
    fn description(&self) -> String;

    /// Get the JSON schema for the tool's parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, params: Value) -> Result<ToolOutput>;
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool instance
    pub async fn register_instance<T: Tool + 'static>(&self, tool: T) {
        let mut tools = self.tools.write().await;
        tools.insert(tool.name(), Arc::new(tool));
    }

    /// Register every TM1 tool against one backend.
    pub async fn register_backend<B>(&self, backend: Arc<B>, concurrency: usize)
    where
        B: CubeSchemaResolver + DimensionMembershipOracle + CellWriter + ProcedureStore + MetadataService + 'static,
    {
        let engine = Arc::new(CellWriteEngine::from_backend(backend.clone(), concurrency));
        let batcher = Arc::new(BulkWriteBatcher::from_backend(backend.clone(), concurrency));
        let editor = Arc::new(ProcedureSectionEditor::new(backend.clone()));

        self.register_instance(CubeTool::new(backend.clone(), backend.clone())).await;
        self.register_instance(DimensionTool::new(backend.clone())).await;
        self.register_instance(QueryTool::new(backend.clone())).await;
        self.register_instance(WriteCellTool::new(engine)).await;
        self.register_instance(WriteBulkTool::new(batcher)).await;
        self.register_instance(ProcedureSectionTool::new(editor)).await;
        self.register_instance(ProcedureTool::new(backend.clone(), backend.clone())).await;
        self.register_instance(ChoreTool::new(backend)).await;
    }

    /// Get all tool names, sorted
    pub async fn tool_names(&self) -> Vec<String> {
        let tools = self.tools.read().await;
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name, description and parameter schema of every tool
    pub async fn catalog(&self) -> Value {
        let tools = self.tools.read().await;
        let mut names: Vec<&String> = tools.keys().collect();
        names.sort();

        let entries: Vec<Value> = names
            .into_iter()
            .map(|name| {
                let tool = &tools[name];
                json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters(),
                })
            })
            .collect();
        Value::Array(entries)
    }

    /// Get a specific tool by name
    pub async fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = self.get_tool(&call.name).await;

        match tool {
            Some(tool) => {
                debug!("Executing tool {}", call.name);
                tool.execute(call.parameters.clone()).await
            }
            None => Ok(ToolOutput::failure(format!("Unknown tool: {}", call.name))),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Tm1Error::invalid_argument(format!("Missing required parameter: {}", key)))
}

pub(crate) fn string_list(params: &Value, key: &str) -> Result<Vec<String>> {
    let items = params[key]
        .as_array()
        .ok_or_else(|| Tm1Error::invalid_argument(format!("Parameter '{}' must be an array of strings", key)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Tm1Error::invalid_argument(format!("Parameter '{}' must contain only strings", key)))
        })
        .collect()
}
