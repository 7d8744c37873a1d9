//! Chore Tool
//!
//! Inspect scheduled jobs and switch them on or off.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, Tool, ToolOutput};
use crate::backend::MetadataService;
use crate::error::{Result, Tm1Error};

pub struct ChoreTool {
    metadata: Arc<dyn MetadataService>,
}

impl ChoreTool {
    pub fn new(metadata: Arc<dyn MetadataService>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl Tool for ChoreTool {
    fn name(&self) -> String {
        "tm1_chores".to_string()
    }

    fn description(&self) -> String {
        "Manage scheduled chores: 'list', 'get', 'activate' or 'deactivate'.".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "get", "activate", "deactivate"],
                    "description": "The action to perform"
                },
                "chore_name": {
                    "type": "string",
                    "description": "Name of the chore (all actions except 'list')"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;

        match action {
            "list" => {
                let chores = self.metadata.chores().await?;
                let active = chores.iter().filter(|c| c.active).count();
                let summary = format!("{} chore(s), {} active", chores.len(), active);
                Ok(ToolOutput::success(serde_json::to_value(&chores)?, summary))
            }
            "get" => {
                let name = required_str(&params, "chore_name")?;
                let chore = self.metadata.get_chore(name).await?;
                let summary = format!("{} is {}", chore.name, if chore.active { "active" } else { "inactive" });
                Ok(ToolOutput::success(serde_json::to_value(&chore)?, summary))
            }
            "activate" | "deactivate" => {
                let name = required_str(&params, "chore_name")?;
                let active = action == "activate";
                self.metadata.set_chore_active(name, active).await?;
                Ok(ToolOutput::success(
                    json!({ "chore": name, "active": active }),
                    format!("Chore {} {}d", name, action),
                ))
            }
            other => Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        }
    }
}
