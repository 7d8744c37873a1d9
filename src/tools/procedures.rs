//! Procedure Tools
//!
//! Section-addressed editing of procedure scripts, plus listing, fetching
//! and deleting whole procedures.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, Tool, ToolOutput};
use crate::backend::{MetadataService, ProcedureStore};
use crate::error::{Result, Tm1Error};
use crate::model::{EditMode, Section};
use crate::procedures::ProcedureSectionEditor;
use crate::utils::truncate::{truncate_text, SUMMARY_BYTES};

pub struct ProcedureSectionTool {
    editor: Arc<ProcedureSectionEditor>,
}

impl ProcedureSectionTool {
    pub fn new(editor: Arc<ProcedureSectionEditor>) -> Self {
        Self { editor }
    }
}

#[async_trait]
impl Tool for ProcedureSectionTool {
    fn name(&self) -> String {
        "tm1_procedure_section".to_string()
    }

    fn description(&self) -> String {
        "Read or edit one section (prolog, metadata, data, epilog) of a TM1 process. \
         'append' adds text to the end of the section, 'overwrite' replaces it. \
         Other sections are left untouched."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["get", "append", "overwrite"],
                    "description": "The action to perform"
                },
                "procedure_name": {
                    "type": "string",
                    "description": "Name of the process"
                },
                "section": {
                    "type": "string",
                    "enum": ["prolog", "metadata", "data", "epilog"],
                    "description": "Section to read or edit"
                },
                "text": {
                    "type": "string",
                    "description": "Script text (for 'append' and 'overwrite')"
                }
            },
            "required": ["action", "procedure_name", "section"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;
        let name = required_str(&params, "procedure_name")?;
        let section = match params["section"]
            .as_str()
            .ok_or_else(|| Tm1Error::invalid_argument("Missing required parameter: section"))?
            .parse::<Section>()
        {
            Ok(section) => section,
            Err(e @ Tm1Error::InvalidSection(_)) => return Ok(ToolOutput::failure(e.to_string())),
            Err(e) => return Err(e),
        };

        let mode = match action {
            "get" => {
                let text = self.editor.read(name, section).await?;
                let summary = truncate_text(&text, SUMMARY_BYTES);
                return Ok(ToolOutput::success(Value::String(text), summary));
            }
            "append" => EditMode::Append,
            "overwrite" => EditMode::Overwrite,
            other => return Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        };

        let text = params["text"]
            .as_str()
            .ok_or_else(|| Tm1Error::invalid_argument("Missing required parameter: text"))?;
        let procedure = self.editor.edit(name, section, text, mode).await?;
        Ok(ToolOutput::success(
            serde_json::to_value(&procedure)?,
            format!("Updated {} section of {}", section, name),
        ))
    }
}

pub struct ProcedureTool {
    metadata: Arc<dyn MetadataService>,
    store: Arc<dyn ProcedureStore>,
}

impl ProcedureTool {
    pub fn new(metadata: Arc<dyn MetadataService>, store: Arc<dyn ProcedureStore>) -> Self {
        Self { metadata, store }
    }
}

#[async_trait]
impl Tool for ProcedureTool {
    fn name(&self) -> String {
        "tm1_procedures".to_string()
    }

    fn description(&self) -> String {
        "List, fetch or delete TM1 processes. 'get' returns all four script sections.".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "get", "delete"],
                    "description": "The action to perform"
                },
                "procedure_name": {
                    "type": "string",
                    "description": "Name of the process (for 'get' and 'delete')"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;

        match action {
            "list" => {
                let names = self.metadata.procedure_names().await?;
                let summary = format!("{} process(es): {}", names.len(), names.join(", "));
                Ok(ToolOutput::success(json!(names), summary))
            }
            "get" => {
                let name = required_str(&params, "procedure_name")?;
                let procedure = self.store.get_procedure(name).await?;
                Ok(ToolOutput::success(serde_json::to_value(&procedure)?, format!("Fetched process {}", name)))
            }
            "delete" => {
                let name = required_str(&params, "procedure_name")?;
                self.metadata.delete_procedure(name).await?;
                Ok(ToolOutput::success(json!({ "deleted": name }), format!("Deleted process {}", name)))
            }
            other => Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        }
    }
}
