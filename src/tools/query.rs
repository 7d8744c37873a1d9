//! Query Tool
//!
//! Runs a stored view or an MDX statement on the server and returns the
//! result as CSV.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, Tool, ToolOutput};
use crate::backend::MetadataService;
use crate::error::{Result, Tm1Error};
use crate::utils::truncate::{truncate_text, SUMMARY_BYTES};

pub struct QueryTool {
    metadata: Arc<dyn MetadataService>,
}

impl QueryTool {
    pub fn new(metadata: Arc<dyn MetadataService>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> String {
        "tm1_query".to_string()
    }

    fn description(&self) -> String {
        "Read cube data. 'view' executes a saved view of a cube, 'mdx' executes an MDX query. \
         Both return CSV with row members in the first column."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["view", "mdx"],
                    "description": "The kind of query"
                },
                "cube_name": {
                    "type": "string",
                    "description": "Cube that owns the view (for 'view')"
                },
                "view_name": {
                    "type": "string",
                    "description": "Name of the view (for 'view')"
                },
                "mdx": {
                    "type": "string",
                    "description": "MDX query string (for 'mdx')"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;

        let cellset = match action {
            "view" => {
                let cube = required_str(&params, "cube_name")?;
                let view = required_str(&params, "view_name")?;
                self.metadata.execute_view(cube, view).await?
            }
            "mdx" => {
                let mdx = required_str(&params, "mdx")?;
                self.metadata.execute_mdx(mdx).await?
            }
            other => return Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        };

        let csv = cellset.to_csv();
        let summary = format!(
            "{} row(s) x {} column(s)\n\n{}",
            cellset.rows.len(),
            cellset.columns.len(),
            truncate_text(&csv, SUMMARY_BYTES)
        );
        Ok(ToolOutput::success(Value::String(csv), summary))
    }
}
