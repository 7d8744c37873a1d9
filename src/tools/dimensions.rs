//! Dimension Tool
//!
//! List, inspect, create and delete dimensions and add elements to them.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, string_list, Tool, ToolOutput};
use crate::backend::MetadataService;
use crate::error::{Result, Tm1Error};
use crate::model::ElementType;

pub struct DimensionTool {
    metadata: Arc<dyn MetadataService>,
}

impl DimensionTool {
    pub fn new(metadata: Arc<dyn MetadataService>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl Tool for DimensionTool {
    fn name(&self) -> String {
        "tm1_dimensions".to_string()
    }

    fn description(&self) -> String {
        "Manage dimensions on the TM1 server. Supports 'list', 'get' (elements with types), \
         'elements' (element names only), 'create', 'delete' and 'add_elements'."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "get", "elements", "create", "delete", "add_elements"],
                    "description": "The action to perform"
                },
                "dimension_name": {
                    "type": "string",
                    "description": "Name of the dimension (all actions except 'list')"
                },
                "elements": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Element names to add (for 'add_elements')"
                },
                "element_type": {
                    "type": "string",
                    "enum": ["Numeric", "String", "Consolidated"],
                    "description": "Type of the new elements (for 'add_elements', default: Numeric)"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;

        match action {
            "list" => {
                let names = self.metadata.dimension_names().await?;
                let summary = format!("{} dimension(s): {}", names.len(), names.join(", "));
                Ok(ToolOutput::success(json!(names), summary))
            }
            "get" => {
                let name = required_str(&params, "dimension_name")?;
                let dimension = self.metadata.get_dimension(name).await?;
                let summary = format!("{} has {} element(s)", dimension.name, dimension.elements.len());
                Ok(ToolOutput::success(serde_json::to_value(&dimension)?, summary))
            }
            "elements" => {
                let name = required_str(&params, "dimension_name")?;
                let dimension = self.metadata.get_dimension(name).await?;
                let names: Vec<String> = dimension.elements.into_iter().map(|e| e.name).collect();
                let summary = format!("{} elements: {}", name, names.join(", "));
                Ok(ToolOutput::success(json!(names), summary))
            }
            "create" => {
                let name = required_str(&params, "dimension_name")?;
                let dimension = self.metadata.create_dimension(name).await?;
                Ok(ToolOutput::success(serde_json::to_value(&dimension)?, format!("Created dimension {}", name)))
            }
            "delete" => {
                let name = required_str(&params, "dimension_name")?;
                self.metadata.delete_dimension(name).await?;
                Ok(ToolOutput::success(json!({ "deleted": name }), format!("Deleted dimension {}", name)))
            }
            "add_elements" => {
                let name = required_str(&params, "dimension_name")?;
                let elements = string_list(&params, "elements")?;
                if elements.iter().any(|e| e.trim().is_empty()) {
                    return Err(Tm1Error::invalid_argument("element names must not be blank"));
                }
                let element_type: ElementType = params["element_type"].as_str().unwrap_or("Numeric").parse()?;

                let dimension = self.metadata.add_elements(name, &elements, element_type).await?;
                let summary = format!(
                    "Added {} {} element(s) to {} ({} total)",
                    elements.len(),
                    element_type,
                    name,
                    dimension.elements.len()
                );
                Ok(ToolOutput::success(serde_json::to_value(&dimension)?, summary))
            }
            other => Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        }
    }
}
