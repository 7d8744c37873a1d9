//! Cube Tool
//!
//! List, inspect, create and delete cubes.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, string_list, Tool, ToolOutput};
use crate::backend::{CubeSchemaResolver, MetadataService};
use crate::error::{Result, Tm1Error};
use crate::model::Cube;

pub struct CubeTool {
    metadata: Arc<dyn MetadataService>,
    resolver: Arc<dyn CubeSchemaResolver>,
}

impl CubeTool {
    pub fn new(metadata: Arc<dyn MetadataService>, resolver: Arc<dyn CubeSchemaResolver>) -> Self {
        Self { metadata, resolver }
    }
}

#[async_trait]
impl Tool for CubeTool {
    fn name(&self) -> String {
        "tm1_cubes".to_string()
    }

    fn description(&self) -> String {
        "Manage cubes on the TM1 server. 'list' returns all cube names, 'dimensions' returns a cube's \
         dimensions in coordinate order, 'create' builds a cube from an ordered dimension list \
         (measure dimension last, others in ascending size), 'delete' removes a cube."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "dimensions", "create", "delete"],
                    "description": "The action to perform"
                },
                "cube_name": {
                    "type": "string",
                    "description": "Name of the cube (all actions except 'list')"
                },
                "dimensions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ordered dimension names (for 'create')"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?;

        match action {
            "list" => {
                let cubes = self.metadata.cube_names().await?;
                let summary = format!("{} cube(s): {}", cubes.len(), cubes.join(", "));
                Ok(ToolOutput::success(json!(cubes), summary))
            }
            "dimensions" => {
                let cube = required_str(&params, "cube_name")?;
                let dimensions = self.resolver.cube_dimensions(cube).await?;
                let summary = format!("{} dimensions: {}", cube, dimensions.join(", "));
                Ok(ToolOutput::success(json!(dimensions), summary))
            }
            "create" => {
                let cube = Cube {
                    name: required_str(&params, "cube_name")?.to_string(),
                    dimensions: string_list(&params, "dimensions")?,
                };
                if cube.dimensions.len() < 2 {
                    return Err(Tm1Error::invalid_argument("a cube needs at least two dimensions"));
                }
                self.metadata.create_cube(&cube).await?;
                let summary = format!("Created cube {} over {}", cube.name, cube.dimensions.join(" x "));
                Ok(ToolOutput::success(serde_json::to_value(&cube)?, summary))
            }
            "delete" => {
                let cube = required_str(&params, "cube_name")?;
                self.metadata.delete_cube(cube).await?;
                Ok(ToolOutput::success(json!({ "deleted": cube }), format!("Deleted cube {}", cube)))
            }
            other => Err(Tm1Error::invalid_argument(format!("Unknown action: {}", other))),
        }
    }
}
