//! Cell Write Tools
//!
//! Single-cell and bulk writes. Both validate every coordinate against the
//! cube's dimensions before anything is written.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{required_str, string_list, Tool, ToolOutput};
use crate::cells::{BulkWriteBatcher, BulkWriteOutcome, CellWriteEngine, PositionFailure, WriteOutcome};
use crate::error::{Result, Tm1Error};
use crate::model::{CellValue, CoordinateTuple};

const WRITE_OK: &str = "Success!";
const WRITE_REJECTED: &str = "Failed, check dimension element order";

fn describe(failures: &[PositionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}='{}'", f.dimension, f.element))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_coordinate(value: &Value, key: &str) -> Result<CoordinateTuple> {
    CoordinateTuple::new(string_list(value, key)?)
}

pub struct WriteCellTool {
    engine: Arc<CellWriteEngine>,
}

impl WriteCellTool {
    pub fn new(engine: Arc<CellWriteEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for WriteCellTool {
    fn name(&self) -> String {
        "tm1_write_cell".to_string()
    }

    fn description(&self) -> String {
        "Write one value into a cube cell. Coordinates must list one element per cube dimension, \
         in the cube's dimension order; nothing is written if any element does not exist."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cube_name": {
                    "type": "string",
                    "description": "Name of the cube to write to"
                },
                "coordinates": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Element names, one per dimension, in dimension order"
                },
                "value": {
                    "type": ["number", "string"],
                    "description": "Value to write"
                }
            },
            "required": ["cube_name", "coordinates", "value"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let cube = required_str(&params, "cube_name")?;
        let coordinate = parse_coordinate(&params, "coordinates")?;
        let value = CellValue::from_json(&params["value"])?;

        let outcome = self.engine.write_cell(cube, &coordinate, &value).await?;
        match &outcome {
            WriteOutcome::Success => Ok(ToolOutput::success(
                json!({ "status": "success", "cube": cube, "coordinate": coordinate, "value": value }),
                WRITE_OK,
            )),
            WriteOutcome::ValidationFailure { failures, .. } => Ok(ToolOutput::failure_with(
                serde_json::to_value(&outcome)?,
                format!("{}: {}", WRITE_REJECTED, describe(failures)),
            )),
        }
    }
}

pub struct WriteBulkTool {
    batcher: Arc<BulkWriteBatcher>,
}

impl WriteBulkTool {
    pub fn new(batcher: Arc<BulkWriteBatcher>) -> Self {
        Self { batcher }
    }
}

#[async_trait]
impl Tool for WriteBulkTool {
    fn name(&self) -> String {
        "tm1_write_bulk".to_string()
    }

    fn description(&self) -> String {
        "Write many cells of one cube in a single request. All records are validated first; \
         if any coordinate is invalid the whole batch is rejected and nothing is written. \
         A coordinate repeated in the batch keeps its last value."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cube_name": {
                    "type": "string",
                    "description": "Name of the cube to write to"
                },
                "records": {
                    "type": "array",
                    "description": "Cells to write",
                    "items": {
                        "type": "object",
                        "properties": {
                            "coordinates": { "type": "array", "items": { "type": "string" } },
                            "value": { "type": ["number", "string"] }
                        },
                        "required": ["coordinates", "value"]
                    }
                }
            },
            "required": ["cube_name", "records"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let cube = required_str(&params, "cube_name")?;
        let records = params["records"]
            .as_array()
            .ok_or_else(|| Tm1Error::invalid_argument("Missing required parameter: records"))?
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let coordinate = parse_coordinate(record, "coordinates")
                    .map_err(|e| Tm1Error::invalid_argument(format!("record {}: {}", i, e)))?;
                let value = CellValue::from_json(&record["value"])
                    .map_err(|e| Tm1Error::invalid_argument(format!("record {}: {}", i, e)))?;
                Ok((coordinate, value))
            })
            .collect::<Result<Vec<_>>>()?;
        let submitted = records.len();

        let outcome = self.batcher.write_bulk(cube, records).await?;
        match &outcome {
            BulkWriteOutcome::Committed { count } => Ok(ToolOutput::success(
                serde_json::to_value(&outcome)?,
                format!("Wrote {} cell(s) to {} ({} record(s) submitted)", count, cube, submitted),
            )),
            BulkWriteOutcome::Rejected { rejected, .. } => {
                let detail = rejected
                    .iter()
                    .map(|r| format!("{} -> {}", r.coordinate, describe(&r.failures)))
                    .collect::<Vec<_>>()
                    .join("; ");
                Ok(ToolOutput::failure_with(
                    serde_json::to_value(&outcome)?,
                    format!("{}; {} record(s) rejected, nothing written: {}", WRITE_REJECTED, rejected.len(), detail),
                ))
            }
        }
    }
}
