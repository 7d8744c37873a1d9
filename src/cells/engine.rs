//! Cell Write Engine
//!
//! Resolve schema, validate, then write a single cell. The remote mutation is
//! only issued once every coordinate position has been confirmed.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::validator::{CoordinateValidator, PositionFailure};
use crate::backend::{CellWriter, CubeSchemaResolver, DimensionMembershipOracle};
use crate::error::Result;
use crate::model::{CellValue, CoordinateTuple};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    Success,
    ValidationFailure {
        cube: String,
        coordinate: CoordinateTuple,
        failures: Vec<PositionFailure>,
    },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success)
    }
}

pub struct CellWriteEngine {
    resolver: Arc<dyn CubeSchemaResolver>,
    validator: CoordinateValidator,
    writer: Arc<dyn CellWriter>,
}

impl CellWriteEngine {
    pub fn new(
        resolver: Arc<dyn CubeSchemaResolver>,
        oracle: Arc<dyn DimensionMembershipOracle>,
        writer: Arc<dyn CellWriter>,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            validator: CoordinateValidator::new(oracle, concurrency),
            writer,
        }
    }

    /// Wire every capability to one backend.
    pub fn from_backend<B>(backend: Arc<B>, concurrency: usize) -> Self
    where
        B: CubeSchemaResolver + DimensionMembershipOracle + CellWriter + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, concurrency)
    }

    pub async fn write_cell(&self, cube: &str, coordinate: &CoordinateTuple, value: &CellValue) -> Result<WriteOutcome> {
        let dimensions = self.resolver.cube_dimensions(cube).await?;
        let validation = self.validator.validate(&dimensions, coordinate).await?;

        if !validation.is_valid() {
            warn!(
                "Rejected write to {} at {}: {} invalid position(s)",
                cube,
                coordinate,
                validation.failures.len()
            );
            return Ok(WriteOutcome::ValidationFailure {
                cube: cube.to_string(),
                coordinate: coordinate.clone(),
                failures: validation.failures,
            });
        }

        self.writer.write_cell(cube, &dimensions, coordinate, value).await?;
        info!("Wrote {} to {} at {}", value, cube, coordinate);
        Ok(WriteOutcome::Success)
    }
}
