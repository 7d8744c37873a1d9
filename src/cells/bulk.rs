//! Bulk Write Batcher
//!
//! Validate-all-then-commit-all: the schema is resolved once per batch, every
//! record is validated, and only a fully valid batch is submitted, as one
//! remote mutation. A single bad record rejects the whole batch.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::validator::{CoordinateValidator, PositionFailure};
use crate::backend::{CellWriter, CubeSchemaResolver, DimensionMembershipOracle};
use crate::error::Result;
use crate::model::{BulkWriteRequest, CellValue, CoordinateTuple};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub coordinate: CoordinateTuple,
    pub failures: Vec<PositionFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkWriteOutcome {
    /// Number of distinct cells submitted
    Committed { count: usize },
    /// Nothing was written
    Rejected { cube: String, rejected: Vec<RecordFailure> },
}

pub struct BulkWriteBatcher {
    resolver: Arc<dyn CubeSchemaResolver>,
    validator: CoordinateValidator,
    writer: Arc<dyn CellWriter>,
}

impl BulkWriteBatcher {
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

    pub fn from_backend<B>(backend: Arc<B>, concurrency: usize) -> Self
    where
        B: CubeSchemaResolver + DimensionMembershipOracle + CellWriter + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, concurrency)
    }

    /// Key `records` by coordinate (last value wins) and write them.
    pub async fn write_bulk<I>(&self, cube: &str, records: I) -> Result<BulkWriteOutcome>
    where
        I: IntoIterator<Item = (CoordinateTuple, CellValue)>,
    {
        let request = BulkWriteRequest::from_records(records);
        self.write_request(cube, &request).await
    }

    pub async fn write_request(&self, cube: &str, request: &BulkWriteRequest) -> Result<BulkWriteOutcome> {
        let dimensions = self.resolver.cube_dimensions(cube).await?;
        let results = self.validator.validate_many(&dimensions, request.coordinates()).await?;

        let rejected: Vec<RecordFailure> = request
            .coordinates()
            .zip(results)
            .filter(|(_, result)| !result.is_valid())
            .map(|(coordinate, result)| RecordFailure {
                coordinate: coordinate.clone(),
                failures: result.failures,
            })
            .collect();

        if !rejected.is_empty() {
            warn!(
                "Rejected bulk write to {}: {} of {} record(s) invalid",
                cube,
                rejected.len(),
                request.len()
            );
            return Ok(BulkWriteOutcome::Rejected {
                cube: cube.to_string(),
                rejected,
            });
        }

        if request.is_empty() {
            return Ok(BulkWriteOutcome::Committed { count: 0 });
        }

        self.writer.write_cells(cube, &dimensions, request).await?;
        info!("Committed {} cell(s) to {}", request.len(), cube);
        Ok(BulkWriteOutcome::Committed { count: request.len() })
    }
}
