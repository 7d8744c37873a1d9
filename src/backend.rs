//! Backend Capabilities
//!
//! The seams between the cell-write core and the remote server. `Tm1Client`
//! implements all of them; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{BulkWriteRequest, CellSet, CellValue, Chore, CoordinateTuple, Cube, Dimension, ElementType, Procedure};

/// Resolves a cube name to its ordered dimension names.
#[async_trait]
pub trait CubeSchemaResolver: Send + Sync {
    /// Fails with `NotFound` if the cube does not exist.
    async fn cube_dimensions(&self, cube: &str) -> Result<Vec<String>>;
}

/// Answers element membership questions for a dimension's default hierarchy.
#[async_trait]
pub trait DimensionMembershipOracle: Send + Sync {
    /// `Ok(false)` when the element is absent; `NotFound` only when the
    /// dimension itself is missing.
    async fn element_exists(&self, dimension: &str, element: &str) -> Result<bool>;
}

/// Remote cell mutation.
///
/// `dimensions` is the cube's resolved dimension order, positionally aligned
/// with every coordinate passed alongside it.
#[async_trait]
pub trait CellWriter: Send + Sync {
    async fn write_cell(
        &self,
        cube: &str,
        dimensions: &[String],
        coordinate: &CoordinateTuple,
        value: &CellValue,
    ) -> Result<()>;

    /// Submit every cell of `request` in one remote call.
    async fn write_cells(&self, cube: &str, dimensions: &[String], request: &BulkWriteRequest) -> Result<()>;
}

/// Whole-object procedure persistence.
#[async_trait]
pub trait ProcedureStore: Send + Sync {
    async fn get_procedure(&self, name: &str) -> Result<Procedure>;

    async fn update_procedure(&self, procedure: &Procedure) -> Result<()>;
}

/// Object listing, creation, deletion and queries exposed as plain passthroughs.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn cube_names(&self) -> Result<Vec<String>>;
    async fn create_cube(&self, cube: &Cube) -> Result<()>;
    async fn delete_cube(&self, name: &str) -> Result<()>;

    async fn dimension_names(&self) -> Result<Vec<String>>;
    async fn get_dimension(&self, name: &str) -> Result<Dimension>;
    async fn create_dimension(&self, name: &str) -> Result<Dimension>;
    async fn delete_dimension(&self, name: &str) -> Result<()>;
    /// Adds elements to the default hierarchy, leaving existing ones in place.
    async fn add_elements(&self, dimension: &str, elements: &[String], element_type: ElementType) -> Result<Dimension>;

    async fn execute_view(&self, cube: &str, view: &str) -> Result<CellSet>;
    async fn execute_mdx(&self, mdx: &str) -> Result<CellSet>;

    async fn procedure_names(&self) -> Result<Vec<String>>;
    async fn delete_procedure(&self, name: &str) -> Result<()>;

    async fn chores(&self) -> Result<Vec<Chore>>;
    async fn get_chore(&self, name: &str) -> Result<Chore>;
    async fn set_chore_active(&self, name: &str, active: bool) -> Result<()>;
}
