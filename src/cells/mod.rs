//! Coordinate-validated cell mutation.

mod bulk;
mod engine;
mod validator;

pub use bulk::{BulkWriteBatcher, BulkWriteOutcome, RecordFailure};
pub use engine::{CellWriteEngine, WriteOutcome};
pub use validator::{CoordinateValidator, PositionFailure, ValidationResult};
