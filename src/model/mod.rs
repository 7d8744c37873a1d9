//! Data Model
//!
//! Typed cube addresses, cell values, procedures and server objects.

mod coordinate;
mod objects;
mod procedure;

pub use coordinate::{BulkWriteRequest, CellValue, CoordinateTuple, Scalar};
pub use objects::{CellSet, Chore, Cube, Dimension, Element, ElementType};
pub use procedure::{EditMode, Procedure, Section};
