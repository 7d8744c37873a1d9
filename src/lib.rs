//! TM1 Agency
//!
//! Exposes a TM1 / Planning Analytics server as callable tools:
//! - Coordinate-validated single and bulk cell writes
//! - Section-addressed procedure (process) editing
//! - Cube, dimension, view, procedure and chore passthroughs

pub mod backend;
pub mod cells;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod procedures;
pub mod tools;
pub mod utils;

// Re-exports for convenience
pub use cells::{BulkWriteBatcher, BulkWriteOutcome, CellWriteEngine, CoordinateValidator, WriteOutcome};
pub use client::Tm1Client;
pub use config::Tm1Config;
pub use error::{Result, Tm1Error};
pub use procedures::ProcedureSectionEditor;
pub use tools::{ToolCall, ToolOutput, ToolRegistry};
