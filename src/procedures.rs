//! Procedure Section Editor
//!
//! Reads and edits one of a procedure's four script sections, then persists
//! the whole procedure back so untouched sections survive unchanged.

use std::sync::Arc;
use tracing::info;

use crate::backend::ProcedureStore;
use crate::error::Result;
use crate::model::{EditMode, Procedure, Section};

pub struct ProcedureSectionEditor {
    store: Arc<dyn ProcedureStore>,
}

impl ProcedureSectionEditor {
    pub fn new(store: Arc<dyn ProcedureStore>) -> Self {
        Self { store }
    }

    pub async fn get_section(&self, procedure: &str, section: &str) -> Result<String> {
        let section: Section = section.parse()?;
        self.read(procedure, section).await
    }

    pub async fn read(&self, procedure: &str, section: Section) -> Result<String> {
        let proc = self.store.get_procedure(procedure).await?;
        Ok(proc.section(section).to_string())
    }

    /// Section names are parsed before anything is fetched, so an invalid
    /// name never reaches the store.
    pub async fn edit_section(&self, procedure: &str, section: &str, text: &str, mode: EditMode) -> Result<Procedure> {
        let section: Section = section.parse()?;
        self.edit(procedure, section, text, mode).await
    }

    pub async fn edit(&self, procedure: &str, section: Section, text: &str, mode: EditMode) -> Result<Procedure> {
        let mut proc = self.store.get_procedure(procedure).await?;
        proc.apply(section, text, mode);
        self.store.update_procedure(&proc).await?;

        info!("Updated {} section of {} ({:?}, {} bytes)", section, procedure, mode, text.len());
        Ok(proc)
    }
}
