//! Procedure (TM1 process) model
//!
//! A procedure owns exactly four script sections. Section names are a closed
//! enum; anything else fails to parse with [`Tm1Error::InvalidSection`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Tm1Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Prolog,
    Metadata,
    Data,
    Epilog,
}

impl Section {
    /// Lifecycle order
    pub const ALL: [Section; 4] = [Section::Prolog, Section::Metadata, Section::Data, Section::Epilog];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Prolog => "prolog",
            Section::Metadata => "metadata",
            Section::Data => "data",
            Section::Epilog => "epilog",
        }
    }
}

impl FromStr for Section {
    type Err = Tm1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prolog" => Ok(Section::Prolog),
            "metadata" => Ok(Section::Metadata),
            "data" => Ok(Section::Data),
            "epilog" => Ok(Section::Epilog),
            _ => Err(Tm1Error::InvalidSection(s.to_string())),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    Append,
    Overwrite,
}

/// A stored procedure, serialized with the server's field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PrologProcedure", default)]
    pub prolog: String,
    #[serde(rename = "MetadataProcedure", default)]
    pub metadata: String,
    #[serde(rename = "DataProcedure", default)]
    pub data: String,
    #[serde(rename = "EpilogProcedure", default)]
    pub epilog: String,
}

impl Procedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Prolog => &self.prolog,
            Section::Metadata => &self.metadata,
            Section::Data => &self.data,
            Section::Epilog => &self.epilog,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Prolog => &mut self.prolog,
            Section::Metadata => &mut self.metadata,
            Section::Data => &mut self.data,
            Section::Epilog => &mut self.epilog,
        }
    }

    /// Apply `text` to one section in place.
    pub fn apply(&mut self, section: Section, text: &str, mode: EditMode) {
        let target = self.section_mut(section);
        match mode {
            EditMode::Append => target.push_str(text),
            EditMode::Overwrite => {
                target.clear();
                target.push_str(text);
            }
        }
    }
}
