//! Server object types returned by the passthrough actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Tm1Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube {
    pub name: String,
    /// Ordered; the last one is the measure dimension by convention
    pub dimensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Numeric,
    String,
    Consolidated,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Numeric => "Numeric",
            ElementType::String => "String",
            ElementType::Consolidated => "Consolidated",
        }
    }
}

impl FromStr for ElementType {
    type Err = Tm1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "n" => Ok(ElementType::Numeric),
            "string" | "s" => Ok(ElementType::String),
            "consolidated" | "c" => Ok(ElementType::Consolidated),
            _ => Err(Tm1Error::invalid_argument(format!(
                "unknown element type '{}', expected Numeric, String or Consolidated",
                s
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub element_type: ElementType,
}

impl Element {
    pub fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self { name: name.into(), element_type }
    }
}

/// A dimension with its default hierarchy's elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub elements: Vec<Element>,
}

/// A scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Active", default)]
    pub active: bool,
    #[serde(rename = "StartTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// ISO-8601 style duration as the server reports it, e.g. `P1DT00H00M00S`
    #[serde(rename = "Frequency", default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

/// A two-axis query result: column tuples, row tuples and a dense value grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSet {
    pub columns: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// `values[row][column]`; `None` for cells the server left out
    pub values: Vec<Vec<Option<serde_json::Value>>>,
}

impl CellSet {
    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().map(|t| t.join(":")));
        push_csv_line(&mut out, &header);

        for (r, values) in self.values.iter().enumerate() {
            let mut line = vec![self.rows.get(r).map(|t| t.join(":")).unwrap_or_default()];
            line.extend(values.iter().map(|v| match v {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            }));
            push_csv_line(&mut out, &line);
        }
        out
    }
}

fn push_csv_line(out: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields
        .iter()
        .map(|f| {
            if f.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.clone()
            }
        })
        .collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}
