//! Cell addressing types
//!
//! `CoordinateTuple` and `CellValue` are checked when they are built, so the
//! write path only ever sees well-formed addresses and finite numbers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, Tm1Error};

/// Ordered element names, one per cube dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CoordinateTuple(Vec<String>);

impl CoordinateTuple {
    /// Build a tuple; every element name must be non-blank.
    pub fn new<I, S>(elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if let Some(pos) = elements.iter().position(|e| e.trim().is_empty()) {
            return Err(Tm1Error::invalid_argument(format!(
                "coordinate position {} is blank",
                pos
            )));
        }
        Ok(Self(elements))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for CoordinateTuple {
    type Error = Tm1Error;

    fn try_from(value: Vec<String>) -> Result<Self> {
        CoordinateTuple::new(value)
    }
}

impl From<CoordinateTuple> for Vec<String> {
    fn from(value: CoordinateTuple) -> Self {
        value.0
    }
}

impl fmt::Display for CoordinateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Raw cell payload. Only reachable from a [`CellValue`], which guarantees
/// numbers are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Numeric(f64),
    String(String),
}

/// A scalar stored in one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Scalar", into = "Scalar")]
pub struct CellValue(Scalar);

impl CellValue {
    pub fn numeric(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Tm1Error::invalid_argument(format!(
                "cell value must be a finite number, got {}",
                value
            )));
        }
        Ok(CellValue(Scalar::Numeric(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        CellValue(Scalar::String(value.into()))
    }

    /// Convert a loosely typed JSON scalar.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| Tm1Error::invalid_argument(format!("unrepresentable number {}", n)))
                .and_then(CellValue::numeric),
            serde_json::Value::String(s) => Ok(CellValue::string(s.as_str())),
            other => Err(Tm1Error::invalid_argument(format!(
                "cell value must be a number or string, got {}",
                other
            ))),
        }
    }

    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl TryFrom<Scalar> for CellValue {
    type Error = Tm1Error;

    fn try_from(value: Scalar) -> Result<Self> {
        match value {
            Scalar::Numeric(n) => CellValue::numeric(n),
            Scalar::String(s) => Ok(CellValue::string(s)),
        }
    }
}

impl From<CellValue> for Scalar {
    fn from(value: CellValue) -> Self {
        value.0
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Scalar::Numeric(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Cells addressed into one cube, keyed by coordinate.
///
/// Re-inserting a coordinate replaces its value but keeps its original
/// position, so submission order follows first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteRequest {
    cells: Vec<(CoordinateTuple, CellValue)>,
    index: HashMap<CoordinateTuple, usize>,
}

impl BulkWriteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (CoordinateTuple, CellValue)>,
    {
        let mut request = Self::new();
        for (coordinate, value) in records {
            request.insert(coordinate, value);
        }
        request
    }

    /// Insert a cell; returns the value it replaced, if any.
    pub fn insert(&mut self, coordinate: CoordinateTuple, value: CellValue) -> Option<CellValue> {
        match self.index.get(&coordinate) {
            Some(&slot) => Some(std::mem::replace(&mut self.cells[slot].1, value)),
            None => {
                self.index.insert(coordinate.clone(), self.cells.len());
                self.cells.push((coordinate, value));
                None
            }
        }
    }

    pub fn get(&self, coordinate: &CoordinateTuple) -> Option<&CellValue> {
        self.index.get(coordinate).map(|&slot| &self.cells[slot].1)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CoordinateTuple, &CellValue)> {
        self.cells.iter().map(|(c, v)| (c, v))
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &CoordinateTuple> {
        self.cells.iter().map(|(c, _)| c)
    }
}
