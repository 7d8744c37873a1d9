//! OData path and payload helpers for the TM1 REST API.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Result, Tm1Error};
use crate::model::{BulkWriteRequest, CellSet, CellValue, CoordinateTuple, Scalar};

/// `$expand` clause that returns axis members and cell values for a cellset.
pub(crate) const CELLSET_EXPAND: &str =
    "$expand=Axes($expand=Tuples($expand=Members($select=Name))),Cells($select=Ordinal,Value)";

/// Quote a key for use inside a body binding: `O'Brien` -> `'O''Brien'`.
pub(crate) fn quote_key(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// `Collection('name')` path segment, percent-encoded for the URL.
pub(crate) fn entity(collection: &str, name: &str) -> String {
    format!(
        "{}('{}')",
        collection,
        urlencoding::encode(&name.replace('\'', "''"))
    )
}

/// Path of the default hierarchy, which shares the dimension's name.
pub(crate) fn default_hierarchy(dimension: &str) -> String {
    format!("{}/{}", entity("Dimensions", dimension), entity("Hierarchies", dimension))
}

pub(crate) fn element_binding(dimension: &str, element: &str) -> String {
    format!(
        "Dimensions({d})/Hierarchies({d})/Elements({e})",
        d = quote_key(dimension),
        e = quote_key(element)
    )
}

/// Values are sent as strings, which the server coerces per element type.
fn wire_value(value: &CellValue) -> Value {
    match value.as_scalar() {
        Scalar::Numeric(n) => Value::String(n.to_string()),
        Scalar::String(s) => Value::String(s.clone()),
    }
}

/// Body of one `tm1.Update` entry.
pub(crate) fn cell_update(dimensions: &[String], coordinate: &CoordinateTuple, value: &CellValue) -> Result<Value> {
    if dimensions.len() != coordinate.len() {
        return Err(Tm1Error::ShapeMismatch {
            expected: dimensions.len(),
            actual: coordinate.len(),
        });
    }
    let bindings: Vec<String> = dimensions
        .iter()
        .zip(coordinate.iter())
        .map(|(d, e)| element_binding(d, e))
        .collect();

    Ok(json!({
        "Cells": [{ "Tuple@odata.bind": bindings }],
        "Value": wire_value(value),
    }))
}

/// Array body submitting every cell of a batch in one `tm1.Update` call.
pub(crate) fn bulk_update(dimensions: &[String], request: &BulkWriteRequest) -> Result<Value> {
    let updates = request
        .iter()
        .map(|(coordinate, value)| cell_update(dimensions, coordinate, value))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(updates))
}

/// `{"value": [...]}` collection envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Named {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct RawCellSet {
    #[serde(rename = "Axes", default)]
    axes: Vec<RawAxis>,
    #[serde(rename = "Cells", default)]
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawAxis {
    #[serde(rename = "Ordinal", default)]
    ordinal: usize,
    #[serde(rename = "Tuples", default)]
    tuples: Vec<RawTuple>,
}

#[derive(Debug, Deserialize)]
struct RawTuple {
    #[serde(rename = "Members", default)]
    members: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(rename = "Ordinal")]
    ordinal: usize,
    #[serde(rename = "Value", default)]
    value: Value,
}

fn axis_labels(axes: &[RawAxis], ordinal: usize) -> Vec<Vec<String>> {
    axes.iter()
        .find(|a| a.ordinal == ordinal)
        .map(|a| {
            a.tuples
                .iter()
                .map(|t| t.members.iter().map(|m| m.name.clone()).collect())
                .collect()
        })
        .unwrap_or_else(|| vec![Vec::new()])
}

/// Lay out an expanded cellset response as a row-major grid.
pub(crate) fn parse_cellset(body: Value) -> Result<CellSet> {
    let raw: RawCellSet = serde_json::from_value(body)?;
    let columns = axis_labels(&raw.axes, 0);
    let rows = axis_labels(&raw.axes, 1);

    let width = columns.len().max(1);
    let mut values = vec![vec![None; columns.len()]; rows.len()];
    for cell in raw.cells {
        let (r, c) = (cell.ordinal / width, cell.ordinal % width);
        if let Some(slot) = values.get_mut(r).and_then(|row| row.get_mut(c)) {
            *slot = Some(cell.value);
        }
    }

    Ok(CellSet { columns, rows, values })
}
