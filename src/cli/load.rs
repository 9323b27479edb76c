//! Matrices and tables from JSON files.

use std::{fs, path::Path};

use log::debug;

use super::CliError;
use crate::value::{Matrix, Table, Value};

/// Reads `path` and converts its JSON to a value.
pub fn load_value(path: &Path) -> Result<Value, CliError> {
    let text = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let value = value_from_json(&json)?;
    debug!("loaded {} from {}", value.type_name(), path.display());
    Ok(value)
}

/// An array of number arrays is a matrix; an array of objects is a table
/// whose columns follow the key order of the first object.
pub fn value_from_json(json: &serde_json::Value) -> Result<Value, CliError> {
    let rows = json
        .as_array()
        .ok_or_else(|| CliError::InvalidData("expected an array of rows".into()))?;
    let first = rows
        .first()
        .ok_or_else(|| CliError::InvalidData("no rows".into()))?;

    if first.is_array() {
        let data = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_array()
                    .ok_or_else(|| CliError::InvalidData(format!("row {} is not an array", i)))?
                    .iter()
                    .map(|cell| number(cell, i))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = Matrix::from_rows(data).map_err(|e| CliError::InvalidData(e.to_string()))?;
        return Ok(matrix.into());
    }

    let columns: Vec<String> = first
        .as_object()
        .ok_or_else(|| CliError::InvalidData("rows must be arrays or objects".into()))?
        .keys()
        .cloned()
        .collect();

    let mut data = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let object = row
            .as_object()
            .ok_or_else(|| CliError::InvalidData(format!("row {} is not an object", i)))?;
        let cells = columns
            .iter()
            .map(|c| match object.get(c) {
                Some(cell) => number(cell, i),
                None => Err(CliError::InvalidData(format!(
                    "row {} has no column '{}'",
                    i, c
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        data.push(cells);
    }

    let matrix = Matrix::from_rows(data).map_err(|e| CliError::InvalidData(e.to_string()))?;
    let table = Table::new(columns, matrix).map_err(|e| CliError::InvalidData(e.to_string()))?;
    Ok(table.into())
}

fn number(cell: &serde_json::Value, row: usize) -> Result<f64, CliError> {
    cell.as_f64().ok_or_else(|| {
        CliError::InvalidData(format!("row {}: {} is not a number", row, cell))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Grid;
    use serde_json::json;

    #[test]
    fn test_array_of_arrays_is_matrix() {
        let v = value_from_json(&json!([[1, 2], [3, 4.5]])).unwrap();
        assert!(!v.is_table());
        assert_eq!(v.shape(), (2, 2));
        assert_eq!(v.as_matrix().get(1, 1), Some(4.5));
    }

    #[test]
    fn test_array_of_objects_is_table() {
        let v = value_from_json(&json!([{"b": 1, "a": 2}, {"a": 4, "b": 3}])).unwrap();
        let Value::Table(t) = v else {
            panic!("expected a table");
        };
        assert_eq!(t.columns(), ["b", "a"]);
        assert_eq!(t.as_matrix().row(1), [3.0, 4.0]);
    }

    #[test]
    fn test_non_numeric_cell() {
        assert!(value_from_json(&json!([[1, "x"]])).is_err());
        assert!(value_from_json(&json!([{"a": null}])).is_err());
        assert!(value_from_json(&json!({"a": 1})).is_err());
        assert!(value_from_json(&json!([])).is_err());
    }
}
