//! Built-in service implementations, keyed by `(service, function)`.
//!
//! Arguments arrive bound and type-checked in parameter order, so a handler
//! only has to pick them out by position.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    config::Limits,
    registry::{Arg, Output, ServiceFn},
    value::{Grid, Matrix, Table, Value},
};

pub static BUILTIN_SERVICES: &[(&str, &str, ServiceFn)] = &[
    ("matrix", "Identity", identity),
    ("matrix", "Fill", fill),
    ("matrix", "Transpose", transpose),
    ("matrix", "Determinant", determinant),
    ("matrix", "Inverse", inverse),
    ("matrix", "Rank", rank),
    ("matrix", "Trace", trace),
    ("matrix", "Shape", shape),
    ("matrix", "SubMatrix", sub_matrix),
    ("matrix", "LU", lu),
    ("matrix", "Abs", abs),
    ("matrix", "Round", round),
    ("table", "ToTable", to_table),
    ("table", "ToMatrix", to_matrix),
    ("table", "Mean", mean),
    ("table", "Sum", sum),
];

fn int_arg(args: &[Arg], index: usize) -> Result<i64, String> {
    match args.get(index) {
        Some(Arg::Int(n)) => Ok(*n),
        other => Err(format!("Expected an integer argument, got {:?}", other)),
    }
}

fn float_arg(args: &[Arg], index: usize) -> Result<f64, String> {
    match args.get(index) {
        Some(Arg::Float(n)) => Ok(*n),
        Some(Arg::Int(n)) => Ok(*n as f64),
        other => Err(format!("Expected a number argument, got {:?}", other)),
    }
}

fn value_arg(args: &[Arg], index: usize) -> Result<&Value, String> {
    match args.get(index) {
        Some(Arg::Matrix(v)) => Ok(v),
        other => Err(format!("Expected a matrix argument, got {:?}", other)),
    }
}

fn matrix_arg(args: &[Arg], index: usize) -> Result<&Matrix, String> {
    value_arg(args, index).map(Grid::as_matrix)
}

/// Checks a requested dimension against the configured bounds.
fn dimension(n: i64, what: &str, limits: &Limits) -> Result<usize, String> {
    if n < 1 {
        return Err(format!("{} must be at least 1, got {}", what, n));
    }
    let n = n as usize;
    if n > limits.max_dimension {
        return Err(format!(
            "{} can be at most {}, got {}",
            what, limits.max_dimension, n
        ));
    }
    Ok(n)
}

fn identity(args: &[Arg], limits: &Limits) -> Result<Output, String> {
    let size = dimension(int_arg(args, 0)?, "Size", limits)?;
    let m = Matrix::identity(size).map_err(|e| e.to_string())?;
    Ok(Output::Value(m.into()))
}

fn fill(args: &[Arg], limits: &Limits) -> Result<Output, String> {
    let rows = dimension(int_arg(args, 0)?, "Row count", limits)?;
    let cols = dimension(int_arg(args, 1)?, "Column count", limits)?;
    let value = float_arg(args, 2)?;
    let m = Matrix::filled(rows, cols, value).map_err(|e| e.to_string())?;
    Ok(Output::Value(m.into()))
}

fn transpose(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Value(matrix_arg(args, 0)?.transpose().into()))
}

fn determinant(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let det = matrix_arg(args, 0)?.determinant().map_err(|e| e.to_string())?;
    Ok(Output::Number(det))
}

fn inverse(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let inv = matrix_arg(args, 0)?.inverse().map_err(|e| e.to_string())?;
    Ok(Output::Value(inv.into()))
}

fn rank(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Number(matrix_arg(args, 0)?.rank() as f64))
}

fn trace(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let t = matrix_arg(args, 0)?.trace().map_err(|e| e.to_string())?;
    Ok(Output::Number(t))
}

fn shape(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let (rows, cols) = value_arg(args, 0)?.shape();
    let m = Matrix::new(1, 2, vec![rows as f64, cols as f64]).map_err(|e| e.to_string())?;
    Ok(Output::Value(m.into()))
}

fn index_arg(args: &[Arg], index: usize, what: &str) -> Result<usize, String> {
    let n = int_arg(args, index)?;
    usize::try_from(n).map_err(|_| format!("{} can't be negative, got {}", what, n))
}

fn sub_matrix(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let value = value_arg(args, 0)?;
    let r1 = index_arg(args, 1, "r1")?;
    let r2 = index_arg(args, 2, "r2")?;
    let c1 = index_arg(args, 3, "c1")?;
    let c2 = index_arg(args, 4, "c2")?;
    let sub = value.sub_range(r1..r2, c1..c2).map_err(|e| e.to_string())?;
    Ok(Output::Value(sub))
}

fn lu(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let (l, u) = matrix_arg(args, 0)?.lu().map_err(|e| e.to_string())?;
    Ok(Output::Values(vec![l.into(), u.into()]))
}

fn abs(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Value(matrix_arg(args, 0)?.map(f64::abs).into()))
}

/// Rounds half away from zero, going through a decimal to avoid binary float artefacts.
fn round_value(x: f64, decimals: u32) -> f64 {
    Decimal::from_f64(x)
        .map(|d| d.round_dp_with_strategy(decimals, rust_decimal::RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(x)
}

fn round(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let decimals = int_arg(args, 1)?;
    let decimals = u32::try_from(decimals)
        .ok()
        .filter(|d| *d <= 28)
        .ok_or_else(|| format!("Decimals must be between 0 and 28, got {}", decimals))?;
    Ok(Output::Value(
        matrix_arg(args, 0)?.map(|x| round_value(x, decimals)).into(),
    ))
}

fn to_table(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Value(match value_arg(args, 0)? {
        Value::Table(t) => Value::Table(t.clone()),
        Value::Matrix(m) => Table::from_matrix(m.clone()).into(),
    }))
}

fn to_matrix(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Value(value_arg(args, 0)?.clone().into_matrix().into()))
}

/// Applies `f` to every column and returns one row, labelled like the input.
fn column_summary(value: &Value, f: impl Fn(&[f64]) -> f64) -> Result<Value, String> {
    let m = value.as_matrix();
    let columns = m.transpose();
    let data: Vec<f64> = (0..columns.rows()).map(|c| f(columns.row(c))).collect();
    let row = Matrix::new(1, data.len(), data).map_err(|e| e.to_string())?;
    Ok(match value {
        Value::Table(t) => Table::new(t.columns().to_vec(), row)
            .map_err(|e| e.to_string())?
            .into(),
        Value::Matrix(_) => row.into(),
    })
}

fn mean(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let summary = column_summary(value_arg(args, 0)?, |col| {
        col.iter().sum::<f64>() / col.len() as f64
    })?;
    Ok(Output::Value(summary))
}

fn sum(args: &[Arg], _: &Limits) -> Result<Output, String> {
    let summary = column_summary(value_arg(args, 0)?, |col| col.iter().sum())?;
    Ok(Output::Value(summary))
}
