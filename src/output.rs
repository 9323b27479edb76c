//! Text and JSON rendering of results and commands.
//!
//! Numbers are rounded through [`rust_decimal`] so that binary noise such as
//! `0.30000000000000004` never reaches the user, and trailing zeros are
//! dropped.
//!
//! # Features
//!
//! - **Scalars** via [`Renderer::format_number`] - rounded, `NaN` and
//!   `Infinity` spelled out
//! - **Matrices** - one row per line, columns right-aligned
//! - **Tables** - like matrices, with a header row of column names
//! - **Commands** via [`to_json()`] - the `{state, message, output}` triple
//!
//! # Examples
//!
//! ```
//! use matrix_expr::output::Renderer;
//!
//! let renderer = Renderer::new(2);
//! assert_eq!(renderer.format_number(3.14159), "3.14");
//! assert_eq!(renderer.format_number(7.0), "7");
//! assert_eq!(renderer.format_number(f64::NAN), "NaN");
//! ```

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use serde_json::json;

use crate::{
    ast::{Payload, Token, TokenKind},
    command::Command,
    value::{Grid, Value},
};

pub struct Renderer {
    decimals: u32,
}

impl Renderer {
    pub fn new(decimals: u32) -> Self {
        Renderer { decimals }
    }

    pub fn format_number(&self, n: f64) -> String {
        if n.is_nan() {
            return "NaN".to_string();
        }
        if n.is_infinite() {
            return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        match Decimal::from_f64(n) {
            Some(d) => d
                .round_dp_with_strategy(self.decimals, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
                .to_string(),
            // Outside the decimal range
            None => n.to_string(),
        }
    }

    pub fn render(&self, token: &Token) -> String {
        match (&token.value, token.kind) {
            (_, TokenKind::DocsQuery | TokenKind::Output | TokenKind::ErrorMarker) => {
                token.info.clone().unwrap_or_default()
            }
            (_, TokenKind::Void) => String::new(),
            (Payload::Number(n), _) => self.format_number(*n),
            (Payload::Text(s), _) => s.clone(),
            (Payload::Matrix(v), _) if token.name.is_empty() => self.render_value(v),
            (Payload::Matrix(v), _) => format!("{} =\n{}", token.name, self.render_value(v)),
            (Payload::Matrices(vs), _) => vs
                .iter()
                .map(|v| self.render_value(v))
                .collect::<Vec<_>>()
                .join("\n\n"),
            (Payload::Null, _) => "null".to_string(),
        }
    }

    /// One line per row, each column padded to its widest cell.
    pub fn render_value(&self, value: &Value) -> String {
        let matrix = value.as_matrix();
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(matrix.rows() + 1);
        if let Value::Table(table) = value {
            rows.push(table.columns().to_vec());
        }
        for i in 0..matrix.rows() {
            rows.push(
                matrix
                    .row(i)
                    .iter()
                    .map(|&x| self.format_number(x))
                    .collect(),
            );
        }

        let widths: Vec<usize> = (0..matrix.cols())
            .map(|j| rows.iter().map(|r| r[j].chars().count()).max().unwrap_or(0))
            .collect();

        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{:>w$}", cell, w = w))
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A command as a JSON object.
pub fn command_to_json(command: &Command) -> serde_json::Value {
    json!({
        "state": command.state().to_string(),
        "message": command.message(),
        "output": command.output(),
    })
}

pub fn to_json(command: &Command, pretty: bool) -> Result<String, serde_json::Error> {
    let value = command_to_json(command);
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Matrix, Table};

    #[test]
    fn test_matrix_columns_are_aligned() {
        let m = Matrix::from_rows(vec![vec![1.0, 20.0], vec![300.0, 4.5]]).unwrap();
        let out = Renderer::new(6).render_value(&m.into());
        assert_eq!(out, "  1   20\n300  4.5");
    }

    #[test]
    fn test_table_has_header_row() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let t = Table::new(vec!["a".into(), "b".into()], m).unwrap();
        assert_eq!(Renderer::new(6).render_value(&t.into()), "a  b\n1  2");
    }

    #[test]
    fn test_rounding() {
        let r = Renderer::new(3);
        assert_eq!(r.format_number(0.1 + 0.2), "0.3");
        assert_eq!(r.format_number(2.0 / 3.0), "0.667");
        assert_eq!(r.format_number(f64::NEG_INFINITY), "-Infinity");
    }
}
