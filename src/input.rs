//! Operand entry: turning the text a user typed into values the backend accepts.
//!
//! An empty operand is not an error here. It is returned as `None` so the
//! session can decide whether to continue from the previous result.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CalcError;
use crate::modes::Matrix;

lazy_static! {
    static ref NUMBER_REGEX: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap();
    static ref INTEGER_REGEX: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
}

pub fn is_number(text: &str) -> bool {
    NUMBER_REGEX.is_match(text)
}

pub fn parse_operand(text: &str) -> Result<Option<f64>, CalcError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if !is_number(text) {
        return Err(CalcError::InvalidOperand(text.to_string()));
    }
    match text.parse::<f64>() {
        // Literals like 1e400 overflow to infinity, which JSON cannot carry
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(CalcError::InvalidOperand(text.to_string())),
    }
}

pub fn parse_integer(text: &str) -> Result<Option<i64>, CalcError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if !INTEGER_REGEX.is_match(text) {
        return Err(CalcError::NotAnInteger(text.to_string()));
    }
    // Digits only at this point, so a failure means the value is out of range
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| CalcError::InvalidOperand(text.to_string()))
}

/// Parse `"1 2; 3 4"` (or `"1,2;3,4"`) into a rectangular matrix.
pub fn parse_matrix(text: &str) -> Result<Matrix, CalcError> {
    let text = text.trim().trim_end_matches(';');
    if text.trim().is_empty() {
        return Err(CalcError::InvalidMatrix("matrix is empty".to_string()));
    }

    let mut rows: Matrix = Vec::new();
    for (r, row_text) in text.split(';').enumerate() {
        let mut row = Vec::new();
        for cell in row_text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|c| !c.is_empty())
        {
            if !is_number(cell) {
                return Err(CalcError::InvalidMatrix(format!(
                    "'{}' in row {} is not a number",
                    cell,
                    r + 1
                )));
            }
            match cell.parse::<f64>() {
                Ok(value) if value.is_finite() => row.push(value),
                _ => {
                    return Err(CalcError::InvalidMatrix(format!(
                        "'{}' in row {} is out of range",
                        cell,
                        r + 1
                    )));
                }
            }
        }

        if row.is_empty() {
            return Err(CalcError::InvalidMatrix(format!("row {} is empty", r + 1)));
        }
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(CalcError::InvalidMatrix(format!(
                    "row {} has {} columns, expected {}",
                    r + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // Also covers -0.0
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{}", value)
}

pub fn format_matrix(matrix: &Matrix) -> String {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| format_number(*v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}
