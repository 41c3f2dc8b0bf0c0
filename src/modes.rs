use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::error::CalcError;
use crate::input::{format_matrix, format_number};

pub type Matrix = Vec<Vec<f64>>;

/// Which calculator panel a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Add,
    Simple,
    Complex,
    Scientific,
    Matrix,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Add => "add",
            Mode::Simple => "simple",
            Mode::Complex => "complex",
            Mode::Scientific => "scientific",
            Mode::Matrix => "matrix",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
}

impl Operation {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operation::Add),
            "-" => Some(Operation::Subtract),
            "*" | "x" | "×" => Some(Operation::Multiply),
            "/" | "÷" => Some(Operation::Divide),
            "^" => Some(Operation::Power),
            "%" => Some(Operation::Modulo),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Power => "^",
            Operation::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScientificFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Log,
    Ln,
    Exp,
    Abs,
    Factorial,
}

impl ScientificFunction {
    pub const ALL: [ScientificFunction; 16] = [
        ScientificFunction::Sin,
        ScientificFunction::Cos,
        ScientificFunction::Tan,
        ScientificFunction::Asin,
        ScientificFunction::Acos,
        ScientificFunction::Atan,
        ScientificFunction::Sinh,
        ScientificFunction::Cosh,
        ScientificFunction::Tanh,
        ScientificFunction::Sqrt,
        ScientificFunction::Cbrt,
        ScientificFunction::Log,
        ScientificFunction::Ln,
        ScientificFunction::Exp,
        ScientificFunction::Abs,
        ScientificFunction::Factorial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScientificFunction::Sin => "sin",
            ScientificFunction::Cos => "cos",
            ScientificFunction::Tan => "tan",
            ScientificFunction::Asin => "asin",
            ScientificFunction::Acos => "acos",
            ScientificFunction::Atan => "atan",
            ScientificFunction::Sinh => "sinh",
            ScientificFunction::Cosh => "cosh",
            ScientificFunction::Tanh => "tanh",
            ScientificFunction::Sqrt => "sqrt",
            ScientificFunction::Cbrt => "cbrt",
            ScientificFunction::Log => "log",
            ScientificFunction::Ln => "ln",
            ScientificFunction::Exp => "exp",
            ScientificFunction::Abs => "abs",
            ScientificFunction::Factorial => "factorial",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixOperation {
    Add,
    Subtract,
    Multiply,
    Transpose,
    Determinant,
    Inverse,
}

impl MatrixOperation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "add" | "+" => Some(MatrixOperation::Add),
            "subtract" | "sub" | "-" => Some(MatrixOperation::Subtract),
            "multiply" | "mul" | "*" => Some(MatrixOperation::Multiply),
            "transpose" | "t" => Some(MatrixOperation::Transpose),
            "determinant" | "det" => Some(MatrixOperation::Determinant),
            "inverse" | "inv" => Some(MatrixOperation::Inverse),
            _ => None,
        }
    }

    /// Operations that take a second matrix
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            MatrixOperation::Add | MatrixOperation::Subtract | MatrixOperation::Multiply
        )
    }
}

/// Rows and columns of a rectangular, non-empty matrix.
pub fn shape(matrix: &Matrix) -> Result<(usize, usize), CalcError> {
    let cols = matrix
        .first()
        .map(|row| row.len())
        .ok_or_else(|| CalcError::InvalidMatrix("matrix is empty".to_string()))?;
    if cols == 0 || matrix.iter().any(|row| row.len() != cols) {
        return Err(CalcError::InvalidMatrix(
            "rows must be non-empty and of equal length".to_string(),
        ));
    }
    Ok((matrix.len(), cols))
}

fn dims(matrix: &Matrix) -> String {
    let cols = matrix.first().map_or(0, |r| r.len());
    format!("[{}x{}]", matrix.len(), cols)
}

/// One calculation, ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcRequest {
    Add {
        num1: i64,
        num2: i64,
    },
    Simple {
        num1: f64,
        operation: Operation,
        num2: f64,
    },
    Complex {
        expression: String,
    },
    Scientific {
        function: ScientificFunction,
        value: f64,
    },
    Matrix {
        operation: MatrixOperation,
        matrix_a: Matrix,
        matrix_b: Option<Matrix>,
    },
}

impl CalcRequest {
    /// Build a matrix request, checking operand count and shapes up front.
    pub fn matrix(
        operation: MatrixOperation,
        matrix_a: Matrix,
        matrix_b: Option<Matrix>,
    ) -> Result<Self, CalcError> {
        let (rows_a, cols_a) = shape(&matrix_a)?;

        match (&matrix_b, operation.is_binary()) {
            (None, true) => {
                return Err(CalcError::InvalidMatrix(
                    "this operation needs a second matrix".to_string(),
                ));
            }
            (Some(_), false) => {
                return Err(CalcError::InvalidMatrix(
                    "this operation takes a single matrix".to_string(),
                ));
            }
            _ => {}
        }

        match operation {
            MatrixOperation::Add | MatrixOperation::Subtract => {
                if let Some(b) = &matrix_b {
                    if shape(b)? != (rows_a, cols_a) {
                        return Err(CalcError::InvalidMatrix(format!(
                            "shapes {} and {} differ",
                            dims(&matrix_a),
                            dims(b)
                        )));
                    }
                }
            }
            MatrixOperation::Multiply => {
                if let Some(b) = &matrix_b {
                    let (rows_b, _) = shape(b)?;
                    if cols_a != rows_b {
                        return Err(CalcError::InvalidMatrix(format!(
                            "cannot multiply {} by {}",
                            dims(&matrix_a),
                            dims(b)
                        )));
                    }
                }
            }
            MatrixOperation::Determinant | MatrixOperation::Inverse => {
                if rows_a != cols_a {
                    return Err(CalcError::InvalidMatrix(format!(
                        "{} is not square",
                        dims(&matrix_a)
                    )));
                }
            }
            MatrixOperation::Transpose => {}
        }

        Ok(CalcRequest::Matrix {
            operation,
            matrix_a,
            matrix_b,
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            CalcRequest::Add { .. } => Mode::Add,
            CalcRequest::Simple { .. } => Mode::Simple,
            CalcRequest::Complex { .. } => Mode::Complex,
            CalcRequest::Scientific { .. } => Mode::Scientific,
            CalcRequest::Matrix { .. } => Mode::Matrix,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            CalcRequest::Add { .. } => "/api/add",
            CalcRequest::Simple { .. } => "/api/calculate",
            CalcRequest::Complex { .. } => "/api/calculate/complex",
            CalcRequest::Scientific { .. } => "/api/calculate/scientific",
            CalcRequest::Matrix { .. } => "/api/calculate/matrix",
        }
    }

    /// Query pairs for the GET endpoint; empty for the JSON ones.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            CalcRequest::Add { num1, num2 } => {
                vec![("num1", num1.to_string()), ("num2", num2.to_string())]
            }
            _ => Vec::new(),
        }
    }

    /// JSON body for the POST endpoints; `None` for `/api/add`.
    pub fn body(&self) -> Option<Value> {
        match self {
            CalcRequest::Add { .. } => None,
            CalcRequest::Simple {
                num1,
                operation,
                num2,
            } => Some(json!({ "num1": num1, "num2": num2, "operation": operation })),
            CalcRequest::Complex { expression } => Some(json!({ "expression": expression })),
            CalcRequest::Scientific { function, value } => {
                Some(json!({ "function": function, "value": value }))
            }
            CalcRequest::Matrix {
                operation,
                matrix_a,
                matrix_b,
            } => Some(json!({
                "operation": operation,
                "matrix_a": matrix_a,
                "matrix_b": matrix_b,
            })),
        }
    }

    /// Human readable form used in the history log.
    pub fn describe(&self) -> String {
        match self {
            CalcRequest::Add { num1, num2 } => format!("{} + {}", num1, num2),
            CalcRequest::Simple {
                num1,
                operation,
                num2,
            } => format!(
                "{} {} {}",
                format_number(*num1),
                operation.symbol(),
                format_number(*num2)
            ),
            CalcRequest::Complex { expression } => expression.clone(),
            CalcRequest::Scientific { function, value } => {
                format!("{}({})", function.name(), format_number(*value))
            }
            CalcRequest::Matrix {
                operation,
                matrix_a,
                matrix_b,
            } => {
                let a = dims(matrix_a);
                let b = matrix_b.as_ref().map(dims).unwrap_or_default();
                match operation {
                    MatrixOperation::Add => format!("{} + {}", a, b),
                    MatrixOperation::Subtract => format!("{} - {}", a, b),
                    MatrixOperation::Multiply => format!("{} * {}", a, b),
                    MatrixOperation::Transpose => format!("transpose({})", a),
                    MatrixOperation::Determinant => format!("det({})", a),
                    MatrixOperation::Inverse => format!("inv({})", a),
                }
            }
        }
    }
}

/// A successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalcOutcome {
    Scalar(f64),
    Matrix(Matrix),
}

impl CalcOutcome {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            CalcOutcome::Scalar(v) => Some(*v),
            CalcOutcome::Matrix(_) => None,
        }
    }
}

impl fmt::Display for CalcOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcOutcome::Scalar(v) => f.write_str(&format_number(*v)),
            CalcOutcome::Matrix(m) => write!(f, "[{}]", format_matrix(m)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResult {
    Scalar(f64),
    Matrix(Matrix),
}

/// Envelope every endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    result: Option<WireResult>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
}

impl ApiResponse {
    pub fn into_outcome(self) -> Result<CalcOutcome, CalcError> {
        if let Some(error) = self.error {
            return Err(CalcError::Backend(error));
        }
        if let Some(detail) = self.detail {
            return Err(CalcError::Backend(render_detail(&detail)));
        }
        match self.result {
            Some(WireResult::Scalar(v)) => Ok(CalcOutcome::Scalar(v)),
            Some(WireResult::Matrix(m)) => Ok(CalcOutcome::Matrix(m)),
            None => Err(CalcError::MalformedResponse(
                "response has neither result nor error".to_string(),
            )),
        }
    }
}

/// Flatten a `detail` field: either a string or a list of `{"msg": ...}` objects.
pub fn render_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.get("msg").and_then(Value::as_str) {
                Some(msg) => msg.to_string(),
                None => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_routes_and_bodies() {
        let add = CalcRequest::Add { num1: 12, num2: 6 };
        assert_eq!(add.path(), "/api/add");
        assert!(add.body().is_none());
        assert_eq!(
            add.query(),
            vec![("num1", "12".to_string()), ("num2", "6".to_string())]
        );

        let simple = CalcRequest::Simple {
            num1: 3.0,
            operation: Operation::Divide,
            num2: 4.0,
        };
        assert_eq!(simple.path(), "/api/calculate");
        assert_eq!(
            simple.body().unwrap(),
            json!({"num1": 3.0, "num2": 4.0, "operation": "divide"})
        );

        let sci = CalcRequest::Scientific {
            function: ScientificFunction::Factorial,
            value: 5.0,
        };
        assert_eq!(sci.path(), "/api/calculate/scientific");
        assert_eq!(sci.body().unwrap(), json!({"function": "factorial", "value": 5.0}));
    }

    #[test]
    fn matrix_body_carries_null_second_operand() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let req = CalcRequest::matrix(MatrixOperation::Determinant, a, None).unwrap();
        assert_eq!(req.path(), "/api/calculate/matrix");
        assert_eq!(
            req.body().unwrap(),
            json!({
                "operation": "determinant",
                "matrix_a": [[1.0, 2.0], [3.0, 4.0]],
                "matrix_b": null
            })
        );
        assert_eq!(req.describe(), "det([2x2])");
    }

    #[test]
    fn matrix_shape_checks() {
        let sq = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let wide = vec![vec![1.0, 2.0, 3.0]];

        use MatrixOperation::*;
        let check = |op, a: &Matrix, b: Option<&Matrix>| {
            CalcRequest::matrix(op, a.clone(), b.cloned())
        };

        assert!(check(Add, &sq, None).is_err());
        assert!(check(Transpose, &sq, Some(&sq)).is_err());
        assert!(check(Add, &sq, Some(&wide)).is_err());
        assert!(check(Inverse, &wide, None).is_err());
        // 1x3 * 2x2: inner dimensions differ
        assert!(check(Multiply, &wide, Some(&sq)).is_err());

        let column = vec![vec![1.0], vec![2.0]];
        let ok = check(Multiply, &sq, Some(&column)).unwrap();
        assert_eq!(ok.describe(), "[2x2] * [2x1]");
        assert!(check(Transpose, &wide, None).is_ok());
    }

    #[test]
    fn describe_renders_numbers_without_trailing_zeroes() {
        let simple = CalcRequest::Simple {
            num1: 18.0,
            operation: Operation::Multiply,
            num2: 0.5,
        };
        assert_eq!(simple.describe(), "18 * 0.5");
        let sci = CalcRequest::Scientific {
            function: ScientificFunction::Sin,
            value: 30.0,
        };
        assert_eq!(sci.describe(), "sin(30)");
    }

    #[test]
    fn response_envelopes() {
        let scalar: ApiResponse = serde_json::from_str(r#"{"result": 18}"#).unwrap();
        assert_eq!(scalar.into_outcome().unwrap(), CalcOutcome::Scalar(18.0));

        let matrix: ApiResponse =
            serde_json::from_str(r#"{"result": [[1, 3], [2, 4]]}"#).unwrap();
        assert_eq!(
            matrix.into_outcome().unwrap(),
            CalcOutcome::Matrix(vec![vec![1.0, 3.0], vec![2.0, 4.0]])
        );

        let error: ApiResponse =
            serde_json::from_str(r#"{"error": "Division by zero"}"#).unwrap();
        assert!(matches!(
            error.into_outcome(),
            Err(CalcError::Backend(m)) if m == "Division by zero"
        ));

        let detail: ApiResponse = serde_json::from_value(json!({
            "detail": [{
                "loc": ["query", "num1"],
                "msg": "field required",
                "type": "value_error.missing"
            }]
        }))
        .unwrap();
        assert!(matches!(
            detail.into_outcome(),
            Err(CalcError::Backend(m)) if m == "field required"
        ));

        let empty: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.into_outcome(), Err(CalcError::MalformedResponse(_))));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(ScientificFunction::from_name("SQRT"), Some(ScientificFunction::Sqrt));
        assert_eq!(ScientificFunction::from_name("gamma"), None);
        assert_eq!(MatrixOperation::from_name("det"), Some(MatrixOperation::Determinant));
        assert_eq!(Operation::from_symbol("×"), Some(Operation::Multiply));
    }
}
