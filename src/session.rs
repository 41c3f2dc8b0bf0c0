use log::{debug, warn};

use crate::client::Backend;
use crate::error::CalcError;
use crate::history::{History, HistoryEntry};
use crate::input::{format_number, parse_integer, parse_matrix, parse_operand};
use crate::modes::{CalcOutcome, CalcRequest, MatrixOperation, Operation, ScientificFunction};

/// Whether the next calculation starts from scratch or from the last result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Continuation {
    Fresh,
    Chained(f64),
}

/// Binary operators that let a complex expression continue the chain.
const CHAIN_OPERATORS: [char; 5] = ['+', '*', '/', '^', '%'];

/// The calculator controller: operand resolution, dispatch and history.
pub struct Calculator<B: Backend> {
    backend: B,
    state: Continuation,
    history: History,
}

impl<B: Backend> Calculator<B> {
    pub fn new(backend: B, history_capacity: usize) -> Result<Self, CalcError> {
        Ok(Calculator {
            backend,
            state: Continuation::Fresh,
            history: History::with_capacity(history_capacity)?,
        })
    }

    pub fn state(&self) -> Continuation {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Swap in a loaded history, keeping this session's capacity.
    pub fn replace_history(&mut self, mut history: History) -> Result<(), CalcError> {
        history.resize(self.history.capacity())?;
        self.history = history;
        Ok(())
    }

    fn first_operand(&self, entered: Option<f64>) -> Result<f64, CalcError> {
        match (entered, self.state) {
            (Some(value), _) => Ok(value),
            (None, Continuation::Chained(previous)) => Ok(previous),
            (None, Continuation::Fresh) => Err(CalcError::MissingOperand),
        }
    }

    pub fn add_request(&self, num1: &str, num2: &str) -> Result<CalcRequest, CalcError> {
        let num1 = match parse_integer(num1)? {
            Some(n) => n,
            None => {
                let previous = self.first_operand(None)?;
                if previous.fract() != 0.0 || previous.abs() >= i64::MAX as f64 {
                    return Err(CalcError::NotAnInteger(format_number(previous)));
                }
                previous as i64
            }
        };
        let num2 = parse_integer(num2)?.ok_or(CalcError::MissingOperand)?;
        Ok(CalcRequest::Add { num1, num2 })
    }

    pub fn simple_request(
        &self,
        num1: &str,
        operation: Operation,
        num2: &str,
    ) -> Result<CalcRequest, CalcError> {
        let num1 = self.first_operand(parse_operand(num1)?)?;
        let num2 = parse_operand(num2)?.ok_or(CalcError::MissingOperand)?;
        Ok(CalcRequest::Simple {
            num1,
            operation,
            num2,
        })
    }

    pub fn complex_request(&self, expression: &str) -> Result<CalcRequest, CalcError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(CalcError::MissingOperand);
        }

        let continues = expression
            .chars()
            .next()
            .is_some_and(|c| CHAIN_OPERATORS.contains(&c));
        let expression = match (continues, self.state) {
            (true, Continuation::Chained(previous)) => {
                format!("{} {}", format_number(previous), expression)
            }
            _ => expression.to_string(),
        };

        Ok(CalcRequest::Complex { expression })
    }

    pub fn scientific_request(
        &self,
        function: ScientificFunction,
        value: &str,
    ) -> Result<CalcRequest, CalcError> {
        let value = self.first_operand(parse_operand(value)?)?;
        Ok(CalcRequest::Scientific { function, value })
    }

    pub fn matrix_request(
        &self,
        operation: MatrixOperation,
        matrix_a: &str,
        matrix_b: Option<&str>,
    ) -> Result<CalcRequest, CalcError> {
        let a = parse_matrix(matrix_a)?;
        let b = matrix_b.map(parse_matrix).transpose()?;
        CalcRequest::matrix(operation, a, b)
    }

    pub async fn add(&mut self, num1: &str, num2: &str) -> Result<CalcOutcome, CalcError> {
        let request = self.add_request(num1, num2)?;
        self.dispatch(request).await
    }

    pub async fn simple(
        &mut self,
        num1: &str,
        operation: Operation,
        num2: &str,
    ) -> Result<CalcOutcome, CalcError> {
        let request = self.simple_request(num1, operation, num2)?;
        self.dispatch(request).await
    }

    pub async fn complex(&mut self, expression: &str) -> Result<CalcOutcome, CalcError> {
        let request = self.complex_request(expression)?;
        self.dispatch(request).await
    }

    pub async fn scientific(
        &mut self,
        function: ScientificFunction,
        value: &str,
    ) -> Result<CalcOutcome, CalcError> {
        let request = self.scientific_request(function, value)?;
        self.dispatch(request).await
    }

    pub async fn matrix(
        &mut self,
        operation: MatrixOperation,
        matrix_a: &str,
        matrix_b: Option<&str>,
    ) -> Result<CalcOutcome, CalcError> {
        let request = self.matrix_request(operation, matrix_a, matrix_b)?;
        self.dispatch(request).await
    }

    /// Send a prepared request. Only a successful outcome touches state or history.
    pub async fn dispatch(&mut self, request: CalcRequest) -> Result<CalcOutcome, CalcError> {
        debug!("{} request: {}", request.mode(), request.describe());

        let outcome = match self.backend.execute(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} failed: {}", request.describe(), e);
                return Err(e);
            }
        };

        self.history.push(HistoryEntry::new(
            request.mode(),
            request.describe(),
            outcome.clone(),
        ));
        self.state = match outcome.as_scalar() {
            Some(value) => Continuation::Chained(value),
            None => Continuation::Fresh,
        };

        Ok(outcome)
    }

    /// Continue from history entry `index` (0 = newest).
    pub fn recall(&mut self, index: usize) -> Result<f64, CalcError> {
        let entry = self
            .history
            .get(index)
            .ok_or(CalcError::NoSuchEntry(index))?;
        let value = entry
            .outcome
            .as_scalar()
            .ok_or(CalcError::NotScalar(index))?;
        self.state = Continuation::Chained(value);
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.state = Continuation::Fresh;
    }

    pub fn clear_all(&mut self) {
        self.state = Continuation::Fresh;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers from a queue and records what it was asked.
    #[derive(Default)]
    struct ScriptedBackend {
        answers: Mutex<Vec<Result<CalcOutcome, CalcError>>>,
        seen: Mutex<Vec<CalcRequest>>,
    }

    impl ScriptedBackend {
        fn answering(answers: Vec<Result<CalcOutcome, CalcError>>) -> Self {
            let mut answers = answers;
            answers.reverse();
            ScriptedBackend {
                answers: Mutex::new(answers),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<CalcRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn execute(&self, request: &CalcRequest) -> Result<CalcOutcome, CalcError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(CalcError::Backend("no scripted answer".to_string())))
        }
    }

    fn scalar(v: f64) -> Result<CalcOutcome, CalcError> {
        Ok(CalcOutcome::Scalar(v))
    }

    #[tokio::test]
    async fn empty_first_operand_continues_from_previous_result() {
        let backend = ScriptedBackend::answering(vec![scalar(18.0), scalar(36.0)]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.add("12", "6").await.unwrap();
        assert_eq!(calc.state(), Continuation::Chained(18.0));

        calc.simple("", Operation::Multiply, "2").await.unwrap();
        assert_eq!(calc.state(), Continuation::Chained(36.0));

        let seen = calc.backend().seen();
        assert_eq!(
            seen[1],
            CalcRequest::Simple {
                num1: 18.0,
                operation: Operation::Multiply,
                num2: 2.0
            }
        );
        let log: Vec<String> = calc.history().entries().map(|e| e.to_string()).collect();
        assert_eq!(log, vec!["18 * 2 = 36", "12 + 6 = 18"]);
    }

    #[tokio::test]
    async fn entered_operand_starts_a_fresh_chain() {
        let backend = ScriptedBackend::answering(vec![scalar(5.0), scalar(7.0)]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.simple("2", Operation::Add, "3").await.unwrap();
        calc.simple("4", Operation::Add, "3").await.unwrap();

        match &calc.backend().seen()[1] {
            CalcRequest::Simple { num1, .. } => assert_eq!(*num1, 4.0),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn nothing_to_continue_from() {
        let calc = Calculator::new(ScriptedBackend::default(), 10).unwrap();
        assert!(matches!(
            calc.simple_request("", Operation::Add, "1"),
            Err(CalcError::MissingOperand)
        ));
        assert!(matches!(
            calc.scientific_request(ScientificFunction::Sin, " "),
            Err(CalcError::MissingOperand)
        ));
        assert!(matches!(
            calc.simple_request("1", Operation::Add, ""),
            Err(CalcError::MissingOperand)
        ));
    }

    #[tokio::test]
    async fn failure_leaves_state_and_history_alone() {
        let backend = ScriptedBackend::answering(vec![
            scalar(10.0),
            Err(CalcError::Backend("Division by zero".to_string())),
        ]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.simple("5", Operation::Add, "5").await.unwrap();
        let err = calc.simple("", Operation::Divide, "0").await.unwrap_err();
        assert!(matches!(err, CalcError::Backend(_)));
        assert_eq!(calc.state(), Continuation::Chained(10.0));
        assert_eq!(calc.history().len(), 1);

        // Rejected before dispatch: the backend never sees it
        assert!(calc.simple("abc", Operation::Add, "1").await.is_err());
        assert_eq!(calc.backend().seen().len(), 2);
    }

    #[tokio::test]
    async fn complex_expressions_continue_on_leading_operator() {
        let backend = ScriptedBackend::answering(vec![scalar(12.0), scalar(17.0), scalar(-3.0)]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        // No chain yet: sent unchanged
        assert_eq!(
            calc.complex_request("* 2").unwrap(),
            CalcRequest::Complex {
                expression: "* 2".to_string()
            }
        );

        calc.complex("(2 + 4) * 2").await.unwrap();
        calc.complex("+ 5").await.unwrap();
        calc.complex("-3").await.unwrap();

        let expressions: Vec<String> = calc
            .backend()
            .seen()
            .into_iter()
            .map(|r| match r {
                CalcRequest::Complex { expression } => expression,
                other => panic!("unexpected request {:?}", other),
            })
            .collect();
        assert_eq!(expressions, vec!["(2 + 4) * 2", "12 + 5", "-3"]);
    }

    #[tokio::test]
    async fn matrix_results_break_the_chain_but_determinants_do_not() {
        let backend = ScriptedBackend::answering(vec![
            Ok(CalcOutcome::Matrix(vec![vec![1.0, 3.0], vec![2.0, 4.0]])),
            scalar(-2.0),
        ]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.matrix(MatrixOperation::Transpose, "1 2; 3 4", None)
            .await
            .unwrap();
        assert_eq!(calc.state(), Continuation::Fresh);

        calc.matrix(MatrixOperation::Determinant, "1 2; 3 4", None)
            .await
            .unwrap();
        assert_eq!(calc.state(), Continuation::Chained(-2.0));
    }

    #[tokio::test]
    async fn add_requires_integral_chain() {
        let backend = ScriptedBackend::answering(vec![scalar(2.5)]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.simple("5", Operation::Divide, "2").await.unwrap();
        assert!(matches!(
            calc.add_request("", "1"),
            Err(CalcError::NotAnInteger(v)) if v == "2.5"
        ));
        assert!(matches!(calc.add_request("1.5", "1"), Err(CalcError::NotAnInteger(_))));
    }

    #[tokio::test]
    async fn recall_and_clear() {
        let backend = ScriptedBackend::answering(vec![
            scalar(3.0),
            Ok(CalcOutcome::Matrix(vec![vec![1.0]])),
        ]);
        let mut calc = Calculator::new(backend, 10).unwrap();

        calc.simple("1", Operation::Add, "2").await.unwrap();
        calc.matrix(MatrixOperation::Inverse, "1", None).await.unwrap();
        assert_eq!(calc.state(), Continuation::Fresh);

        assert!(matches!(calc.recall(0), Err(CalcError::NotScalar(0))));
        assert!(matches!(calc.recall(5), Err(CalcError::NoSuchEntry(5))));
        assert_eq!(calc.recall(1).unwrap(), 3.0);
        assert_eq!(calc.state(), Continuation::Chained(3.0));

        calc.clear();
        assert_eq!(calc.state(), Continuation::Fresh);
        assert_eq!(calc.history().len(), 2);

        calc.recall(1).unwrap();
        calc.clear_all();
        assert_eq!(calc.state(), Continuation::Fresh);
        assert!(calc.history().is_empty());
    }

    #[tokio::test]
    async fn history_stays_bounded() {
        let backend = ScriptedBackend::answering((1..=4).map(|n| scalar(n as f64)).collect());
        let mut calc = Calculator::new(backend, 2).unwrap();

        for n in 1..=4 {
            calc.simple(&n.to_string(), Operation::Add, "0").await.unwrap();
        }
        assert_eq!(calc.history().len(), 2);
        assert_eq!(calc.history().latest().unwrap().expression, "4 + 0");
    }
}
