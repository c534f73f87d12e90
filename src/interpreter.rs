use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rustc_hash::FxHashMap;

use crate::ast::{BinaryOperator, Expression, Program, Statement};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        operator: BinaryOperator,
        left: Value,
        right: Value,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("execution cancelled")]
    Cancelled,
}

/// Variable bindings, innermost scope last. In the default [`ScopeMode::Flat`]
/// the stack never grows past the global scope.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<FxHashMap<String, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Binds `name` in the innermost scope, overwriting any previous binding
    /// at that level.
    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Overwrites the nearest existing binding for `name`. Returns false when
    /// no scope holds the name.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.scopes
            .iter()
            .flat_map(|scope| scope.iter().map(|(name, value)| (name.as_str(), value)))
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "the global scope must stay");
        self.scopes.pop();
    }
}

/// How `if`/`while` bodies relate to the enclosing environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeMode {
    /// One environment shared by the whole program. A `var` inside a
    /// block is visible after it.
    #[default]
    Flat,
    /// Each block gets its own scope that reads and assigns through to its
    /// parent; `var` bindings die with the block.
    Lexical,
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    env: Environment,
    mode: ScopeMode,
    cancel: Arc<AtomicBool>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_scope_mode(ScopeMode::Flat)
    }

    pub fn with_scope_mode(mode: ScopeMode) -> Self {
        Self {
            env: Environment::new(),
            mode,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the host to abort a run. The flag is checked before every
    /// statement and before every loop iteration.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Bindings as left by the last run, including everything executed before
    /// a runtime error.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Runs the program and returns the values passed to `print`, in
    /// execution order. Formatting them is the caller's concern.
    pub fn run(&mut self, program: &Program) -> Result<Vec<Value>, RuntimeError> {
        let mut output = Vec::new();
        for statement in &program.0 {
            self.execute(statement, &mut output)?;
        }
        Ok(output)
    }

    fn execute(
        &mut self,
        statement: &Statement,
        output: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(RuntimeError::Cancelled);
        }

        match statement {
            Statement::Expression(expression) => {
                self.evaluate(expression)?;
            }
            Statement::VarDeclaration(name, expression) => {
                let value = self.evaluate(expression)?;
                self.env.define(name.clone(), value);
            }
            Statement::Assignment(name, expression) => {
                let value = self.evaluate(expression)?;
                if !self.env.assign(name, value) {
                    return Err(RuntimeError::UndefinedVariable(name.clone()));
                }
            }
            Statement::Print(expression) => {
                let value = self.evaluate(expression)?;
                output.push(value);
            }
            Statement::If(condition, consequent, alternate) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(consequent, output)?;
                } else if let Some(alternate) = alternate {
                    self.execute_block(alternate, output)?;
                }
            }
            Statement::While(condition, body) => loop {
                if self.cancel.load(Ordering::Relaxed) {
                    return Err(RuntimeError::Cancelled);
                }
                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }
                self.execute_block(body, output)?;
            },
        }

        Ok(())
    }

    fn execute_block(
        &mut self,
        statements: &[Statement],
        output: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        if self.mode == ScopeMode::Flat {
            for statement in statements {
                self.execute(statement, output)?;
            }
            return Ok(());
        }

        self.env.push_scope();
        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement, output));
        self.env.pop_scope();
        result
    }

    fn evaluate(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::NumberLiteral(n) => Ok(Value::Number(*n)),
            Expression::StringLiteral(s) => Ok(Value::String(s.clone())),
            Expression::Identifier(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expression::Binary(left, operator, right) => {
                // Left operand strictly before right; both are always
                // evaluated, so errors on the right are never skipped
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                apply(*operator, left, right)
            }
        }
    }
}

fn apply(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match operator {
        BinaryOperator::Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                Ok(Value::String(format!("{}{}", a, b)))
            }
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::Minus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::Multiply => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::Divide => match (left, right) {
            (Value::Number(_), Value::Number(b)) if b == 0.0 => Err(RuntimeError::DivisionByZero),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::Equal => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a == b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a == b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a == b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::NotEqual => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a != b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a != b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a != b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::LessThan => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a < b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a < b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::LessThanOrEqual => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a <= b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a <= b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::GreaterThan => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a > b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a > b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::GreaterThanOrEqual => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a >= b)),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a >= b)),
            (left, right) => Err(mismatch(operator, left, right)),
        },
        BinaryOperator::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

fn mismatch(operator: BinaryOperator, left: Value, right: Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operator,
        left,
        right,
    }
}
