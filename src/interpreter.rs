use std::io::{self, Write};

use log::{debug, trace};

use crate::ast::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::environment::{Environment, ScopeId};
use crate::error::{self, LoxError, LoxResult};
use crate::value::Value;

/// Tree-walking evaluator. Globals live as long as the interpreter, so
/// successive calls to [`Interpreter::interpret`] share them.
pub struct Interpreter<W: Write> {
    env: Environment,
    scope: ScopeId,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter whose `print` statements write to `out`.
    pub fn with_output(out: W) -> Self {
        let env = Environment::new();
        let scope = env.global();
        Self { env, scope, out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Executes `stmts` in order, stopping at the first runtime error.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> LoxResult<()> {
        debug!("interpreting {} statements", stmts.len());
        for stmt in stmts {
            trace!("executing {:?}", stmt);
            if let Err(err) = self.execute(stmt) {
                debug!("runtime error on line {}: {}", err.line, err.ty);
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> LoxResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr, line) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)
                    .map_err(|err| LoxError::new(error::Output(err.to_string()), *line))?;
            }

            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::default(),
                };
                self.env.define(self.scope, &name.name, value);
            }

            Stmt::Block(body) => self.execute_block(body)?,

            Stmt::If(cond, then_branch, else_branch) => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }

            Stmt::While(cond, body) => {
                while self.evaluate(cond)?.is_truthy() {
                    self.execute(body)?;
                }
            }
        }
        Ok(())
    }

    fn execute_block(&mut self, stmts: &[Stmt]) -> LoxResult<()> {
        let prev_scope = self.scope;
        self.scope = self.env.push(prev_scope);
        let result = stmts.iter().try_for_each(|stmt| self.execute(stmt));
        self.env.pop(self.scope);
        self.scope = prev_scope;
        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> LoxResult<Value> {
        Ok(match expr {
            Expr::Nil => Value::Nil,
            Expr::Bool(value) => Value::Bool(*value),
            Expr::Number(value) => Value::Number(*value),
            Expr::Str(value) => Value::Str(value.clone()),

            Expr::Grouping(expr) => self.evaluate(expr)?,

            Expr::Unary { op, line, operand } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Value::Number(-n),
                        _ => return Err(LoxError::new(error::OperandNotNumber, *line)),
                    },
                }
            }

            Expr::Binary { lhs, op, line, rhs } => {
                let (lhs, rhs) = (self.evaluate(lhs)?, self.evaluate(rhs)?);
                binary(*op, lhs, rhs).map_err(|ty| LoxError::new(ty, *line))?
            }

            // The deciding operand itself is the result, not a boolean.
            Expr::Logical { lhs, op, rhs } => {
                let lhs = self.evaluate(lhs)?;
                match (op, lhs.is_truthy()) {
                    (LogicalOp::Or, true) | (LogicalOp::And, false) => lhs,
                    _ => self.evaluate(rhs)?,
                }
            }

            Expr::Variable(name) => self.env.get(self.scope, name)?,

            Expr::Assign(name, value) => {
                let value = self.evaluate(value)?;
                self.env.assign(self.scope, name, value.clone())?;
                value
            }
        })
    }
}

fn numbers(lhs: &Value, rhs: &Value) -> Result<(f64, f64), error::Type> {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(lhs), Some(rhs)) => Ok((lhs, rhs)),
        _ => {
            trace!("non-numeric operands: {} and {}", lhs.type_name(), rhs.type_name());
            Err(error::OperandsNotNumbers)
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, error::Type> {
    Ok(match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => Value::Number(lhs + rhs),
            (Value::Str(lhs), Value::Str(rhs)) => Value::from(lhs + &rhs),
            (lhs @ Value::Str(_), rhs @ Value::Number(_))
            | (lhs @ Value::Number(_), rhs @ Value::Str(_)) => {
                Value::from(format!("{}{}", lhs, rhs))
            }
            _ => return Err(error::InvalidAddOperands),
        },
        BinaryOp::Sub => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Number(lhs - rhs)
        }
        BinaryOp::Mul => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Number(lhs * rhs)
        }
        BinaryOp::Div => match numbers(&lhs, &rhs)? {
            (_, rhs) if rhs == 0.0 => return Err(error::DivisionByZero),
            (lhs, rhs) => Value::Number(lhs / rhs),
        },
        BinaryOp::GT => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Bool(lhs > rhs)
        }
        BinaryOp::GTE => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Bool(lhs >= rhs)
        }
        BinaryOp::LT => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Bool(lhs < rhs)
        }
        BinaryOp::LTE => {
            let (lhs, rhs) = numbers(&lhs, &rhs)?;
            Value::Bool(lhs <= rhs)
        }
        BinaryOp::EQ => Value::Bool(lhs == rhs),
        BinaryOp::NEQ => Value::Bool(lhs != rhs),
    })
}
