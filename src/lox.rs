use std::io::{self, Write};

use log::debug;

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::{lexer, parser};

/// Diagnostics collected from a single [`Lox::run`].
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    /// Scan and parse errors, in source order.
    pub syntax_errors: Vec<LoxError>,
    pub runtime_error: Option<LoxError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.syntax_errors.is_empty() && self.runtime_error.is_none()
    }

    /// Every reported error, syntax errors first.
    pub fn errors(&self) -> impl Iterator<Item = &LoxError> {
        self.syntax_errors.iter().chain(self.runtime_error.iter())
    }
}

/// Scans and parses `source` without running it. Scan and parse errors are
/// merged and ordered by line.
pub fn compile(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
    let (tokens, mut errors) = lexer::scan(source);
    let (stmts, parse_errors) = parser::parse(&tokens);
    errors.extend(parse_errors);
    errors.sort_by_key(|err| err.line);
    (stmts, errors)
}

/// Turns a program made of one expression statement into a `print` of that
/// expression, so a prompt line like `1 + 2;` shows `3`. Prompt input is a
/// single line, hence line 1.
pub fn echo_lone_expression(mut stmts: Vec<Stmt>) -> Vec<Stmt> {
    if let [Stmt::Expression(_)] = stmts.as_slice() {
        if let Some(Stmt::Expression(expr)) = stmts.pop() {
            stmts.push(Stmt::Print(expr, 1));
        }
    }
    stmts
}

/// A session that runs source text through scanner, parser and interpreter.
/// Variables defined by one run stay visible to the next.
pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
}

impl Lox<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    /// Runs `source`. Statements that parsed are executed even when others
    /// had syntax errors.
    pub fn run(&mut self, source: &str) -> Outcome {
        let (stmts, syntax_errors) = compile(source);
        if !syntax_errors.is_empty() {
            debug!("{} syntax errors, running the remaining statements", syntax_errors.len());
        }

        self.execute(&stmts, syntax_errors)
    }

    /// Runs already parsed statements, attaching any earlier `syntax_errors`
    /// to the outcome.
    pub fn execute(&mut self, stmts: &[Stmt], syntax_errors: Vec<LoxError>) -> Outcome {
        Outcome {
            syntax_errors,
            runtime_error: self.interpreter.interpret(stmts).err(),
        }
    }
}
