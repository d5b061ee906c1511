use std::fmt;

use thiserror::Error;

use crate::token::{self, Token};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Type {
    // Scanning
    #[error("Unexpected character.")]
    UnexpectedChar(char),
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Unterminated block comment.")]
    UnterminatedComment,
    #[error("Malformed number.")]
    MalformedNumber,

    // Parsing
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect {0}.")]
    Expected(&'static str),
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Too much nesting.")]
    TooMuchNesting,

    // Runtime
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Operand must be a number.")]
    OperandNotNumber,
    #[error("Operands must be numbers.")]
    OperandsNotNumbers,
    #[error("Operands must be two numbers or two strings.")]
    InvalidAddOperands,
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Could not write output: {0}")]
    Output(String),
}

pub use Type::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Scan,
    Parse,
    Runtime,
}

impl Type {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            UnexpectedChar(_) | UnterminatedString | UnterminatedComment | MalformedNumber => {
                Stage::Scan
            }
            ExpectedExpression | Expected(_) | InvalidAssignmentTarget | TooMuchNesting => {
                Stage::Parse
            }
            _ => Stage::Runtime,
        }
    }
}

/// Where on its line a syntax error was detected.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    Unknown,
    End,
    Lexeme(String),
}

impl From<&Token> for Location {
    fn from(tok: &Token) -> Self {
        match tok.ty {
            token::Eof => Location::End,
            _ => Location::Lexeme(tok.lexeme.clone()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => Ok(()),
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoxError {
    pub ty: Type,
    pub line: usize,
    pub location: Location,
}

impl LoxError {
    pub fn new(ty: Type, line: usize) -> Self {
        Self {
            ty,
            line,
            location: Location::Unknown,
        }
    }

    pub fn at(ty: Type, tok: &Token) -> Self {
        Self {
            ty,
            line: tok.line,
            location: tok.into(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.ty.stage()
    }
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage() {
            Stage::Runtime => write!(f, "{}\n[line {}]", self.ty, self.line),
            Stage::Scan | Stage::Parse => {
                write!(f, "[line {}] Error{}: {}", self.line, self.location, self.ty)
            }
        }
    }
}

impl std::error::Error for LoxError {}

pub type LoxResult<T> = std::result::Result<T, LoxError>;
