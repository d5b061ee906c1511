#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod lox;
pub mod parser;
pub mod token;
pub mod value;

pub use lox::{compile, echo_lone_expression, Lox, Outcome};
