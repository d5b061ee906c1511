use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use maplit::hashmap;

#[rustfmt::skip]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    EQ, NEQ, GTE, LTE, GT, LT,

    Add, Sub, Div, Mul,

    Assign, Bang, Comma, Semicolon, Period,
    LBrace, RBrace,
    LParen, RParen,

    // Keywords
    Nil, True, False,
    And, Or,
    Class, Else, For, Fun, If, Print, Return, Super, This, Var, While,

    Ident,
    Num,
    Str,

    Eof,
}

pub use Type::*;

impl Type {
    /// Whether a token of this type can begin a statement or declaration.
    #[must_use]
    pub fn starts_statement(self) -> bool {
        matches!(self, Class | Fun | Var | For | If | While | Print | Return)
    }
}

lazy_static! {
    pub static ref KEYWORDS: HashMap<&'static str, Type> = hashmap! {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
    };
}

/// Decoded value of a number or string literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub ty: Type,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(ty: Type, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            literal: None,
            line,
        }
    }

    #[must_use]
    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Eof => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
