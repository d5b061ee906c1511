use std::convert::TryFrom;
use std::fmt;

use itertools::Itertools;

use crate::token::{self, Literal, Token};

/// An identifier together with the line it was written on.
#[derive(Clone, Debug, PartialEq)]
pub struct Name {
    pub name: String,
    pub line: usize,
}

impl Name {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl TryFrom<&Token> for Name {
    type Error = String;

    fn try_from(tok: &Token) -> Result<Self, Self::Error> {
        if let token::Ident = tok.ty {
            Ok(Name::new(tok.lexeme.clone(), tok.line))
        } else {
            Err(format!("Token {} cannot be converted into a Name.", tok))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    EQ,
    NEQ,
    GTE,
    LTE,
    GT,
    LT,
}

impl TryFrom<token::Type> for BinaryOp {
    type Error = String;

    fn try_from(ty: token::Type) -> Result<Self, Self::Error> {
        Ok(match ty {
            token::Add => BinaryOp::Add,
            token::Sub => BinaryOp::Sub,
            token::Mul => BinaryOp::Mul,
            token::Div => BinaryOp::Div,
            token::EQ => BinaryOp::EQ,
            token::NEQ => BinaryOp::NEQ,
            token::GTE => BinaryOp::GTE,
            token::LTE => BinaryOp::LTE,
            token::GT => BinaryOp::GT,
            token::LT => BinaryOp::LT,
            t => return Err(format!("Token type {:?} cannot be converted to BinaryOp.", t)),
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #![allow(clippy::enum_glob_use)]
        use BinaryOp::*;

        let formatted_op = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            EQ => "==",
            NEQ => "!=",
            GTE => ">=",
            LTE => "<=",
            GT => ">",
            LT => "<",
        };
        write!(f, "{}", formatted_op)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl TryFrom<token::Type> for LogicalOp {
    type Error = String;

    fn try_from(ty: token::Type) -> Result<Self, Self::Error> {
        match ty {
            token::And => Ok(LogicalOp::And),
            token::Or => Ok(LogicalOp::Or),
            t => Err(format!("Token type {:?} cannot be converted to LogicalOp.", t)),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl TryFrom<token::Type> for UnaryOp {
    type Error = String;

    fn try_from(ty: token::Type) -> Result<Self, Self::Error> {
        match ty {
            token::Bang => Ok(UnaryOp::Not),
            token::Sub => Ok(UnaryOp::Neg),
            t => Err(format!("Token type {:?} cannot be converted to UnaryOp.", t)),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

/// Expression nodes. Operator nodes keep the line of their operator token so
/// runtime errors can point back at the source.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Grouping(Box<Expr>),
    Unary {
        op: UnaryOp,
        line: usize,
        operand: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        line: usize,
        rhs: Box<Expr>,
    },
    Logical {
        lhs: Box<Expr>,
        op: LogicalOp,
        rhs: Box<Expr>,
    },
    Variable(Name),
    Assign(Name, Box<Expr>),
}

impl TryFrom<&Token> for Expr {
    type Error = String;

    fn try_from(tok: &Token) -> Result<Self, Self::Error> {
        Ok(match (tok.ty, &tok.literal) {
            (token::Nil, _) => Expr::Nil,
            (token::True, _) => Expr::Bool(true),
            (token::False, _) => Expr::Bool(false),
            (token::Num, Some(Literal::Number(n))) => Expr::Number(*n),
            (token::Str, Some(Literal::Str(s))) => Expr::Str(s.clone()),
            (token::Ident, _) => Expr::Variable(Name::try_from(tok)?),
            _ => return Err(format!("Token {} cannot be converted into Expression.", tok)),
        })
    }
}

impl Expr {
    /// Renders the expression in reverse Polish notation, e.g. `1 2 + 3 *`.
    #[must_use]
    pub fn rpn(&self) -> String {
        match self {
            Expr::Grouping(e) => e.rpn(),
            Expr::Unary { op, operand, .. } => format!("{} {}", operand.rpn(), op),
            Expr::Binary { lhs, op, rhs, .. } => format!("{} {} {}", lhs.rpn(), rhs.rpn(), op),
            Expr::Logical { lhs, op, rhs } => format!("{} {} {}", lhs.rpn(), rhs.rpn(), op),
            Expr::Assign(name, value) => format!("{} {} =", name, value.rpn()),
            e => e.to_string(),
        }
    }

    /// Source form of the expression, as accepted by the parser.
    fn source(&self) -> String {
        match self {
            Expr::Str(s) => format!("\"{}\"", s),
            Expr::Grouping(e) => format!("({})", e.source()),
            Expr::Unary { op, operand, .. } => format!("{}{}", op, operand.source()),
            Expr::Binary { lhs, op, rhs, .. } => {
                format!("{} {} {}", lhs.source(), op, rhs.source())
            }
            Expr::Logical { lhs, op, rhs } => format!("{} {} {}", lhs.source(), op, rhs.source()),
            Expr::Assign(name, value) => format!("{} = {}", name, value.source()),
            e => e.to_string(),
        }
    }
}

/// Fully parenthesized prefix form, e.g. `(* (- 123) (group 45.67))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil => write!(f, "nil"),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Str(s) => write!(f, "{}", s),
            Expr::Grouping(e) => write!(f, "(group {})", e),
            Expr::Unary { op, operand, .. } => write!(f, "({} {})", op, operand),
            Expr::Binary { lhs, op, rhs, .. } => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::Logical { lhs, op, rhs } => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Assign(name, value) => write!(f, "(= {} {})", name, value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr, usize),
    Var(Name, Option<Expr>),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
}

fn format_block(stmts: &[Stmt], level: usize) -> String {
    stmts.iter().map(|stmt| stmt.format_level(level)).join("")
}

impl Stmt {
    pub fn format(&self) -> String {
        self.format_level(0)
    }

    fn format_level(&self, level: usize) -> String {
        let indent = "  ".repeat(level);
        let stmt = match self {
            Stmt::Expression(expr) => format!("{};", expr.source()),
            Stmt::Print(expr, _) => format!("print {};", expr.source()),
            Stmt::Var(name, None) => format!("var {};", name),
            Stmt::Var(name, Some(init)) => format!("var {} = {};", name, init.source()),
            Stmt::Block(stmts) => {
                let stmts = format_block(stmts, level + 1);
                format!("{{\n{}{}}}", stmts, indent)
            }
            Stmt::If(cond, then_branch, else_branch) => {
                let then_branch = then_branch.format_level(level + 1);
                let else_branch = else_branch
                    .as_ref()
                    .map(|stmt| format!("{}else\n{}", indent, stmt.format_level(level + 1)))
                    .unwrap_or_default();
                // Both branches already end with a newline.
                let text = format!("if ({})\n{}{}", cond.source(), then_branch, else_branch);
                return format!("{}{}", indent, text);
            }
            Stmt::While(cond, body) => {
                let body = body.format_level(level + 1);
                return format!("{}while ({})\n{}", indent, cond.source(), body);
            }
        };

        format!("{}{}\n", indent, stmt)
    }
}
