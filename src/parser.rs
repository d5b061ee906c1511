use std::convert::TryFrom;

use log::debug;

use crate::ast::{BinaryOp, Expr, LogicalOp, Name, Stmt, UnaryOp};
use crate::error::{self, LoxError, LoxResult};
use crate::token::{self, Token};

/// Deepest allowed nesting of groupings, unary operators, assignments and
/// statements. Each level costs several stack frames.
pub const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &'a Token {
        // The token stream always ends with EOF, which is never consumed.
        let tokens = self.tokens;
        &tokens[self.current.min(tokens.len() - 1)]
    }

    fn peek_type(&self) -> token::Type {
        self.peek().ty
    }

    fn at_end(&self) -> bool {
        self.peek_type() == token::Eof
    }

    fn consume(&mut self) -> &'a Token {
        let tok = self.peek();
        if !self.at_end() {
            self.current += 1;
        }
        tok
    }

    fn matches(&mut self, types: &[token::Type]) -> Option<&'a Token> {
        if types.contains(&self.peek_type()) {
            Some(self.consume())
        } else {
            None
        }
    }

    fn expect(&mut self, expected: token::Type, message: &'static str) -> LoxResult<&'a Token> {
        if self.peek_type() == expected {
            Ok(self.consume())
        } else {
            Err(LoxError::at(error::Expected(message), self.peek()))
        }
    }

    fn nested<T>(&mut self, parse: fn(&mut Self) -> LoxResult<T>) -> LoxResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(LoxError::at(error::TooMuchNesting, self.peek()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skips tokens until the start of the next statement, so a single
    /// malformed statement doesn't hide errors in the ones after it.
    fn synchronize(&mut self) {
        while !self.at_end() {
            if self.peek_type().starts_statement() || self.consume().ty == token::Semicolon {
                return;
            }
        }
    }

    fn parse_program(&mut self) -> Vec<Stmt> {
        let mut stmts = vec![];
        while !self.at_end() {
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }
        stmts
    }

    fn parse_declaration(&mut self) -> Option<Stmt> {
        let start = self.current;
        let result = if self.matches(&[token::Var]).is_some() {
            self.parse_var()
        } else {
            self.parse_statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                debug!("syntax error on line {}, synchronizing", err.line);
                self.errors.push(err);
                // Always make progress, even when the offending token could
                // itself start a statement.
                if self.current == start {
                    self.consume();
                }
                self.synchronize();
                None
            }
        }
    }

    fn parse_var(&mut self) -> LoxResult<Stmt> {
        let name = self.parse_name("variable name")?;
        let initializer = if self.matches(&[token::Assign]).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(token::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::Var(name, initializer))
    }

    fn parse_name(&mut self, what: &'static str) -> LoxResult<Name> {
        let tok = self.expect(token::Ident, what)?;
        Name::try_from(tok).map_err(|_| LoxError::at(error::Expected(what), tok))
    }

    fn parse_statement(&mut self) -> LoxResult<Stmt> {
        match self.peek_type() {
            token::Print => {
                let line = self.consume().line;
                let expr = self.parse_expression()?;
                self.expect(token::Semicolon, "';' after value")?;
                Ok(Stmt::Print(expr, line))
            }
            token::LBrace => {
                self.consume();
                Ok(Stmt::Block(self.nested(Self::parse_block)?))
            }
            token::If => self.parse_if(),
            token::While => self.parse_while(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(token::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_block(&mut self) -> LoxResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !matches!(self.peek_type(), token::RBrace | token::Eof) {
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }
        self.expect(token::RBrace, "'}' after block")?;
        Ok(stmts)
    }

    fn parse_if(&mut self) -> LoxResult<Stmt> {
        self.expect(token::If, "'if'")?;
        self.expect(token::LParen, "'(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.expect(token::RParen, "')' after if condition")?;

        let then_branch = Box::new(self.nested(Self::parse_statement)?);
        // Binds to the innermost open `if`, since nested ifs are parsed first.
        let else_branch = if self.matches(&[token::Else]).is_some() {
            Some(Box::new(self.nested(Self::parse_statement)?))
        } else {
            None
        };

        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn parse_while(&mut self) -> LoxResult<Stmt> {
        self.expect(token::While, "'while'")?;
        self.expect(token::LParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.expect(token::RParen, "')' after condition")?;
        let body = Box::new(self.nested(Self::parse_statement)?);
        Ok(Stmt::While(cond, body))
    }

    fn parse_expression(&mut self) -> LoxResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> LoxResult<Expr> {
        let expr = self.parse_or()?;

        if let Some(equals) = self.matches(&[token::Assign]) {
            let value = self.nested(Self::parse_assignment)?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(value))),
                // Reported, but parsing carries on with the right-hand side.
                _ => {
                    self.errors.push(LoxError::at(error::InvalidAssignmentTarget, equals));
                    Ok(value)
                }
            };
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> LoxResult<Expr> {
        let mut lhs = self.parse_and()?;
        while let Some(tok) = self.matches(&[token::Or]) {
            let op = LogicalOp::try_from(tok.ty).map_err(|_| unexpected(tok))?;
            let rhs = self.parse_and()?;
            lhs = Expr::Logical { lhs: Box::new(lhs), op, rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> LoxResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while let Some(tok) = self.matches(&[token::And]) {
            let op = LogicalOp::try_from(tok.ty).map_err(|_| unexpected(tok))?;
            let rhs = self.parse_equality()?;
            lhs = Expr::Logical { lhs: Box::new(lhs), op, rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> LoxResult<Expr> {
        self.parse_binary(&[token::NEQ, token::EQ], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> LoxResult<Expr> {
        self.parse_binary(&[token::GT, token::GTE, token::LT, token::LTE], Self::parse_term)
    }

    fn parse_term(&mut self) -> LoxResult<Expr> {
        self.parse_binary(&[token::Sub, token::Add], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> LoxResult<Expr> {
        self.parse_binary(&[token::Div, token::Mul], Self::parse_unary)
    }

    /// Left-associative loop shared by the binary precedence levels.
    fn parse_binary(
        &mut self,
        ops: &[token::Type],
        operand: fn(&mut Self) -> LoxResult<Expr>,
    ) -> LoxResult<Expr> {
        let mut lhs = operand(self)?;
        while let Some(tok) = self.matches(ops) {
            let op = BinaryOp::try_from(tok.ty).map_err(|_| unexpected(tok))?;
            let rhs = operand(self)?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                line: tok.line,
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> LoxResult<Expr> {
        if let Some(tok) = self.matches(&[token::Bang, token::Sub]) {
            let op = UnaryOp::try_from(tok.ty).map_err(|_| unexpected(tok))?;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op,
                line: tok.line,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> LoxResult<Expr> {
        let tok = self.peek();
        match tok.ty {
            token::Nil | token::True | token::False | token::Num | token::Str | token::Ident => {
                self.consume();
                Expr::try_from(tok).map_err(|_| unexpected(tok))
            }
            token::LParen => {
                self.consume();
                let expr = self.nested(Self::parse_expression)?;
                self.expect(token::RParen, "')' after expression")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            _ => Err(unexpected(tok)),
        }
    }
}

fn unexpected(tok: &Token) -> LoxError {
    LoxError::at(error::ExpectedExpression, tok)
}

/// Parses a whole program. Statements that fail to parse are reported in the
/// error list and left out of the returned statements.
pub fn parse(tokens: &[Token]) -> (Vec<Stmt>, Vec<LoxError>) {
    let mut parser = Parser {
        tokens,
        current: 0,
        depth: 0,
        errors: vec![],
    };
    let stmts = parser.parse_program();
    debug!("parsed {} statements with {} errors", stmts.len(), parser.errors.len());
    (stmts, parser.errors)
}

/// Parses a single expression, ignoring anything after it.
pub fn parse_expression(tokens: &[Token]) -> LoxResult<Expr> {
    let mut parser = Parser {
        tokens,
        current: 0,
        depth: 0,
        errors: vec![],
    };
    let expr = parser.parse_expression()?;
    match parser.errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_str(src: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, errors) = lexer::scan(src);
        assert!(errors.is_empty(), "scan errors: {:?}", errors);
        parse(&tokens)
    }

    macro_rules! parse_expr {
        ($src:expr) => {{
            let (tokens, _) = lexer::scan($src);
            parse_expression(&tokens).map(|expr| expr.to_string())
        }};
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_expr!("2 + 3 * 4"), Ok("(+ 2 (* 3 4))".to_owned()));
        assert_eq!(parse_expr!("-123 * (45.67)"), Ok("(* (- 123) (group 45.67))".to_owned()));
        assert_eq!(
            parse_expr!("1 < 2 == 3 >= 4"),
            Ok("(== (< 1 2) (>= 3 4))".to_owned())
        );
        assert_eq!(
            parse_expr!("a or b and c == d"),
            Ok("(or a (and b (== c d)))".to_owned())
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(parse_expr!("6 / 3 - 1"), Ok("(- (/ 6 3) 1)".to_owned()));
        assert_eq!(parse_expr!("1 - 2 - 3"), Ok("(- (- 1 2) 3)".to_owned()));
        assert_eq!(parse_expr!("a or b or c"), Ok("(or (or a b) c)".to_owned()));
    }

    #[test]
    fn test_right_associativity() {
        assert_eq!(parse_expr!("a = b = 1"), Ok("(= a (= b 1))".to_owned()));
        assert_eq!(parse_expr!("!!-x"), Ok("(! (! (- x)))".to_owned()));
    }

    #[test]
    fn test_primary_errors() {
        let err = parse_expr!("(1 + 2").unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error at end: Expect ')' after expression.");

        let err = parse_expr!("1 + ;").unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error at ';': Expect expression.");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (stmts, errors) = parse_str("a + b = c; print 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error at '=': Invalid assignment target.");
        // Parsing continued past the bad target.
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_statements() {
        let (stmts, errors) = parse_str("var a; var b = 1; print a; { a = b; } a;");
        assert!(errors.is_empty());
        assert_eq!(
            stmts,
            vec![
                Stmt::Var(Name::new("a", 1), None),
                Stmt::Var(Name::new("b", 1), Some(Expr::Number(1.0))),
                Stmt::Print(Expr::Variable(Name::new("a", 1)), 1),
                Stmt::Block(vec![Stmt::Expression(Expr::Assign(
                    Name::new("a", 1),
                    Box::new(Expr::Variable(Name::new("b", 1)))
                ))]),
                Stmt::Expression(Expr::Variable(Name::new("a", 1))),
            ]
        );
    }

    #[test]
    fn test_dangling_else() {
        let (stmts, errors) = parse_str("if (a) if (b) print 1; else print 2;");
        assert!(errors.is_empty());

        match &stmts[..] {
            [Stmt::If(_, inner, None)] => match inner.as_ref() {
                Stmt::If(_, _, Some(_)) => (),
                stmt => panic!("else attached to the wrong if: {:?}", stmt),
            },
            stmts => panic!("unexpected statements: {:?}", stmts),
        }
    }

    #[test]
    fn test_while() {
        let (stmts, errors) = parse_str("while (i < 3) { i = i + 1; }");
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].format(), "while (i < 3)\n  {\n    i = i + 1;\n  }\n");
    }

    #[test]
    fn test_synchronization() {
        let (stmts, errors) = parse_str("print 1\nprint 2;\nvar = 3;\nprint 4;");
        assert_eq!(
            errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "[line 2] Error at 'print': Expect ';' after value.",
                "[line 3] Error at '=': Expect variable name.",
            ]
        );
        assert_eq!(stmts, vec![
            Stmt::Print(Expr::Number(2.0), 2),
            Stmt::Print(Expr::Number(4.0), 4),
        ]);
    }

    #[test]
    fn test_errors_inside_block() {
        let (stmts, errors) = parse_str("{ print ; print 2; }");
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts, vec![Stmt::Block(vec![Stmt::Print(Expr::Number(2.0), 1)])]);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse_expr!(&nested(MAX_DEPTH)).is_ok());

        let err = parse_expr!(&nested(200)).unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error at '(': Too much nesting.");

        let negations = format!("{}1", "-".repeat(200));
        assert_eq!(parse_expr!(&negations).unwrap_err().ty, error::TooMuchNesting);

        let assignments = format!("{}1", "a = ".repeat(200));
        assert_eq!(parse_expr!(&assignments).unwrap_err().ty, error::TooMuchNesting);
    }

    #[test]
    fn test_nesting_limit_recovers() {
        let blocks = format!("{}{}", "{".repeat(200), "}".repeat(200));
        let (_, errors) = parse_str(&format!("{}\nprint 1;", blocks));
        assert_eq!(errors[0].ty, error::TooMuchNesting);

        let parens = format!("print {}1{};\nprint 2;", "(".repeat(200), ")".repeat(200));
        let (stmts, errors) = parse_str(&parens);
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts, vec![Stmt::Print(Expr::Number(2.0), 2)]);
    }

    #[test]
    fn test_unclosed_block() {
        let (stmts, errors) = parse_str("{ print 1;");
        assert!(stmts.is_empty());
        assert_eq!(errors[0].to_string(), "[line 1] Error at end: Expect '}' after block.");
    }
}
