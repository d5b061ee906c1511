use log::debug;

use crate::error::{self, LoxError};
use crate::token::{self, Literal, Token, KEYWORDS};

struct Lexer<'a> {
    src: &'a [char],
    start: usize,
    current: usize,
    line: usize,
    errors: Vec<LoxError>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a [char] {
        &self.src[self.current..]
    }

    fn lexeme(&self) -> String {
        self.src[self.start..self.current].iter().collect()
    }

    fn error(&mut self, ty: error::Type) {
        self.errors.push(LoxError::new(ty, self.line));
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_trivia();
            self.start = self.current;

            let (ty, len) = match self.rest() {
                [] => return None,

                ['"', ..] => match self.scan_string() {
                    Some(tok) => return Some(tok),
                    None => continue,
                },
                [c, ..] if c.is_ascii_digit() => match self.scan_number() {
                    Some(tok) => return Some(tok),
                    None => continue,
                },
                [c, ..] if is_alpha(*c) => return Some(self.scan_identifier()),

                ['!', '=', ..] => (token::NEQ, 2),
                ['=', '=', ..] => (token::EQ, 2),
                ['<', '=', ..] => (token::LTE, 2),
                ['>', '=', ..] => (token::GTE, 2),
                ['!', ..] => (token::Bang, 1),
                ['=', ..] => (token::Assign, 1),
                ['<', ..] => (token::LT, 1),
                ['>', ..] => (token::GT, 1),

                ['+', ..] => (token::Add, 1),
                ['-', ..] => (token::Sub, 1),
                ['*', ..] => (token::Mul, 1),
                ['/', ..] => (token::Div, 1),

                [',', ..] => (token::Comma, 1),
                ['.', ..] => (token::Period, 1),
                [';', ..] => (token::Semicolon, 1),
                ['{', ..] => (token::LBrace, 1),
                ['}', ..] => (token::RBrace, 1),
                ['(', ..] => (token::LParen, 1),
                [')', ..] => (token::RParen, 1),

                [c, ..] => {
                    let c = *c;
                    self.current += 1;
                    self.error(error::UnexpectedChar(c));
                    continue;
                }
            };

            self.current += len;
            return Some(Token::new(ty, self.lexeme(), self.line));
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.rest() {
                ['/', '/', ..] => self.skip_line_comment(),
                ['/', '*', ..] => self.skip_block_comment(),
                ['\n', ..] => {
                    self.line += 1;
                    self.current += 1;
                }
                [' ', ..] | ['\r', ..] | ['\t', ..] => self.current += 1,
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        let comment_length = self.rest().iter().take_while(|&&c| c != '\n').count();
        self.current += comment_length;
    }

    fn skip_block_comment(&mut self) {
        // Skip the opening `/*`.
        self.current += 2;
        let mut depth = 1;

        while depth > 0 {
            match self.rest() {
                ['/', '*', ..] => {
                    depth += 1;
                    self.current += 2;
                }
                ['*', '/', ..] => {
                    depth -= 1;
                    self.current += 2;
                }
                ['\n', ..] => {
                    self.line += 1;
                    self.current += 1;
                }
                [_, ..] => self.current += 1,
                [] => {
                    self.error(error::UnterminatedComment);
                    return;
                }
            }
        }
    }

    fn scan_string(&mut self) -> Option<Token> {
        let mut size = 1;
        let chars = self.rest();

        loop {
            match chars.get(size) {
                Some('"') => break,
                Some('\n') => self.line += 1,
                Some(_) => (),
                None => {
                    self.current += size;
                    self.error(error::UnterminatedString);
                    return None;
                }
            }
            size += 1;
        }

        let value = chars[1..size].iter().collect::<String>();
        // Add 1 to account for the closing quote.
        self.current += size + 1;
        Some(Token::new(token::Str, self.lexeme(), self.line).with_literal(Literal::Str(value)))
    }

    fn scan_number(&mut self) -> Option<Token> {
        self.current += self.count_digits(0);

        if let ['.', c, ..] = self.rest() {
            if c.is_ascii_digit() {
                self.current += 1 + self.count_digits(1);
            }
        }

        let lexeme = self.lexeme();
        match lexeme.parse::<f64>() {
            Ok(value) => {
                Some(Token::new(token::Num, lexeme, self.line).with_literal(Literal::Number(value)))
            }
            Err(_) => {
                self.error(error::MalformedNumber);
                None
            }
        }
    }

    fn count_digits(&self, offset: usize) -> usize {
        self.rest()[offset..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count()
    }

    fn scan_identifier(&mut self) -> Token {
        let length = self
            .rest()
            .iter()
            .take_while(|&&c| is_alpha(c) || c.is_ascii_digit())
            .count();
        self.current += length;

        let name = self.lexeme();
        let ty = KEYWORDS.get(name.as_str()).copied().unwrap_or(token::Ident);
        Token::new(ty, name, self.line)
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Scans `src` into tokens, always terminated by an EOF token.
///
/// Invalid input is reported in the returned error list and skipped, so
/// scanning never stops early.
pub fn scan(src: &str) -> (Vec<Token>, Vec<LoxError>) {
    let chars = src.chars().collect::<Vec<_>>();
    let mut lexer = Lexer {
        src: &chars,
        start: 0,
        current: 0,
        line: 1,
        errors: vec![],
    };

    let mut tokens = std::iter::from_fn(|| lexer.next_token()).collect::<Vec<_>>();
    tokens.push(Token::new(token::Eof, "", lexer.line));

    debug!("scanned {} tokens with {} errors", tokens.len(), lexer.errors.len());
    (tokens, lexer.errors)
}
