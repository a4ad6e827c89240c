//! Restricted arithmetic expression evaluation for `--evaluate`.
//!
//! Deliberately a tiny recursive-descent parser over `+ - * / %`, unary
//! minus, parentheses, and decimal literals. Anything else is an error. This
//! keeps `--evaluate` useful for macro arithmetic without exposing a general
//! code-execution surface, which is also why the option is gated on GM
//! privilege before any mutation begins.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expected ')' to close expression group")]
    UnbalancedParen,
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("trailing input after expression")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

/// Evaluate an arithmetic expression to a number.
pub fn evaluate(text: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(EvalError::TrailingInput);
    }
    Ok(value)
}

/// Render an evaluated result the way chat values are stored: integral
/// results print without a fractional part.
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            },
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            },
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            },
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            },
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            },
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            },
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            },
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            },
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal.parse().map_err(|_| EvalError::BadNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            },
            other => return Err(EvalError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                },
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                },
                _ => break,
            }
        }
        Ok(value)
    }

    // term := factor (('*' | '/' | '%') factor)*
    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    value *= self.factor()?;
                },
                Token::Slash => {
                    self.next();
                    value /= self.factor()?;
                },
                Token::Percent => {
                    self.next();
                    value %= self.factor()?;
                },
                _ => break,
            }
        }
        Ok(value)
    }

    // factor := '-' factor | number | '(' expr ')'
    fn factor(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(EvalError::UnbalancedParen),
                }
            },
            Some(Token::Plus | Token::Star | Token::Slash | Token::Percent | Token::RParen) => {
                Err(EvalError::TrailingInput)
            },
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}
