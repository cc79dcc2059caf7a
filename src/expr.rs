//! Arithmetic expressions for derived columns.
//!
//! Grammar: `+ - * / % ( )`, numeric literals and at most two distinct
//! identifiers. Identifiers are resolved against real column names (or the
//! row-index sentinel) at view-spec validation time, not here.

use crate::error::ExprError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Index into [`ParsedExpr::idents`].
    Ident(usize),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// A parsed expression plus the distinct identifiers it references, in
/// first-appearance order. At most two.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedExpr {
    pub ast: Expr,
    pub idents: Vec<String>,
}

impl ParsedExpr {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = lex(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            idents: Vec::new(),
        };
        let ast = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(ExprError::UnexpectedToken(parser.describe_current()));
        }
        Ok(Self {
            ast,
            idents: parser.idents,
        })
    }

    /// Evaluate with `resolve` supplying the value of identifier `k`
    /// (an index into `self.idents`). Division and modulo by zero yield 0
    /// rather than poisoning a whole column.
    pub fn eval(&self, resolve: &dyn Fn(usize) -> f64) -> f64 {
        eval_node(&self.ast, resolve)
    }
}

fn eval_node(node: &Expr, resolve: &dyn Fn(usize) -> f64) -> f64 {
    match node {
        Expr::Number(v) => *v,
        Expr::Ident(k) => resolve(*k),
        Expr::Neg(inner) => -eval_node(inner, resolve),
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_node(lhs, resolve);
            let r = eval_node(rhs, resolve);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => {
                    if r == 0.0 {
                        0.0
                    } else {
                        l / r
                    }
                }
                BinOp::Rem => {
                    if r == 0.0 {
                        0.0
                    } else {
                        l % r
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

fn lex(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut lit = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        lit.push(d);
                        chars.next();
                    } else if (d == 'x' || d == 'X') && lit == "0" {
                        // hex literal
                        lit.push(d);
                        chars.next();
                        while let Some(&h) = chars.peek() {
                            if h.is_ascii_hexdigit() {
                                lit.push(h);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        break;
                    } else {
                        break;
                    }
                }
                let value = if let Some(hex) = lit.strip_prefix("0x").or_else(|| lit.strip_prefix("0X")) {
                    u32::from_str_radix(hex, 16)
                        .map(|v| v as f64)
                        .map_err(|_| ExprError::UnexpectedToken(lit.clone()))?
                } else {
                    lit.parse::<f64>()
                        .map_err(|_| ExprError::UnexpectedToken(lit.clone()))?
                };
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    idents: Vec<String>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(t) => format!("{t:?}"),
            None => "end".to_string(),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.bump() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::Ident(name)) => {
                let idx = match self.idents.iter().position(|n| *n == name) {
                    Some(idx) => idx,
                    None => {
                        if self.idents.len() == 2 {
                            return Err(ExprError::TooManyIdentifiers);
                        }
                        self.idents.push(name);
                        self.idents.len() - 1
                    }
                };
                Ok(Expr::Ident(idx))
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    Some(t) => Err(ExprError::UnexpectedToken(format!("{t:?}"))),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(t) => Err(ExprError::UnexpectedToken(format!("{t:?}"))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
