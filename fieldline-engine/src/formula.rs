//! 受限算术公式：仅支持 `+ - * / ( )`、十进制数字与 `field_width` / `field_length` 两个符号。
//!
//! 实现为词法分析 + 递归下降解析 + 求值三段，不借助任何动态求值手段。

use std::fmt;

use fieldline_core::template::FormulaOrNumber;

use crate::errors::FormulaError;

pub const FIELD_WIDTH: &str = "field_width";
pub const FIELD_LENGTH: &str = "field_length";

/// 公式源文本的最大字节数。
pub const MAX_FORMULA_LEN: usize = 1024;
/// 括号与一元运算符的最大嵌套层数。
pub const MAX_FORMULA_DEPTH: usize = 64;

/// 公式求值时的变量取值（单位：米）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaVars {
    pub field_width: f64,
    pub field_length: f64,
}

impl FormulaVars {
    #[inline]
    pub fn new(field_width: f64, field_length: f64) -> Self {
        Self {
            field_width,
            field_length,
        }
    }

    #[inline]
    fn get(&self, symbol: Symbol) -> f64 {
        match symbol {
            Symbol::FieldWidth => self.field_width,
            Symbol::FieldLength => self.field_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    FieldWidth,
    FieldLength,
}

impl Symbol {
    fn from_identifier(name: &str) -> Option<Self> {
        match name {
            FIELD_WIDTH => Some(Symbol::FieldWidth),
            FIELD_LENGTH => Some(Symbol::FieldLength),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Symbol(Symbol),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Symbol(Symbol),
    Neg(Box<Expr>),
    /// 同优先级运算链，自左向右求值，链长不增加递归深度。
    Chain(Box<Expr>, Vec<(BinaryOp, Expr)>),
}

/// 已解析的公式，可针对不同场地尺寸重复求值。
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.len() > MAX_FORMULA_LEN {
            return Err(FormulaError::invalid(
                source,
                format!("formula longer than {MAX_FORMULA_LEN} bytes"),
            ));
        }
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::invalid(source, "empty formula"));
        }
        let mut parser = Parser {
            source,
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        match parser.peek() {
            None => Ok(Self {
                source: source.to_string(),
                expr,
            }),
            Some(Token::RParen) => Err(FormulaError::invalid(
                source,
                "unbalanced parentheses: unexpected `)`",
            )),
            Some(token) => Err(FormulaError::invalid(
                source,
                format!("unexpected {} after complete expression", describe(token)),
            )),
        }
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, vars: &FormulaVars) -> Result<f64, FormulaError> {
        let value = eval(&self.expr, vars, &self.source)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::invalid(&self.source, "result is not a finite number"))
        }
    }

    /// 公式中出现的全部数字字面量，按出现顺序。
    pub fn literals(&self) -> Vec<f64> {
        let mut out = Vec::new();
        collect_literals(&self.expr, &mut out);
        out
    }

    pub fn references(&self, symbol: Symbol) -> bool {
        references(&self.expr, symbol)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 对模板数值求值：数字直接返回，公式按当前场地尺寸计算。
pub fn evaluate(value: &FormulaOrNumber, vars: &FormulaVars) -> Result<f64, FormulaError> {
    match value {
        FormulaOrNumber::Number(number) if number.is_finite() => Ok(*number),
        FormulaOrNumber::Number(number) => Err(FormulaError::invalid(
            &number.to_string(),
            "literal is not a finite number",
        )),
        FormulaOrNumber::Formula(source) => evaluate_str(source, vars),
    }
}

pub fn evaluate_str(source: &str, vars: &FormulaVars) -> Result<f64, FormulaError> {
    Formula::parse(source)?.evaluate(vars)
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                chars.next();
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &source[start..end];
                let value = literal.parse::<f64>().map_err(|_| {
                    FormulaError::invalid(source, format!("invalid number literal `{literal}`"))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &source[start..end];
                let symbol = Symbol::from_identifier(name).ok_or_else(|| {
                    FormulaError::invalid(source, format!("unknown identifier `{name}`"))
                })?;
                tokens.push(Token::Symbol(symbol));
            }
            other => {
                return Err(FormulaError::invalid(
                    source,
                    format!("unexpected character `{other}` at offset {start}"),
                ));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(chain(first, rest)),
            };
            self.bump();
            rest.push((op, self.parse_term()?));
        }
    }

    // term := unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(chain(first, rest)),
            };
            self.bump();
            rest.push((op, self.parse_unary()?));
        }
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_FORMULA_DEPTH {
            return Err(FormulaError::invalid(self.source, "formula nested too deeply"));
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.bump();
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        match self.bump() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Symbol(symbol)) => Ok(Expr::Symbol(symbol)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::invalid(
                        self.source,
                        "unbalanced parentheses: missing `)`",
                    )),
                }
            }
            Some(Token::RParen) => Err(FormulaError::invalid(
                self.source,
                "unbalanced parentheses: unexpected `)`",
            )),
            Some(token) => Err(FormulaError::invalid(
                self.source,
                format!("expected a number, symbol or `(`, found {}", describe(token)),
            )),
            None => Err(FormulaError::invalid(self.source, "unexpected end of formula")),
        }
    }
}

fn chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Chain(Box::new(first), rest)
    }
}

fn describe(token: Token) -> String {
    match token {
        Token::Number(value) => format!("number {value}"),
        Token::Symbol(Symbol::FieldWidth) => format!("`{FIELD_WIDTH}`"),
        Token::Symbol(Symbol::FieldLength) => format!("`{FIELD_LENGTH}`"),
        Token::Plus => "`+`".to_string(),
        Token::Minus => "`-`".to_string(),
        Token::Star => "`*`".to_string(),
        Token::Slash => "`/`".to_string(),
        Token::LParen => "`(`".to_string(),
        Token::RParen => "`)`".to_string(),
    }
}

fn eval(expr: &Expr, vars: &FormulaVars, source: &str) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Symbol(symbol) => Ok(vars.get(*symbol)),
        Expr::Neg(inner) => Ok(-eval(inner, vars, source)?),
        Expr::Chain(first, rest) => {
            let mut acc = eval(first, vars, source)?;
            for (op, rhs) in rest {
                let r = eval(rhs, vars, source)?;
                acc = match op {
                    BinaryOp::Add => acc + r,
                    BinaryOp::Sub => acc - r,
                    BinaryOp::Mul => acc * r,
                    BinaryOp::Div if r == 0.0 => {
                        return Err(FormulaError::DivisionByZero {
                            formula: source.to_string(),
                        });
                    }
                    BinaryOp::Div => acc / r,
                };
            }
            Ok(acc)
        }
    }
}

fn collect_literals(expr: &Expr, out: &mut Vec<f64>) {
    match expr {
        Expr::Number(value) => out.push(*value),
        Expr::Symbol(_) => {}
        Expr::Neg(inner) => collect_literals(inner, out),
        Expr::Chain(first, rest) => {
            collect_literals(first, out);
            for (_, rhs) in rest {
                collect_literals(rhs, out);
            }
        }
    }
}

fn references(expr: &Expr, symbol: Symbol) -> bool {
    match expr {
        Expr::Number(_) => false,
        Expr::Symbol(found) => *found == symbol,
        Expr::Neg(inner) => references(inner, symbol),
        Expr::Chain(first, rest) => {
            references(first, symbol) || rest.iter().any(|(_, rhs)| references(rhs, symbol))
        }
    }
}
