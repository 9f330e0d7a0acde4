//! Recursive-descent parser for the arrow lambda grammar.
//!
//! Accepted shape: `<params> => <expr>` where `<params>` is a bare
//! identifier or a parenthesized, comma-separated identifier list. A single
//! trailing `;` after the body is tolerated, matching sources that write an
//! explicit statement terminator.

use crate::error::{Result, StepseqError};
use crate::lambda::ast::{BinaryOp, Expr, Lambda, UnaryOp};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Arrow,
    Question,
    Colon,
    Semicolon,
    Not,
    Mul,
    Div,
    Rem,
    Plus,
    Minus,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
}

fn invalid(source: &str, message: impl Into<String>) -> StepseqError {
    StepseqError::InvalidExpression {
        message: message.into(),
        expression: source.to_string(),
    }
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    let n = text
                        .parse::<f64>()
                        .map_err(|_| invalid(source, format!("bad number literal '{text}'")))?;
                    tokens.push(Token::Float(n));
                } else {
                    let n = text
                        .parse::<i64>()
                        .map_err(|_| invalid(source, format!("bad number literal '{text}'")))?;
                    tokens.push(Token::Int(n));
                }
            }
            '\'' | '"' => {
                let quote = c;
                i += 1;
                let mut text = String::new();
                loop {
                    if i >= chars.len() {
                        return Err(invalid(source, "unterminated string literal"));
                    }
                    if chars[i] == quote {
                        i += 1;
                        break;
                    }
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                        match chars[i] {
                            'n' => text.push('\n'),
                            't' => text.push('\t'),
                            other => text.push(other),
                        }
                    } else {
                        text.push(chars[i]);
                    }
                    i += 1;
                }
                tokens.push(Token::Str(text));
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Rem);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push(Token::Arrow);
                    i += 2;
                } else if chars.get(i + 1) == Some(&'=') {
                    // Accept both == and ===
                    i += 2;
                    if chars.get(i) == Some(&'=') {
                        i += 1;
                    }
                    tokens.push(Token::EqEq);
                } else {
                    return Err(invalid(source, "assignment is not supported"));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    if chars.get(i) == Some(&'=') {
                        i += 1;
                    }
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(invalid(source, "unexpected character '&'"));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(invalid(source, "unexpected character '|'"));
                }
            }
            other => {
                return Err(invalid(source, format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, source: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(invalid(self.source, format!("expected {what}")))
        }
    }

    fn parse_params(&mut self) -> Result<Vec<String>> {
        // Either a bare identifier or a parenthesized list
        if self.eat(&Token::LParen) {
            let mut params = Vec::new();
            if self.eat(&Token::RParen) {
                return Ok(params);
            }
            loop {
                match self.advance() {
                    Some(Token::Ident(name)) => params.push(name),
                    _ => return Err(invalid(self.source, "expected parameter name")),
                }
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "')' after parameter list")?;
                break;
            }
            Ok(params)
        } else {
            match self.advance() {
                Some(Token::Ident(name)) => Ok(vec![name]),
                _ => Err(invalid(self.source, "expected parameter list")),
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let cond = self.parse_or()?;
        if self.eat(&Token::Question) {
            let then_expr = self.parse_expr()?;
            self.expect(&Token::Colon, "':' in conditional")?;
            let else_expr = self.parse_conditional()?;
            return Ok(Expr::Conditional(
                Box::new(cond),
                Box::new(then_expr),
                Box::new(else_expr),
            ));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Mul) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Rem) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        if self.eat(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.advance() {
                    Some(Token::Ident(name)) => {
                        expr = Expr::Property(Box::new(expr), name);
                    }
                    _ => return Err(invalid(self.source, "expected property name after '.'")),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_expr()?;
                self.expect(&Token::RBracket, "']' after index")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::Int(n))),
            Some(Token::Float(n)) => Ok(Expr::Literal(Value::Float(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                "undefined" => Ok(Expr::Literal(Value::Undefined)),
                _ => Ok(Expr::Ident(name)),
            },
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(invalid(self.source, "expected expression")),
        }
    }
}

/// Parse a lambda string of the form `<params> => <expr>`
pub fn parse_lambda(source: &str) -> Result<Lambda> {
    let tokens = lex(source)?;
    if !tokens.contains(&Token::Arrow) {
        return Err(invalid(source, "missing '=>'"));
    }

    let mut parser = Parser::new(tokens, source);
    let params = parser.parse_params()?;
    parser.expect(&Token::Arrow, "'=>'")?;
    let body = parser.parse_expr()?;
    parser.eat(&Token::Semicolon);
    if parser.peek().is_some() {
        return Err(invalid(source, "unexpected trailing input"));
    }

    Ok(Lambda {
        params,
        body,
        source: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_parenthesized_params() {
        assert_eq!(parse_lambda("x => x").unwrap().params, vec!["x"]);
        assert_eq!(
            parse_lambda("(a, b, c) => a").unwrap().params,
            vec!["a", "b", "c"]
        );
        assert!(parse_lambda("() => 1").unwrap().params.is_empty());
    }

    #[test]
    fn test_trailing_semicolon_tolerated() {
        assert!(parse_lambda("x => x + 1;").is_ok());
    }

    #[test]
    fn test_precedence_shape() {
        let lambda = parse_lambda("x => 1 + 2 * 3").unwrap();
        match lambda.body {
            Expr::Binary(BinaryOp::Add, _, rhs) => {
                assert!(matches!(*rhs, Expr::Binary(BinaryOp::Mul, _, _)));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        assert!(parse_lambda("bad syntax").is_err());
        assert!(parse_lambda("(x, y => x").is_err());
        assert!(parse_lambda("x => ").is_err());
        assert!(parse_lambda("x => x) + 1").is_err());
        assert!(parse_lambda("=> x").is_err());
    }

    #[test]
    fn test_strict_equality_accepted() {
        assert!(parse_lambda("x => x === 3").is_ok());
        assert!(parse_lambda("x => x !== 3").is_ok());
    }
}
