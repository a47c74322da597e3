//! Precedence-climbing parser for a single expression.

use std::sync::Arc;

use crate::ast::{ArrowFunction, BinaryOp, Element, Expr, LogicalOp, Param, Property, UnaryOp};
use crate::error::{CompileError, Result};
use crate::guard::DepthGuard;
use crate::lexer::{Token, is_reserved, tokenize};

/// Parse `source` as exactly one expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.sequence()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

/// Binding power of a binary operator token, with its node builder.
fn binary_op(token: &Token) -> Option<(u8, BinaryKind)> {
    let Token::Punct(p) = token else {
        return None;
    };
    let entry = match *p {
        "??" => (1, BinaryKind::Logical(LogicalOp::Nullish)),
        "||" => (1, BinaryKind::Logical(LogicalOp::Or)),
        "&&" => (2, BinaryKind::Logical(LogicalOp::And)),
        "|" => (3, BinaryKind::Binary(BinaryOp::BitOr)),
        "^" => (4, BinaryKind::Binary(BinaryOp::BitXor)),
        "&" => (5, BinaryKind::Binary(BinaryOp::BitAnd)),
        "==" => (6, BinaryKind::Binary(BinaryOp::LooseEq)),
        "!=" => (6, BinaryKind::Binary(BinaryOp::LooseNe)),
        "===" => (6, BinaryKind::Binary(BinaryOp::StrictEq)),
        "!==" => (6, BinaryKind::Binary(BinaryOp::StrictNe)),
        "<" => (7, BinaryKind::Binary(BinaryOp::Lt)),
        "<=" => (7, BinaryKind::Binary(BinaryOp::Le)),
        ">" => (7, BinaryKind::Binary(BinaryOp::Gt)),
        ">=" => (7, BinaryKind::Binary(BinaryOp::Ge)),
        "+" => (8, BinaryKind::Binary(BinaryOp::Add)),
        "-" => (8, BinaryKind::Binary(BinaryOp::Sub)),
        "*" => (9, BinaryKind::Binary(BinaryOp::Mul)),
        "/" => (9, BinaryKind::Binary(BinaryOp::Div)),
        "%" => (9, BinaryKind::Binary(BinaryOp::Rem)),
        "**" => (10, BinaryKind::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

#[derive(Clone, Copy)]
enum BinaryKind {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at(&self, p: &str) -> bool {
        self.peek().is_some_and(|t| t.is(p))
    }

    fn eat(&mut self, p: &str) -> bool {
        if self.at(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: &str) -> Result<()> {
        if self.eat(p) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> CompileError {
        match self.peek() {
            None => CompileError::syntax("Unexpected end of input"),
            Some(token) => CompileError::syntax(format!("Unexpected {}", token.describe())),
        }
    }

    fn sequence(&mut self) -> Result<Expr> {
        let first = self.assignment()?;
        if !self.at(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(",") {
            items.push(self.assignment()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn assignment(&mut self) -> Result<Expr> {
        let _guard = DepthGuard::enter()?;
        if self.arrow_ahead() {
            self.arrow()
        } else {
            self.conditional()
        }
    }

    fn conditional(&mut self) -> Result<Expr> {
        let test = self.binary(1)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let then = self.assignment()?;
        if !self.eat(":") {
            return Err(self.unexpected());
        }
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional(
            Box::new(test),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr> {
        let starts_unary = self.peek().is_some_and(|t| {
            ["!", "-", "+", "~"].iter().any(|p| t.is(p)) || t.is_ident("typeof") || t.is_ident("void")
        });
        let mut left = self.unary()?;
        let mut left_is_unary = starts_unary;

        while let Some((prec, kind)) = self.peek().and_then(binary_op) {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = match kind {
                BinaryKind::Binary(BinaryOp::Pow) => {
                    if left_is_unary {
                        return Err(CompileError::syntax(
                            "Unary operator used immediately before exponentiation expression. \
                             Parenthesis must be used to disambiguate operator precedence",
                        ));
                    }
                    self.binary(prec)?
                }
                _ => self.binary(prec + 1)?,
            };
            left = match kind {
                BinaryKind::Binary(op) => Expr::Binary(op, Box::new(left), Box::new(right)),
                BinaryKind::Logical(op) => Expr::Logical(op, Box::new(left), Box::new(right)),
            };
            left_is_unary = false;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Punct("!")) => Some(UnaryOp::Not),
            Some(Token::Punct("-")) => Some(UnaryOp::Neg),
            Some(Token::Punct("+")) => Some(UnaryOp::Plus),
            Some(Token::Punct("~")) => Some(UnaryOp::BitNot),
            Some(t) if t.is_ident("typeof") => Some(UnaryOp::TypeOf),
            Some(t) if t.is_ident("void") => Some(UnaryOp::Void),
            _ => None,
        };
        let Some(op) = op else {
            return self.postfix();
        };
        self.pos += 1;
        let _guard = DepthGuard::enter()?;
        let operand = self.unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        let mut chained = false;
        loop {
            if self.eat(".") {
                let name = self.property_name()?;
                expr = member(expr, Expr::String(name), false);
            } else if self.eat("?.") {
                chained = true;
                if self.eat("(") {
                    let args = self.elements(")")?;
                    expr = call(expr, args, true);
                } else if self.eat("[") {
                    let property = self.sequence()?;
                    self.expect("]")?;
                    expr = member(expr, property, true);
                } else {
                    let name = self.property_name()?;
                    expr = member(expr, Expr::String(name), true);
                }
            } else if self.eat("[") {
                let property = self.sequence()?;
                self.expect("]")?;
                expr = member(expr, property, false);
            } else if self.eat("(") {
                let args = self.elements(")").map_err(|e| {
                    if e.message.starts_with("Unexpected") && self.peek().is_some() {
                        CompileError::syntax("missing ) after argument list")
                    } else {
                        e
                    }
                })?;
                expr = call(expr, args, false);
            } else {
                break;
            }
        }
        Ok(if chained { Expr::Chain(Box::new(expr)) } else { expr })
    }

    fn property_name(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Comma-separated elements up to `close`, allowing holes in arrays.
    fn elements(&mut self, close: &str) -> Result<Vec<Element>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            if close == "]" && self.eat(",") {
                items.push(Element::Item(Expr::Undefined));
                continue;
            }
            if self.eat("...") {
                items.push(Element::Spread(self.assignment()?));
            } else {
                items.push(Element::Item(self.assignment()?));
            }
            if !self.eat(",") {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(token) = self.next() else {
            return Err(CompileError::syntax("Unexpected end of input"));
        };
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::String(s) => Ok(Expr::String(s)),
            Token::Regex { source, flags } => Ok(Expr::Regex { source, flags }),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "undefined" | "this" => Ok(Expr::Undefined),
                _ if is_reserved(&name) => {
                    self.pos -= 1;
                    Err(self.unexpected())
                }
                _ => Ok(Expr::Ident(name)),
            },
            Token::Punct("(") => {
                let _guard = DepthGuard::enter()?;
                let inner = self.sequence()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Punct("[") => {
                let _guard = DepthGuard::enter()?;
                let items = self.elements("]")?;
                Ok(Expr::Array(items))
            }
            Token::Punct("{") => {
                let _guard = DepthGuard::enter()?;
                let object = self.object()?;
                Ok(object)
            }
            Token::Punct(_) => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn object(&mut self) -> Result<Expr> {
        let mut properties = Vec::new();
        loop {
            if self.eat("}") {
                return Ok(Expr::Object(properties));
            }
            if self.eat("...") {
                properties.push(Property::Spread(self.assignment()?));
            } else if self.eat("[") {
                let key = self.assignment()?;
                self.expect("]")?;
                self.expect(":")?;
                properties.push(Property::Computed(key, self.assignment()?));
            } else {
                let (key, shorthand) = match self.next() {
                    Some(Token::Ident(name)) => {
                        let shorthand = !is_reserved(&name);
                        (name, shorthand)
                    }
                    Some(Token::String(s)) => (s, false),
                    Some(Token::Number(n)) => (zt_schema::value::js_number_string(n), false),
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected());
                    }
                };
                if self.eat(":") {
                    properties.push(Property::Named(key, self.assignment()?));
                } else if shorthand && (self.at(",") || self.at("}")) {
                    properties.push(Property::Named(key.clone(), Expr::Ident(key)));
                } else {
                    return Err(self.unexpected());
                }
            }
            if !self.eat(",") {
                self.expect("}")?;
                return Ok(Expr::Object(properties));
            }
        }
    }

    /// Whether the tokens at the cursor begin an arrow function.
    fn arrow_ahead(&self) -> bool {
        match self.peek() {
            Some(Token::Ident(name)) if !is_reserved(name) => {
                self.peek_at(1).is_some_and(|t| t.is("=>"))
            }
            Some(t) if t.is("(") => {
                let mut depth = 0usize;
                for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
                    if token.is("(") || token.is("[") || token.is("{") {
                        depth += 1;
                    } else if token.is(")") || token.is("]") || token.is("}") {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return self.peek_at(offset + 1).is_some_and(|t| t.is("=>"));
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn arrow(&mut self) -> Result<Expr> {
        let params = if self.eat("(") {
            let mut params = Vec::new();
            while !self.eat(")") {
                params.push(self.param()?);
                if !self.eat(",") {
                    self.expect(")")?;
                    break;
                }
            }
            params
        } else {
            vec![self.param()?]
        };
        self.expect("=>")?;

        let body = if self.eat("{") {
            let body = if self.peek().is_some_and(|t| t.is_ident("return")) {
                self.pos += 1;
                if self.at(";") || self.at("}") {
                    None
                } else {
                    Some(self.sequence()?)
                }
            } else {
                None
            };
            self.eat(";");
            self.expect("}")?;
            body
        } else {
            Some(self.assignment()?)
        };

        Ok(Expr::Arrow(Arc::new(ArrowFunction { params, body })))
    }

    fn param(&mut self) -> Result<Param> {
        match self.next() {
            Some(Token::Ident(name)) if !is_reserved(&name) => Ok(Param::Name(name)),
            Some(Token::Punct("{")) => {
                let mut bindings = Vec::new();
                while !self.eat("}") {
                    let key = self.property_name()?;
                    let local = if self.eat(":") {
                        self.property_name()?
                    } else {
                        key.clone()
                    };
                    if is_reserved(&local) {
                        return Err(CompileError::syntax(format!("Unexpected token '{local}'")));
                    }
                    bindings.push((key, local));
                    if !self.eat(",") {
                        self.expect("}")?;
                        break;
                    }
                }
                Ok(Param::Object(bindings))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.unexpected())
            }
        }
    }
}

fn member(object: Expr, property: Expr, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: Box::new(property),
        optional,
    }
}

fn call(callee: Expr, args: Vec<Element>, optional: bool) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        optional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Number(2.0)),
                    Box::new(Expr::Number(3.0)),
                )),
            )
        );
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let expr = parse_expression("2 ** 3 ** 2").unwrap();
        let Expr::Binary(BinaryOp::Pow, _, right) = expr else {
            panic!("expected exponent");
        };
        assert!(matches!(*right, Expr::Binary(BinaryOp::Pow, ..)));
        assert!(parse_expression("-2 ** 2").is_err());
    }

    #[test]
    fn test_member_call() {
        let expr = parse_expression("z.string()").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                callee: Box::new(Expr::Member {
                    object: ident("z"),
                    property: Box::new(Expr::String("string".to_string())),
                    optional: false,
                }),
                args: vec![],
                optional: false,
            }
        );
    }

    #[test]
    fn test_object_literal_keys() {
        let expr = parse_expression("{a: 1, 'b c': 2, 3: x, d, ...e, [f]: 4,}").unwrap();
        let Expr::Object(properties) = expr else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 6);
        assert_eq!(properties[3], Property::Named("d".to_string(), Expr::Ident("d".to_string())));
        assert!(matches!(properties[4], Property::Spread(_)));
    }

    #[test]
    fn test_arrow_forms() {
        for source in [
            "x => x > 1",
            "(x) => x",
            "(a, b) => a + b",
            "() => 1",
            "({ a, b: c }) => a === c",
            "(v) => { return v.length > 0; }",
        ] {
            assert!(
                matches!(parse_expression(source).unwrap(), Expr::Arrow(_)),
                "{source}"
            );
        }
        // Parenthesised expressions are not parameter lists
        assert!(matches!(parse_expression("(a) + 1").unwrap(), Expr::Binary(..)));
    }

    #[test]
    fn test_optional_chain_is_wrapped() {
        let expr = parse_expression("a?.b.c").unwrap();
        assert!(matches!(expr, Expr::Chain(_)));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse_expression("").unwrap_err().message, "Unexpected end of input");
        assert_eq!(parse_expression("z.string(").unwrap_err().message, "Unexpected end of input");
        assert_eq!(parse_expression("a b").unwrap_err().message, "Unexpected identifier 'b'");
        assert_eq!(parse_expression("z = 1").unwrap_err().message, "Unexpected token '='");
        assert_eq!(
            parse_expression("f(1 2)").unwrap_err().message,
            "missing ) after argument list"
        );
        assert_eq!(
            parse_expression("function () {}").unwrap_err().message,
            "Unexpected token 'function'"
        );
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "(".repeat(400), ")".repeat(400));
        assert_eq!(parse_expression(&source).unwrap_err().kind, ErrorKind::Range);
    }
}
