use super::ast::{BinaryOp, Expr, Function, Variable};
use super::lexer::{tokenize, Token, TokenKind};
use super::SyntaxError;
use std::str::FromStr;

/// Guards the recursive descent against pathological nesting.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parses a formula into an expression tree.
///
/// Precedence, loosest first: `+ -`, then `* /`, then unary `-`.
/// Operators of equal precedence associate to the left.
pub fn parse(formula: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(formula)?;
    if tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;

    if let Some(tok) = parser.peek() {
        return Err(SyntaxError::UnexpectedToken {
            found: tok.kind.to_string(),
            expected: "an operator or end of formula",
            offset: tok.offset,
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), SyntaxError> {
        match self.advance() {
            Some(tok) if tok.kind == kind => Ok(()),
            Some(tok) => Err(SyntaxError::UnexpectedToken {
                found: tok.kind.to_string(),
                expected,
                offset: tok.offset,
            }),
            None => Err(SyntaxError::UnexpectedEnd { expected }),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(SyntaxError::TooDeep {
                limit: MAX_NESTING_DEPTH,
                offset,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.peek().map(|t| t.offset).unwrap_or_default();
        if self.eat(&TokenKind::Minus) {
            self.enter(offset)?;
            let inner = self.unary()?;
            self.leave();
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.advance().ok_or(SyntaxError::UnexpectedEnd {
            expected: "a number, variable or '('",
        })?;

        match tok.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::LParen => {
                self.enter(tok.offset)?;
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                self.leave();
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if self.peek().is_some_and(|t| t.kind == TokenKind::LParen) {
                    self.pos += 1;
                    self.call(name, tok.offset)
                } else {
                    Variable::from_str(&name)
                        .map(Expr::Variable)
                        .map_err(|_| SyntaxError::UnknownVariable {
                            name,
                            offset: tok.offset,
                        })
                }
            }
            other => Err(SyntaxError::UnexpectedToken {
                found: other.to_string(),
                expected: "a number, variable or '('",
                offset: tok.offset,
            }),
        }
    }

    /// Parses the argument list after `name(`.
    fn call(&mut self, name: String, offset: usize) -> Result<Expr, SyntaxError> {
        let function = Function::from_str(&name).map_err(|_| SyntaxError::UnknownFunction {
            name: name.clone(),
            offset,
        })?;

        self.enter(offset)?;
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }
        self.leave();

        if !function.accepts(args.len()) {
            let (min, max) = function.arity();
            let expected = match max {
                Some(m) if m == min => min.to_string(),
                Some(m) => format!("{}..={}", min, m),
                None => format!("at least {}", min),
            };
            return Err(SyntaxError::Arity {
                name,
                expected,
                found: args.len(),
                offset,
            });
        }

        Ok(Expr::Call { function, args })
    }
}
