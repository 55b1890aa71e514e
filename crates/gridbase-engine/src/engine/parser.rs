//! Precedence-climbing parser producing a formula AST.
//!
//! Precedence, lowest first: comparison, `&`, `+ -`, `* /`, unary sign,
//! primaries (literals, `{field}` references, calls, parenthesized groups).
//!
//! Runs of operators at one precedence level parse into a flat
//! [`Expr::Chain`] rather than a left-deep tree, so long sums evaluate in a
//! loop instead of recursing once per operand.

use super::Value;
use super::lexer::{Lexer, Token};
use crate::error::{FormulaError, Result};

/// Nesting limit for groups, calls and unary signs.
pub(crate) const MAX_DEPTH: usize = 200;
/// Operand limit for one formula.
pub(crate) const MAX_OPERANDS: usize = 2_000;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Field(String),
    Call { name: String, args: Vec<Expr> },
    Negate(Box<Expr>),
    /// `first op1 e1 op2 e2 ...`, all operators of one precedence, applied
    /// left to right.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinaryOp, Expr)>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
}

pub(crate) fn parse(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_expr(0)?;
    if parser.lookahead != Token::Eof {
        return Err(FormulaError::parse(
            parser.offset,
            format!("unexpected token {:?}", parser.lookahead),
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    offset: usize,
    depth: usize,
    operands: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let (lookahead, offset) = lexer.next_token()?;
        Ok(Self {
            lexer,
            lookahead,
            offset,
            depth: 0,
            operands: 0,
        })
    }

    fn bump(&mut self) -> Result<Token> {
        let (next, offset) = self.lexer.next_token()?;
        self.offset = offset;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.lookahead == token {
            self.bump()?;
            Ok(())
        } else if self.lookahead == Token::Eof {
            Err(FormulaError::UnexpectedEnd)
        } else {
            Err(FormulaError::parse(
                self.offset,
                format!("expected {token:?}, found {:?}", self.lookahead),
            ))
        }
    }

    fn infix_binding_power(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.lookahead {
            Token::Equals => BinaryOp::Equals,
            Token::NotEquals => BinaryOp::NotEquals,
            Token::Less => BinaryOp::Less,
            Token::LessEquals => BinaryOp::LessEquals,
            Token::Greater => BinaryOp::Greater,
            Token::GreaterEquals => BinaryOp::GreaterEquals,
            Token::Ampersand => BinaryOp::Concat,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Subtract,
            Token::Star => BinaryOp::Multiply,
            Token::Slash => BinaryOp::Divide,
            _ => return None,
        };
        let prec = match op {
            BinaryOp::Equals
            | BinaryOp::NotEquals
            | BinaryOp::Less
            | BinaryOp::LessEquals
            | BinaryOp::Greater
            | BinaryOp::GreaterEquals => 1,
            BinaryOp::Concat => 2,
            BinaryOp::Add | BinaryOp::Subtract => 3,
            BinaryOp::Multiply | BinaryOp::Divide => 4,
        };
        Some((op, prec))
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((_, prec)) = self.infix_binding_power() {
            if prec < min_prec {
                break;
            }
            // All binary operators are left-associative: collect every
            // operator of this precedence into one chain.
            let mut rest = Vec::new();
            loop {
                match self.infix_binding_power() {
                    Some((op, p)) if p == prec => {
                        self.bump()?;
                        rest.push((op, self.parse_expr(prec + 1)?));
                    }
                    _ => break,
                }
            }
            left = Expr::Chain {
                first: Box::new(left),
                rest,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::parse(self.offset, "formula is nested too deeply"));
        }
        if self.operands >= MAX_OPERANDS {
            return Err(FormulaError::parse(self.offset, "formula is too long"));
        }
        self.operands += 1;
        self.depth += 1;
        let expr = self.parse_unary_inner();
        self.depth -= 1;
        expr
    }

    fn parse_unary_inner(&mut self) -> Result<Expr> {
        match self.lookahead {
            Token::Minus => {
                self.bump()?;
                Ok(Expr::Negate(Box::new(self.parse_unary()?)))
            }
            Token::Plus => {
                self.bump()?;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let offset = self.offset;
        match self.bump()? {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::String(s) => Ok(Expr::Literal(Value::String(s))),
            Token::FieldRef(name) => Ok(Expr::Field(name)),
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.lookahead == Token::LParen {
                    self.bump()?;
                    let args = self.parse_args()?;
                    return Ok(Expr::Call { name, args });
                }
                if name.eq_ignore_ascii_case("true") {
                    Ok(Expr::Literal(Value::Bool(true)))
                } else if name.eq_ignore_ascii_case("false") {
                    Ok(Expr::Literal(Value::Bool(false)))
                } else {
                    Err(FormulaError::parse(
                        offset,
                        format!("unknown identifier {name:?}"),
                    ))
                }
            }
            Token::Eof => Err(FormulaError::UnexpectedEnd),
            other => Err(FormulaError::parse(
                offset,
                format!("unexpected token {other:?}"),
            )),
        }
    }

    /// Arguments after the opening paren, consuming the closing paren.
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.lookahead == Token::RParen {
            self.bump()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            match self.lookahead {
                Token::Comma => {
                    self.bump()?;
                }
                Token::RParen => {
                    self.bump()?;
                    return Ok(args);
                }
                Token::Eof => return Err(FormulaError::UnexpectedEnd),
                _ => {
                    return Err(FormulaError::parse(
                        self.offset,
                        format!("expected ',' or ')', found {:?}", self.lookahead),
                    ));
                }
            }
        }
    }
}
