//! Recursive-descent statement parser with a Pratt expression core.

use std::rc::Rc;

use super::ast::{
    BinaryOp, DeclKind, Declarator, Expr, ExprKind, FunctionDecl, LogicalOp, Program, Stmt,
    UnaryOp, UpdateOp,
};
use super::error::{ScriptError, ScriptErrorKind};
use super::lexer::{Keyword, Lexeme, LexemeKind, Symbol, lex};
use crate::token::Span;

/// Binding power of an infix operator.
///
/// `left < right` is left-associative (`a - b - c` is `(a - b) - c`),
/// `left > right` is right-associative (`a = b = c` is `a = (b = c)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn left(power: u8) -> Self {
        Self {
            left: power,
            right: power + 1,
        }
    }

    const fn right(power: u8) -> Self {
        Self {
            left: power + 1,
            right: power,
        }
    }
}

const ASSIGN: BindingPower = BindingPower::right(4);
const CONDITIONAL: BindingPower = BindingPower::right(6);
const NULLISH: BindingPower = BindingPower::left(8);
const LOGICAL_OR: BindingPower = BindingPower::left(10);
const LOGICAL_AND: BindingPower = BindingPower::left(12);
const EQUALITY: BindingPower = BindingPower::left(20);
const RELATIONAL: BindingPower = BindingPower::left(22);
const ADDITIVE: BindingPower = BindingPower::left(26);
const MULTIPLICATIVE: BindingPower = BindingPower::left(28);
const EXPONENT: BindingPower = BindingPower::right(30);
/// Operand power of prefix operators; tighter than every infix operator.
const PREFIX: u8 = 32;

/// Deepest statement or expression nesting a script may use.
///
/// Operators folded into a left-associative chain count as one level each.
pub const MAX_NESTING: usize = 64;

/// What an infix symbol builds.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
    Assign(Option<BinaryOp>),
    Conditional,
}

fn infix(sym: Symbol) -> Option<(BindingPower, Infix)> {
    use Symbol as S;
    Some(match sym {
        S::Assign => (ASSIGN, Infix::Assign(None)),
        S::PlusAssign => (ASSIGN, Infix::Assign(Some(BinaryOp::Add))),
        S::MinusAssign => (ASSIGN, Infix::Assign(Some(BinaryOp::Sub))),
        S::StarAssign => (ASSIGN, Infix::Assign(Some(BinaryOp::Mul))),
        S::SlashAssign => (ASSIGN, Infix::Assign(Some(BinaryOp::Div))),
        S::PercentAssign => (ASSIGN, Infix::Assign(Some(BinaryOp::Rem))),
        S::Question => (CONDITIONAL, Infix::Conditional),
        S::QuestionQuestion => (NULLISH, Infix::Logical(LogicalOp::Nullish)),
        S::OrOr => (LOGICAL_OR, Infix::Logical(LogicalOp::Or)),
        S::AndAnd => (LOGICAL_AND, Infix::Logical(LogicalOp::And)),
        S::EqEq => (EQUALITY, Infix::Binary(BinaryOp::Eq)),
        S::NotEq => (EQUALITY, Infix::Binary(BinaryOp::NotEq)),
        S::EqEqEq => (EQUALITY, Infix::Binary(BinaryOp::StrictEq)),
        S::NotEqEq => (EQUALITY, Infix::Binary(BinaryOp::StrictNotEq)),
        S::Lt => (RELATIONAL, Infix::Binary(BinaryOp::Lt)),
        S::Le => (RELATIONAL, Infix::Binary(BinaryOp::Le)),
        S::Gt => (RELATIONAL, Infix::Binary(BinaryOp::Gt)),
        S::Ge => (RELATIONAL, Infix::Binary(BinaryOp::Ge)),
        S::Plus => (ADDITIVE, Infix::Binary(BinaryOp::Add)),
        S::Minus => (ADDITIVE, Infix::Binary(BinaryOp::Sub)),
        S::Star => (MULTIPLICATIVE, Infix::Binary(BinaryOp::Mul)),
        S::Slash => (MULTIPLICATIVE, Infix::Binary(BinaryOp::Div)),
        S::Percent => (MULTIPLICATIVE, Infix::Binary(BinaryOp::Rem)),
        S::StarStar => (EXPONENT, Infix::Binary(BinaryOp::Pow)),
        _ => return None,
    })
}

/// Parse script source into a `Program`.
///
/// # Errors
///
/// Returns `ScriptError` on lexical or syntax errors, including
/// `break`/`continue` outside a loop and `return` outside a function.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let lexemes = lex(source)?;
    Parser::new(&lexemes).parse_program()
}

struct Parser<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
    loop_depth: usize,
    function_depth: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    const fn new(lexemes: &'a [Lexeme]) -> Self {
        Self {
            lexemes,
            pos: 0,
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        }
    }

    fn parse_program(mut self) -> Result<Program, ScriptError> {
        let mut body = Vec::new();
        while self.pos < self.lexemes.len() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // -- Lexeme helpers --

    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&'a LexemeKind> {
        self.lexemes.get(self.pos + offset).map(|l| &l.kind)
    }

    fn next(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.lexemes.get(self.pos)?;
        self.pos += 1;
        Some(lexeme)
    }

    fn span(&self) -> Span {
        self.peek()
            .or_else(|| self.lexemes.last())
            .map_or_else(Span::default, |l| l.span)
    }

    fn at_symbol(&self, sym: Symbol) -> bool {
        matches!(self.peek(), Some(Lexeme { kind: LexemeKind::Symbol(s), .. }) if *s == sym)
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Some(Lexeme { kind: LexemeKind::Keyword(k), .. }) if *k == kw)
    }

    fn eat_symbol(&mut self, sym: Symbol) -> bool {
        if self.at_symbol(sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, sym: Symbol) -> Result<Span, ScriptError> {
        let span = self.span();
        if self.eat_symbol(sym) {
            Ok(span)
        } else {
            Err(self.unexpected(&sym.to_string()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ScriptError> {
        match self.peek() {
            Some(Lexeme {
                kind: LexemeKind::Ident(name),
                span,
                ..
            }) => {
                self.pos += 1;
                Ok((name.clone(), *span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        let expected = expected.to_string();
        match self.peek() {
            Some(lexeme) => ScriptError::new(
                ScriptErrorKind::UnexpectedToken {
                    expected,
                    found: lexeme.kind.to_string(),
                },
                lexeme.span,
            ),
            None => ScriptError::new(ScriptErrorKind::UnexpectedEnd { expected }, self.span()),
        }
    }

    /// A statement ends at `;`, before `}`, at the end, or at a line break.
    fn end_statement(&mut self) -> Result<(), ScriptError> {
        if self.eat_symbol(Symbol::Semicolon) {
            return Ok(());
        }
        match self.peek() {
            None => Ok(()),
            Some(l) if l.line_break_before => Ok(()),
            Some(_) if self.at_symbol(Symbol::RBrace) => Ok(()),
            Some(_) => Err(self.unexpected("';'")),
        }
    }

    /// Whether the next lexeme cannot continue the current statement.
    fn at_statement_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(l) => {
                l.line_break_before
                    || self.at_symbol(Symbol::Semicolon)
                    || self.at_symbol(Symbol::RBrace)
            }
        }
    }

    /// Go one nesting level deeper; the caller releases it with `leave`.
    fn enter(&mut self) -> Result<(), ScriptError> {
        if self.nesting >= MAX_NESTING {
            return Err(ScriptError::new(
                ScriptErrorKind::NestingTooDeep(MAX_NESTING),
                self.span(),
            ));
        }
        self.nesting += 1;
        Ok(())
    }

    const fn leave(&mut self, levels: usize) {
        self.nesting -= levels;
    }

    // -- Statements --

    fn parse_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.enter()?;
        let stmt = self.parse_statement_inner()?;
        self.leave(1);
        Ok(stmt)
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ScriptError> {
        let Some(lexeme) = self.peek() else {
            return Err(self.unexpected("statement"));
        };

        match &lexeme.kind {
            LexemeKind::Keyword(Keyword::Let) => self.parse_declaration_statement(DeclKind::Let),
            LexemeKind::Keyword(Keyword::Var) => self.parse_declaration_statement(DeclKind::Var),
            LexemeKind::Keyword(Keyword::Const) => {
                self.parse_declaration_statement(DeclKind::Const)
            }
            LexemeKind::Keyword(Keyword::If) => self.parse_if(),
            LexemeKind::Keyword(Keyword::For) => self.parse_for(),
            LexemeKind::Keyword(Keyword::While) => self.parse_while(),
            LexemeKind::Keyword(Keyword::Do) => self.parse_do_while(),
            LexemeKind::Keyword(Keyword::Function) => {
                Ok(Stmt::Function(Rc::new(self.parse_function()?)))
            }
            LexemeKind::Keyword(Keyword::Break) => {
                self.pos += 1;
                if self.loop_depth == 0 {
                    return Err(ScriptError::new(
                        ScriptErrorKind::BreakOutsideLoop,
                        lexeme.span,
                    ));
                }
                self.end_statement()?;
                Ok(Stmt::Break)
            }
            LexemeKind::Keyword(Keyword::Continue) => {
                self.pos += 1;
                if self.loop_depth == 0 {
                    return Err(ScriptError::new(
                        ScriptErrorKind::ContinueOutsideLoop,
                        lexeme.span,
                    ));
                }
                self.end_statement()?;
                Ok(Stmt::Continue)
            }
            LexemeKind::Keyword(Keyword::Return) => {
                self.pos += 1;
                if self.function_depth == 0 {
                    return Err(ScriptError::new(
                        ScriptErrorKind::ReturnOutsideFunction,
                        lexeme.span,
                    ));
                }
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_statement()?;
                Ok(Stmt::Return(value))
            }
            LexemeKind::Symbol(Symbol::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            LexemeKind::Symbol(Symbol::Semicolon) => {
                self.pos += 1;
                Ok(Stmt::Empty)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.end_statement()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect_symbol(Symbol::LBrace)?;
        let mut body = Vec::new();
        loop {
            if self.eat_symbol(Symbol::RBrace) {
                return Ok(body);
            }
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.parse_statement()?);
        }
    }

    fn parse_declaration_statement(&mut self, kind: DeclKind) -> Result<Stmt, ScriptError> {
        let stmt = self.parse_declaration(kind)?;
        self.end_statement()?;
        Ok(stmt)
    }

    /// `let a = 1, b` without the terminator.
    fn parse_declaration(&mut self, kind: DeclKind) -> Result<Stmt, ScriptError> {
        self.pos += 1; // let / var / const
        let mut declarators = Vec::new();
        loop {
            let (name, span) = self.expect_ident()?;
            let init = if self.eat_symbol(Symbol::Assign) {
                Some(self.parse_bp(ASSIGN.right)?)
            } else if kind == DeclKind::Const {
                return Err(self.unexpected("'=' after const name"));
            } else {
                None
            };
            declarators.push(Declarator { name, init, span });
            if !self.eat_symbol(Symbol::Comma) {
                break;
            }
        }
        Ok(Stmt::Decl { kind, declarators })
    }

    fn parse_if(&mut self) -> Result<Stmt, ScriptError> {
        self.pos += 1; // if
        self.expect_symbol(Symbol::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_symbol(Symbol::RParen)?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if self.at_keyword(Keyword::Else) {
            self.pos += 1;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Box<Stmt>, ScriptError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    fn parse_while(&mut self) -> Result<Stmt, ScriptError> {
        self.pos += 1; // while
        self.expect_symbol(Symbol::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_symbol(Symbol::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ScriptError> {
        self.pos += 1; // do
        let body = self.parse_loop_body()?;
        if !self.at_keyword(Keyword::While) {
            return Err(self.unexpected("'while'"));
        }
        self.pos += 1;
        self.expect_symbol(Symbol::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_symbol(Symbol::RParen)?;
        self.eat_symbol(Symbol::Semicolon);
        Ok(Stmt::DoWhile { body, cond })
    }

    fn decl_kind_at(&self, offset: usize) -> Option<DeclKind> {
        match self.peek_kind_at(offset) {
            Some(LexemeKind::Keyword(Keyword::Let)) => Some(DeclKind::Let),
            Some(LexemeKind::Keyword(Keyword::Var)) => Some(DeclKind::Var),
            Some(LexemeKind::Keyword(Keyword::Const)) => Some(DeclKind::Const),
            _ => None,
        }
    }

    fn parse_for(&mut self) -> Result<Stmt, ScriptError> {
        self.pos += 1; // for
        self.expect_symbol(Symbol::LParen)?;

        if let Some(kind) = self.decl_kind_at(0)
            && matches!(self.peek_kind_at(1), Some(LexemeKind::Ident(_)))
            && matches!(self.peek_kind_at(2), Some(LexemeKind::Ident(of)) if of == "of")
        {
            self.pos += 1;
            let (name, _) = self.expect_ident()?;
            self.pos += 1; // of
            let iterable = self.parse_expr()?;
            self.expect_symbol(Symbol::RParen)?;
            let body = self.parse_loop_body()?;
            return Ok(Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            });
        }

        let init = if self.at_symbol(Symbol::Semicolon) {
            None
        } else if let Some(kind) = self.decl_kind_at(0) {
            Some(Box::new(self.parse_declaration(kind)?))
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.expect_symbol(Symbol::Semicolon)?;

        let cond = if self.at_symbol(Symbol::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_symbol(Symbol::Semicolon)?;

        let update = if self.at_symbol(Symbol::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_symbol(Symbol::RParen)?;

        let body = self.parse_loop_body()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDecl, ScriptError> {
        let span = self.span();
        self.pos += 1; // function
        let (name, _) = self.expect_ident()?;

        self.expect_symbol(Symbol::LParen)?;
        let mut params = Vec::new();
        while !self.eat_symbol(Symbol::RParen) {
            let (param, _) = self.expect_ident()?;
            params.push(param);
            if !self.eat_symbol(Symbol::Comma) {
                self.expect_symbol(Symbol::RParen)?;
                break;
            }
        }

        // loops outside the function do not enclose its body
        let saved_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;

        Ok(FunctionDecl {
            name,
            params,
            body: body?,
            span,
        })
    }

    // -- Expressions --

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        self.parse_bp(0)
    }

    fn parse_bp(&mut self, min_bp: u8) -> Result<Expr, ScriptError> {
        self.enter()?;
        let mut levels = 1;
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some(Lexeme {
                kind: LexemeKind::Symbol(sym),
                ..
            }) = self.peek()
            else {
                break;
            };
            let Some((bp, op)) = infix(*sym) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }
            self.enter()?;
            levels += 1;
            self.pos += 1;

            let span = lhs.span;
            let kind = match op {
                Infix::Binary(op) => ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(self.parse_bp(bp.right)?),
                },
                Infix::Logical(op) => ExprKind::Logical {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(self.parse_bp(bp.right)?),
                },
                Infix::Assign(op) => {
                    if !lhs.is_place() {
                        return Err(ScriptError::new(
                            ScriptErrorKind::InvalidAssignmentTarget,
                            lhs.span,
                        ));
                    }
                    ExprKind::Assign {
                        op,
                        target: Box::new(lhs),
                        value: Box::new(self.parse_bp(bp.right)?),
                    }
                }
                Infix::Conditional => {
                    let then = self.parse_bp(ASSIGN.right)?;
                    self.expect_symbol(Symbol::Colon)?;
                    ExprKind::Conditional {
                        cond: Box::new(lhs),
                        then: Box::new(then),
                        otherwise: Box::new(self.parse_bp(bp.right)?),
                    }
                }
            };
            lhs = Expr::new(kind, span);
        }

        self.leave(levels);
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        let op = match self.peek().map(|l| &l.kind) {
            Some(LexemeKind::Symbol(Symbol::Bang)) => Some(UnaryOp::Not),
            Some(LexemeKind::Symbol(Symbol::Minus)) => Some(UnaryOp::Neg),
            Some(LexemeKind::Symbol(Symbol::Plus)) => Some(UnaryOp::Plus),
            Some(LexemeKind::Keyword(Keyword::Typeof)) => Some(UnaryOp::Typeof),
            Some(LexemeKind::Symbol(Symbol::PlusPlus | Symbol::MinusMinus)) => {
                let op = if self.at_symbol(Symbol::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.pos += 1;
                let target = self.parse_bp(PREFIX)?;
                if !target.is_place() {
                    return Err(ScriptError::new(
                        ScriptErrorKind::InvalidAssignmentTarget,
                        target.span,
                    ));
                }
                return Ok(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    span,
                ));
            }
            _ => None,
        };

        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_bp(PREFIX)?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ScriptError> {
        let mut levels = 0;
        loop {
            let span = expr.span;
            if self.at_symbol(Symbol::Dot)
                || self.at_symbol(Symbol::LBracket)
                || self.at_symbol(Symbol::LParen)
            {
                self.enter()?;
                levels += 1;
            }
            if self.eat_symbol(Symbol::Dot) {
                let property = match self.peek().map(|l| &l.kind) {
                    Some(LexemeKind::Ident(name)) => name.clone(),
                    Some(LexemeKind::Keyword(kw)) => kw.as_str().to_string(),
                    _ => return Err(self.unexpected("property name")),
                };
                self.pos += 1;
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                    span,
                );
            } else if self.eat_symbol(Symbol::LBracket) {
                let index = self.parse_expr()?;
                self.expect_symbol(Symbol::RBracket)?;
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.eat_symbol(Symbol::LParen) {
                let args = self.parse_list(Symbol::RParen)?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if let Some(l) = self.peek()
                && !l.line_break_before
                && (self.at_symbol(Symbol::PlusPlus) || self.at_symbol(Symbol::MinusMinus))
            {
                if !expr.is_place() {
                    return Err(ScriptError::new(
                        ScriptErrorKind::InvalidAssignmentTarget,
                        expr.span,
                    ));
                }
                let op = if self.at_symbol(Symbol::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.pos += 1;
                self.leave(levels);
                return Ok(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        target: Box::new(expr),
                    },
                    span,
                ));
            } else {
                self.leave(levels);
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn parse_list(&mut self, close: Symbol) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        while !self.eat_symbol(close) {
            items.push(self.parse_bp(ASSIGN.right)?);
            if !self.eat_symbol(Symbol::Comma) {
                self.expect_symbol(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        let Some(lexeme) = self.next() else {
            return Err(self.unexpected("expression"));
        };
        let span = lexeme.span;

        let kind = match &lexeme.kind {
            LexemeKind::Number(n) => ExprKind::Number(*n),
            LexemeKind::Str(s) => ExprKind::Str(s.clone()),
            LexemeKind::Ident(name) => ExprKind::Ident(name.clone()),
            LexemeKind::Keyword(Keyword::True) => ExprKind::Bool(true),
            LexemeKind::Keyword(Keyword::False) => ExprKind::Bool(false),
            LexemeKind::Keyword(Keyword::Null) => ExprKind::Null,
            LexemeKind::Keyword(Keyword::Undefined) => ExprKind::Undefined,
            LexemeKind::Symbol(Symbol::LParen) => {
                let inner = self.parse_expr()?;
                self.expect_symbol(Symbol::RParen)?;
                return Ok(inner);
            }
            LexemeKind::Symbol(Symbol::LBracket) => ExprKind::Array(self.parse_list(Symbol::RBracket)?),
            LexemeKind::Symbol(Symbol::LBrace) => ExprKind::Object(self.parse_object()?),
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("expression"));
            }
        };

        Ok(Expr::new(kind, span))
    }

    /// Object literal entries after the opening brace.
    fn parse_object(&mut self) -> Result<Vec<(String, Expr)>, ScriptError> {
        let mut entries = Vec::new();
        while !self.eat_symbol(Symbol::RBrace) {
            let Some(lexeme) = self.next() else {
                return Err(self.unexpected("property name"));
            };
            let key = match &lexeme.kind {
                LexemeKind::Ident(name) | LexemeKind::Str(name) => name.clone(),
                LexemeKind::Keyword(kw) => kw.as_str().to_string(),
                LexemeKind::Number(n) => super::value::format_number(*n),
                LexemeKind::Symbol(_) => {
                    self.pos -= 1;
                    return Err(self.unexpected("property name"));
                }
            };

            let value = if self.eat_symbol(Symbol::Colon) {
                self.parse_bp(ASSIGN.right)?
            } else if let LexemeKind::Ident(name) = &lexeme.kind {
                // shorthand `{ name }`
                Expr::new(ExprKind::Ident(name.clone()), lexeme.span)
            } else {
                return Err(self.unexpected("':'"));
            };
            entries.push((key, value));

            if !self.eat_symbol(Symbol::Comma) {
                self.expect_symbol(Symbol::RBrace)?;
                break;
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let program = parse(source).expect("should parse");
        match program.body.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let e = expr("1 + 2 * 3");
        let ExprKind::Binary { op, rhs, .. } = e.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let e = expr("a - b - c");
        let ExprKind::Binary { lhs, .. } = e.kind else {
            panic!("expected binary");
        };
        assert!(matches!(
            lhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));
    }

    #[test]
    fn assignment_is_right_associative() {
        let e = expr("a = b = 1");
        let ExprKind::Assign { value, .. } = e.kind else {
            panic!("expected assign");
        };
        assert!(matches!(value.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn invalid_assignment_target() {
        let err = parse("1 = 2").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::InvalidAssignmentTarget);
        let err = parse("f()++").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::InvalidAssignmentTarget);
    }

    #[test]
    fn for_loop_spread_over_lines() {
        let program = parse("for (i = 0; i < 3; i++) { // ~\nappend(i);\n} // ~\n")
            .expect("should parse");
        assert_eq!(program.body.len(), 1);
        assert!(matches!(program.body[0], Stmt::For { .. }));
    }

    #[test]
    fn for_of_loop() {
        let program = parse("for (const x of [1, 2]) append(x)").expect("should parse");
        assert!(matches!(
            &program.body[0],
            Stmt::ForOf { kind: DeclKind::Const, name, .. } if name == "x"
        ));
    }

    #[test]
    fn else_on_next_line() {
        let program = parse("if (t < 4) {\n}\nelse if (t > 6) {\n} else {\n}").expect("should parse");
        let Stmt::If { otherwise, .. } = &program.body[0] else {
            panic!("expected if");
        };
        assert!(matches!(
            otherwise.as_deref(),
            Some(Stmt::If {
                otherwise: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn semicolons_optional_at_line_break() {
        let program = parse("let a = 1\nlet b = a\nb").expect("should parse");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn missing_separator_on_one_line() {
        let err = parse("let a = 1 2").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn unclosed_block() {
        let err = parse("for (;;) {\nappend(1);\n").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::UnexpectedEnd { .. }));
    }

    #[test]
    fn break_outside_loop() {
        let err = parse("break;").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::BreakOutsideLoop);
        let err = parse("while (true) { function f() { break; } }").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::BreakOutsideLoop);
    }

    #[test]
    fn return_outside_function() {
        let err = parse("return 1;").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::ReturnOutsideFunction);
        assert!(parse("function f(x) { return x / 2; }").is_ok());
    }

    #[test]
    fn object_and_array_literals() {
        let e = expr("x = { a: 1, 'b c': [1, 2,], d }");
        let ExprKind::Assign { value, .. } = e.kind else {
            panic!("expected assign");
        };
        let ExprKind::Object(entries) = value.kind else {
            panic!("expected object");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b c", "d"]);
    }

    #[test]
    fn nesting_is_limited() {
        let deep_parens = format!("x = {}1{};", "(".repeat(3000), ")".repeat(3000));
        let deep_blocks = format!("{}{}", "{".repeat(MAX_NESTING + 1), "}".repeat(MAX_NESTING + 1));
        let long_chain = format!("x = 1{};", " + 1".repeat(MAX_NESTING));
        for source in [deep_parens, deep_blocks, long_chain] {
            let err = parse(&source).unwrap_err();
            assert_eq!(err.kind, ScriptErrorKind::NestingTooDeep(MAX_NESTING));
            assert!(err.is_syntax());
        }
    }

    #[test]
    fn moderate_nesting_parses() {
        let parens = format!("x = {}1{};", "(".repeat(20), ")".repeat(20));
        let blocks = format!("{}{}", "{".repeat(20), "}".repeat(20));
        let chain = format!("x = 1{};", " + 1".repeat(40));
        for source in [parens, blocks, chain] {
            assert!(parse(&source).is_ok(), "{source}");
        }
    }

    #[test]
    fn member_call_chain() {
        let e = expr("d.toString().length");
        assert!(matches!(e.kind, ExprKind::Member { ref property, .. } if property == "length"));
    }
}
