//! Recursive-descent parser producing the [`ast`](crate::ast) tree.
//!
//! Binary operators are parsed by precedence climbing. Automatic semicolon
//! insertion applies before `}`, at end of input and after a line break.
//!
//! Nesting is capped at [`MAX_NESTING_DEPTH`]: every statement, assignment,
//! unary operand and `new` counts one level, as does each operator or call
//! that wraps an expression on its left.

use crate::ast::{
    AssignOp, BinaryOp, CatchClause, Expr, ForInTarget, ForInit, FunctionDef, LogicalOp,
    MemberKey, Program, Stmt, UnaryOp, VarDeclarations,
};
use crate::config::MAX_NESTING_DEPTH;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::runtime::value::number_to_string;
use crate::{JsrtError, Result};
use std::rc::Rc;
use tracing::debug;

/// Parses a complete script.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    let token_count = tokens.len();
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    debug!(tokens = token_count, statements = body.len(), "parsed program");
    Ok(Program { body })
}

/// Either side of a binary operator table entry.
#[derive(Clone, Copy)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    // --- Token cursor ---

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof, and the cursor never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check_punct(&self, p: &str) -> bool {
        self.peek().is_punct(p)
    }

    fn check_keyword(&self, k: &str) -> bool {
        self.peek().is_keyword(k)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.check_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: &str) -> bool {
        if self.check_keyword(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Enters one nesting level; the caller restores `depth` when done.
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at(self.peek(), "nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one nesting level down.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> JsrtError {
        JsrtError::syntax(token.line, token.column, message)
    }

    fn unexpected(&self) -> JsrtError {
        let token = self.peek();
        self.error_at(token, format!("unexpected {}", token.describe()))
    }

    fn expect_punct(&mut self, p: &str) -> Result<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            let token = self.peek();
            Err(self.error_at(
                token,
                format!("expected '{}' but found {}", p, token.describe()),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<Rc<str>> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name: Rc<str> = Rc::from(name.as_str());
                self.advance();
                Ok(name)
            }
            _ => {
                let token = self.peek();
                Err(self.error_at(
                    token,
                    format!("expected identifier but found {}", token.describe()),
                ))
            }
        }
    }

    /// Identifier or reserved word, as allowed after `.` and as an object literal key.
    fn property_name(&mut self) -> Result<Rc<str>> {
        let name = match &self.peek().kind {
            TokenKind::Identifier(name) => Rc::from(name.as_str()),
            TokenKind::Keyword(k) => Rc::from(*k),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(name)
    }

    fn consume_semicolon(&mut self) -> Result<()> {
        if self.eat_punct(";") {
            return Ok(());
        }
        let token = self.peek();
        if token.is_punct("}") || token.kind == TokenKind::Eof || token.newline_before {
            return Ok(());
        }
        Err(self.error_at(
            token,
            format!("expected ';' but found {}", token.describe()),
        ))
    }

    // --- Statements ---

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> Result<Stmt> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Punct("{") => Ok(Stmt::Block(self.block()?)),
            TokenKind::Punct(";") => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Keyword("var") => {
                self.advance();
                let declarations = self.var_declarations(false)?;
                self.consume_semicolon()?;
                Ok(Stmt::Var(declarations))
            }
            TokenKind::Keyword("function") => {
                self.advance();
                let def = self.function_rest(true)?;
                Ok(Stmt::FunctionDecl(def))
            }
            TokenKind::Keyword("if") => self.if_statement(),
            TokenKind::Keyword("while") => {
                self.advance();
                self.expect_punct("(")?;
                let test = self.expression(false)?;
                self.expect_punct(")")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { test, body })
            }
            TokenKind::Keyword("do") => {
                self.advance();
                let body = Box::new(self.statement()?);
                if !self.eat_keyword("while") {
                    return Err(self.unexpected());
                }
                self.expect_punct("(")?;
                let test = self.expression(false)?;
                self.expect_punct(")")?;
                self.eat_punct(";");
                Ok(Stmt::DoWhile { body, test })
            }
            TokenKind::Keyword("for") => self.for_statement(),
            TokenKind::Keyword("break") => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            TokenKind::Keyword("continue") => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Keyword("return") => {
                self.advance();
                let next = self.peek();
                let argument = if next.is_punct(";")
                    || next.is_punct("}")
                    || next.kind == TokenKind::Eof
                    || next.newline_before
                {
                    None
                } else {
                    Some(self.expression(false)?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(argument))
            }
            TokenKind::Keyword("throw") => {
                self.advance();
                if self.peek().newline_before {
                    return Err(self.error_at(&token, "illegal newline after throw"));
                }
                let argument = self.expression(false)?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(argument))
            }
            TokenKind::Keyword("try") => self.try_statement(),
            TokenKind::Keyword(k @ ("switch" | "with" | "debugger" | "case" | "default")) => {
                Err(self.error_at(&token, format!("'{}' statements are not supported", k)))
            }
            _ => {
                let expr = self.expression(false)?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.check_punct("}") {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn var_declarations(&mut self, no_in: bool) -> Result<VarDeclarations> {
        let mut declarations = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.eat_punct("=") {
                Some(self.assignment(no_in)?)
            } else {
                None
            };
            declarations.push((name, init));
            if !self.eat_punct(",") {
                return Ok(declarations);
            }
        }
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect_punct("(")?;
        let test = self.expression(false)?;
        self.expect_punct(")")?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.eat_keyword("else") {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect_punct("(")?;

        let init = if self.check_punct(";") {
            None
        } else if self.eat_keyword("var") {
            let declarations = self.var_declarations(true)?;
            if self.check_keyword("in") && declarations.len() == 1 && declarations[0].1.is_none()
            {
                self.advance();
                let name = declarations[0].0.clone();
                return self.for_in_rest(ForInTarget::Var(name));
            }
            Some(ForInit::Var(declarations))
        } else {
            let expr = self.expression(true)?;
            if self.check_keyword("in") {
                if !matches!(expr, Expr::Identifier(_) | Expr::Member { .. }) {
                    return Err(self.error_at(self.peek(), "invalid for-in left-hand side"));
                }
                self.advance();
                return self.for_in_rest(ForInTarget::Expr(expr));
            }
            Some(ForInit::Expr(expr))
        };

        self.expect_punct(";")?;
        let test = if self.check_punct(";") {
            None
        } else {
            Some(self.expression(false)?)
        };
        self.expect_punct(";")?;
        let update = if self.check_punct(")") {
            None
        } else {
            Some(self.expression(false)?)
        };
        self.expect_punct(")")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    fn for_in_rest(&mut self, target: ForInTarget) -> Result<Stmt> {
        let object = self.expression(false)?;
        self.expect_punct(")")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::ForIn {
            target,
            object,
            body,
        })
    }

    fn try_statement(&mut self) -> Result<Stmt> {
        let try_token = self.advance();
        let block = self.block()?;
        let handler = if self.eat_keyword("catch") {
            self.expect_punct("(")?;
            let param = self.expect_identifier()?;
            self.expect_punct(")")?;
            let body = self.block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat_keyword("finally") {
            Some(self.block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(&try_token, "missing catch or finally after try"));
        }
        Ok(Stmt::Try {
            block,
            handler,
            finalizer,
        })
    }

    /// Parses what follows the `function` keyword.
    fn function_rest(&mut self, name_required: bool) -> Result<Rc<FunctionDef>> {
        let name = if matches!(self.peek().kind, TokenKind::Identifier(_)) {
            Some(self.expect_identifier()?)
        } else if name_required {
            return Err(self.error_at(self.peek(), "function statement requires a name"));
        } else {
            None
        };
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.check_punct(")") {
            loop {
                params.push(self.expect_identifier()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDef { name, params, body }))
    }

    // --- Expressions ---

    fn expression(&mut self, no_in: bool) -> Result<Expr> {
        let first = self.assignment(no_in)?;
        if !self.check_punct(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_punct(",") {
            items.push(self.assignment(no_in)?);
        }
        Ok(Expr::Sequence(items))
    }

    fn assignment(&mut self, no_in: bool) -> Result<Expr> {
        self.nested(|parser| parser.assignment_body(no_in))
    }

    fn assignment_body(&mut self, no_in: bool) -> Result<Expr> {
        let target = self.conditional(no_in)?;
        let op: AssignOp = match self.peek().kind {
            TokenKind::Punct("=") => None,
            TokenKind::Punct("+=") => Some(BinaryOp::Add),
            TokenKind::Punct("-=") => Some(BinaryOp::Sub),
            TokenKind::Punct("*=") => Some(BinaryOp::Mul),
            TokenKind::Punct("/=") => Some(BinaryOp::Div),
            TokenKind::Punct("%=") => Some(BinaryOp::Mod),
            TokenKind::Punct("&=") => Some(BinaryOp::BitAnd),
            TokenKind::Punct("|=") => Some(BinaryOp::BitOr),
            TokenKind::Punct("^=") => Some(BinaryOp::BitXor),
            TokenKind::Punct("<<=") => Some(BinaryOp::Shl),
            TokenKind::Punct(">>=") => Some(BinaryOp::Shr),
            TokenKind::Punct(">>>=") => Some(BinaryOp::UShr),
            _ => return Ok(target),
        };
        let token = self.advance();
        if !matches!(target, Expr::Identifier(_) | Expr::Member { .. }) {
            return Err(self.error_at(&token, "invalid assignment target"));
        }
        let value = self.assignment(no_in)?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self, no_in: bool) -> Result<Expr> {
        let test = self.binary(0, no_in)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.assignment(false)?;
        self.expect_punct(":")?;
        let alternate = self.assignment(no_in)?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn binary_operator(&self, no_in: bool) -> Option<(u8, Operator)> {
        use BinaryOp::*;
        let op = match self.peek().kind {
            TokenKind::Punct("||") => return Some((1, Operator::Logical(LogicalOp::Or))),
            TokenKind::Punct("&&") => return Some((2, Operator::Logical(LogicalOp::And))),
            TokenKind::Punct("|") => (3, BitOr),
            TokenKind::Punct("^") => (4, BitXor),
            TokenKind::Punct("&") => (5, BitAnd),
            TokenKind::Punct("==") => (6, Eq),
            TokenKind::Punct("!=") => (6, NotEq),
            TokenKind::Punct("===") => (6, StrictEq),
            TokenKind::Punct("!==") => (6, StrictNotEq),
            TokenKind::Punct("<") => (7, Lt),
            TokenKind::Punct(">") => (7, Gt),
            TokenKind::Punct("<=") => (7, LtEq),
            TokenKind::Punct(">=") => (7, GtEq),
            TokenKind::Keyword("instanceof") => (7, InstanceOf),
            TokenKind::Keyword("in") if !no_in => (7, In),
            TokenKind::Punct("<<") => (8, Shl),
            TokenKind::Punct(">>") => (8, Shr),
            TokenKind::Punct(">>>") => (8, UShr),
            TokenKind::Punct("+") => (9, Add),
            TokenKind::Punct("-") => (9, Sub),
            TokenKind::Punct("*") => (10, Mul),
            TokenKind::Punct("/") => (10, Div),
            TokenKind::Punct("%") => (10, Mod),
            _ => return None,
        };
        Some((op.0, Operator::Binary(op.1)))
    }

    fn binary(&mut self, min_precedence: u8, no_in: bool) -> Result<Expr> {
        let depth = self.depth;
        let mut left = self.unary()?;
        while let Some((precedence, operator)) = self.binary_operator(no_in) {
            if precedence < min_precedence {
                break;
            }
            self.descend()?;
            self.advance();
            let right = self.binary(precedence + 1, no_in)?;
            left = match operator {
                Operator::Binary(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Operator::Logical(op) => Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        self.nested(Self::unary_body)
    }

    fn unary_body(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Minus),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Punct("~") => Some(UnaryOp::BitNot),
            TokenKind::Keyword("typeof") => Some(UnaryOp::Typeof),
            TokenKind::Keyword("void") => Some(UnaryOp::Void),
            TokenKind::Keyword("delete") => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let argument = Box::new(self.unary()?);
            return Ok(Expr::Unary { op, argument });
        }

        let increment = match self.peek().kind {
            TokenKind::Punct("++") => Some(true),
            TokenKind::Punct("--") => Some(false),
            _ => None,
        };
        if let Some(increment) = increment {
            let token = self.advance();
            let argument = self.unary()?;
            if !matches!(argument, Expr::Identifier(_) | Expr::Member { .. }) {
                return Err(self.error_at(&token, "invalid increment/decrement operand"));
            }
            return Ok(Expr::Update {
                increment,
                prefix: true,
                argument: Box::new(argument),
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.left_hand_side()?;
        let token = self.peek();
        if token.newline_before {
            return Ok(expr);
        }
        let increment = match token.kind {
            TokenKind::Punct("++") => true,
            TokenKind::Punct("--") => false,
            _ => return Ok(expr),
        };
        if !matches!(expr, Expr::Identifier(_) | Expr::Member { .. }) {
            return Err(self.error_at(token, "invalid increment/decrement operand"));
        }
        self.advance();
        Ok(Expr::Update {
            increment,
            prefix: false,
            argument: Box::new(expr),
        })
    }

    fn left_hand_side(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut expr = if self.check_keyword("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };
        loop {
            if self.check_punct("(") || self.at_member_suffix() {
                self.descend()?;
            }
            if self.check_punct("(") {
                let arguments = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                };
            } else if self.at_member_suffix() {
                expr = self.member_suffix(expr)?;
            } else {
                self.depth = depth;
                return Ok(expr);
            }
        }
    }

    fn at_member_suffix(&self) -> bool {
        self.check_punct(".") || self.check_punct("[")
    }

    /// Parses `.name` or `[expr]` applied to `object`.
    fn member_suffix(&mut self, object: Expr) -> Result<Expr> {
        let property = if self.eat_punct(".") {
            MemberKey::Static(self.property_name()?)
        } else {
            self.expect_punct("[")?;
            let key = self.expression(false)?;
            self.expect_punct("]")?;
            MemberKey::Computed(Box::new(key))
        };
        Ok(Expr::Member {
            object: Box::new(object),
            property,
        })
    }

    fn new_expression(&mut self) -> Result<Expr> {
        self.nested(Self::new_expression_body)
    }

    fn new_expression_body(&mut self) -> Result<Expr> {
        self.advance();
        let mut callee = if self.check_keyword("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };
        while self.at_member_suffix() {
            callee = self.member_suffix(callee)?;
        }
        let arguments = if self.check_punct("(") {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect_punct("(")?;
        let mut arguments = Vec::new();
        if !self.check_punct(")") {
            loop {
                arguments.push(self.assignment(false)?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::String(s) => Ok(Expr::String(Rc::from(s))),
            TokenKind::Identifier(name) => Ok(Expr::Identifier(Rc::from(name))),
            TokenKind::Regex { pattern, flags } => Ok(Expr::Regex {
                pattern: Rc::from(pattern),
                flags: Rc::from(flags),
            }),
            TokenKind::Keyword("true") => Ok(Expr::Boolean(true)),
            TokenKind::Keyword("false") => Ok(Expr::Boolean(false)),
            TokenKind::Keyword("null") => Ok(Expr::Null),
            TokenKind::Keyword("this") => Ok(Expr::This),
            TokenKind::Keyword("function") => Ok(Expr::Function(self.function_rest(false)?)),
            TokenKind::Punct("(") => {
                let expr = self.expression(false)?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            TokenKind::Punct("[") => self.array_literal(),
            TokenKind::Punct("{") => self.object_literal(),
            _ => Err(self.error_at(&token, format!("unexpected {}", token.describe()))),
        }
    }

    fn array_literal(&mut self) -> Result<Expr> {
        let mut elements = Vec::new();
        loop {
            if self.eat_punct("]") {
                return Ok(Expr::Array(elements));
            }
            if self.eat_punct(",") {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.assignment(false)?));
            if !self.check_punct("]") {
                self.expect_punct(",")?;
            }
        }
    }

    fn object_literal(&mut self) -> Result<Expr> {
        let mut properties = Vec::new();
        loop {
            if self.eat_punct("}") {
                return Ok(Expr::Object(properties));
            }
            let key: Rc<str> = match &self.peek().kind {
                TokenKind::String(s) => {
                    let key = Rc::from(s.as_str());
                    self.advance();
                    key
                }
                TokenKind::Number(n) => {
                    let key = Rc::from(number_to_string(*n).as_str());
                    self.advance();
                    key
                }
                _ => self.property_name()?,
            };
            self.expect_punct(":")?;
            let value = self.assignment(false)?;
            properties.push((key, value));
            if !self.check_punct("}") {
                self.expect_punct(",")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        match parse(source).unwrap().body.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_member_call_shape() {
        let e = expr("foo.bar.foobar()");
        match e {
            Expr::Call { callee, arguments } => {
                assert!(arguments.is_empty());
                assert_eq!(callee.describe(), "foo.bar.foobar");
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        match expr("1 + 2 * 3") {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected {:?}", other),
        }
        match expr("a || b && c") {
            Expr::Logical {
                op: LogicalOp::Or,
                right,
                ..
            } => assert!(matches!(*right, Expr::Logical { op: LogicalOp::And, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_asi_and_restricted_return() {
        let program = parse("var a = 1\nvar b = 2\nfunction f() { return\n1 }").unwrap();
        assert_eq!(program.body.len(), 3);
        match &program.body[2] {
            Stmt::FunctionDecl(def) => {
                assert!(matches!(def.body[0], Stmt::Return(None)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_try_requires_handler() {
        assert!(parse("try { x() }").is_err());
        assert!(parse("try { x() } finally { y() }").is_ok());
    }

    #[test]
    fn test_for_in_forms() {
        let program = parse("for (var k in o) {} for (k in o) {} for (var i = 0; i < 3; i++) {}")
            .unwrap();
        assert!(matches!(program.body[0], Stmt::ForIn { target: ForInTarget::Var(_), .. }));
        assert!(matches!(program.body[1], Stmt::ForIn { target: ForInTarget::Expr(_), .. }));
        assert!(matches!(program.body[2], Stmt::For { .. }));
    }

    #[test]
    fn test_new_with_member_and_call() {
        match expr("new a.B(1).c") {
            Expr::Member { object, .. } => match *object {
                Expr::New { callee, arguments } => {
                    assert_eq!(callee.describe(), "a.B");
                    assert_eq!(arguments.len(), 1);
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_position() {
        match parse("var x = ;") {
            Err(JsrtError::Syntax { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 9);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_statement() {
        assert!(parse("switch (x) {}").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_NESTING_DEPTH / 4;
        let shallow = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&shallow).is_ok());

        for deep in [
            format!("{}1{}", "(".repeat(5000), ")".repeat(5000)),
            format!("{}x", "!".repeat(5000)),
            format!("{}{{}}", "if (x) ".repeat(5000)),
            format!("x{}", ".y".repeat(5000)),
            vec!["1"; 5000].join(" + "),
        ] {
            match parse(&deep) {
                Err(JsrtError::Syntax { message, .. }) => assert!(message.contains("nesting")),
                other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
            }
        }
    }
}
