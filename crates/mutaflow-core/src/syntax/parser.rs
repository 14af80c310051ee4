//! Recursive-descent parser producing an arena [`SyntaxTree`]

use super::ast::*;
use super::lexer::{tokenize, Keyword, Token, TokenKind};
use crate::error::ParseError;
use std::sync::Arc;
use tracing::trace;

/// Parses a complete compilation unit.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        nodes: Vec::new(),
    };
    let root = parser.compilation_unit()?;
    trace!(nodes = parser.nodes.len(), "parsed compilation unit");
    Ok(SyntaxTree::from_unordered(Arc::from(source), parser.nodes, root))
}

type PResult<T> = Result<T, ParseError>;

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    nodes: Vec<Node>,
}

impl<'s> Parser<'s> {
    // ---- token helpers -------------------------------------------------

    fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> Token {
        self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn at_punct(&self, p: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(q) if q == p)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(k)
    }

    fn eat_punct(&mut self, p: &str) -> Option<Token> {
        self.at_punct(p).then(|| self.bump())
    }

    fn expect_punct(&mut self, p: &str) -> PResult<Token> {
        self.eat_punct(p).ok_or_else(|| self.error(format!("expected `{p}`")))
    }

    fn expect_keyword(&mut self, k: Keyword) -> PResult<Token> {
        if self.at_keyword(k) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected `{}`", format!("{k:?}").to_lowercase())))
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Token)> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident {
            self.bump();
            Ok((self.text(tok.span).to_string(), tok))
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start..span.end]
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let tok = self.peek();
        let found = match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", self.text(tok.span)),
        };
        ParseError::at(self.source, tok.span.start, format!("{}, found {found}", message.into()))
    }

    fn prev_end(&self) -> usize {
        self.pos.checked_sub(1).map_or(0, |p| self.tokens[p].span.end)
    }

    fn push(&mut self, kind: NodeKind, children: Vec<NodeId>, span: Span, token: Option<Span>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children,
            span,
            token,
            synthetic: false,
            trailing: None,
        });
        id
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    // ---- declarations --------------------------------------------------

    fn compilation_unit(&mut self) -> PResult<NodeId> {
        let mut children = Vec::new();
        while self.at_keyword(Keyword::Using) {
            children.push(self.using()?);
        }
        loop {
            if self.peek().kind == TokenKind::Eof {
                break;
            }
            if self.at_keyword(Keyword::Namespace) {
                children.push(self.namespace()?);
            } else {
                children.push(self.class()?);
            }
        }
        Ok(self.push(
            NodeKind::CompilationUnit,
            children,
            Span::new(0, self.source.len()),
            None,
        ))
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let (mut path, _) = self.expect_ident()?;
        while self.eat_punct(".").is_some() {
            let (segment, _) = self.expect_ident()?;
            path.push('.');
            path.push_str(&segment);
        }
        Ok(path)
    }

    fn using(&mut self) -> PResult<NodeId> {
        let start = self.expect_keyword(Keyword::Using)?.span.start;
        let path = self.qualified_name()?;
        self.expect_punct(";")?;
        Ok(self.push(NodeKind::Using { path }, vec![], Span::new(start, self.prev_end()), None))
    }

    fn namespace(&mut self) -> PResult<NodeId> {
        let start = self.expect_keyword(Keyword::Namespace)?.span.start;
        let name = self.qualified_name()?;
        self.expect_punct("{")?;
        let mut classes = Vec::new();
        while !self.at_punct("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("expected `}`"));
            }
            classes.push(self.class()?);
        }
        self.bump();
        Ok(self.push(
            NodeKind::Namespace { name },
            classes,
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    fn modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek().kind {
                TokenKind::Keyword(Keyword::Public) => Modifier::Public,
                TokenKind::Keyword(Keyword::Private) => Modifier::Private,
                TokenKind::Keyword(Keyword::Protected) => Modifier::Protected,
                TokenKind::Keyword(Keyword::Internal) => Modifier::Internal,
                TokenKind::Keyword(Keyword::Static) => Modifier::Static,
                _ => return modifiers,
            };
            self.bump();
            modifiers.push(modifier);
        }
    }

    fn class(&mut self) -> PResult<NodeId> {
        let start = self.peek().span.start;
        let modifiers = self.modifiers();
        self.expect_keyword(Keyword::Class)?;
        let (name, _) = self.expect_ident()?;
        self.expect_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("expected `}`"));
            }
            members.push(self.member()?);
        }
        self.bump();
        Ok(self.push(
            NodeKind::Class { name, modifiers },
            members,
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    fn value_type(&self) -> Option<TypeName> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => Some(TypeName::Int),
            TokenKind::Keyword(Keyword::Double) => Some(TypeName::Double),
            TokenKind::Keyword(Keyword::Bool) => Some(TypeName::Bool),
            TokenKind::Keyword(Keyword::String) => Some(TypeName::String),
            _ => None,
        }
    }

    fn expect_type(&mut self) -> PResult<TypeName> {
        let ty = self.value_type().ok_or_else(|| self.error("expected a type"))?;
        self.bump();
        Ok(ty)
    }

    fn member(&mut self) -> PResult<NodeId> {
        let start = self.peek().span.start;
        let modifiers = self.modifiers();
        let ty = if self.at_keyword(Keyword::Void) {
            self.bump();
            TypeName::Void
        } else {
            self.expect_type()?
        };

        if self.peek().kind == TokenKind::Ident && matches!(self.peek_at(1).kind, TokenKind::Punct("(")) {
            return self.method(start, modifiers, ty);
        }
        if ty == TypeName::Void {
            return Err(self.error("expected method name"));
        }

        let decl_start = self.tokens[self.pos - 1].span.start;
        let declaration = self.declarators(ty, decl_start)?;
        self.expect_punct(";")?;
        Ok(self.push(
            NodeKind::Field { modifiers },
            vec![declaration],
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    fn method(&mut self, start: usize, modifiers: Vec<Modifier>, return_type: TypeName) -> PResult<NodeId> {
        let (name, _) = self.expect_ident()?;
        self.expect_punct("(")?;
        let mut children = Vec::new();
        if !self.at_punct(")") {
            loop {
                let param_start = self.peek().span.start;
                let ty = self.expect_type()?;
                let (param, _) = self.expect_ident()?;
                children.push(self.push(
                    NodeKind::Parameter { name: param, ty },
                    vec![],
                    Span::new(param_start, self.prev_end()),
                    None,
                ));
                if self.eat_punct(",").is_none() {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        children.push(self.block()?);
        Ok(self.push(
            NodeKind::Method {
                name,
                modifiers,
                return_type,
            },
            children,
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    /// `declarator (',' declarator)*` after the type keyword was consumed.
    fn declarators(&mut self, ty: TypeName, start: usize) -> PResult<NodeId> {
        let mut declarators = Vec::new();
        loop {
            let (name, tok) = self.expect_ident()?;
            let mut children = Vec::new();
            if self.eat_punct("=").is_some() {
                children.push(self.expression()?);
            }
            declarators.push(self.push(
                NodeKind::VariableDeclarator { name },
                children,
                Span::new(tok.span.start, self.prev_end()),
                Some(tok.span),
            ));
            if self.eat_punct(",").is_none() {
                break;
            }
        }
        Ok(self.push(
            NodeKind::VariableDeclaration { ty },
            declarators,
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    // ---- statements ----------------------------------------------------

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.expect_punct("{")?.span.start;
        let mut statements = Vec::new();
        while !self.at_punct("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("expected `}`"));
            }
            statements.push(self.statement()?);
        }
        self.bump();
        Ok(self.push(NodeKind::Block, statements, Span::new(start, self.prev_end()), None))
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Punct("{") => self.block(),
            TokenKind::Punct(";") => {
                self.bump();
                Ok(self.push(NodeKind::EmptyStatement, vec![], tok.span, None))
            }
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::While) => self.while_statement(),
            TokenKind::Keyword(Keyword::For) => self.for_statement(),
            TokenKind::Keyword(Keyword::Return) => {
                self.bump();
                let mut children = Vec::new();
                if !self.at_punct(";") {
                    children.push(self.expression()?);
                }
                self.expect_punct(";")?;
                Ok(self.push(NodeKind::Return, children, Span::new(tok.span.start, self.prev_end()), None))
            }
            TokenKind::Keyword(Keyword::Else) => Err(self.error("`else` without `if`")),
            _ if self.value_type().is_some() => {
                let ty = self.expect_type()?;
                let declaration = self.declarators(ty, tok.span.start)?;
                self.expect_punct(";")?;
                Ok(self.push(
                    NodeKind::LocalDeclaration,
                    vec![declaration],
                    Span::new(tok.span.start, self.prev_end()),
                    None,
                ))
            }
            _ => {
                let expr = self.expression()?;
                self.expect_punct(";")?;
                Ok(self.push(
                    NodeKind::ExpressionStatement,
                    vec![expr],
                    Span::new(tok.span.start, self.prev_end()),
                    None,
                ))
            }
        }
    }

    fn condition(&mut self) -> PResult<NodeId> {
        self.expect_punct("(")?;
        let cond = self.expression()?;
        self.expect_punct(")")?;
        Ok(cond)
    }

    fn if_statement(&mut self) -> PResult<NodeId> {
        let start = self.expect_keyword(Keyword::If)?.span.start;
        let cond = self.condition()?;
        let then = self.statement()?;
        let mut children = vec![cond, then];
        if self.at_keyword(Keyword::Else) {
            let else_start = self.bump().span.start;
            let body = self.statement()?;
            children.push(self.push(NodeKind::Else, vec![body], Span::new(else_start, self.prev_end()), None));
        }
        Ok(self.push(NodeKind::If, children, Span::new(start, self.prev_end()), None))
    }

    fn while_statement(&mut self) -> PResult<NodeId> {
        let start = self.expect_keyword(Keyword::While)?.span.start;
        let cond = self.condition()?;
        let body = self.statement()?;
        Ok(self.push(NodeKind::While, vec![cond, body], Span::new(start, self.prev_end()), None))
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.expect_keyword(Keyword::For)?.span.start;
        self.expect_punct("(")?;
        let init = match self.value_type() {
            Some(ty) => {
                let decl_start = self.bump().span.start;
                self.declarators(ty, decl_start)?
            }
            None => self.expression()?,
        };
        self.expect_punct(";")?;
        let cond = self.expression()?;
        self.expect_punct(";")?;
        let step = self.expression()?;
        self.expect_punct(")")?;
        let body = self.statement()?;
        Ok(self.push(
            NodeKind::For,
            vec![init, cond, step, body],
            Span::new(start, self.prev_end()),
            None,
        ))
    }

    // ---- expressions ---------------------------------------------------

    fn expression(&mut self) -> PResult<NodeId> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<NodeId> {
        let target = self.binary(1)?;
        let op = match self.peek().kind {
            TokenKind::Punct("=") => AssignOp::Assign,
            TokenKind::Punct("+=") => AssignOp::AddAssign,
            TokenKind::Punct("-=") => AssignOp::SubAssign,
            TokenKind::Punct("*=") => AssignOp::MulAssign,
            TokenKind::Punct("/=") => AssignOp::DivAssign,
            TokenKind::Punct("%=") => AssignOp::RemAssign,
            _ => return Ok(target),
        };
        let tok = self.bump();
        let value = self.assignment()?;
        let span = self.span_of(target).cover(self.span_of(value));
        Ok(self.push(NodeKind::Assignment { op }, vec![target, value], span, Some(tok.span)))
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek().kind {
            TokenKind::Punct("+") => BinaryOp::Add,
            TokenKind::Punct("-") => BinaryOp::Sub,
            TokenKind::Punct("*") => BinaryOp::Mul,
            TokenKind::Punct("/") => BinaryOp::Div,
            TokenKind::Punct("%") => BinaryOp::Rem,
            TokenKind::Punct("==") => BinaryOp::Eq,
            TokenKind::Punct("!=") => BinaryOp::Ne,
            TokenKind::Punct("<") => BinaryOp::Lt,
            TokenKind::Punct("<=") => BinaryOp::Le,
            TokenKind::Punct(">") => BinaryOp::Gt,
            TokenKind::Punct(">=") => BinaryOp::Ge,
            TokenKind::Punct("&&") => BinaryOp::And,
            TokenKind::Punct("||") => BinaryOp::Or,
            _ => return None,
        })
    }

    /// Precedence climbing over the left-associative binary levels.
    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        let mut left = self.unary()?;
        while let Some(op) = self.binary_op() {
            if op.precedence() < min_prec {
                break;
            }
            let tok = self.bump();
            let right = self.binary(op.precedence() + 1)?;
            let span = self.span_of(left).cover(self.span_of(right));
            left = self.push(NodeKind::Binary { op }, vec![left, right], span, Some(tok.span));
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let op = match self.peek().kind {
            TokenKind::Punct("++") => UnaryOp::Increment,
            TokenKind::Punct("--") => UnaryOp::Decrement,
            TokenKind::Punct("!") => UnaryOp::Not,
            TokenKind::Punct("-") => UnaryOp::Negate,
            TokenKind::Punct("+") => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        let tok = self.bump();
        let operand = self.unary()?;
        let span = tok.span.cover(self.span_of(operand));
        Ok(self.push(NodeKind::PrefixUnary { op }, vec![operand], span, Some(tok.span)))
    }

    fn postfix(&mut self) -> PResult<NodeId> {
        let mut expr = self.primary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct("++") => UnaryOp::Increment,
                TokenKind::Punct("--") => UnaryOp::Decrement,
                _ => return Ok(expr),
            };
            let tok = self.bump();
            let span = self.span_of(expr).cover(tok.span);
            expr = self.push(NodeKind::PostfixUnary { op }, vec![expr], span, Some(tok.span));
        }
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let tok = self.peek();
        let spelling = self.text(tok.span);
        let literal = |kind| NodeKind::Literal {
            value: Literal::new(kind, spelling),
        };
        match tok.kind {
            TokenKind::Int => {
                let kind = literal(LiteralKind::Int);
                self.bump();
                Ok(self.push(kind, vec![], tok.span, Some(tok.span)))
            }
            TokenKind::Double => {
                let kind = literal(LiteralKind::Double);
                self.bump();
                Ok(self.push(kind, vec![], tok.span, Some(tok.span)))
            }
            TokenKind::Str => {
                let kind = literal(LiteralKind::String);
                self.bump();
                Ok(self.push(kind, vec![], tok.span, Some(tok.span)))
            }
            TokenKind::Keyword(Keyword::True | Keyword::False) => {
                let kind = literal(LiteralKind::Bool);
                self.bump();
                Ok(self.push(kind, vec![], tok.span, Some(tok.span)))
            }
            TokenKind::Punct("(") => {
                self.bump();
                let inner = self.expression()?;
                self.expect_punct(")")?;
                Ok(self.push(
                    NodeKind::Parenthesized,
                    vec![inner],
                    Span::new(tok.span.start, self.prev_end()),
                    None,
                ))
            }
            TokenKind::Ident => {
                let (name, _) = self.expect_ident()?;
                if self.at_punct("(") || self.at_punct(".") {
                    return self.invocation(name, tok.span.start);
                }
                Ok(self.push(NodeKind::Identifier { name }, vec![], tok.span, Some(tok.span)))
            }
            _ => Err(self.error("expected expression")),
        }
    }

    fn invocation(&mut self, mut callee: String, start: usize) -> PResult<NodeId> {
        while self.eat_punct(".").is_some() {
            let (segment, _) = self.expect_ident()?;
            callee.push('.');
            callee.push_str(&segment);
        }
        if !self.at_punct("(") {
            return Err(self.error("member access is only supported in invocations; expected `(`"));
        }
        self.bump();
        let mut args = Vec::new();
        if !self.at_punct(")") {
            loop {
                args.push(self.expression()?);
                if self.eat_punct(",").is_none() {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        Ok(self.push(
            NodeKind::Invocation { callee },
            args,
            Span::new(start, self.prev_end()),
            None,
        ))
    }
}
