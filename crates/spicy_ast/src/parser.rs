//! A minimal recursive-descent parser producing the AST shapes
//! `spicy_grammar`/`spicy_codegen` need: module/unit/field/hook/switch/
//! while/sink declarations.
//!
//! This deliberately does not attempt full Spicy surface-syntax coverage —
//! the printer and a complete front end are external collaborators. It
//! exists so the rest of the pipeline (scope building, resolution, grammar
//! construction, code generation) has real AST to work on, including in
//! this crate's own tests and `spicy_tests`.

use crate::attribute::{Attribute, AttributeSet};
use crate::ctor::Ctor;
use crate::decl::{DeclKind, Declaration, FieldType, Hook, HookEvent, Linkage, Repeat, SwitchCase, SwitchField, UnitDecl, UnitField};
use crate::expr::{Expression, OperatorKind};
use crate::lexer::Lexer;
use crate::module::{Module, ModuleUid};
use crate::node::{AstContext, Node, NodeKind};
use crate::stmt::Statement;
use crate::token::{Token, TokenKind};
use crate::ty::{QualifiedType, UnqualifiedType};
use spicy_base::{Diagnostic, Id, Interner, Span};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    interner: &'a mut Interner,
    ctx: &'a mut AstContext,
}

type PResult<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    pub fn new(src: &str, interner: &'a mut Interner, ctx: &'a mut AstContext) -> PResult<Self> {
        let tokens = Lexer::new(src).tokenize()?;
        Ok(Parser { tokens, pos: 0, interner, ctx })
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn bump(&mut self) -> TokenKind {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].kind.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<()> {
        if self.peek() == kind {
            self.bump();
            Ok(())
        } else {
            Err(Diagnostic::error(
                "parse-error",
                format!("expected {:?}, found {:?}", kind, self.peek()),
                self.span(),
            ))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> PResult<Id> {
        match self.bump() {
            TokenKind::Ident(name) => Ok(self.intern_path(&name)),
            other => Err(Diagnostic::error("parse-error", format!("expected identifier, found {other:?}"), self.span())),
        }
    }

    fn single_component(&mut self) -> PResult<spicy_base::Symbol> {
        match self.bump() {
            TokenKind::Ident(name) => Ok(self.interner.intern(&name)),
            other => Err(Diagnostic::error("parse-error", format!("expected identifier component, found {other:?}"), self.span())),
        }
    }

    fn intern_path(&mut self, name: &str) -> Id {
        Id::single(self.interner.intern(name))
    }

    /// Parses a full module: `module <name>;` followed by imports and
    /// declarations until EOF.
    pub fn parse_module(&mut self, canonical_path: &str) -> PResult<Module> {
        self.expect(&TokenKind::KwModule)?;
        let name = self.ident()?;
        self.expect(&TokenKind::Semicolon)?;

        let ext = if canonical_path.ends_with(".hlt") { "hlt" } else { "spicy" };
        let mut module = Module::new(ModuleUid::new(name, canonical_path, ext, ext));

        while self.peek() != &TokenKind::Eof {
            if self.eat(&TokenKind::KwImport) {
                let imported = self.ident()?;
                self.expect(&TokenKind::Semicolon)?;
                module.add_import(imported);
                continue;
            }
            let decl_id = self.parse_top_level_declaration()?;
            module.add_declaration(decl_id);
        }
        Ok(module)
    }

    fn parse_linkage(&mut self) -> Linkage {
        if self.eat(&TokenKind::KwPublic) {
            Linkage::Public
        } else {
            self.eat(&TokenKind::KwPrivate);
            Linkage::Private
        }
    }

    fn parse_top_level_declaration(&mut self) -> PResult<crate::node::NodeId> {
        let start = self.span();
        let linkage = self.parse_linkage();

        let kind = if self.eat(&TokenKind::KwType) {
            let name = self.ident()?;
            self.expect(&TokenKind::Equals)?;
            let (ty, unit) = self.parse_type_or_unit()?;
            self.expect(&TokenKind::Semicolon)?;
            DeclKind::Type { name, ty, unit }
        } else if self.eat(&TokenKind::KwConst) {
            let name = self.ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_scalar_type()?;
            self.expect(&TokenKind::Equals)?;
            let value = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            DeclKind::Constant { name, ty, value }
        } else if self.eat(&TokenKind::KwGlobal) {
            let name = self.ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_scalar_type()?;
            let init = if self.eat(&TokenKind::Equals) { Some(self.parse_expression()?) } else { None };
            self.expect(&TokenKind::Semicolon)?;
            DeclKind::GlobalVariable { name, ty, init }
        } else {
            return Err(Diagnostic::error("parse-error", format!("unexpected top-level token {:?}", self.peek()), start));
        };

        Ok(self.ctx.create(Node::new(NodeKind::Declaration(Declaration::new(linkage, kind)), start.merge(self.span()))))
    }

    /// Parses either `unit { ... }` (returning the unit body) or a plain
    /// scalar/container type name.
    fn parse_type_or_unit(&mut self) -> PResult<(QualifiedType, Option<UnitDecl>)> {
        if self.eat(&TokenKind::KwUnit) {
            if self.eat(&TokenKind::LParen) {
                while self.peek() != &TokenKind::RParen {
                    self.bump();
                }
                self.expect(&TokenKind::RParen)?;
            }
            let unit = self.parse_unit_body()?;
            Ok((QualifiedType::rhs_mutable(UnqualifiedType::Struct(vec![])), Some(unit)))
        } else {
            Ok((self.parse_scalar_type()?, None))
        }
    }

    fn parse_unit_body(&mut self) -> PResult<UnitDecl> {
        self.expect(&TokenKind::LBrace)?;
        let mut unit = UnitDecl::default();
        while !self.eat(&TokenKind::RBrace) {
            if self.eat(&TokenKind::KwOn) {
                unit_push_hook(&mut unit, self.parse_on_hook()?);
                continue;
            }
            if self.peek() == &TokenKind::KwSwitch {
                let field = self.parse_switch_field()?;
                unit.fields.push(field);
                continue;
            }
            let field = self.parse_unit_field()?;
            unit.fields.push(field);
        }
        Ok(unit)
    }

    fn parse_on_hook(&mut self) -> PResult<(HookEvent, Hook)> {
        // `on %init { ... }` / `on %done { ... }` / `on %error { ... }`
        let name = match self.bump() {
            TokenKind::Attribute(name) => name,
            other => return Err(Diagnostic::error("parse-error", format!("expected %event after `on`, found {other:?}"), self.span())),
        };
        let event = match name.as_str() {
            "init" => HookEvent::Init,
            "done" => HookEvent::Done,
            "error" => HookEvent::Error,
            _ => HookEvent::FieldDone,
        };
        let body = self.parse_block()?;
        Ok((event.clone(), Hook::new(event, body)))
    }

    fn parse_switch_field(&mut self) -> PResult<UnitField> {
        self.expect(&TokenKind::KwSwitch)?;
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let guard = if self.eat(&TokenKind::KwCase) {
                let g = self.parse_expression()?;
                Some(g)
            } else {
                self.expect(&TokenKind::KwDefault)?;
                None
            };
            self.expect(&TokenKind::Arrow)?;
            let field = self.parse_unit_field()?;
            cases.push(SwitchCase { guard, field: Box::new(field) });
        }

        let mut field = UnitField::new(
            None,
            FieldType::Switch(SwitchField { discriminant: Some(discriminant), cases }),
        );
        field.attributes = self.parse_trailing_attributes()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(field)
    }

    fn parse_unit_field(&mut self) -> PResult<UnitField> {
        let name = match self.peek().clone() {
            TokenKind::Ident(n) => {
                self.bump();
                Some(self.intern_path(&n))
            }
            _ => None,
        };
        self.expect(&TokenKind::Colon)?;

        let field_type = if let TokenKind::StringLiteral(_) | TokenKind::BytesLiteral(_) | TokenKind::RegexpLiteral(_) = self.peek().clone() {
            FieldType::Literal(self.parse_ctor_literal()?)
        } else if self.eat(&TokenKind::KwSink) {
            FieldType::Sink
        } else {
            let ty = self.parse_scalar_type()?;
            FieldType::Type(ty)
        };

        let mut repeat = if self.eat(&TokenKind::LBracket) {
            self.expect(&TokenKind::RBracket)?;
            Repeat::Vector
        } else {
            Repeat::None
        };

        let attributes = self.parse_attributes(&mut repeat)?;

        let mut field = UnitField::new(name, field_type);
        field.repeat = repeat;
        field.attributes = attributes;
        self.expect(&TokenKind::Semicolon)?;
        Ok(field)
    }

    /// Consumes a run of `&name`/`&name=value` attributes. `&until`/`&while`/
    /// `&eod` additionally set the field's [`Repeat`] rather than landing in
    /// the returned [`AttributeSet`], since they govern loop termination
    /// rather than being passive metadata.
    fn parse_attributes(&mut self, repeat: &mut Repeat) -> PResult<AttributeSet> {
        self.parse_trailing_attributes_raw(|name, value, set| match (name.as_str(), value) {
            ("until", Some(v)) => *repeat = Repeat::Until(v),
            ("while", Some(v)) => *repeat = Repeat::While(v),
            ("eod", None) => *repeat = Repeat::Eod,
            (_, Some(v)) => set.push(Attribute::expr(leak(name), v)),
            (_, None) => set.push(Attribute::flag(leak(name))),
        })
    }

    fn parse_trailing_attributes(&mut self) -> PResult<AttributeSet> {
        self.parse_trailing_attributes_raw(|name, value, set| match value {
            Some(v) => set.push(Attribute::expr(leak(name), v)),
            None => set.push(Attribute::flag(leak(name))),
        })
    }

    fn parse_trailing_attributes_raw(
        &mut self,
        mut handle: impl FnMut(String, Option<Expression>, &mut AttributeSet),
    ) -> PResult<AttributeSet> {
        let mut set = AttributeSet::new();
        loop {
            match self.peek().clone() {
                TokenKind::Attribute(name) => {
                    self.bump();
                    let value = if self.eat(&TokenKind::Equals) { Some(self.parse_expression()?) } else { None };
                    handle(name, value, &mut set);
                }
                _ => break,
            }
        }
        Ok(set)
    }

    fn parse_ctor_literal(&mut self) -> PResult<Ctor> {
        Ok(match self.bump() {
            TokenKind::StringLiteral(s) => Ctor::StringValue(s),
            TokenKind::BytesLiteral(b) => Ctor::Bytes(b),
            TokenKind::RegexpLiteral(r) => Ctor::Regexp(r),
            other => return Err(Diagnostic::error("parse-error", format!("expected literal, found {other:?}"), self.span())),
        })
    }

    fn parse_scalar_type(&mut self) -> PResult<QualifiedType> {
        let ty = match self.bump() {
            TokenKind::Ident(name) => scalar_type_from_name(&name).unwrap_or(UnqualifiedType::Name({
                self.intern_path(&name)
            })),
            TokenKind::KwVoid => UnqualifiedType::Void,
            other => return Err(Diagnostic::error("parse-error", format!("expected type name, found {other:?}"), self.span())),
        };
        Ok(QualifiedType::rhs_mutable(ty))
    }

    fn parse_block(&mut self) -> PResult<Statement> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            stmts.push(self.parse_statement()?);
        }
        Ok(Statement::Block(stmts))
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        if self.eat(&TokenKind::KwReturn) {
            let value = if self.peek() != &TokenKind::Semicolon { Some(self.parse_expression()?) } else { None };
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Statement::Return(value));
        }
        if self.eat(&TokenKind::KwYield) {
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Statement::Yield);
        }
        if self.eat(&TokenKind::KwAssert) {
            let e = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Statement::Assert(e, None));
        }
        if self.eat(&TokenKind::KwPrint) {
            let mut args = vec![self.parse_expression()?];
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Statement::Print(args));
        }
        if self.eat(&TokenKind::KwIf) {
            self.expect(&TokenKind::LParen)?;
            let cond = self.parse_expression()?;
            self.expect(&TokenKind::RParen)?;
            let then = self.parse_block()?;
            let else_ = if self.eat(&TokenKind::KwElse) { Some(Box::new(self.parse_block()?)) } else { None };
            return Ok(Statement::If(cond, Box::new(then), else_));
        }
        if self.peek() == &TokenKind::LBrace {
            return self.parse_block();
        }
        let e = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Statement::Expression(e))
    }

    // --- expressions: precedence-climbing over a small binary-operator table ---

    pub fn parse_expression(&mut self) -> PResult<Expression> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expression> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, prec)) = binary_op(self.peek()) else { break };
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expression::UnresolvedOperator { kind: op, operands: vec![lhs, rhs] };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        if self.eat(&TokenKind::Bang) {
            let e = self.parse_unary()?;
            return Ok(Expression::UnresolvedOperator { kind: OperatorKind::Not, operands: vec![e] });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let mut e = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let member = self.ident()?;
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    let mut operands = vec![e, Expression::Name(member)];
                    operands.extend(args);
                    e = Expression::UnresolvedOperator { kind: OperatorKind::MemberCall, operands };
                } else {
                    e = Expression::UnresolvedOperator { kind: OperatorKind::Member, operands: vec![e, Expression::Name(member)] };
                }
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(&TokenKind::RBracket)?;
                e = Expression::UnresolvedOperator { kind: OperatorKind::Index, operands: vec![e, index] };
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expression>> {
        let mut args = Vec::new();
        if self.peek() != &TokenKind::RParen {
            args.push(self.parse_expression()?);
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        Ok(match self.bump() {
            TokenKind::IntLiteral(n) => Expression::Ctor(Ctor::SignedInteger(n, 64)),
            TokenKind::UintLiteral(n) => Expression::Ctor(Ctor::UnsignedInteger(n, 64)),
            TokenKind::RealLiteral(n) => Expression::Ctor(Ctor::Real(n)),
            TokenKind::StringLiteral(s) => Expression::Ctor(Ctor::StringValue(s)),
            TokenKind::BytesLiteral(b) => Expression::Ctor(Ctor::Bytes(b)),
            TokenKind::RegexpLiteral(r) => Expression::Ctor(Ctor::Regexp(r)),
            TokenKind::KwTrue => Expression::Ctor(Ctor::Bool(true)),
            TokenKind::KwFalse => Expression::Ctor(Ctor::Bool(false)),
            TokenKind::KwNull => Expression::Null,
            TokenKind::DollarDollar => Expression::DollarDollar,
            TokenKind::Ident(name) => {
                let mut id = self.intern_path(&name);
                while self.eat(&TokenKind::DoubleColon) {
                    let next = self.single_component()?;
                    id = id.join(&Id::single(next));
                }
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    let mut operands = vec![Expression::Name(id)];
                    operands.extend(args);
                    Expression::UnresolvedOperator { kind: OperatorKind::Call, operands }
                } else {
                    Expression::Name(id)
                }
            }
            TokenKind::LParen => {
                let e = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                e
            }
            other => return Err(Diagnostic::error("parse-error", format!("unexpected token in expression: {other:?}"), self.span())),
        })
    }
}

fn unit_push_hook(unit: &mut UnitDecl, (event, hook): (HookEvent, Hook)) {
    match event {
        HookEvent::Init => unit.on_init.push(hook),
        HookEvent::Done => unit.on_done.push(hook),
        HookEvent::Error => unit.on_error.push(hook),
        HookEvent::Foreach | HookEvent::FieldDone => unit.on_done.push(hook),
    }
}

fn binary_op(kind: &TokenKind) -> Option<(OperatorKind, u8)> {
    Some(match kind {
        TokenKind::OrOr => (OperatorKind::LogicalOr, 1),
        TokenKind::AndAnd => (OperatorKind::LogicalAnd, 2),
        TokenKind::Pipe => (OperatorKind::BitOr, 3),
        TokenKind::Caret => (OperatorKind::BitXor, 4),
        TokenKind::Amp => (OperatorKind::BitAnd, 5),
        TokenKind::EqEq => (OperatorKind::Eq, 6),
        TokenKind::Ne => (OperatorKind::Ne, 6),
        TokenKind::Lt => (OperatorKind::Lt, 7),
        TokenKind::Le => (OperatorKind::Le, 7),
        TokenKind::Gt => (OperatorKind::Gt, 7),
        TokenKind::Ge => (OperatorKind::Ge, 7),
        TokenKind::Shl => (OperatorKind::Shl, 8),
        TokenKind::Shr => (OperatorKind::Shr, 8),
        TokenKind::Plus => (OperatorKind::Add, 9),
        TokenKind::Minus => (OperatorKind::Sub, 9),
        TokenKind::Star => (OperatorKind::Mul, 10),
        TokenKind::Slash => (OperatorKind::Div, 10),
        TokenKind::Percent => (OperatorKind::Mod, 10),
        _ => return None,
    })
}

fn scalar_type_from_name(name: &str) -> Option<UnqualifiedType> {
    Some(match name {
        "bool" => UnqualifiedType::Bool,
        "int8" => UnqualifiedType::SignedInteger(8),
        "int16" => UnqualifiedType::SignedInteger(16),
        "int32" => UnqualifiedType::SignedInteger(32),
        "int64" => UnqualifiedType::SignedInteger(64),
        "uint8" => UnqualifiedType::UnsignedInteger(8),
        "uint16" => UnqualifiedType::UnsignedInteger(16),
        "uint32" => UnqualifiedType::UnsignedInteger(32),
        "uint64" => UnqualifiedType::UnsignedInteger(64),
        "real" => UnqualifiedType::Real,
        "interval" => UnqualifiedType::Interval,
        "time" => UnqualifiedType::Time,
        "addr" => UnqualifiedType::Address,
        "port" => UnqualifiedType::Port,
        "string" => UnqualifiedType::StringType,
        "bytes" => UnqualifiedType::Bytes,
        "stream" => UnqualifiedType::Stream,
        _ => return None,
    })
}

/// Attribute names are parsed from owned `String`s but `Attribute::name` is
/// `&'static str`, since attribute names come from a small fixed vocabulary.
/// This leaks the string once per occurrence rather than treating it as a
/// per-parse allocation hot path.
fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}
