//! Declarations, including Spicy's `unit` body: fields, hooks, properties
//! and switch branching.

use crate::expr::Expression;
use crate::node::NodeId;
use crate::stmt::Statement;
use crate::ty::{FunctionType, QualifiedType};
use spicy_base::Id;

/// Cross-module visibility of a declaration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Linkage {
    Private,
    Public,
    /// A struct/unit member.
    Struct,
    /// Module-init top-level code.
    Init,
}

/// How many times (and under what gate) a unit field repeats.
#[derive(Clone, Debug)]
pub enum Repeat {
    /// Parsed exactly once.
    None,
    /// `: T[]` with no extra bound — runs until input or a type-level
    /// terminator decides otherwise.
    Vector,
    /// `&until=expr`.
    Until(Expression),
    /// `&while=expr`.
    While(Expression),
    /// `&eod` — loop until end-of-data.
    Eod,
}

/// One `case`/default arm of a unit field switch.
#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` marks the default (`*`) arm.
    pub guard: Option<Expression>,
    pub field: Box<UnitField>,
}

/// A branching unit field: `switch (expr) { ... }` or a bare
/// `( A | B | C )` alternation, disambiguated by look-ahead when no
/// explicit discriminant expression is given.
#[derive(Clone, Debug)]
pub struct SwitchField {
    /// `Some` for an explicit `switch (expr)`; `None` for a bare
    /// alternation disambiguated purely by look-ahead.
    pub discriminant: Option<Expression>,
    pub cases: Vec<SwitchCase>,
}

/// What a unit field actually parses.
#[derive(Clone, Debug)]
pub enum FieldType {
    /// A value of a parse-type (`uint8`, `bytes &size=4`, ...).
    Type(QualifiedType),
    /// A literal terminal: a byte/string literal or regex literal that
    /// must match exactly.
    Literal(crate::ctor::Ctor),
    /// Invocation of another unit's parser.
    Unit(NodeId),
    Switch(SwitchField),
    /// `: sink`.
    Sink,
    /// Assignment to a field with no input consumption.
    Variable(Expression),
}

/// A hook's attachment point.
#[derive(Clone, Debug)]
pub enum HookEvent {
    Init,
    Done,
    Error,
    /// Runs once per element of a repeated field.
    Foreach,
    /// Runs after the field it's declared on finishes parsing
    /// (`%done` hook on that specific field).
    FieldDone,
}

/// User code attached to a unit field or lifecycle event.
#[derive(Clone, Debug)]
pub struct Hook {
    pub event: HookEvent,
    /// Higher runs first; hooks with equal priority run in registration
    /// order.
    pub priority: i32,
    pub body: Statement,
}

impl Hook {
    pub fn new(event: HookEvent, body: Statement) -> Self {
        Hook { event, priority: 0, body }
    }

    pub fn with_priority(event: HookEvent, priority: i32, body: Statement) -> Self {
        Hook { event, priority, body }
    }
}

/// A `%property` or `%property=value` unit-level declaration.
#[derive(Clone, Debug)]
pub struct Property {
    pub name: Id,
    pub value: Option<Expression>,
}

/// One member of a `unit` body.
#[derive(Clone, Debug)]
pub struct UnitField {
    /// `None` for an anonymous field (`&anonymous`, or a bare literal used
    /// only for its match side effect).
    pub name: Option<Id>,
    pub field_type: FieldType,
    pub repeat: Repeat,
    pub attributes: crate::attribute::AttributeSet,
    pub hooks: Vec<Hook>,
    /// `if (cond) field;` — gates whether this field is parsed at all.
    pub condition: Option<Expression>,
}

impl UnitField {
    pub fn new(name: Option<Id>, field_type: FieldType) -> Self {
        UnitField {
            name,
            field_type,
            repeat: Repeat::None,
            attributes: crate::attribute::AttributeSet::new(),
            hooks: Vec::new(),
            condition: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none() || self.attributes.has("&anonymous")
    }
}

/// The body of a Spicy `unit` declaration.
#[derive(Clone, Debug, Default)]
pub struct UnitDecl {
    pub parameters: Vec<(Id, QualifiedType)>,
    pub fields: Vec<UnitField>,
    pub properties: Vec<Property>,
    /// `%init` hooks, unit-level (not attached to any one field).
    pub on_init: Vec<Hook>,
    pub on_done: Vec<Hook>,
    pub on_error: Vec<Hook>,
    /// A filter unit forwards transformed bytes into a downstream parser
    /// via `forward`/`forward_eod`.
    pub is_filter: bool,
}

impl UnitDecl {
    /// Looks up a unit-level property by its already-interned name
    /// (property names are compared as `Id`s since both sides go through
    /// the same interner — callers build `name` with `Id::parse` first).
    pub fn property(&self, name: &Id) -> Option<&Property> {
        self.properties.iter().find(|p| &p.name == name)
    }
}

/// The specific kind of a top-level declaration.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Type { name: Id, ty: QualifiedType, unit: Option<UnitDecl> },
    Constant { name: Id, ty: QualifiedType, value: Expression },
    GlobalVariable { name: Id, ty: QualifiedType, init: Option<Expression> },
    LocalVariable { name: Id, ty: QualifiedType, init: Option<Expression> },
    Parameter { name: Id, ty: QualifiedType },
    ImportedModule { name: Id, alias: Option<Id> },
    Function { name: Id, ty: FunctionType, body: Option<Statement> },
    Hook(Hook),
    PropertyDecl(Property),
    /// `Expression` linkage: a named alias for an expression.
    ExpressionAlias { name: Id, value: Expression },
}

/// A declaration node: its kind plus cross-module visibility.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub linkage: Linkage,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(linkage: Linkage, kind: DeclKind) -> Self {
        Declaration { linkage, kind }
    }

    pub fn tag(&self) -> &'static str {
        match &self.kind {
            DeclKind::Type { .. } => "decl-type",
            DeclKind::Constant { .. } => "decl-constant",
            DeclKind::GlobalVariable { .. } => "decl-global",
            DeclKind::LocalVariable { .. } => "decl-local",
            DeclKind::Parameter { .. } => "decl-parameter",
            DeclKind::ImportedModule { .. } => "decl-import",
            DeclKind::Function { .. } => "decl-function",
            DeclKind::Hook(_) => "decl-hook",
            DeclKind::PropertyDecl(_) => "decl-property",
            DeclKind::ExpressionAlias { .. } => "decl-expr-alias",
        }
    }

    /// The declaration's own name, if it has one (imported modules,
    /// hooks and properties are anonymous at the declaration level).
    pub fn name(&self) -> Option<&Id> {
        match &self.kind {
            DeclKind::Type { name, .. }
            | DeclKind::Constant { name, .. }
            | DeclKind::GlobalVariable { name, .. }
            | DeclKind::LocalVariable { name, .. }
            | DeclKind::Parameter { name, .. }
            | DeclKind::ImportedModule { name, .. }
            | DeclKind::Function { name, .. }
            | DeclKind::ExpressionAlias { name, .. } => Some(name),
            DeclKind::Hook(_) | DeclKind::PropertyDecl(_) => None,
        }
    }

    /// `true` iff a declaration's type and transitive references are fully
    /// resolved.
    pub fn is_resolved(&self) -> bool {
        match &self.kind {
            DeclKind::Type { ty, .. } => ty.is_resolved(),
            DeclKind::Constant { ty, .. } => ty.is_resolved(),
            DeclKind::GlobalVariable { ty, .. } => ty.is_resolved(),
            DeclKind::LocalVariable { ty, .. } => ty.is_resolved(),
            DeclKind::Parameter { ty, .. } => ty.is_resolved(),
            DeclKind::Function { ty, .. } => {
                ty.result.is_resolved() && ty.parameters.iter().all(|p| p.ty.is_resolved())
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Constness, Side, UnqualifiedType};

    fn mk_id(s: &str) -> Id {
        let mut interner = spicy_base::Interner::new();
        Id::parse(&mut interner, s)
    }

    #[test]
    fn declaration_name_is_some_for_named_kinds() {
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::Constant {
                name: mk_id("Foo"),
                ty: QualifiedType::new(UnqualifiedType::Bool, Constness::Const, Side::Rhs),
                value: Expression::Void,
            },
        );
        assert!(decl.name().is_some());
        assert_eq!(decl.tag(), "decl-constant");
    }

    #[test]
    fn declaration_name_is_none_for_hooks() {
        let decl = Declaration::new(
            Linkage::Struct,
            DeclKind::Hook(Hook::new(HookEvent::Init, Statement::Nop)),
        );
        assert!(decl.name().is_none());
    }

    #[test]
    fn unresolved_type_declaration_is_not_resolved() {
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::GlobalVariable {
                name: mk_id("x"),
                ty: QualifiedType::new(UnqualifiedType::Auto, Constness::Mutable, Side::Rhs),
                init: None,
            },
        );
        assert!(!decl.is_resolved());
    }

    #[test]
    fn anonymous_field_has_no_name() {
        let field = UnitField::new(None, FieldType::Type(QualifiedType::new(
            UnqualifiedType::UnsignedInteger(8),
            Constness::Mutable,
            Side::Rhs,
        )));
        assert!(field.is_anonymous());
    }

    #[test]
    fn named_field_with_anonymous_attribute_is_anonymous() {
        let mut field = UnitField::new(Some(mk_id("x")), FieldType::Type(QualifiedType::new(
            UnqualifiedType::UnsignedInteger(8),
            Constness::Mutable,
            Side::Rhs,
        )));
        field.attributes.push(crate::attribute::Attribute::flag("&anonymous"));
        assert!(field.is_anonymous());
    }

    #[test]
    fn named_field_without_flag_is_not_anonymous() {
        let field = UnitField::new(Some(mk_id("x")), FieldType::Type(QualifiedType::new(
            UnqualifiedType::UnsignedInteger(8),
            Constness::Mutable,
            Side::Rhs,
        )));
        assert!(!field.is_anonymous());
    }
}
