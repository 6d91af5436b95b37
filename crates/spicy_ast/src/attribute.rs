//! Attributes: side channels attached to declarations and type items, e.g.
//! `&default=`, `&optional`, `&anonymous`, `&priority=`.

use crate::expr::Expression;

/// The declared value-kind an [`Attribute`] expects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttributeKind {
    None,
    Expression,
    StringValue,
    Integer,
}

/// A single `&name=value` (or bare `&name`) attribute.
#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub value: Option<AttributeValue>,
}

#[derive(Clone, Debug)]
pub enum AttributeValue {
    Expr(Box<Expression>),
    Str(String),
    Int(i64),
}

impl Attribute {
    pub fn flag(name: &'static str) -> Self {
        Attribute { name, kind: AttributeKind::None, value: None }
    }

    pub fn expr(name: &'static str, expr: Expression) -> Self {
        Attribute {
            name,
            kind: AttributeKind::Expression,
            value: Some(AttributeValue::Expr(Box::new(expr))),
        }
    }

    pub fn string(name: &'static str, s: impl Into<String>) -> Self {
        Attribute { name, kind: AttributeKind::StringValue, value: Some(AttributeValue::Str(s.into())) }
    }

    pub fn integer(name: &'static str, n: i64) -> Self {
        Attribute { name, kind: AttributeKind::Integer, value: Some(AttributeValue::Int(n)) }
    }

    /// `true` iff `value`'s shape matches this attribute's declared kind;
    /// an attribute's expression is coerced against its declared kind
    /// during resolution, and this is what that coercion checks against.
    pub fn matches_kind(&self) -> bool {
        match (self.kind, &self.value) {
            (AttributeKind::None, None) => true,
            (AttributeKind::Expression, Some(AttributeValue::Expr(_))) => true,
            (AttributeKind::StringValue, Some(AttributeValue::Str(_))) => true,
            (AttributeKind::Integer, Some(AttributeValue::Int(_))) => true,
            _ => false,
        }
    }
}

/// An ordered bag of attributes attached to one declaration or field.
#[derive(Clone, Debug, Default)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        AttributeSet { attributes: Vec::new() }
    }

    pub fn push(&mut self, attr: Attribute) {
        self.attributes.push(attr);
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// `true` iff every attribute in the set type-checks against its
    /// declared kind.
    pub fn all_valid(&self) -> bool {
        self.attributes.iter().all(|a| a.matches_kind())
    }
}
