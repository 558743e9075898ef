//! Static types of scrutinees, and the domains of values they may take.
//!
//! The match compiler never inspects types directly: everything it needs to
//! know is asked of a [`DomainOracle`]. [`TypeEnv`] answers those questions
//! from type definitions, and [`OpenDomain`] answers them for hosts without
//! any static information.

use fxhash::{FxHashMap, FxHashSet};

use crate::core::{Const, LitKind};
use crate::symbol::Symbol;

/// Static types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// The type of all integers.
    Int,
    /// The type of all strings.
    String,
    /// The type of booleans.
    Bool,
    /// A type with exactly one inhabitant.
    Literal(Const),
    /// Record types.
    Record(Vec<(Symbol, Type)>),
    /// Closed unions of types.
    Union(Vec<Type>),
    /// References to named types.
    Named(Symbol),
    /// A type about which nothing is known.
    Unknown,
}

impl Type {
    /// Looks up the type of a field of a record type.
    pub fn field(&self, label: Symbol) -> Option<&Type> {
        match self {
            Type::Record(fields) => (fields.iter())
                .find(|(field_label, _)| *field_label == label)
                .map(|(_, r#type)| r#type),
            _ => None,
        }
    }
}

/// The values that a scrutinee (or its discriminant) may take, rendered as
/// strings so that keys of any literal kind can be compared uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    /// The domain is closed. Values are kept in declaration order.
    Known(Vec<String>),
    /// The domain is open, or could not be determined.
    Unknown,
}

impl Domain {
    pub fn from_consts(consts: impl IntoIterator<Item = Const>) -> Domain {
        let mut seen = FxHashSet::default();
        let values = (consts.into_iter())
            .map(|r#const| r#const.to_string())
            .filter(|value| seen.insert(value.clone()))
            .collect();
        Domain::Known(values)
    }
}

/// Static information about scrutinee types, supplied by the host.
///
/// Implementations must be deterministic: asking the same question about the
/// same type must always produce the same answer.
pub trait DomainOracle {
    /// The members of a closed union type, or `None` if `r#type` is not a
    /// closed union. Nested unions and named types are flattened.
    fn union_members<'a>(&'a self, r#type: &'a Type) -> Option<Vec<&'a Type>>;

    /// The literal type of a field of `member`, if it declares one.
    fn field_literal(&self, member: &Type, label: Symbol) -> Option<Const>;

    /// The literals making up `r#type`, if it is a closed literal type or a
    /// union of literals.
    fn literal_members(&self, r#type: &Type) -> Option<Vec<Const>>;

    /// The domain of the scrutinee, or of its discriminant field if one is
    /// supplied.
    fn resolve_domain(&self, r#type: &Type, discriminant: Option<Symbol>) -> Domain {
        let consts = match discriminant {
            None => self.literal_members(r#type),
            Some(label) => self.union_members(r#type).and_then(|members| {
                (members.into_iter())
                    .map(|member| self.field_literal(member, label))
                    .collect::<Option<Vec<_>>>()
            }),
        };

        match consts {
            Some(consts) => Domain::from_consts(consts),
            None => Domain::Unknown,
        }
    }

    /// The kind of literal the scrutinee (or its discriminant) takes, if
    /// every value in its domain is of the same kind.
    fn literal_kind(&self, r#type: &Type, discriminant: Option<Symbol>) -> Option<LitKind> {
        let consts = match discriminant {
            None => self.literal_members(r#type)?,
            Some(label) => (self.union_members(r#type)?.into_iter())
                .map(|member| self.field_literal(member, label))
                .collect::<Option<Vec<_>>>()?,
        };
        let (first, rest) = consts.split_first()?;
        let kind = first.kind();
        rest.iter().all(|r#const| r#const.kind() == kind).then_some(kind)
    }
}

/// An oracle for hosts that have no static type information. Every domain is
/// [unknown][Domain::Unknown].
#[derive(Debug, Copy, Clone, Default)]
pub struct OpenDomain;

impl DomainOracle for OpenDomain {
    fn union_members<'a>(&'a self, _: &'a Type) -> Option<Vec<&'a Type>> {
        None
    }

    fn field_literal(&self, _: &Type, _: Symbol) -> Option<Const> {
        None
    }

    fn literal_members(&self, _: &Type) -> Option<Vec<Const>> {
        None
    }
}

static UNKNOWN: Type = Type::Unknown;

/// Named type definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    defs: FxHashMap<Symbol, Type>,
}

impl TypeEnv {
    pub fn new() -> TypeEnv {
        TypeEnv::default()
    }

    /// Define a named type, returning the previous definition if there was one.
    pub fn define(&mut self, name: Symbol, r#type: Type) -> Option<Type> {
        self.defs.insert(name, r#type)
    }

    pub fn get(&self, name: Symbol) -> Option<&Type> {
        self.defs.get(&name)
    }

    /// Unfold named type references until a structural type is reached.
    /// Undefined and cyclic names unfold to [`Type::Unknown`].
    pub fn unfold<'a>(&'a self, mut r#type: &'a Type) -> &'a Type {
        let mut seen = FxHashSet::default();
        while let Type::Named(name) = r#type {
            if !seen.insert(*name) {
                return &UNKNOWN;
            }
            r#type = self.defs.get(name).unwrap_or(&UNKNOWN);
        }
        r#type
    }

    /// Flatten the members of a union, unfolding named types along the way.
    /// A name that refers back to a union it is already being unfolded
    /// within contributes [`Type::Unknown`].
    fn collect_members<'a>(
        &'a self,
        r#type: &'a Type,
        members: &mut Vec<&'a Type>,
        unfolding: &mut FxHashSet<Symbol>,
    ) {
        match r#type {
            Type::Named(name) => {
                if !unfolding.insert(*name) {
                    members.push(&UNKNOWN);
                    return;
                }
                let definition = self.defs.get(name).unwrap_or(&UNKNOWN);
                self.collect_members(definition, members, unfolding);
                unfolding.remove(name);
            }
            Type::Union(types) => {
                for r#type in types {
                    self.collect_members(r#type, members, unfolding);
                }
            }
            r#type => members.push(r#type),
        }
    }
}

impl DomainOracle for TypeEnv {
    fn union_members<'a>(&'a self, r#type: &'a Type) -> Option<Vec<&'a Type>> {
        match self.unfold(r#type) {
            Type::Union(_) => {
                let mut members = Vec::new();
                self.collect_members(r#type, &mut members, &mut FxHashSet::default());
                Some(members)
            }
            // A lone record behaves like a union with a single member
            unfolded @ Type::Record(_) => Some(vec![unfolded]),
            _ => None,
        }
    }

    fn field_literal(&self, member: &Type, label: Symbol) -> Option<Const> {
        match self.unfold(self.unfold(member).field(label)?) {
            Type::Literal(r#const) => Some(*r#const),
            _ => None,
        }
    }

    fn literal_members(&self, r#type: &Type) -> Option<Vec<Const>> {
        match self.unfold(r#type) {
            Type::Literal(r#const) => Some(vec![*r#const]),
            Type::Bool => Some(vec![Const::Bool(true), Const::Bool(false)]),
            Type::Union(_) => {
                let mut members = Vec::new();
                self.collect_members(r#type, &mut members, &mut FxHashSet::default());
                (members.into_iter())
                    .map(|member| match member {
                        Type::Literal(r#const) => Some(*r#const),
                        _ => None,
                    })
                    .collect()
            }
            _ => None,
        }
    }
}
