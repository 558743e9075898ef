//! Lowering of the surface language into the core language.
//!
//! Type items are converted into [domain types][Type] and match expressions
//! into [match requests][MatchRequest], ready to be compiled. Annotations
//! carry no meaning in the core language, and are erased everywhere except
//! on the scrutinee, where they supply its static type.

use std::str::FromStr;

use scoped_arena::Scope;

use crate::alloc;
use crate::core::{self, Const};
use crate::domain::{Type, TypeEnv};
use crate::matching::{MatchRequest, Message, RawArm, RawArms, RawGuard};
use crate::source::{ByteRange, Span};
use crate::surface::{self, Key, Literal, MatchArms, MatchExpr};
use crate::symbol::Symbol;

/// Lowering context.
pub struct Context<'arena> {
    scope: &'arena Scope<'arena>,
    /// Diagnostic messages encountered while lowering.
    messages: Vec<Message>,
}

impl<'arena> Context<'arena> {
    pub fn new(scope: &'arena Scope<'arena>) -> Context<'arena> {
        Context {
            scope,
            messages: Vec::new(),
        }
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn drain_messages(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.messages.drain(..)
    }

    /// Define the type items of a module. Later definitions replace earlier
    /// ones with the same name.
    pub fn define_types(&mut self, module: &surface::Module<'_>, env: &mut TypeEnv) {
        for item in module.items {
            if let surface::Item::Type(type_def) = item {
                let r#type = self.lower_type(&type_def.r#type);
                env.define(type_def.name.1, r#type);
            }
        }
    }

    pub fn lower_type(&mut self, r#type: &surface::Type<'_>) -> Type {
        match r#type {
            surface::Type::Name(_, name) => match name.resolve() {
                "Int" => Type::Int,
                "String" => Type::String,
                "Bool" => Type::Bool,
                _ => Type::Named(*name),
            },
            surface::Type::Literal(range, literal) => match self.lower_literal(*range, *literal) {
                Some(r#const) => Type::Literal(r#const),
                None => Type::Unknown,
            },
            surface::Type::Record(_, fields) => Type::Record(
                (fields.iter())
                    .map(|((_, label), r#type)| (*label, self.lower_type(r#type)))
                    .collect(),
            ),
            surface::Type::Union(_, types) => {
                Type::Union(types.iter().map(|r#type| self.lower_type(r#type)).collect())
            }
        }
    }

    /// Lower a surface term. Returns `None` if the term contained a literal
    /// that could not be parsed.
    pub fn lower_term(&mut self, term: &surface::Term<'_>) -> Option<core::Term<'arena>> {
        match term {
            surface::Term::Name(range, name) => Some(core::Term::Var(Span::from(*range), *name)),
            surface::Term::Literal(range, literal) => {
                let r#const = self.lower_literal(*range, *literal)?;
                Some(core::Term::ConstLit(Span::from(*range), r#const))
            }
            surface::Term::Ann(_, term, _) => self.lower_term(term),
            surface::Term::Proj(range, head_expr, (_, label)) => {
                let head_expr = self.lower_term(head_expr)?;
                Some(core::Term::RecordProj(
                    Span::from(*range),
                    self.scope.to_scope(head_expr),
                    *label,
                ))
            }
            surface::Term::App(range, head_expr, arg_expr) => {
                let head_expr = self.lower_term(head_expr)?;
                let arg_expr = self.lower_term(arg_expr)?;
                Some(core::Term::FunApp(
                    Span::from(*range),
                    self.scope.to_scope(head_expr),
                    self.scope.to_scope(arg_expr),
                ))
            }
        }
    }

    fn lower_literal(&mut self, range: ByteRange, literal: Literal) -> Option<Const> {
        match literal {
            Literal::String(contents) => Some(Const::String(contents)),
            Literal::Number(text) => self.parse_number(range, text).map(Const::Int),
            Literal::Bool(value) => Some(Const::Bool(value)),
        }
    }

    fn parse_number<T: FromStr>(&mut self, range: ByteRange, text: Symbol) -> Option<T>
    where
        T::Err: std::fmt::Display,
    {
        match text.resolve().parse() {
            Ok(data) => Some(data),
            Err(error) => {
                let message = error.to_string();
                self.push_message(Message::InvalidNumericLiteral { range, message });
                None
            }
        }
    }

    /// The static type of the scrutinee of `expr`, if it was annotated.
    pub fn scrutinee_type(&mut self, expr: &MatchExpr<'_>) -> Option<Type> {
        match expr.scrutinee {
            surface::Term::Ann(_, _, r#type) => Some(self.lower_type(r#type)),
            _ => None,
        }
    }

    /// Lower a match expression. Returns `None` if any part of it could not
    /// be lowered, in which case the site should be left as it was written.
    pub fn lower_match<'a>(
        &mut self,
        expr: &MatchExpr<'_>,
        scrutinee_type: Option<&'a Type>,
    ) -> Option<MatchRequest<'a, 'arena>> {
        let scrutinee = self.lower_term(expr.scrutinee)?;
        let scrutinee_range = match expr.scrutinee {
            surface::Term::Ann(_, term, _) => term.range(),
            term => term.range(),
        };

        let arms = match expr.arms {
            MatchArms::Keyed(arms) => {
                let mut raw_arms = Vec::with_capacity(arms.len());
                for arm in arms {
                    let (key_range, key) = arm.key;
                    let key = match key {
                        Key::Placeholder => None,
                        Key::Name(name) => Some(name),
                        Key::Literal(literal) => Some(self.key_text(key_range, literal)?),
                    };
                    let handler = self.lower_term(&arm.handler)?;
                    raw_arms.push(RawArm {
                        range: arm.range,
                        key,
                        handler: self.scope.to_scope(handler),
                    });
                }
                RawArms::Keyed(alloc::slice_from_iter(self.scope, raw_arms))
            }
            MatchArms::Guards(guards) => {
                let mut raw_guards = Vec::with_capacity(guards.len());
                for guard in guards {
                    let mut elems = Vec::with_capacity(guard.elems.len());
                    for elem in guard.elems {
                        elems.push(self.lower_term(elem)?);
                    }
                    raw_guards.push(RawGuard {
                        range: guard.range,
                        elems: alloc::slice_from_iter(self.scope, elems),
                    });
                }
                RawArms::Guards(alloc::slice_from_iter(self.scope, raw_guards))
            }
        };

        Some(MatchRequest {
            range: expr.range,
            scrutinee_range,
            scrutinee: self.scope.to_scope(scrutinee),
            scrutinee_type,
            arms,
            discriminant: expr.discriminant.map(|(_, label)| label),
        })
    }

    /// The text that a literal key is compared against. Numbers are
    /// normalised, so that `007` and `7` are the same key.
    fn key_text(&mut self, range: ByteRange, literal: Literal) -> Option<Symbol> {
        match literal {
            Literal::String(contents) => Some(contents),
            Literal::Number(text) => {
                let value = self.parse_number::<i64>(range, text)?;
                Some(Symbol::intern(value.to_string()))
            }
            Literal::Bool(true) => Some(Symbol::intern_static("true")),
            Literal::Bool(false) => Some(Symbol::intern_static("false")),
        }
    }
}
