//! Core language.
//!
//! This is the expression representation that match sites are compiled into.
//! Terms are allocated in a [`Scope`], and borrow their subterms from it.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use scoped_arena::Scope;

use crate::alloc;
use crate::source::Span;
use crate::symbol::Symbol;

pub mod pretty;
pub mod semantics;

/// Constant literals.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Const {
    Bool(bool),
    Int(i64),
    String(Symbol),
}

impl Const {
    /// The kind of literal this constant is.
    pub fn kind(&self) -> LitKind {
        match self {
            Const::Bool(_) => LitKind::Bool,
            Const::Int(_) => LitKind::Int,
            Const::String(_) => LitKind::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Const::Int(value) => Some(*value),
            Const::Bool(_) | Const::String(_) => None,
        }
    }
}

/// Formats a constant the way it is compared against match keys: integers in
/// decimal, booleans as `true`/`false`, and strings without quotes.
impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Bool(value) => write!(f, "{value}"),
            Const::Int(value) => write!(f, "{value}"),
            Const::String(value) => write!(f, "{value}"),
        }
    }
}

/// Kinds of constant literals.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LitKind {
    Bool,
    Int,
    String,
}

impl LitKind {
    /// Convert the text of a match key into a constant of this kind. Text that
    /// does not parse as the expected kind is kept as a string, which can
    /// never be equal to a constant of another kind.
    pub fn parse_key(self, text: Symbol) -> Const {
        let fallback = Const::String(text);
        match self {
            LitKind::String => fallback,
            LitKind::Int => text.resolve().parse().map_or(fallback, Const::Int),
            LitKind::Bool => match text.resolve() {
                "true" => Const::Bool(true),
                "false" => Const::Bool(false),
                _ => fallback,
            },
        }
    }
}

/// Comparison operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Lt => "<",
        }
    }
}

/// Core language terms.
#[derive(Debug, Clone)]
pub enum Term<'arena> {
    /// Variable occurrences.
    ///
    /// These refer to names bound by the host program, or to temporaries
    /// introduced by [let expressions][Term::Let].
    Var(Span, Symbol),
    /// Constant literals.
    ConstLit(Span, Const),
    /// Record projections.
    RecordProj(Span, &'arena Term<'arena>, Symbol),
    /// Function applications.
    FunApp(Span, &'arena Term<'arena>, &'arena Term<'arena>),
    /// Comparisons between two terms.
    Compare(Span, CmpOp, &'arena Term<'arena>, &'arena Term<'arena>),
    /// Conditional expressions.
    If(
        Span,
        &'arena Term<'arena>,
        &'arena Term<'arena>,
        &'arena Term<'arena>,
    ),
    /// Let expressions.
    Let(Span, Symbol, &'arena Term<'arena>, &'arena Term<'arena>),
    /// Multi-way dispatch on a constant. The branch constants are unique, and
    /// the default expression is taken when none of them are equal to the
    /// head expression.
    ConstMatch(
        Span,
        &'arena Term<'arena>,
        &'arena [(Const, Term<'arena>)],
        &'arena Term<'arena>,
    ),
    /// Raise a runtime error with a message.
    Throw(Span, Symbol),
}

impl<'arena> Term<'arena> {
    pub fn span(&self) -> Span {
        match self {
            Term::Var(span, _)
            | Term::ConstLit(span, _)
            | Term::RecordProj(span, _, _)
            | Term::FunApp(span, _, _)
            | Term::Compare(span, _, _, _)
            | Term::If(span, _, _, _)
            | Term::Let(span, _, _, _)
            | Term::ConstMatch(span, _, _, _)
            | Term::Throw(span, _) => *span,
        }
    }

    /// Returns `true` if evaluating `self` more than once has no observable
    /// effect and costs no more than a lookup.
    pub fn is_atomic(&self) -> bool {
        match self {
            Term::Var(_, _) | Term::ConstLit(_, _) => true,
            Term::RecordProj(_, _, _)
            | Term::FunApp(_, _, _)
            | Term::Compare(_, _, _, _)
            | Term::If(_, _, _, _)
            | Term::Let(_, _, _, _)
            | Term::ConstMatch(_, _, _, _)
            | Term::Throw(_, _) => false,
        }
    }

    /// Returns `false` if `self` could never evaluate to a function.
    pub fn is_callable(&self) -> bool {
        !matches!(self, Term::ConstLit(_, _) | Term::Compare(_, _, _, _))
    }
}

/// Generator for the names of temporaries introduced by match compilation.
///
/// Names are allocated with an atomic increment, so a single generator can be
/// shared between match sites that are compiled concurrently without two
/// sites ever receiving the same name.
#[derive(Debug, Default)]
pub struct TempNames {
    next: AtomicU32,
}

impl TempNames {
    /// The prefix of every temporary name. It cannot be written in source
    /// code, so temporaries never shadow user bindings.
    pub const PREFIX: &'static str = "$scrut";

    pub fn new() -> TempNames {
        TempNames::default()
    }

    pub fn fresh(&self) -> Symbol {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        Symbol::intern(format!("{}{index}", TempNames::PREFIX))
    }
}

/// A pending let binding, produced by [`Builder::bind_once`].
#[derive(Debug, Clone)]
pub struct Binding<'arena> {
    name: Symbol,
    expr: &'arena Term<'arena>,
}

impl<'arena> Binding<'arena> {
    pub fn name(&self) -> Symbol {
        self.name
    }
}

/// Smart constructors for the terms produced by match compilation.
#[derive(Copy, Clone)]
pub struct Builder<'arena> {
    scope: &'arena Scope<'arena>,
}

impl<'arena> Builder<'arena> {
    pub fn new(scope: &'arena Scope<'arena>) -> Builder<'arena> {
        Builder { scope }
    }

    pub fn scope(&self) -> &'arena Scope<'arena> {
        self.scope
    }

    pub fn alloc(&self, term: Term<'arena>) -> &'arena Term<'arena> {
        self.scope.to_scope(term)
    }

    pub fn call_with(&self, handler: &'arena Term<'arena>, arg: Term<'arena>) -> Term<'arena> {
        Term::FunApp(Span::Empty, handler, self.alloc(arg))
    }

    pub fn field_access(&self, expr: Term<'arena>, label: Symbol) -> Term<'arena> {
        Term::RecordProj(Span::Empty, self.alloc(expr), label)
    }

    pub fn equals(&self, expr: Term<'arena>, r#const: Const) -> Term<'arena> {
        self.compare(CmpOp::Eq, expr, r#const)
    }

    pub fn less_than(&self, expr: Term<'arena>, r#const: Const) -> Term<'arena> {
        self.compare(CmpOp::Lt, expr, r#const)
    }

    fn compare(&self, op: CmpOp, expr: Term<'arena>, r#const: Const) -> Term<'arena> {
        let r#const = Term::ConstLit(Span::Empty, r#const);
        Term::Compare(Span::Empty, op, self.alloc(expr), self.alloc(r#const))
    }

    pub fn conditional(
        &self,
        cond: Term<'arena>,
        then_expr: Term<'arena>,
        else_expr: Term<'arena>,
    ) -> Term<'arena> {
        Term::If(
            Span::Empty,
            self.alloc(cond),
            self.alloc(then_expr),
            self.alloc(else_expr),
        )
    }

    /// Bind `expr` to a fresh temporary. Returns a reference to the temporary
    /// and the binding, which must be [wrapped][Builder::wrap] around any term
    /// that uses the reference.
    pub fn bind_once(
        &self,
        names: &TempNames,
        expr: &'arena Term<'arena>,
    ) -> (Term<'arena>, Binding<'arena>) {
        let name = names.fresh();
        (Term::Var(Span::Empty, name), Binding { name, expr })
    }

    pub fn wrap(&self, binding: Binding<'arena>, body: Term<'arena>) -> Term<'arena> {
        Term::Let(Span::Empty, binding.name, binding.expr, self.alloc(body))
    }

    pub fn throw_error(&self, message: &'static str) -> Term<'arena> {
        Term::Throw(Span::Empty, Symbol::intern_static(message))
    }

    pub fn dispatch(
        &self,
        head: Term<'arena>,
        cases: Vec<(Const, Term<'arena>)>,
        default: Term<'arena>,
    ) -> Term<'arena> {
        Term::ConstMatch(
            Span::Empty,
            self.alloc(head),
            alloc::slice_from_iter(self.scope, cases),
            self.alloc(default),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys() {
        let text = Symbol::intern("404");
        assert_eq!(LitKind::Int.parse_key(text), Const::Int(404));
        assert_eq!(LitKind::String.parse_key(text), Const::String(text));
        assert_eq!(LitKind::Bool.parse_key(text), Const::String(text));
        assert_eq!(
            LitKind::Bool.parse_key(Symbol::intern("false")),
            Const::Bool(false),
        );
    }

    #[test]
    fn temp_names_are_unique_across_threads() {
        let names = TempNames::new();
        let mut fresh: Vec<Symbol> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| (0..64).map(|_| names.fresh()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let total = fresh.len();
        fresh.sort();
        fresh.dedup();
        assert_eq!(fresh.len(), total);
    }

    #[test]
    fn bind_once_wraps_in_let() {
        let scope = Scope::new();
        let builder = Builder::new(&scope);
        let names = TempNames::new();

        let expr = builder.alloc(Term::Var(Span::Empty, Symbol::intern("x")));
        let (temp, binding) = builder.bind_once(&names, expr);
        let name = binding.name();
        let term = builder.wrap(binding, temp);

        match term {
            Term::Let(_, def_name, _, Term::Var(_, body_name)) => {
                assert_eq!(def_name, name);
                assert_eq!(*body_name, name);
            }
            term => panic!("expected let, found {term:?}"),
        }
    }
}
