//! Generation of decision trees for each [strategy][Strategy].
//!
//! Every generator calls the handler of the matching arm with the scrutinee
//! itself, never with the probed discriminant.

use crate::core::{Builder, Const, TempNames, Term};
use crate::matching::arms::{ArmKey, Arms, Wildcard};
use crate::matching::strategy::Strategy;
use crate::matching::{Context, Message};
use crate::source::ByteRange;
use crate::symbol::Symbol;

pub const NON_EXHAUSTIVE_MATCH: &str = "non-exhaustive match";
pub const NO_GUARD_MATCHED: &str = "no guard matched";

/// A keyed arm, with its key converted to the constant it is compared to.
#[derive(Debug, Clone)]
pub struct Case<'arena> {
    pub range: ByteRange,
    pub key: Const,
    pub handler: &'arena Term<'arena>,
}

/// Report every handler or predicate that could never be called. Returns
/// `false` if there were any.
pub fn check_callable(ctx: &mut Context<'_, '_>, arms: &Arms<'_>) -> bool {
    let mut is_callable = true;
    for (range, callee) in arms.callees() {
        if !callee.is_callable() {
            ctx.push_message(Message::HandlerNotCallable { range });
            is_callable = false;
        }
    }
    is_callable
}

/// Whether the scrutinee needs to be bound to a temporary before the
/// decision tree refers to it.
fn needs_binding(strategy: Strategy, scrutinee: &Term<'_>) -> bool {
    match strategy {
        Strategy::HashedDispatch | Strategy::BinarySearchTree => true,
        Strategy::TernaryChain | Strategy::GuardChain => !scrutinee.is_atomic(),
    }
}

fn with_scrutinee<'arena>(
    builder: Builder<'arena>,
    names: &TempNames,
    strategy: Strategy,
    scrutinee: &'arena Term<'arena>,
    body: impl FnOnce(&Term<'arena>) -> Term<'arena>,
) -> Term<'arena> {
    if needs_binding(strategy, scrutinee) {
        let (temp, binding) = builder.bind_once(names, scrutinee);
        let body = body(&temp);
        builder.wrap(binding, body)
    } else {
        body(scrutinee)
    }
}

/// Compile a keyed match site. `cases` must have unique keys and, for
/// [`Strategy::BinarySearchTree`], integer keys.
pub fn compile_keyed<'arena>(
    builder: Builder<'arena>,
    names: &TempNames,
    strategy: Strategy,
    scrutinee: &'arena Term<'arena>,
    discriminant: Option<Symbol>,
    cases: &[Case<'arena>],
    wildcard: Option<&Wildcard<'arena>>,
) -> Term<'arena> {
    with_scrutinee(builder, names, strategy, scrutinee, |scrutinee| {
        let fallback = match wildcard {
            Some(wildcard) => builder.call_with(wildcard.handler, scrutinee.clone()),
            None => builder.throw_error(NON_EXHAUSTIVE_MATCH),
        };
        let probe = match discriminant {
            Some(label) => builder.field_access(scrutinee.clone(), label),
            None => scrutinee.clone(),
        };

        match strategy {
            Strategy::HashedDispatch => hashed_dispatch(builder, scrutinee, probe, cases, fallback),
            Strategy::BinarySearchTree => {
                let mut cases = cases.to_vec();
                cases.sort_by_key(|case| case.key);
                binary_search_tree(builder, scrutinee, &probe, &cases, &fallback)
            }
            Strategy::TernaryChain | Strategy::GuardChain => {
                ternary_chain(builder, scrutinee, &probe, cases, fallback)
            }
        }
    })
}

/// Compile a guarded match site. Predicates are tested in order.
pub fn compile_guards<'arena>(
    builder: Builder<'arena>,
    names: &TempNames,
    scrutinee: &'arena Term<'arena>,
    arms: &Arms<'arena>,
) -> Term<'arena> {
    with_scrutinee(builder, names, Strategy::GuardChain, scrutinee, |scrutinee| {
        let fallback = builder.throw_error(NO_GUARD_MATCHED);
        guard_chain(builder, scrutinee, arms, fallback)
    })
}

/// `probe == key_0 ? handler_0(scrutinee) : ... : fallback`
fn ternary_chain<'arena>(
    builder: Builder<'arena>,
    scrutinee: &Term<'arena>,
    probe: &Term<'arena>,
    cases: &[Case<'arena>],
    fallback: Term<'arena>,
) -> Term<'arena> {
    cases.iter().rev().fold(fallback, |else_expr, case| {
        builder.conditional(
            builder.equals(probe.clone(), case.key),
            builder.call_with(case.handler, scrutinee.clone()),
            else_expr,
        )
    })
}

fn hashed_dispatch<'arena>(
    builder: Builder<'arena>,
    scrutinee: &Term<'arena>,
    probe: Term<'arena>,
    cases: &[Case<'arena>],
    fallback: Term<'arena>,
) -> Term<'arena> {
    let branches = (cases.iter())
        .map(|case| (case.key, builder.call_with(case.handler, scrutinee.clone())))
        .collect();
    builder.dispatch(probe, branches, fallback)
}

/// Split the sorted cases in half with `<` until a single candidate remains,
/// which is then tested for equality. Any path through the tree performs at
/// most `⌈log2 n⌉ + 1` comparisons.
fn binary_search_tree<'arena>(
    builder: Builder<'arena>,
    scrutinee: &Term<'arena>,
    probe: &Term<'arena>,
    cases: &[Case<'arena>],
    fallback: &Term<'arena>,
) -> Term<'arena> {
    match cases {
        [] => fallback.clone(),
        [case] => builder.conditional(
            builder.equals(probe.clone(), case.key),
            builder.call_with(case.handler, scrutinee.clone()),
            fallback.clone(),
        ),
        _ => {
            let (lower, upper) = cases.split_at(cases.len() / 2);
            builder.conditional(
                builder.less_than(probe.clone(), upper[0].key),
                binary_search_tree(builder, scrutinee, probe, lower, fallback),
                binary_search_tree(builder, scrutinee, probe, upper, fallback),
            )
        }
    }
}

/// `predicate_0(scrutinee) ? handler_0(scrutinee) : ... : fallback`
fn guard_chain<'arena>(
    builder: Builder<'arena>,
    scrutinee: &Term<'arena>,
    arms: &Arms<'arena>,
    fallback: Term<'arena>,
) -> Term<'arena> {
    let guards = arms.arms.iter().filter_map(|arm| match arm.key {
        ArmKey::Guard(predicate) => Some((predicate, arm.handler)),
        ArmKey::Tag(_) | ArmKey::NumericLiteral(_) => None,
    });

    guards.rev().fold(fallback, |else_expr, (predicate, handler)| {
        builder.conditional(
            builder.call_with(predicate, scrutinee.clone()),
            builder.call_with(handler, scrutinee.clone()),
            else_expr,
        )
    })
}

#[cfg(test)]
mod tests {
    use scoped_arena::Scope;

    use super::*;
    use crate::core::semantics::{EvalContext, Value};
    use crate::matching::tests::range;
    use crate::source::Span;

    fn cases<'arena>(scope: &'arena Scope<'arena>, keys: &[i64]) -> Vec<Case<'arena>> {
        (keys.iter())
            .map(|key| Case {
                range: range(0, 1),
                key: Const::Int(*key),
                handler: scope.to_scope(Term::Var(Span::Empty, Symbol::intern(format!("h{key}")))),
            })
            .collect()
    }

    fn depth(term: &Term<'_>) -> usize {
        match term {
            Term::If(_, _, then_expr, else_expr) => 1 + depth(then_expr).max(depth(else_expr)),
            Term::Let(_, _, _, body_expr) => depth(body_expr),
            _ => 0,
        }
    }

    #[test]
    fn tree_depth_is_logarithmic() {
        let scope = Scope::new();
        let builder = Builder::new(&scope);
        let x = Term::Var(Span::Empty, Symbol::intern("x"));
        let fallback = builder.throw_error(NON_EXHAUSTIVE_MATCH);

        for n in 1..=64_i64 {
            let keys = (0..n).map(|i| i * 10).collect::<Vec<_>>();
            let tree = binary_search_tree(builder, &x, &x, &cases(&scope, &keys), &fallback);
            let bound = (n as f64).log2().ceil() as usize + 1;
            assert!(depth(&tree) <= bound, "n = {n}: {} > {bound}", depth(&tree));
        }
    }

    #[test]
    fn atomic_scrutinees_are_not_bound() {
        let scope = Scope::new();
        let builder = Builder::new(&scope);
        let names = TempNames::new();
        let x = builder.alloc(Term::Var(Span::Empty, Symbol::intern("x")));
        let cases = cases(&scope, &[1, 2]);

        let term = compile_keyed(builder, &names, Strategy::TernaryChain, x, None, &cases, None);
        assert!(matches!(term, Term::If(..)));

        let term = compile_keyed(builder, &names, Strategy::HashedDispatch, x, None, &cases, None);
        assert!(matches!(term, Term::Let(_, _, _, Term::ConstMatch(..))));
    }

    #[test]
    fn handlers_receive_the_scrutinee() {
        let scope = Scope::new();
        let builder = Builder::new(&scope);
        let names = TempNames::new();
        let shape = builder.alloc(Term::Var(Span::Empty, Symbol::intern("shape")));
        let cases = [Case {
            range: range(0, 1),
            key: Const::String(Symbol::intern("circle")),
            handler: builder.alloc(Term::Var(Span::Empty, Symbol::intern("id"))),
        }];

        let circle = Value::record([
            (Symbol::intern("kind"), Value::string("circle")),
            (Symbol::intern("radius"), Value::int(2)),
        ]);
        let mut context = EvalContext::new();
        context.define(Symbol::intern("shape"), circle.clone());
        context.define(Symbol::intern("id"), Value::fun(Ok));

        for strategy in [Strategy::TernaryChain, Strategy::HashedDispatch] {
            let kind = Some(Symbol::intern("kind"));
            let term = compile_keyed(builder, &names, strategy, shape, kind, &cases, None);
            assert_eq!(context.eval(&term), Ok(circle.clone()));
        }
    }
}
