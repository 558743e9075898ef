//! Compilation of match sites into decision trees.
//!
//! A match site is a scrutinee expression, a collection of arms, and
//! optionally the static type of the scrutinee. Compilation proceeds in a
//! fixed order:
//!
//! 1. [extract][arms::extract] the arms, pulling out the wildcard
//! 2. [classify][classify::classify] the site, probing for a discriminant
//! 3. [check exhaustiveness][coverage::check_exhaustiveness] against the
//!    domain of the scrutinee
//! 4. [select a strategy][strategy::select_strategy]
//! 5. generate a decision tree with the [chosen generator][compile]
//!
//! Problems found along the way are pushed as [messages][Message]. Problems
//! with the arms themselves abandon the site, which should then be left as
//! it was written. Exhaustiveness errors do not: the compiled term throws
//! at runtime when no arm applies.

use scoped_arena::Scope;

use crate::core::{Builder, TempNames, Term};
use crate::domain::{Domain, DomainOracle, Type};
use crate::source::ByteRange;
use crate::symbol::Symbol;

pub mod arms;
pub mod classify;
pub mod compile;
pub mod coverage;
pub mod reporting;
pub mod strategy;

pub use self::reporting::Message;
pub use self::strategy::Strategy;

use self::classify::MatchForm;
use self::compile::Case;
use self::strategy::KeyShape;

/// A keyed arm, as written. A key of `None` is the wildcard.
#[derive(Debug, Clone)]
pub struct RawArm<'arena> {
    pub range: ByteRange,
    pub key: Option<Symbol>,
    pub handler: &'arena Term<'arena>,
}

/// A guard entry, as written. Well-formed entries have exactly two elements:
/// a predicate followed by a handler.
#[derive(Debug, Clone)]
pub struct RawGuard<'arena> {
    pub range: ByteRange,
    pub elems: &'arena [Term<'arena>],
}

#[derive(Debug, Clone)]
pub enum RawArms<'arena> {
    Keyed(&'arena [RawArm<'arena>]),
    Guards(&'arena [RawGuard<'arena>]),
}

impl<'arena> RawArms<'arena> {
    pub fn len(&self) -> usize {
        match self {
            RawArms::Keyed(arms) => arms.len(),
            RawArms::Guards(guards) => guards.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A match site to be compiled.
#[derive(Debug, Clone)]
pub struct MatchRequest<'a, 'arena> {
    /// The range of the whole match construct.
    pub range: ByteRange,
    pub scrutinee_range: ByteRange,
    pub scrutinee: &'arena Term<'arena>,
    pub scrutinee_type: Option<&'a Type>,
    pub arms: RawArms<'arena>,
    /// A field of the scrutinee to compare the keys against.
    pub discriminant: Option<Symbol>,
}

/// The result of compiling a match site.
#[derive(Debug, Clone)]
pub enum Compiled<'arena> {
    Term(Term<'arena>, Strategy),
    /// The site could not be compiled, and should be left as it was written.
    PassThrough,
}

/// Match compilation context.
pub struct Context<'arena, 'env> {
    builder: Builder<'arena>,
    oracle: &'env dyn DomainOracle,
    names: &'env TempNames,
    /// Diagnostic messages encountered while compiling match sites.
    messages: Vec<Message>,
}

impl<'arena, 'env> Context<'arena, 'env> {
    pub fn new(
        scope: &'arena Scope<'arena>,
        oracle: &'env dyn DomainOracle,
        names: &'env TempNames,
    ) -> Context<'arena, 'env> {
        Context {
            builder: Builder::new(scope),
            oracle,
            names,
            messages: Vec::new(),
        }
    }

    pub fn builder(&self) -> Builder<'arena> {
        self.builder
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drain the diagnostic messages accumulated so far.
    pub fn drain_messages(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.messages.drain(..)
    }

    fn pass_through(&self, reason: &'static str) -> Compiled<'arena> {
        tracing::debug!(reason, "leaving match uncompiled");
        Compiled::PassThrough
    }

    #[tracing::instrument(level = "debug", skip_all, fields(arms = request.arms.len()))]
    pub fn compile_match(&mut self, request: &MatchRequest<'_, 'arena>) -> Compiled<'arena> {
        let mut arms = match arms::extract(self, request.range, &request.arms) {
            Some(arms) => arms,
            None => return self.pass_through("no usable arms"),
        };

        let form = match request.arms {
            RawArms::Guards(_) => MatchForm::Guard,
            RawArms::Keyed(_) => classify::classify(
                self.oracle,
                request.scrutinee_type,
                request.discriminant,
                &arms,
            ),
        };
        tracing::debug!(?form, "classified match");

        if let Some(discriminant) =
            classify::bypassed_discriminant(self.oracle, request.scrutinee_type, form)
        {
            self.push_message(Message::NumericKeysOnTaggedUnion {
                scrutinee_range: request.scrutinee_range,
                discriminant,
            });
        }

        if !compile::check_callable(self, &arms) {
            return self.pass_through("handler cannot be called");
        }

        if form == MatchForm::Guard {
            let term = compile::compile_guards(self.builder, self.names, request.scrutinee, &arms);
            return Compiled::Term(term, Strategy::GuardChain);
        }

        if form == MatchForm::NumericLiteral {
            classify::to_numeric(&mut arms);
        }
        let kind = classify::key_kind(self.oracle, request.scrutinee_type, form);
        let cases = (arms.arms.iter())
            .filter_map(|arm| {
                let key = arm.key.to_const(kind)?;
                Some(Case { range: arm.range, key, handler: arm.handler })
            })
            .collect::<Vec<_>>();

        if !arms::check_unique_keys(self, &cases) {
            return self.pass_through("duplicate keys");
        }

        self.check_coverage(request, form, &cases, arms.wildcard.is_some());

        let shape = match form {
            MatchForm::NumericLiteral => {
                let keys = cases.iter().filter_map(|case| case.key.as_int()).collect::<Vec<_>>();
                KeyShape::Integers { dense: strategy::is_dense(&keys) }
            }
            _ => KeyShape::Strings,
        };
        let strategy = strategy::select_strategy(shape, cases.len());

        let discriminant = match form {
            MatchForm::Tagged(label) => Some(label),
            _ => None,
        };
        let term = compile::compile_keyed(
            self.builder,
            self.names,
            strategy,
            request.scrutinee,
            discriminant,
            &cases,
            arms.wildcard.as_ref(),
        );

        Compiled::Term(term, strategy)
    }

    fn check_coverage(
        &mut self,
        request: &MatchRequest<'_, 'arena>,
        form: MatchForm,
        cases: &[Case<'arena>],
        has_wildcard: bool,
    ) {
        let domain = match (form, request.scrutinee_type) {
            (MatchForm::Mixed | MatchForm::Guard, _) | (_, None) => Domain::Unknown,
            (MatchForm::Tagged(label), Some(r#type)) => {
                self.oracle.resolve_domain(r#type, Some(label))
            }
            (MatchForm::NumericLiteral | MatchForm::LiteralSet, Some(r#type)) => {
                self.oracle.resolve_domain(r#type, None)
            }
        };

        let provided = cases.iter().map(|case| case.key.to_string()).collect::<Vec<_>>();
        let report = coverage::check_exhaustiveness(&domain, &provided, has_wildcard);

        if !report.is_exhaustive {
            self.push_message(Message::NonExhaustiveMatch {
                match_range: request.range,
                scrutinee_range: request.scrutinee_range,
                missing: report.missing.clone(),
            });
        }

        for (case, key) in cases.iter().zip(provided) {
            if report.extra.contains(&key) {
                let suggestion = reporting::suggest_key(&key, &report.missing).map(str::to_owned);
                self.push_message(Message::UnknownArmKey {
                    range: case.range,
                    key,
                    suggestion,
                });
            }
        }
    }
}
