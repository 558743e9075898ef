//! Extraction of arms from the raw arm collection of a match site.

use fxhash::FxHashMap;

use crate::core::{Const, LitKind, Term};
use crate::matching::compile::Case;
use crate::matching::{Context, Message, RawArms};
use crate::source::ByteRange;
use crate::symbol::Symbol;

/// The key of an arm, as decided by the [classifier][super::classify].
#[derive(Debug, Clone)]
pub enum ArmKey<'arena> {
    /// A tag or literal, as it was written.
    Tag(Symbol),
    /// An integer literal.
    NumericLiteral(i64),
    /// A predicate that is called with the scrutinee.
    Guard(&'arena Term<'arena>),
}

impl<'arena> ArmKey<'arena> {
    /// The constant that the scrutinee is compared against, if this is not a
    /// guard.
    pub fn to_const(&self, kind: LitKind) -> Option<Const> {
        match self {
            ArmKey::Tag(text) => Some(kind.parse_key(*text)),
            ArmKey::NumericLiteral(value) => Some(Const::Int(*value)),
            ArmKey::Guard(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Arm<'arena> {
    pub range: ByteRange,
    pub key: ArmKey<'arena>,
    pub handler: &'arena Term<'arena>,
}

#[derive(Debug, Clone)]
pub struct Wildcard<'arena> {
    pub range: ByteRange,
    pub handler: &'arena Term<'arena>,
}

/// The canonical arms of a match site, in source order, with the wildcard
/// pulled out of the list.
#[derive(Debug, Clone)]
pub struct Arms<'arena> {
    pub arms: Vec<Arm<'arena>>,
    pub wildcard: Option<Wildcard<'arena>>,
}

impl<'arena> Arms<'arena> {
    /// Handlers and predicates, along with the range of the arm they belong to.
    pub fn callees(&self) -> impl Iterator<Item = (ByteRange, &'arena Term<'arena>)> + '_ {
        let arms = self.arms.iter().flat_map(|arm| {
            let predicate = match arm.key {
                ArmKey::Guard(predicate) => Some((arm.range, predicate)),
                ArmKey::Tag(_) | ArmKey::NumericLiteral(_) => None,
            };
            predicate.into_iter().chain([(arm.range, arm.handler)])
        });
        let wildcard = (self.wildcard.iter()).map(|wildcard| (wildcard.range, wildcard.handler));
        arms.chain(wildcard)
    }
}

/// Extract the arms of a match site. Malformed guards are reported and
/// skipped. Returns `None` if no usable arm remains.
pub fn extract<'arena>(
    ctx: &mut Context<'arena, '_>,
    match_range: ByteRange,
    raw_arms: &RawArms<'arena>,
) -> Option<Arms<'arena>> {
    let mut arms = Vec::with_capacity(raw_arms.len());
    let mut wildcard = None::<Wildcard<'arena>>;

    match raw_arms {
        RawArms::Keyed(raw_arms) => {
            for raw_arm in raw_arms.iter() {
                match raw_arm.key {
                    Some(text) => arms.push(Arm {
                        range: raw_arm.range,
                        key: ArmKey::Tag(text),
                        handler: raw_arm.handler,
                    }),
                    None => match &wildcard {
                        Some(first) => ctx.push_message(Message::DuplicateWildcard {
                            range: raw_arm.range,
                            first_range: first.range,
                        }),
                        None => {
                            wildcard = Some(Wildcard {
                                range: raw_arm.range,
                                handler: raw_arm.handler,
                            })
                        }
                    },
                }
            }
        }
        RawArms::Guards(raw_guards) => {
            for raw_guard in raw_guards.iter() {
                match raw_guard.elems {
                    [predicate, handler] => arms.push(Arm {
                        range: raw_guard.range,
                        key: ArmKey::Guard(predicate),
                        handler,
                    }),
                    elems => ctx.push_message(Message::MalformedGuard {
                        range: raw_guard.range,
                        found_len: elems.len(),
                    }),
                }
            }
        }
    }

    if arms.is_empty() && wildcard.is_none() {
        ctx.push_message(Message::NoArms { match_range });
        return None;
    }

    Some(Arms { arms, wildcard })
}

/// Report every case whose key was already used by an earlier case. Returns
/// `false` if there were any.
pub fn check_unique_keys(ctx: &mut Context<'_, '_>, cases: &[Case<'_>]) -> bool {
    let mut seen = FxHashMap::<Const, ByteRange>::default();
    let mut is_unique = true;

    for case in cases {
        if let Some(first_range) = seen.get(&case.key) {
            ctx.push_message(Message::DuplicateArmKey {
                range: case.range,
                first_range: *first_range,
                key: case.key.to_string(),
            });
            is_unique = false;
        } else {
            seen.insert(case.key, case.range);
        }
    }

    is_unique
}
