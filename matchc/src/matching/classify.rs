//! Classification of keyed match sites, and discovery of discriminant fields.

use fxhash::FxHashSet;

use crate::core::LitKind;
use crate::domain::{DomainOracle, Type};
use crate::matching::arms::{ArmKey, Arms};
use crate::symbol::Symbol;

/// The form of a match site.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchForm {
    /// The arm keys are compared against a field of the scrutinee.
    Tagged(Symbol),
    /// Every arm key is an integer.
    NumericLiteral,
    /// The scrutinee has a closed literal type.
    LiteralSet,
    /// Keys are compared against the scrutinee, but its domain is not known.
    Mixed,
    /// The arms are predicate/handler pairs.
    Guard,
}

/// Field names that are tried as discriminants, in order of preference.
pub const DISCRIMINANT_CANDIDATES: [&str; 7] =
    ["kind", "_tag", "type", "tag", "__typename", "ok", "status"];

/// Classify a keyed match site. Guard matches are never classified.
pub fn classify(
    oracle: &dyn DomainOracle,
    scrutinee_type: Option<&Type>,
    discriminant: Option<Symbol>,
    arms: &Arms<'_>,
) -> MatchForm {
    if let Some(discriminant) = discriminant {
        return MatchForm::Tagged(discriminant);
    }
    if numeric_keys(arms).is_some() {
        return MatchForm::NumericLiteral;
    }

    let r#type = match scrutinee_type {
        Some(r#type) => r#type,
        None => return MatchForm::Mixed,
    };
    if let Some(discriminant) = probe_discriminant(oracle, r#type) {
        return MatchForm::Tagged(discriminant);
    }
    match oracle.literal_members(r#type) {
        Some(_) => MatchForm::LiteralSet,
        None => MatchForm::Mixed,
    }
}

/// The discriminant of a tagged union scrutinee whose match was classified
/// as numeric. Integer keys are compared against the whole scrutinee, so they
/// can never match.
pub fn bypassed_discriminant(
    oracle: &dyn DomainOracle,
    scrutinee_type: Option<&Type>,
    form: MatchForm,
) -> Option<Symbol> {
    match form {
        MatchForm::NumericLiteral => probe_discriminant(oracle, scrutinee_type?),
        _ => None,
    }
}

/// The integer values of the arm keys, if every arm key is an integer.
pub fn numeric_keys(arms: &Arms<'_>) -> Option<Vec<i64>> {
    (arms.arms.iter())
        .map(|arm| match arm.key {
            ArmKey::Tag(text) => text.resolve().parse().ok(),
            ArmKey::NumericLiteral(value) => Some(value),
            ArmKey::Guard(_) => None,
        })
        .collect()
}

/// Rewrite the arm keys as integers, if every arm key is an integer.
pub fn to_numeric(arms: &mut Arms<'_>) {
    if let Some(values) = numeric_keys(arms) {
        for (arm, value) in arms.arms.iter_mut().zip(values) {
            arm.key = ArmKey::NumericLiteral(value);
        }
    }
}

/// Find a field declared by every member of a union type, with a literal
/// type that is distinct in each member.
pub fn probe_discriminant(oracle: &dyn DomainOracle, r#type: &Type) -> Option<Symbol> {
    let members = oracle.union_members(r#type)?;

    DISCRIMINANT_CANDIDATES.iter().find_map(|&candidate| {
        let label = Symbol::intern_static(candidate);
        let literals = (members.iter())
            .map(|member| oracle.field_literal(member, label))
            .collect::<Option<Vec<_>>>()?;

        let distinct = literals.iter().collect::<FxHashSet<_>>();
        (distinct.len() == literals.len()).then_some(label)
    })
}

/// The kind of literal that the keys of a site are compared as.
pub fn key_kind(oracle: &dyn DomainOracle, scrutinee_type: Option<&Type>, form: MatchForm) -> LitKind {
    let discriminant = match form {
        MatchForm::NumericLiteral => return LitKind::Int,
        MatchForm::Mixed | MatchForm::Guard => return LitKind::String,
        MatchForm::Tagged(label) => Some(label),
        MatchForm::LiteralSet => None,
    };
    scrutinee_type
        .and_then(|r#type| oracle.literal_kind(r#type, discriminant))
        .unwrap_or(LitKind::String)
}

#[cfg(test)]
mod tests {
    use scoped_arena::Scope;

    use super::*;
    use crate::core::{Const, Term};
    use crate::domain::{OpenDomain, TypeEnv};
    use crate::matching::arms::Arm;
    use crate::matching::tests::range;
    use crate::source::Span;

    fn string(value: &str) -> Type {
        Type::Literal(Const::String(Symbol::intern(value)))
    }

    fn record(fields: &[(&str, Type)]) -> Type {
        Type::Record(
            (fields.iter())
                .map(|(label, r#type)| (Symbol::intern(label), r#type.clone()))
                .collect(),
        )
    }

    fn keyed<'arena>(scope: &'arena Scope<'arena>, keys: &[&str]) -> Arms<'arena> {
        let handler = scope.to_scope(Term::Var(Span::Empty, Symbol::intern("f")));
        let arms = (keys.iter())
            .map(|key| Arm {
                range: range(0, 1),
                key: ArmKey::Tag(Symbol::intern(key)),
                handler,
            })
            .collect();
        Arms { arms, wildcard: None }
    }

    #[test]
    fn explicit_discriminant_wins() {
        let scope = Scope::new();
        let arms = keyed(&scope, &["1", "2"]);
        let label = Symbol::intern("code");
        let form = classify(&OpenDomain, None, Some(label), &arms);
        assert_eq!(form, MatchForm::Tagged(label));
    }

    #[test]
    fn integer_keys_are_numeric() {
        let scope = Scope::new();
        let mut arms = keyed(&scope, &["200", "404", "-1"]);
        assert_eq!(classify(&OpenDomain, None, None, &arms), MatchForm::NumericLiteral);

        to_numeric(&mut arms);
        assert!(matches!(arms.arms[2].key, ArmKey::NumericLiteral(-1)));
    }

    #[test]
    fn integer_keys_bypass_numeric_discriminants() {
        let env = TypeEnv::new();
        let response = Type::Union(vec![
            record(&[("status", Type::Literal(Const::Int(200))), ("body", Type::String)]),
            record(&[("status", Type::Literal(Const::Int(404)))]),
        ]);

        let scope = Scope::new();
        let arms = keyed(&scope, &["200", "404"]);
        let form = classify(&env, Some(&response), None, &arms);
        assert_eq!(form, MatchForm::NumericLiteral);
        assert_eq!(
            bypassed_discriminant(&env, Some(&response), form),
            Some(Symbol::intern("status")),
        );

        let label = Symbol::intern("status");
        let form = classify(&env, Some(&response), Some(label), &arms);
        assert_eq!(form, MatchForm::Tagged(label));
        assert_eq!(bypassed_discriminant(&env, Some(&response), form), None);

        let codes = Type::Union(vec![Type::Literal(Const::Int(200)), Type::Literal(Const::Int(404))]);
        assert_eq!(bypassed_discriminant(&env, Some(&codes), MatchForm::NumericLiteral), None);
    }

    #[test]
    fn probe_prefers_earlier_candidates() {
        let env = TypeEnv::new();
        let shape = Type::Union(vec![
            record(&[("type", string("a")), ("kind", string("x"))]),
            record(&[("type", string("b")), ("kind", string("y"))]),
        ]);
        assert_eq!(probe_discriminant(&env, &shape), Some(Symbol::intern("kind")));
    }

    #[test]
    fn probe_requires_distinct_literals() {
        let env = TypeEnv::new();
        let shape = Type::Union(vec![
            record(&[("kind", string("same")), ("_tag", string("a"))]),
            record(&[("kind", string("same")), ("_tag", string("b"))]),
            record(&[("kind", string("other")), ("_tag", Type::String)]),
        ]);
        assert_eq!(probe_discriminant(&env, &shape), None);

        let shape = Type::Union(vec![
            record(&[("kind", string("same")), ("_tag", string("a"))]),
            record(&[("kind", string("same")), ("_tag", string("b"))]),
        ]);
        assert_eq!(probe_discriminant(&env, &shape), Some(Symbol::intern("_tag")));
    }

    #[test]
    fn boolean_discriminants() {
        let env = TypeEnv::new();
        let result = Type::Union(vec![
            record(&[("ok", Type::Literal(Const::Bool(true))), ("value", Type::Int)]),
            record(&[("ok", Type::Literal(Const::Bool(false))), ("error", Type::String)]),
        ]);

        let scope = Scope::new();
        let arms = keyed(&scope, &["true", "false"]);
        let form = classify(&env, Some(&result), None, &arms);
        assert_eq!(form, MatchForm::Tagged(Symbol::intern("ok")));
        assert_eq!(key_kind(&env, Some(&result), form), LitKind::Bool);
    }

    #[test]
    fn literal_sets_and_mixed() {
        let env = TypeEnv::new();
        let scope = Scope::new();
        let arms = keyed(&scope, &["red", "green"]);

        let colour = Type::Union(vec![string("red"), string("green"), string("blue")]);
        assert_eq!(classify(&env, Some(&colour), None, &arms), MatchForm::LiteralSet);
        assert_eq!(classify(&env, Some(&Type::String), None, &arms), MatchForm::Mixed);
        assert_eq!(classify(&env, None, None, &arms), MatchForm::Mixed);
        assert_eq!(key_kind(&env, None, MatchForm::Mixed), LitKind::String);
    }
}
