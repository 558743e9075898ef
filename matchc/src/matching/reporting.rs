use codespan_reporting::diagnostic::{Diagnostic, Label};
use itertools::Itertools;

use crate::files::FileId;
use crate::source::ByteRange;
use crate::symbol::Symbol;

/// Match compilation diagnostic messages.
#[derive(Debug, Clone)]
pub enum Message {
    /// The match site had no arms, or none that could be used.
    NoArms {
        match_range: ByteRange,
    },
    /// A guard entry was not a predicate/handler pair.
    MalformedGuard {
        range: ByteRange,
        found_len: usize,
    },
    DuplicateArmKey {
        range: ByteRange,
        first_range: ByteRange,
        key: String,
    },
    DuplicateWildcard {
        range: ByteRange,
        first_range: ByteRange,
    },
    NonExhaustiveMatch {
        match_range: ByteRange,
        scrutinee_range: ByteRange,
        missing: Vec<String>,
    },
    /// An arm key that is not in the domain of the scrutinee.
    UnknownArmKey {
        range: ByteRange,
        key: String,
        suggestion: Option<String>,
    },
    /// Integer keys were matched against a tagged union as a whole, rather
    /// than against its discriminant.
    NumericKeysOnTaggedUnion {
        scrutinee_range: ByteRange,
        discriminant: Symbol,
    },
    HandlerNotCallable {
        range: ByteRange,
    },
    InvalidNumericLiteral {
        range: ByteRange,
        message: String,
    },
}

impl Message {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary_label = |range: &ByteRange| Label::primary(range.file_id(), *range);
        let secondary_label = |range: &ByteRange| Label::secondary(range.file_id(), *range);

        match self {
            Message::NoArms { match_range } => Diagnostic::error()
                .with_message("match requires at least one arm")
                .with_labels(vec![primary_label(match_range).with_message("no usable arms")]),
            Message::MalformedGuard { range, found_len } => Diagnostic::error()
                .with_message("malformed guard")
                .with_labels(vec![primary_label(range)
                    .with_message(format!("expected 2 elements, found {found_len}"))])
                .with_notes(vec![
                    "guards must be a pair of a predicate and a handler".to_owned()
                ]),
            Message::DuplicateArmKey {
                range,
                first_range,
                key,
            } => Diagnostic::error()
                .with_message(format!("duplicate arm for `{key}`"))
                .with_labels(vec![
                    primary_label(range).with_message("duplicate arm"),
                    secondary_label(first_range).with_message("first arm"),
                ]),
            Message::DuplicateWildcard { range, first_range } => Diagnostic::warning()
                .with_message("unreachable wildcard arm")
                .with_labels(vec![
                    primary_label(range).with_message("unreachable wildcard"),
                    secondary_label(first_range).with_message("first wildcard"),
                ]),
            Message::NonExhaustiveMatch {
                match_range,
                scrutinee_range,
                missing,
            } => Diagnostic::error()
                .with_message("non-exhaustive match")
                .with_labels(vec![
                    primary_label(scrutinee_range).with_message(format!(
                        "{} not covered",
                        (missing.iter()).format_with(", ", |key, f| f(&format_args!("`{key}`"))),
                    )),
                    secondary_label(match_range).with_message("in match expression"),
                ])
                .with_notes(vec![
                    "add an arm for each missing case, or a wildcard arm".to_owned()
                ]),
            Message::UnknownArmKey {
                range,
                key,
                suggestion,
            } => {
                let notes = match suggestion {
                    Some(suggestion) => vec![format!("help: did you mean `{suggestion}`?")],
                    None => Vec::new(),
                };

                Diagnostic::warning()
                    .with_message(format!("`{key}` is not a possible value of the scrutinee"))
                    .with_labels(vec![primary_label(range).with_message("unknown key")])
                    .with_notes(notes)
            }
            Message::NumericKeysOnTaggedUnion {
                scrutinee_range,
                discriminant,
            } => Diagnostic::warning()
                .with_message("integer keys will never match a tagged union")
                .with_labels(vec![primary_label(scrutinee_range).with_message(format!(
                    "tagged by the `{}` field",
                    discriminant.resolve(),
                ))])
                .with_notes(vec![format!(
                    "help: match on the discriminant with `by {}`",
                    discriminant.resolve(),
                )]),
            Message::HandlerNotCallable { range } => Diagnostic::error()
                .with_message("handler cannot be called")
                .with_labels(vec![primary_label(range).with_message("in this arm")])
                .with_notes(vec!["handlers and predicates must be functions".to_owned()]),
            Message::InvalidNumericLiteral { range, message } => Diagnostic::error()
                .with_message(format!("failed to parse numeric literal: {message}"))
                .with_labels(vec![primary_label(range).with_message("invalid numeric literal")]),
        }
    }
}

/// Suggest the candidate closest to `key`, if it is a plausible typo.
pub fn suggest_key<'a>(key: &str, candidates: &'a [String]) -> Option<&'a str> {
    const MAX_DISTANCE: usize = 2;

    (candidates.iter())
        .map(|candidate| (levenshtein::levenshtein(key, candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.as_str())
}

#[cfg(test)]
mod tests {
    use codespan_reporting::diagnostic::Severity;

    use super::*;
    use crate::matching::tests::range;

    #[test]
    fn suggestions() {
        let missing = vec!["circle".to_owned(), "square".to_owned()];
        assert_eq!(suggest_key("cirle", &missing), Some("circle"));
        assert_eq!(suggest_key("squar", &missing), Some("square"));
        assert_eq!(suggest_key("triangle", &missing), None);
        assert_eq!(suggest_key("x", &[]), None);
    }

    #[test]
    fn severities() {
        let error = Message::NonExhaustiveMatch {
            match_range: range(0, 10),
            scrutinee_range: range(6, 7),
            missing: vec!["C".to_owned(), "D".to_owned()],
        }
        .to_diagnostic();
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.labels[0].message, "`C`, `D` not covered");

        let warning = Message::UnknownArmKey {
            range: range(0, 1),
            key: "D".to_owned(),
            suggestion: None,
        }
        .to_diagnostic();
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.notes.is_empty());

        let warning = Message::NumericKeysOnTaggedUnion {
            scrutinee_range: range(6, 7),
            discriminant: Symbol::intern("status"),
        }
        .to_diagnostic();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.notes, ["help: match on the discriminant with `by status`"]);
    }
}
