//! Surface language.
//!
//! A module is a sequence of items. Type items describe the static types of
//! scrutinees, and definitions bind names to match sites:
//!
//! ```text
//! type Shape = { kind: "circle", radius: Int } | { kind: "square", side: Int };
//!
//! def area = match (shape : Shape) { circle => circle_area, square => square_area };
//! def sign = match n if [(is_negative, negative), (always, positive)];
//! ```

use codespan_reporting::diagnostic::{Diagnostic, Label};
use itertools::Itertools;
use scoped_arena::Scope;

use crate::files::FileId;
use crate::source::ByteRange;
use crate::symbol::Symbol;

pub mod lexer;
mod parser;

/// A module of items.
#[derive(Debug, Clone)]
pub struct Module<'arena> {
    pub items: &'arena [Item<'arena>],
}

impl<'arena> Module<'arena> {
    /// Parse a module, recovering from syntax errors at item boundaries.
    pub fn parse(
        scope: &'arena Scope<'arena>,
        file_id: FileId,
        source: &str,
    ) -> (Module<'arena>, Vec<ParseMessage>) {
        parser::Parser::new(scope, file_id, source).parse_module()
    }
}

/// Top-level items.
#[derive(Debug, Clone)]
pub enum Item<'arena> {
    Type(TypeDef<'arena>),
    Def(Def<'arena>),
}

impl<'arena> Item<'arena> {
    pub fn range(&self) -> ByteRange {
        match self {
            Item::Type(type_def) => type_def.range,
            Item::Def(def) => def.range,
        }
    }
}

/// Named type definitions.
#[derive(Debug, Clone)]
pub struct TypeDef<'arena> {
    pub range: ByteRange,
    pub name: (ByteRange, Symbol),
    pub r#type: Type<'arena>,
}

/// Definitions of match sites.
#[derive(Debug, Clone)]
pub struct Def<'arena> {
    pub range: ByteRange,
    pub name: (ByteRange, Symbol),
    pub expr: MatchExpr<'arena>,
}

/// Literals, as they were written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Literal {
    /// String literals, with escapes resolved.
    String(Symbol),
    /// Number literals, not yet parsed.
    Number(Symbol),
    Bool(bool),
}

/// Surface types.
#[derive(Debug, Clone)]
pub enum Type<'arena> {
    /// Named types, including `Int`, `String` and `Bool`.
    Name(ByteRange, Symbol),
    /// Literal types.
    Literal(ByteRange, Literal),
    /// Record types.
    Record(ByteRange, &'arena [((ByteRange, Symbol), Type<'arena>)]),
    /// Unions of two or more types.
    Union(ByteRange, &'arena [Type<'arena>]),
}

impl<'arena> Type<'arena> {
    pub fn range(&self) -> ByteRange {
        match self {
            Type::Name(range, _)
            | Type::Literal(range, _)
            | Type::Record(range, _)
            | Type::Union(range, _) => *range,
        }
    }
}

/// Surface terms.
#[derive(Debug, Clone)]
pub enum Term<'arena> {
    Name(ByteRange, Symbol),
    Literal(ByteRange, Literal),
    /// Annotated terms.
    Ann(ByteRange, &'arena Term<'arena>, &'arena Type<'arena>),
    /// Record projections.
    Proj(ByteRange, &'arena Term<'arena>, (ByteRange, Symbol)),
    /// Function applications.
    App(ByteRange, &'arena Term<'arena>, &'arena Term<'arena>),
}

impl<'arena> Term<'arena> {
    pub fn range(&self) -> ByteRange {
        match self {
            Term::Name(range, _)
            | Term::Literal(range, _)
            | Term::Ann(range, _, _)
            | Term::Proj(range, _, _)
            | Term::App(range, _, _) => *range,
        }
    }
}

/// Match expressions.
#[derive(Debug, Clone)]
pub struct MatchExpr<'arena> {
    pub range: ByteRange,
    pub scrutinee: &'arena Term<'arena>,
    /// A field of the scrutinee named with `by`.
    pub discriminant: Option<(ByteRange, Symbol)>,
    pub arms: MatchArms<'arena>,
}

#[derive(Debug, Clone)]
pub enum MatchArms<'arena> {
    /// `{ key => handler, ... }`
    Keyed(&'arena [KeyedArm<'arena>]),
    /// `if [(predicate, handler), ...]`
    Guards(&'arena [Guard<'arena>]),
}

/// Keys of keyed arms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Placeholder,
    Name(Symbol),
    Literal(Literal),
}

#[derive(Debug, Clone)]
pub struct KeyedArm<'arena> {
    pub range: ByteRange,
    pub key: (ByteRange, Key),
    pub handler: Term<'arena>,
}

/// A guard entry. Entries are written as parenthesised tuples, and are only
/// well formed if they have exactly two elements.
#[derive(Debug, Clone)]
pub struct Guard<'arena> {
    pub range: ByteRange,
    pub elems: &'arena [Term<'arena>],
}

/// Messages produced during lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMessage {
    Lexer(lexer::Error),
    UnexpectedEof {
        range: ByteRange,
        expected: Vec<String>,
    },
    UnexpectedToken {
        range: ByteRange,
        token: String,
        expected: Vec<String>,
    },
}

impl ParseMessage {
    pub fn range(&self) -> ByteRange {
        match self {
            ParseMessage::Lexer(error) => error.range(),
            ParseMessage::UnexpectedEof { range, .. }
            | ParseMessage::UnexpectedToken { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ParseMessage::Lexer(error) => error.to_diagnostic(),
            ParseMessage::UnexpectedEof { range, expected } => Diagnostic::error()
                .with_message("unexpected end of file")
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message("unexpected end of file")
                ])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            ParseMessage::UnexpectedToken {
                range,
                token,
                expected,
            } => Diagnostic::error()
                .with_message(format!("unexpected token {token}"))
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message("unexpected token")
                ])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
        }
    }
}

fn format_expected<T: std::fmt::Display>(expected: &[T]) -> Option<String> {
    expected.split_last().map(|items| match items {
        (last, []) => format!("expected {last}"),
        (last, expected) => format!("expected {} or {last}", expected.iter().format(", ")),
    })
}
