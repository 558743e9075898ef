//! A pretty printer for the core language
//!
//! Example:
//!
//! ```
//! use matchc::core::pretty::Context;
//! use matchc::core::{Const, Term};
//! use matchc::source::Span;
//!
//! let term = Term::ConstLit(Span::Empty, Const::Int(404));
//!
//! let pp = Context::new();
//! assert_eq!(pp.term(&term).pretty(80).to_string(), "404");
//! ```

use pretty::RcDoc;

use crate::core::{Const, Term};
use crate::symbol::Symbol;

/// Term precedences
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Top = 0,
    Let,
    If,
    Cmp,
    App,
    Atomic,
}

const INDENT: isize = 4;

pub struct Context {}

impl<'arena> Context {
    pub fn new() -> Context {
        Context {}
    }

    fn ident(&'arena self, name: Symbol) -> RcDoc {
        RcDoc::text(name.resolve())
    }

    pub fn def(&'arena self, name: Symbol, expr: &Term<'arena>) -> RcDoc {
        RcDoc::concat([
            RcDoc::concat([
                RcDoc::text("def"),
                RcDoc::space(),
                self.ident(name),
                RcDoc::space(),
                RcDoc::text("="),
            ])
            .group(),
            RcDoc::concat([RcDoc::line(), self.term_prec(Prec::Top, expr)])
                .nest(INDENT)
                .group(),
            RcDoc::text(";"),
        ])
    }

    pub fn term(&'arena self, term: &Term<'arena>) -> RcDoc {
        self.term_prec(Prec::Top, term)
    }

    fn term_prec(&'arena self, prec: Prec, term: &Term<'arena>) -> RcDoc {
        match term {
            Term::Var(_, name) => self.ident(*name),
            Term::ConstLit(_, r#const) => self.r#const(r#const),
            Term::RecordProj(_, head_expr, label) => RcDoc::concat([
                self.term_prec(Prec::Atomic, head_expr),
                RcDoc::text("."),
                self.ident(*label),
            ]),
            Term::FunApp(_, head_expr, arg_expr) => RcDoc::concat([
                self.term_prec(Prec::App, head_expr),
                RcDoc::text("("),
                self.term_prec(Prec::Top, arg_expr),
                RcDoc::text(")"),
            ]),
            Term::Compare(_, op, lhs, rhs) => self.paren(
                prec > Prec::Cmp,
                RcDoc::concat([
                    self.term_prec(Prec::App, lhs),
                    RcDoc::space(),
                    RcDoc::text(op.symbol()),
                    RcDoc::space(),
                    self.term_prec(Prec::App, rhs),
                ]),
            ),
            Term::If(_, cond, then_expr, else_expr) => self.paren(
                prec > Prec::If,
                RcDoc::concat([
                    RcDoc::concat([
                        RcDoc::text("if"),
                        RcDoc::space(),
                        self.term_prec(Prec::Cmp, cond),
                        RcDoc::space(),
                        RcDoc::text("then"),
                    ])
                    .group(),
                    RcDoc::concat([RcDoc::line(), self.term_prec(Prec::If, then_expr)])
                        .nest(INDENT),
                    RcDoc::line(),
                    RcDoc::text("else"),
                    // Chains of conditionals are laid out flat, rather than
                    // nesting further at each arm
                    match else_expr {
                        Term::If(..) => {
                            RcDoc::concat([RcDoc::space(), self.term_prec(Prec::If, else_expr)])
                        }
                        _ => RcDoc::concat([RcDoc::line(), self.term_prec(Prec::If, else_expr)])
                            .nest(INDENT),
                    },
                ])
                .group(),
            ),
            Term::Let(_, name, def_expr, body_expr) => self.paren(
                prec > Prec::Let,
                RcDoc::concat([
                    RcDoc::concat([
                        RcDoc::text("let"),
                        RcDoc::space(),
                        self.ident(*name),
                        RcDoc::space(),
                        RcDoc::text("="),
                        RcDoc::softline(),
                        self.term_prec(Prec::Let, def_expr),
                        RcDoc::text(";"),
                    ])
                    .group(),
                    RcDoc::line(),
                    self.term_prec(Prec::Let, body_expr),
                ])
                .group(),
            ),
            Term::ConstMatch(_, head_expr, branches, default_expr) => self.sequence(
                RcDoc::concat([
                    RcDoc::text("match"),
                    RcDoc::space(),
                    self.term_prec(Prec::App, head_expr),
                    RcDoc::space(),
                    RcDoc::text("{"),
                ]),
                (branches.iter())
                    .map(|(r#const, body_expr)| self.branch(self.r#const(r#const), body_expr))
                    .chain(std::iter::once(
                        self.branch(RcDoc::text("_"), default_expr),
                    ))
                    .collect::<Vec<_>>()
                    .into_iter(),
                RcDoc::text(","),
                RcDoc::text("}"),
            ),
            Term::Throw(_, message) => RcDoc::concat([
                RcDoc::text("throw"),
                RcDoc::space(),
                RcDoc::text(format!("{:?}", message.resolve())),
            ]),
        }
    }

    fn r#const(&'arena self, r#const: &Const) -> RcDoc {
        match r#const {
            Const::Bool(value) => RcDoc::text(value.to_string()),
            Const::Int(value) => RcDoc::text(value.to_string()),
            Const::String(value) => RcDoc::text(format!("{:?}", value.resolve())),
        }
    }

    fn branch(&'arena self, pattern: RcDoc<'arena>, body_expr: &Term<'arena>) -> RcDoc {
        RcDoc::concat([
            pattern,
            RcDoc::space(),
            RcDoc::text("=>"),
            RcDoc::space(),
            self.term_prec(Prec::Top, body_expr),
        ])
    }

    /// Wrap a document in parens.
    fn paren(&'arena self, wrap: bool, doc: RcDoc<'arena>) -> RcDoc {
        if wrap {
            RcDoc::concat([RcDoc::text("("), doc, RcDoc::text(")")])
        } else {
            doc
        }
    }

    /// Pretty prints a delimited sequence of documents with a trailing
    /// separator if it is formatted over multiple lines.
    pub fn sequence(
        &'arena self,
        start_delim: RcDoc<'arena>,
        docs: impl ExactSizeIterator<Item = RcDoc<'arena, ()>> + Clone,
        separator: RcDoc<'arena>,
        end_delim: RcDoc<'arena>,
    ) -> RcDoc {
        if docs.len() == 0 {
            return RcDoc::concat([start_delim, end_delim]);
        }

        let docs = RcDoc::intersperse(docs, RcDoc::concat([separator.clone(), RcDoc::line()]));

        RcDoc::concat([
            start_delim,
            RcDoc::concat([
                RcDoc::line(),
                docs,
                RcDoc::flat_alt(separator, RcDoc::nil()),
            ])
            .nest(INDENT),
            RcDoc::line(),
            end_delim,
        ])
        .group()
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}
