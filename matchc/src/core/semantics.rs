//! Reference semantics for the core language.
//!
//! This is a direct, environment-passing interpreter. It is not intended to be
//! fast: its job is to give compiled matches a meaning that can be compared
//! against the meaning of the match they were compiled from.

use std::fmt;
use std::sync::Arc;

use crate::core::{CmpOp, Const, Term};
use crate::symbol::Symbol;

/// Host functions that can be bound in the environment.
pub type NativeFn = dyn Fn(Value) -> Result<Value, Error> + Send + Sync;

/// Values produced by evaluation.
#[derive(Clone)]
pub enum Value {
    Const(Const),
    Record(Arc<[(Symbol, Value)]>),
    Fun(Arc<NativeFn>),
}

impl Value {
    pub fn int(value: i64) -> Value {
        Value::Const(Const::Int(value))
    }

    pub fn string(value: impl AsRef<str>) -> Value {
        Value::Const(Const::String(Symbol::intern(value)))
    }

    pub fn bool(value: bool) -> Value {
        Value::Const(Const::Bool(value))
    }

    pub fn record(fields: impl IntoIterator<Item = (Symbol, Value)>) -> Value {
        Value::Record(fields.into_iter().collect())
    }

    pub fn fun(f: impl Fn(Value) -> Result<Value, Error> + Send + Sync + 'static) -> Value {
        Value::Fun(Arc::new(f))
    }

    pub fn as_const(&self) -> Option<&Const> {
        match self {
            Value::Const(r#const) => Some(r#const),
            Value::Record(_) | Value::Fun(_) => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(r#const) => f.debug_tuple("Const").field(r#const).finish(),
            Value::Record(fields) => f.debug_map().entries(fields.iter().cloned()).finish(),
            Value::Fun(_) => f.write_str("<fun>"),
        }
    }
}

impl PartialEq for Value {
    /// Functions are never equal to anything, including themselves.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Const(lhs), Value::Const(rhs)) => lhs == rhs,
            (Value::Record(lhs), Value::Record(rhs)) => lhs == rhs,
            (_, _) => false,
        }
    }
}

/// Errors encountered while interpreting terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnboundVar(Symbol),
    InvalidRecordProj(Symbol),
    InvalidFunctionElim,
    InvalidComparison(CmpOp),
    InvalidCondition,
    InvalidMatchHead,
    /// An error raised by a [throw expression][Term::Throw].
    Thrown(Symbol),
}

impl Error {
    pub fn description(&self) -> &str {
        match self {
            Error::UnboundVar(_) => "unbound variable",
            Error::InvalidRecordProj(_) => "invalid record projection",
            Error::InvalidFunctionElim => "invalid function elim",
            Error::InvalidComparison(_) => "invalid comparison",
            Error::InvalidCondition => "condition was not a boolean",
            Error::InvalidMatchHead => "match head was not a constant",
            Error::Thrown(message) => message.resolve(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnboundVar(name) => write!(f, "{}: `{name}`", self.description()),
            Error::InvalidRecordProj(label) => write!(f, "{}: `.{label}`", self.description()),
            Error::InvalidComparison(op) => write!(f, "{}: `{}`", self.description(), op.symbol()),
            Error::InvalidFunctionElim
            | Error::InvalidCondition
            | Error::InvalidMatchHead
            | Error::Thrown(_) => f.write_str(self.description()),
        }
    }
}

impl std::error::Error for Error {}

/// Counts of the work done during evaluation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of [comparisons][Term::Compare] evaluated.
    pub comparisons: usize,
    /// Number of [multi-way dispatches][Term::ConstMatch] evaluated.
    pub dispatches: usize,
}

/// Evaluation context.
pub struct EvalContext {
    locals: Vec<(Symbol, Value)>,
    stats: Stats,
}

impl EvalContext {
    pub fn new() -> EvalContext {
        EvalContext {
            locals: Vec::new(),
            stats: Stats::default(),
        }
    }

    /// Bind a value in the environment. Later bindings shadow earlier ones.
    pub fn define(&mut self, name: Symbol, value: Value) {
        self.locals.push((name, value));
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    fn lookup(&self, name: Symbol) -> Result<Value, Error> {
        let (_, value) = (self.locals.iter().rev())
            .find(|(local_name, _)| *local_name == name)
            .ok_or(Error::UnboundVar(name))?;
        Ok(value.clone())
    }

    /// Evaluate a [term][Term] into a [value][Value].
    pub fn eval(&mut self, term: &Term<'_>) -> Result<Value, Error> {
        match term {
            Term::Var(_, name) => self.lookup(*name),
            Term::ConstLit(_, r#const) => Ok(Value::Const(*r#const)),
            Term::RecordProj(_, head_expr, label) => match self.eval(head_expr)? {
                Value::Record(fields) => (fields.iter())
                    .find(|(field_label, _)| field_label == label)
                    .map(|(_, value)| value.clone())
                    .ok_or(Error::InvalidRecordProj(*label)),
                Value::Const(_) | Value::Fun(_) => Err(Error::InvalidRecordProj(*label)),
            },
            Term::FunApp(_, head_expr, arg_expr) => match self.eval(head_expr)? {
                Value::Fun(f) => {
                    let arg = self.eval(arg_expr)?;
                    f(arg)
                }
                Value::Const(_) | Value::Record(_) => Err(Error::InvalidFunctionElim),
            },
            Term::Compare(_, op, lhs, rhs) => {
                self.stats.comparisons += 1;
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                compare(*op, &lhs, &rhs).map(Value::bool)
            }
            Term::If(_, cond, then_expr, else_expr) => match self.eval(cond)? {
                Value::Const(Const::Bool(true)) => self.eval(then_expr),
                Value::Const(Const::Bool(false)) => self.eval(else_expr),
                _ => Err(Error::InvalidCondition),
            },
            Term::Let(_, name, def_expr, body_expr) => {
                let value = self.eval(def_expr)?;
                self.locals.push((*name, value));
                let result = self.eval(body_expr);
                self.locals.pop();
                result
            }
            Term::ConstMatch(_, head_expr, branches, default_expr) => {
                self.stats.dispatches += 1;
                let head = match self.eval(head_expr)? {
                    Value::Const(r#const) => r#const,
                    Value::Record(_) | Value::Fun(_) => return Err(Error::InvalidMatchHead),
                };
                match branches.iter().find(|(r#const, _)| *r#const == head) {
                    Some((_, body_expr)) => self.eval(body_expr),
                    None => self.eval(default_expr),
                }
            }
            Term::Throw(_, message) => Err(Error::Thrown(*message)),
        }
    }
}

impl Default for EvalContext {
    fn default() -> EvalContext {
        EvalContext::new()
    }
}

/// Constants of different kinds are never equal, and can't be ordered.
fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, Error> {
    match (op, lhs, rhs) {
        (CmpOp::Eq, Value::Const(lhs), Value::Const(rhs)) => Ok(lhs == rhs),
        (CmpOp::Lt, Value::Const(Const::Int(lhs)), Value::Const(Const::Int(rhs))) => Ok(lhs < rhs),
        (op, _, _) => Err(Error::InvalidComparison(op)),
    }
}
