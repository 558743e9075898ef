use std::fmt;

use once_cell::sync::Lazy;

// Match sites may be compiled on several threads at once, so the interner
// must be shareable without a lock around it.
static INTERNER: Lazy<lasso::ThreadedRodeo> = Lazy::new(lasso::ThreadedRodeo::new);

/// Interned strings, used for variable names, record labels and tag text.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(lasso::Spur);

impl Symbol {
    pub fn intern(sym: impl AsRef<str>) -> Symbol {
        Symbol(INTERNER.get_or_intern(sym))
    }

    pub fn intern_static(sym: &'static str) -> Symbol {
        Symbol(INTERNER.get_or_intern_static(sym))
    }

    pub fn resolve(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.resolve()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resolve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        assert_eq!(Symbol::intern("circle"), Symbol::intern("circle"));
        assert_eq!(Symbol::intern_static("kind"), Symbol::intern("kind"));
        assert_ne!(Symbol::intern("circle"), Symbol::intern("square"));
    }

    #[test]
    fn intern_from_many_threads() {
        let symbols: Vec<Symbol> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| Symbol::intern("__typename")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(symbols.iter().all(|s| *s == symbols[0]));
        assert_eq!(symbols[0].resolve(), "__typename");
    }
}
