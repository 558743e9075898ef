//! Selection of a code generation strategy from the number and distribution
//! of arm keys.

use std::fmt;

/// Sites with at most this many keyed arms are compiled to conditional
/// chains.
pub const THRESHOLD: usize = 6;

/// Code generation strategies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Nested conditionals, testing each key in turn.
    TernaryChain,
    /// A single multi-way dispatch over a temporary.
    HashedDispatch,
    /// A balanced tree of comparisons over sorted integer keys.
    BinarySearchTree,
    /// Nested conditionals, calling each predicate in turn.
    GuardChain,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::TernaryChain => "ternary chain",
            Strategy::HashedDispatch => "hashed dispatch",
            Strategy::BinarySearchTree => "binary search tree",
            Strategy::GuardChain => "guard chain",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the keys of a site look like, as far as strategy selection is
/// concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyShape {
    Guards,
    /// Keys that can only be compared for equality.
    Strings,
    /// Integer keys, which can also be ordered.
    Integers { dense: bool },
}

pub fn select_strategy(shape: KeyShape, num_arms: usize) -> Strategy {
    let strategy = match shape {
        KeyShape::Guards => Strategy::GuardChain,
        _ if num_arms <= THRESHOLD => Strategy::TernaryChain,
        KeyShape::Strings | KeyShape::Integers { dense: true } => Strategy::HashedDispatch,
        KeyShape::Integers { dense: false } => Strategy::BinarySearchTree,
    };
    tracing::trace!(?shape, num_arms, %strategy, "selected strategy");
    strategy
}

/// Integer keys are dense if the range they span is no more than twice the
/// number of distinct keys.
pub fn is_dense(keys: &[i64]) -> bool {
    let mut keys = keys.to_vec();
    keys.sort_unstable();
    keys.dedup();

    match (keys.first(), keys.last()) {
        (Some(min), Some(max)) => {
            let range = i128::from(*max) - i128::from(*min) + 1;
            range <= 2 * keys.len() as i128
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection() {
        let sparse = KeyShape::Integers { dense: false };
        let dense = KeyShape::Integers { dense: true };

        assert_eq!(select_strategy(sparse, 6), Strategy::TernaryChain);
        assert_eq!(select_strategy(dense, 7), Strategy::HashedDispatch);
        assert_eq!(select_strategy(sparse, 7), Strategy::BinarySearchTree);
        assert_eq!(select_strategy(KeyShape::Strings, 6), Strategy::TernaryChain);
        assert_eq!(select_strategy(KeyShape::Strings, 7), Strategy::HashedDispatch);
        assert_eq!(select_strategy(KeyShape::Guards, 1), Strategy::GuardChain);
        assert_eq!(select_strategy(KeyShape::Guards, 20), Strategy::GuardChain);
    }

    #[test]
    fn density() {
        assert!(is_dense(&[1, 2, 3, 4, 5, 6, 7]));
        assert!(is_dense(&[0, 2, 4, 6, 8, 10, 12]));
        assert!(!is_dense(&[0, 2, 4, 6, 8, 10, 14]));
        assert!(!is_dense(&[2, 17, 93, 1000, 1001, 1002, 50000]));
        assert!(!is_dense(&[]));
    }

    #[test]
    fn density_counts_distinct_keys() {
        assert!(is_dense(&[1, 2, 3, 4]));
        assert!(!is_dense(&[1, 1, 1, 5]));
    }

    #[test]
    fn density_does_not_overflow() {
        assert!(!is_dense(&[i64::MIN, i64::MAX]));
        assert!(is_dense(&[i64::MAX, i64::MAX - 1]));
    }
}
