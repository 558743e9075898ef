use scoped_arena::Scope;

/// Allocate the elements of an iterator to the scope as a slice.
///
/// Unlike [`Scope::to_scope_from_iter`], this never builds an oversized
/// [`Layout`][std::alloc::Layout] while the length is still unknown, which
/// debug builds abort on. The elements are collected into a vector first, and
/// the vector is dropped along with the scope.
pub fn slice_from_iter<'arena, Elem>(
    scope: &'arena Scope<'arena>,
    elems: impl IntoIterator<Item = Elem>,
) -> &'arena [Elem] {
    scope.to_scope(elems.into_iter().collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let scope = Scope::new();
        let elems = slice_from_iter(&scope, std::iter::empty::<u32>());
        assert_eq!(elems, &[] as &[u32]);
    }

    #[test]
    fn unsized_iterators() {
        let scope = Scope::new();
        let elems = slice_from_iter(&scope, (0..10).filter(|n| n % 3 == 0));
        assert_eq!(elems, &[0, 3, 6, 9]);
    }

    #[test]
    fn elements_with_drop_glue() {
        let scope = Scope::new();
        let names = slice_from_iter(&scope, ["a", "b"].map(str::to_owned));
        assert_eq!(names, &["a".to_owned(), "b".to_owned()]);
    }
}
