//! One step of operator-precedence reduction.

use crate::ast::Expr;
use crate::errors::{DeffixError, ErrorKind};

/// Collapses `items[index - 1]`, `items[index]`, `items[index + 1]` into the
/// nested form `(items[index] items[index - 1] items[index + 1])`, leaving the
/// rest of the list untouched.
///
/// `index` must lie in `1..=items.len() - 2`.
///
/// # Examples
///
/// ```rust
/// use deffix::ast::Expr;
/// use deffix::rewrite::nest::list_nest;
///
/// let items: Vec<Expr> = ["1", "a", "2", "b", "3"].iter().map(|s| Expr::symbol(*s)).collect();
/// let nested = list_nest(&items, 3).unwrap();
/// assert_eq!(Expr::form(nested).pretty(), "(1 a (b 2 3))");
/// ```
pub fn list_nest(items: &[Expr], index: usize) -> Result<Vec<Expr>, DeffixError> {
    nest_with(items, index, Expr::form)
}

/// [`list_nest`] over any element type; `build` receives the three collapsed
/// elements in `(operator left right)` order.
pub(crate) fn nest_with<T: Clone>(
    items: &[T],
    index: usize,
    build: impl FnOnce(Vec<T>) -> T,
) -> Result<Vec<T>, DeffixError> {
    if index == 0 || index + 1 >= items.len() {
        return Err(DeffixError::new(ErrorKind::MalformedListNestIndex {
            index,
            len: items.len(),
        }));
    }

    let nested = build(vec![
        items[index].clone(),
        items[index - 1].clone(),
        items[index + 1].clone(),
    ]);

    let mut out = Vec::with_capacity(items.len() - 2);
    out.extend_from_slice(&items[..index - 1]);
    out.push(nested);
    out.extend_from_slice(&items[index + 2..]);
    Ok(out)
}
