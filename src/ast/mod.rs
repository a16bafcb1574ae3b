//! AST module for mixed-notation expressions.
//!
//! An [`Expr`] is either a scalar (symbol or literal) or an ordered list. Lists
//! remember whether they were written as a generic form `( ... )` or as a
//! literal sequence `[ ... ]`, since the rewrite engine treats the two
//! differently when unwrapping singleton lists.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a byte span in the source code.
///
/// # Examples
///
/// ```rust
/// use deffix::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wrapper for carrying source span information with any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

/// Distinguishes a generic bracketed form from a literal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    /// `(a b c)`: a call-like grouping.
    Form,
    /// `[a b c]`: an array-like literal.
    Sequence,
}

/// The expression tree the rewrite engine operates on.
///
/// # Examples
///
/// ```rust
/// use deffix::ast::Expr;
/// let expr = Expr::sequence(vec![Expr::number(1.0), Expr::symbol("x")]);
/// assert!(expr.is_list());
/// assert_eq!(expr.pretty(), "[1 x]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Symbol(String),
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    List(Vec<Expr>, ListKind),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    /// Builds a generic form `( ... )`.
    pub fn form(items: Vec<Expr>) -> Self {
        Expr::List(items, ListKind::Form)
    }

    /// Builds a literal sequence `[ ... ]`.
    pub fn sequence(items: Vec<Expr>) -> Self {
        Expr::List(items, ListKind::Sequence)
    }

    /// Builds the prefix application `(operator args...)`.
    pub fn apply(operator: Expr, args: Vec<Expr>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(operator);
        items.extend(args);
        Expr::form(items)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Expr::List(..))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<(&[Expr], ListKind)> {
        match self {
            Expr::List(items, kind) => Some((items, *kind)),
            _ => None,
        }
    }

    /// Pretty-prints the expression as source text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deffix::ast::Expr;
    /// let expr = Expr::form(vec![Expr::symbol("+"), Expr::number(3.5), Expr::string("a")]);
    /// assert_eq!(expr.pretty(), "(+ 3.5 \"a\")");
    /// ```
    pub fn pretty(&self) -> String {
        match self {
            Expr::Symbol(s) => s.clone(),
            Expr::Number(n) => format_number(*n),
            Expr::String(s) => format!("{:?}", s),
            Expr::Bool(b) => b.to_string(),
            Expr::Nil => "nil".to_string(),
            Expr::List(items, ListKind::Form) => format!("({})", Self::pretty_items(items)),
            Expr::List(items, ListKind::Sequence) => format!("[{}]", Self::pretty_items(items)),
        }
    }

    // ------------------------------------------------------------------------
    // Pretty-printing helpers
    // ------------------------------------------------------------------------

    fn pretty_items(items: &[Expr]) -> String {
        items
            .iter()
            .map(Expr::pretty)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Integral numbers print without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pretty())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<value::Value> for Expr {
    fn from(val: value::Value) -> Self {
        use value::Value;
        match val {
            Value::Nil => Expr::Nil,
            Value::Number(n) => Expr::Number(n),
            Value::String(s) => Expr::String(s),
            Value::Bool(b) => Expr::Bool(b),
            Value::List(items) => Expr::sequence(items.into_iter().map(Expr::from).collect()),
        }
    }
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_nested_mixed_lists() {
        let expr = Expr::form(vec![
            Expr::sequence(vec![Expr::number(1.0), Expr::Nil]),
            Expr::symbol("op"),
            Expr::Bool(false),
        ]);
        assert_eq!(expr.pretty(), "([1 nil] op false)");
    }

    #[test]
    fn value_list_converts_to_sequence() {
        let value = value::Value::List(vec![value::Value::Number(2.0)]);
        assert_eq!(Expr::from(value), Expr::sequence(vec![Expr::number(2.0)]));
    }

    #[test]
    fn fractional_numbers_keep_their_fraction() {
        assert_eq!(Expr::number(0.25).pretty(), "0.25");
        assert_eq!(Expr::number(-4.0).pretty(), "-4");
    }
}
