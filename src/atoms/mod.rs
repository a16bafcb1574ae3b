//! # Operator Kinds
//!
//! Every symbol the engine treats as an operator resolves to one of a closed
//! set of kinds, decided when the symbol is registered or defined:
//!
//! - **`User`**: an operator registered or defined by the program
//! - **`Builtin`**: a built-in arithmetic or comparison function (`+`, `pow`, ...)
//! - **`Sequence`**: a sequence constructor (`list`, `tuple`, `range`)
//!
//! The builtin table is static, so classification never evaluates anything.

use crate::ast::value::Value;
use crate::errors::DeffixError;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub mod collections;
pub mod math;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Pure atoms: operate only on values, no state access
pub type PureAtomFn = fn(args: &[Value]) -> Result<Value, DeffixError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OperatorKind {
    User(String),
    Builtin(BuiltinOperator),
    Sequence(SequenceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Abs,
    Min,
    Max,
    Pow,
    Divmod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SequenceKind {
    List,
    Tuple,
    Range,
}

// ============================================================================
// BUILTIN TABLE
// ============================================================================

impl BuiltinOperator {
    pub const ALL: [BuiltinOperator; 16] = [
        BuiltinOperator::Add,
        BuiltinOperator::Sub,
        BuiltinOperator::Mul,
        BuiltinOperator::Div,
        BuiltinOperator::Mod,
        BuiltinOperator::Eq,
        BuiltinOperator::Ne,
        BuiltinOperator::Lt,
        BuiltinOperator::Gt,
        BuiltinOperator::Le,
        BuiltinOperator::Ge,
        BuiltinOperator::Abs,
        BuiltinOperator::Min,
        BuiltinOperator::Max,
        BuiltinOperator::Pow,
        BuiltinOperator::Divmod,
    ];

    pub const fn symbol(&self) -> &'static str {
        match self {
            BuiltinOperator::Add => "+",
            BuiltinOperator::Sub => "-",
            BuiltinOperator::Mul => "*",
            BuiltinOperator::Div => "/",
            BuiltinOperator::Mod => "%",
            BuiltinOperator::Eq => "=",
            BuiltinOperator::Ne => "!=",
            BuiltinOperator::Lt => "<",
            BuiltinOperator::Gt => ">",
            BuiltinOperator::Le => "<=",
            BuiltinOperator::Ge => ">=",
            BuiltinOperator::Abs => "abs",
            BuiltinOperator::Min => "min",
            BuiltinOperator::Max => "max",
            BuiltinOperator::Pow => "pow",
            BuiltinOperator::Divmod => "divmod",
        }
    }

    fn function(&self) -> PureAtomFn {
        match self {
            BuiltinOperator::Add => math::ATOM_ADD,
            BuiltinOperator::Sub => math::ATOM_SUB,
            BuiltinOperator::Mul => math::ATOM_MUL,
            BuiltinOperator::Div => math::ATOM_DIV,
            BuiltinOperator::Mod => math::ATOM_MOD,
            BuiltinOperator::Eq => math::ATOM_EQ,
            BuiltinOperator::Ne => math::ATOM_NE,
            BuiltinOperator::Lt => math::ATOM_LT,
            BuiltinOperator::Gt => math::ATOM_GT,
            BuiltinOperator::Le => math::ATOM_LE,
            BuiltinOperator::Ge => math::ATOM_GE,
            BuiltinOperator::Abs => math::ATOM_ABS,
            BuiltinOperator::Min => math::ATOM_MIN,
            BuiltinOperator::Max => math::ATOM_MAX,
            BuiltinOperator::Pow => math::ATOM_POW,
            BuiltinOperator::Divmod => math::ATOM_DIVMOD,
        }
    }
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 3] = [SequenceKind::List, SequenceKind::Tuple, SequenceKind::Range];

    pub const fn symbol(&self) -> &'static str {
        match self {
            SequenceKind::List => "list",
            SequenceKind::Tuple => "tuple",
            SequenceKind::Range => "range",
        }
    }

    fn function(&self) -> PureAtomFn {
        match self {
            SequenceKind::List | SequenceKind::Tuple => collections::ATOM_LIST,
            SequenceKind::Range => collections::ATOM_RANGE,
        }
    }
}

static BUILTINS: Lazy<HashMap<&'static str, OperatorKind>> = Lazy::new(|| {
    let builtins = BuiltinOperator::ALL
        .iter()
        .map(|op| (op.symbol(), OperatorKind::Builtin(*op)));
    let sequences = SequenceKind::ALL
        .iter()
        .map(|kind| (kind.symbol(), OperatorKind::Sequence(*kind)));
    builtins.chain(sequences).collect()
});

/// Looks a symbol up in the static table of built-in operators.
///
/// # Examples
///
/// ```rust
/// use deffix::atoms::{resolve_builtin, BuiltinOperator, OperatorKind};
/// assert_eq!(resolve_builtin("*"), Some(OperatorKind::Builtin(BuiltinOperator::Mul)));
/// assert_eq!(resolve_builtin("plus"), None);
/// ```
pub fn resolve_builtin(symbol: &str) -> Option<OperatorKind> {
    BUILTINS.get(symbol).cloned()
}

/// Names of every built-in operator, sorted for display.
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

impl OperatorKind {
    /// The implementation for non-user kinds; user operators are evaluated
    /// from their stored definition instead.
    pub fn function(&self) -> Option<PureAtomFn> {
        match self {
            OperatorKind::User(_) => None,
            OperatorKind::Builtin(op) => Some(op.function()),
            OperatorKind::Sequence(kind) => Some(kind.function()),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorKind::User(name) => write!(f, "user operator '{}'", name),
            OperatorKind::Builtin(op) => write!(f, "builtin '{}'", op.symbol()),
            OperatorKind::Sequence(kind) => write!(f, "sequence constructor '{}'", kind.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_resolves_to_itself() {
        for op in BuiltinOperator::ALL {
            assert_eq!(resolve_builtin(op.symbol()), Some(OperatorKind::Builtin(op)));
        }
        assert_eq!(
            resolve_builtin("range"),
            Some(OperatorKind::Sequence(SequenceKind::Range))
        );
    }

    #[test]
    fn builtin_names_are_sorted_and_complete() {
        let names = builtin_names();
        assert_eq!(names.len(), BuiltinOperator::ALL.len() + SequenceKind::ALL.len());
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
