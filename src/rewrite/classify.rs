//! Symbol classification: operand, operator, or neither.

use crate::ast::Expr;
use crate::atoms::{resolve_builtin, OperatorKind};
use crate::runtime::context::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Operator(OperatorKind),
    Operand,
    Plain,
}

impl Classification {
    pub fn is_operator(&self) -> bool {
        matches!(self, Classification::Operator(_))
    }
}

/// Classifies an element of a list.
///
/// Only symbols can be operands or operators; lists and literals are always
/// `Plain`. An operand binding wins over an operator registration of the same
/// symbol. Unregistered symbols fall back to the static builtin table, which
/// cannot fail.
///
/// # Examples
///
/// ```rust
/// use deffix::ast::Expr;
/// use deffix::rewrite::classify::{classify, Classification};
/// use deffix::Context;
///
/// let mut context = Context::new();
/// context.register_operator(["implies"]);
/// assert!(classify(&Expr::symbol("implies"), &context).is_operator());
/// assert!(classify(&Expr::symbol("+"), &context).is_operator());
/// assert_eq!(classify(&Expr::number(1.0), &context), Classification::Plain);
/// ```
pub fn classify(expr: &Expr, context: &Context) -> Classification {
    let Some(symbol) = expr.as_symbol() else {
        return Classification::Plain;
    };
    if context.operands().contains(symbol) {
        return Classification::Operand;
    }
    if let Some(kind) = context.operators().kind(symbol) {
        return Classification::Operator(kind.clone());
    }
    match resolve_builtin(symbol) {
        Some(kind) => Classification::Operator(kind),
        None => Classification::Plain,
    }
}

pub fn is_operator(expr: &Expr, context: &Context) -> bool {
    classify(expr, context).is_operator()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{BuiltinOperator, SequenceKind};

    #[test]
    fn operand_binding_wins_over_operator_registration() {
        let mut context = Context::new();
        context.register_operator(["x"]);
        context
            .define_operands(&[Expr::symbol("x"), Expr::number(1.0)])
            .unwrap();
        assert_eq!(classify(&Expr::symbol("x"), &context), Classification::Operand);
    }

    #[test]
    fn builtins_and_sequence_constructors_are_operators() {
        let context = Context::new();
        assert_eq!(
            classify(&Expr::symbol("pow"), &context),
            Classification::Operator(OperatorKind::Builtin(BuiltinOperator::Pow))
        );
        assert_eq!(
            classify(&Expr::symbol("tuple"), &context),
            Classification::Operator(OperatorKind::Sequence(SequenceKind::Tuple))
        );
    }

    #[test]
    fn unknown_symbols_and_lists_are_plain() {
        let context = Context::new();
        assert_eq!(classify(&Expr::symbol("foo"), &context), Classification::Plain);
        let list = Expr::form(vec![Expr::symbol("+")]);
        assert_eq!(classify(&list, &context), Classification::Plain);
        assert_eq!(classify(&Expr::string("+"), &context), Classification::Plain);
    }
}
