//! Evaluation of canonical prefix expressions.
//!
//! The evaluator only understands the output of the rewrite engine: every
//! application is a form whose head is an operator symbol. Arguments are
//! evaluated eagerly, left to right.
//!
//! ## Resolution order for a form head
//!
//! 1. operators defined with `define_operator` (parameters bound as locals)
//! 2. builtin operators and sequence constructors, registered or not
//!
//! Registered user operators without a definition cannot be called.

use crate::ast::value::Value;
use crate::ast::{Expr, ListKind};
use crate::atoms::{resolve_builtin, OperatorKind};
use crate::errors::{DeffixError, ErrorKind};
use crate::runtime::context::{Context, UserOperator};
use im::HashMap;
use log::trace;

// ============================================================================
// EVALUATION CONTEXT
// ============================================================================

/// The context for a single evaluation frame.
pub struct EvaluationContext<'a> {
    pub context: &'a Context,
    pub locals: HashMap<String, Value>,
    pub depth: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            locals: HashMap::new(),
            depth: 0,
        }
    }

    fn call_frame(&self, locals: HashMap<String, Value>) -> Self {
        Self {
            context: self.context,
            locals,
            depth: self.depth + 1,
        }
    }

    /// Applies the operator named `name` to already evaluated arguments.
    pub fn call_operator(&self, name: &str, args: &[Value]) -> Result<Value, DeffixError> {
        if let Some(op) = self.context.user_operator(name) {
            return self.call_user_operator(op, args);
        }

        let kind = self
            .context
            .operators()
            .kind(name)
            .cloned()
            .or_else(|| resolve_builtin(name));

        match kind.as_ref().and_then(OperatorKind::function) {
            Some(function) => function(args),
            None if kind.is_some() || self.locals.contains_key(name) => {
                Err(DeffixError::new(ErrorKind::NotCallable {
                    found: name.to_string(),
                }))
            }
            None => Err(DeffixError::new(ErrorKind::UndefinedSymbol {
                symbol: name.to_string(),
            })),
        }
    }

    fn call_user_operator(&self, op: &UserOperator, args: &[Value]) -> Result<Value, DeffixError> {
        if op.params.len() != args.len() {
            return Err(DeffixError::new(ErrorKind::ArityMismatch {
                operation: op.name.clone(),
                expected: op.params.len().to_string(),
                actual: args.len(),
            }));
        }
        let locals = op
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect::<HashMap<_, _>>();
        trace!("calling '{}' with {:?}", op.name, args);
        evaluate_expr(&op.body, &self.call_frame(locals))
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Evaluates a canonical prefix expression against the given context.
pub fn evaluate(expr: &Expr, context: &Context) -> Result<Value, DeffixError> {
    evaluate_expr(expr, &EvaluationContext::new(context))
}

pub fn evaluate_expr(expr: &Expr, ctx: &EvaluationContext) -> Result<Value, DeffixError> {
    let limit = ctx.context.config().max_depth;
    if ctx.depth > limit {
        return Err(DeffixError::new(ErrorKind::RecursionLimit { limit }));
    }

    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Nil => Ok(Value::Nil),
        Expr::Symbol(name) => ctx.locals.get(name).cloned().ok_or_else(|| {
            DeffixError::new(ErrorKind::UndefinedSymbol {
                symbol: name.clone(),
            })
        }),
        Expr::List(items, ListKind::Sequence) => Ok(Value::List(evaluate_args(items, ctx)?)),
        Expr::List(items, ListKind::Form) => match items.split_first() {
            None => Ok(Value::Nil),
            Some((head, args)) => evaluate_call(head, args, ctx),
        },
    }
}

fn evaluate_call(head: &Expr, args: &[Expr], ctx: &EvaluationContext) -> Result<Value, DeffixError> {
    let Some(name) = head.as_symbol() else {
        return Err(DeffixError::new(ErrorKind::NotCallable {
            found: head.pretty(),
        }));
    };
    let values = evaluate_args(args, ctx)?;
    ctx.call_operator(name, &values)
}

fn evaluate_args(args: &[Expr], ctx: &EvaluationContext) -> Result<Vec<Value>, DeffixError> {
    args.iter().map(|arg| evaluate_expr(arg, ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(head: &str, args: Vec<Expr>) -> Expr {
        Expr::apply(Expr::symbol(head), args)
    }

    #[test]
    fn evaluates_nested_builtin_calls() {
        let context = Context::new();
        let expr = call("*", vec![call("+", vec![Expr::number(2.0), Expr::number(3.0)]), Expr::number(4.0)]);
        assert_eq!(evaluate(&expr, &context).unwrap(), Value::Number(20.0));
    }

    #[test]
    fn sequences_evaluate_elementwise() {
        let context = Context::new();
        let expr = Expr::sequence(vec![call("-", vec![Expr::number(1.0)]), Expr::string("a")]);
        assert_eq!(
            evaluate(&expr, &context).unwrap(),
            Value::List(vec![Value::Number(-1.0), Value::String("a".into())])
        );
    }

    #[test]
    fn empty_form_is_nil() {
        assert_eq!(evaluate(&Expr::form(vec![]), &Context::new()).unwrap(), Value::Nil);
    }

    #[test]
    fn registered_operator_without_definition_is_not_callable() {
        let mut context = Context::new();
        context.register_operator(["implies"]);
        let err = evaluate(&call("implies", vec![Expr::Bool(true)]), &context).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotCallable { .. }));

        let err = evaluate(&call("nothing", vec![]), &context).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UndefinedSymbol { .. }));
    }

    #[test]
    fn literal_head_is_not_callable() {
        let expr = Expr::form(vec![Expr::number(1.0), Expr::number(2.0)]);
        let err = evaluate(&expr, &Context::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotCallable { found: "1".into() });
    }

    #[test]
    fn user_operator_checks_arity() {
        let mut context = Context::new();
        context
            .define_operator("sq", vec!["n".into()], &call("*", vec![Expr::symbol("n"), Expr::symbol("n")]))
            .unwrap();
        assert_eq!(
            evaluate(&call("sq", vec![Expr::number(7.0)]), &context).unwrap(),
            Value::Number(49.0)
        );
        let err = evaluate(&call("sq", vec![]), &context).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    }

    #[test]
    fn unbounded_recursion_hits_the_limit() {
        let mut context = Context::with_config(crate::EngineConfig { max_depth: 16 });
        context
            .define_operator("loop", vec!["n".into()], &call("loop", vec![Expr::symbol("n")]))
            .unwrap();
        let err = evaluate(&call("loop", vec![Expr::number(1.0)]), &context).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionLimit { limit: 16 });
    }
}
