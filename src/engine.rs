//! Execution pipeline: parse → directives → rewrite → evaluate.
//!
//! A program is a sequence of top-level forms. Forms headed by a directive
//! symbol change the [`Context`] and are never rewritten; every other form is
//! normalized by the rewrite engine and then evaluated.
//!
//! | Directive | Effect |
//! |---|---|
//! | `(register-operator a b ...)`, `#>a`, `#>[a b]` | register operators |
//! | `(defprecedence a b ...)`, `#<[a b]` | reset the precedence table |
//! | `(defprecedence+ a b ...)` | extend the precedence table |
//! | `(defoperand x 1 y 2 ...)` | bind operands |
//! | `(defoperator name [params] body...)` | define and register an operator |
//! | `(deffix items...)` | evaluate `items` as one mixed-notation form |

use crate::ast::value::Value;
use crate::ast::{Expr, ListKind};
use crate::errors::{DeffixError, ErrorKind, SourceContext};
use crate::rewrite::RewriteTrace;
use crate::runtime::context::{Context, EngineConfig};
use crate::runtime::eval::evaluate;
use crate::syntax::{self, REGISTER_OPERATOR, SET_PRECEDENCE};
use log::{debug, info};

// ============================================================================
// OUTPUT
// ============================================================================

/// Receives the printed result of every evaluated form.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// A null output sink for running without output.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}

/// Collects output lines into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }
}

// ============================================================================
// DIRECTIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    RegisterOperator,
    SetPrecedence,
    ExtendPrecedence,
    DefineOperands,
    DefineOperator,
    Deffix,
}

impl Directive {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            REGISTER_OPERATOR => Some(Directive::RegisterOperator),
            SET_PRECEDENCE => Some(Directive::SetPrecedence),
            "defprecedence+" => Some(Directive::ExtendPrecedence),
            "defoperand" => Some(Directive::DefineOperands),
            "defoperator" => Some(Directive::DefineOperator),
            "deffix" => Some(Directive::Deffix),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Directive::RegisterOperator => REGISTER_OPERATOR,
            Directive::SetPrecedence => SET_PRECEDENCE,
            Directive::ExtendPrecedence => "defprecedence+",
            Directive::DefineOperands => "defoperand",
            Directive::DefineOperator => "defoperator",
            Directive::Deffix => "deffix",
        }
    }

    pub const fn usage(&self) -> &'static str {
        match self {
            Directive::RegisterOperator => "(register-operator a b ...) or #>[a b]",
            Directive::SetPrecedence => "(defprecedence a b ...) or #<[a b]",
            Directive::ExtendPrecedence => "(defprecedence+ a b ...)",
            Directive::DefineOperands => "(defoperand x 1 y 2 ...)",
            Directive::DefineOperator => "(defoperator name [params] body...)",
            Directive::Deffix => "(deffix items...)",
        }
    }

    fn of(expr: &Expr) -> Option<(Self, &[Expr])> {
        let (items, ListKind::Form) = expr.as_list()? else {
            return None;
        };
        let (head, args) = items.split_first()?;
        Directive::from_symbol(head.as_symbol()?).map(|directive| (directive, args))
    }
}

fn invalid_directive(directive: Directive, reason: impl Into<String>) -> DeffixError {
    DeffixError::new(ErrorKind::InvalidDirective {
        directive: directive.name().to_string(),
        reason: reason.into(),
    })
    .with_help(format!("usage: {}", directive.usage()))
}

/// Collects symbol arguments, flattening sequences so that both
/// `(defprecedence * +)` and `(defprecedence [* +])` work.
fn symbol_args(directive: Directive, args: &[Expr]) -> Result<Vec<String>, DeffixError> {
    let mut symbols = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Expr::Symbol(name) => symbols.push(name.clone()),
            Expr::List(items, ListKind::Sequence) => symbols.extend(symbol_args(directive, items)?),
            other => {
                return Err(invalid_directive(
                    directive,
                    format!("expected symbols, found {}", other.pretty()),
                ))
            }
        }
    }
    Ok(symbols)
}

/// Wraps several body expressions into one mixed-notation form.
fn single_form(exprs: &[Expr]) -> Expr {
    match exprs {
        [single] => single.clone(),
        many => Expr::form(many.to_vec()),
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// What happened to one top-level form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// A directive changed the context; `defoperand` reports its value.
    Directive(Directive, Option<Expr>),
    /// A form was rewritten into canonical prefix form.
    Rewritten(Expr),
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionPipeline {
    context: Context,
}

impl ExecutionPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            context: Context::with_config(config),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Runs a program, emitting the value of every evaluated form. Returns
    /// the value of the last evaluated form, or `Nil`.
    pub fn execute(
        &mut self,
        source_text: &str,
        source_name: &str,
        output: &mut dyn OutputSink,
    ) -> Result<Value, DeffixError> {
        let mut last = Value::Nil;
        self.process(source_text, source_name, |context, outcome| {
            if let FormOutcome::Rewritten(canonical) = outcome {
                let value = evaluate(canonical, context)?;
                output.emit(&value.to_string());
                last = value;
            }
            Ok(())
        })?;
        Ok(last)
    }

    /// Applies directives and returns the canonical form of every other
    /// top-level form, without evaluating anything.
    pub fn rewrite_source(&mut self, source_text: &str, source_name: &str) -> Result<Vec<Expr>, DeffixError> {
        let mut forms = Vec::new();
        self.process(source_text, source_name, |_, outcome| {
            if let FormOutcome::Rewritten(canonical) = outcome {
                forms.push(canonical.clone());
            }
            Ok(())
        })?;
        Ok(forms)
    }

    /// Like [`ExecutionPipeline::rewrite_source`], pairing each input form
    /// with the trace of its rewrite.
    pub fn trace_source(
        &mut self,
        source_text: &str,
        source_name: &str,
    ) -> Result<Vec<(Expr, Expr, RewriteTrace)>, DeffixError> {
        let source = SourceContext::from_file(source_name, source_text);
        let mut traces = Vec::new();
        for form in syntax::parse(source_text, &source)? {
            let traced = match Directive::of(&form.value) {
                Some((Directive::Deffix, args)) if !args.is_empty() => {
                    self.context.rewrite_traced(&Expr::form(args.to_vec()))
                }
                Some(_) => match self.apply_directive(&form.value) {
                    Ok(_) => continue,
                    Err(e) => Err(e),
                },
                None => self.context.rewrite_traced(&form.value),
            };
            let (canonical, trace) = traced.map_err(|e| e.with_source(&source, form.span))?;
            traces.push((form.value, canonical, trace));
        }
        Ok(traces)
    }

    /// Handles a single already-parsed form.
    pub fn run_form(&mut self, expr: &Expr) -> Result<FormOutcome, DeffixError> {
        if let Some(outcome) = self.apply_directive(expr)? {
            return Ok(outcome);
        }
        Ok(FormOutcome::Rewritten(self.context.rewrite(expr)?))
    }

    fn process<F>(&mut self, source_text: &str, source_name: &str, mut on_form: F) -> Result<(), DeffixError>
    where
        F: FnMut(&Context, &FormOutcome) -> Result<(), DeffixError>,
    {
        let source = SourceContext::from_file(source_name, source_text);
        let forms = syntax::parse(source_text, &source)?;
        info!("running {} top-level forms from {}", forms.len(), source_name);

        for form in forms {
            let result = self
                .run_form(&form.value)
                .and_then(|outcome| on_form(&self.context, &outcome));
            result.map_err(|e| e.with_source(&source, form.span))?;
        }
        Ok(())
    }

    /// Returns `Some` when `expr` was a directive. `deffix` forms are
    /// rewritten here since their payload is not a directive itself.
    fn apply_directive(&mut self, expr: &Expr) -> Result<Option<FormOutcome>, DeffixError> {
        let Some((directive, args)) = Directive::of(expr) else {
            return Ok(None);
        };
        debug!("directive {} with {} arguments", directive.name(), args.len());

        let reported = match directive {
            Directive::RegisterOperator => {
                self.context.register_operator(symbol_args(directive, args)?);
                None
            }
            Directive::SetPrecedence => {
                self.context.set_precedence(symbol_args(directive, args)?);
                None
            }
            Directive::ExtendPrecedence => {
                self.context.extend_precedence(symbol_args(directive, args)?);
                None
            }
            Directive::DefineOperands => Some(self.context.define_operands(args)?),
            Directive::DefineOperator => {
                self.define_operator(args)?;
                None
            }
            Directive::Deffix => {
                if args.is_empty() {
                    return Err(invalid_directive(directive, "expected an expression"));
                }
                let canonical = self.context.rewrite(&Expr::form(args.to_vec()))?;
                return Ok(Some(FormOutcome::Rewritten(canonical)));
            }
        };
        Ok(Some(FormOutcome::Directive(directive, reported)))
    }

    fn define_operator(&mut self, args: &[Expr]) -> Result<(), DeffixError> {
        let directive = Directive::DefineOperator;
        let [name, params, body @ ..] = args else {
            return Err(invalid_directive(directive, "expected a name, a parameter list, and a body"));
        };
        let Some(name) = name.as_symbol() else {
            return Err(invalid_directive(directive, format!("name must be a symbol, found {}", name.pretty())));
        };
        let Some((params, _)) = params.as_list() else {
            return Err(invalid_directive(directive, "parameters must be a list like [a b]"));
        };
        if body.is_empty() {
            return Err(invalid_directive(directive, "missing body"));
        }
        let params = symbol_args(directive, params)?;
        self.context.define_operator(name, params, &single_form(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_are_recognized_only_at_the_head_of_a_form() {
        let form = Expr::form(vec![Expr::symbol("defoperand"), Expr::symbol("x"), Expr::number(1.0)]);
        assert_eq!(Directive::of(&form).map(|(d, _)| d), Some(Directive::DefineOperands));
        let sequence = Expr::sequence(vec![Expr::symbol("defoperand")]);
        assert!(Directive::of(&sequence).is_none());
        assert!(Directive::of(&Expr::symbol("deffix")).is_none());
    }

    #[test]
    fn symbol_args_flatten_sequences() {
        let args = vec![
            Expr::symbol("*"),
            Expr::sequence(vec![Expr::symbol("/"), Expr::symbol("+")]),
        ];
        let symbols = symbol_args(Directive::SetPrecedence, &args).unwrap();
        assert_eq!(symbols, vec!["*", "/", "+"]);

        let err = symbol_args(Directive::SetPrecedence, &[Expr::number(1.0)]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidDirective { .. }));
    }

    #[test]
    fn invalid_directives_suggest_their_usage() {
        let mut pipeline = ExecutionPipeline::default();
        let err = pipeline
            .execute("(defoperator twice)", "test.dfx", &mut NullSink)
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidDirective { .. }));
        assert_eq!(
            err.diagnostic_info.help.as_deref(),
            Some("usage: (defoperator name [params] body...)")
        );
    }

    #[test]
    fn defoperand_reports_the_first_value() {
        let mut pipeline = ExecutionPipeline::default();
        let form = syntax::parse_str("(defoperand x 1 y 2)").unwrap().remove(0);
        let outcome = pipeline.run_form(&form).unwrap();
        assert_eq!(
            outcome,
            FormOutcome::Directive(Directive::DefineOperands, Some(Expr::number(1.0)))
        );
    }

    #[test]
    fn errors_point_at_the_failing_form() {
        let mut pipeline = ExecutionPipeline::default();
        let err = pipeline
            .execute("(1 + 2)\n(defoperand x)", "test.dfx", &mut NullSink)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OddArity { count: 1 });
        let info = err.source_info.expect("located");
        assert_eq!(info.primary_span.offset(), 8);
    }
}
