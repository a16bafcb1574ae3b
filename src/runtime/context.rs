//! The configuration context threaded through every registration and rewrite
//! call. It replaces process-wide mutable state: each pipeline, REPL session,
//! or test owns its own `Context`.

use crate::ast::Expr;
use crate::atoms::OperatorKind;
use crate::errors::DeffixError;
use crate::rewrite::{RewriteTrace, Rewriter};
use crate::runtime::registry::{OperandEnvironment, OperatorRegistry, PrecedenceTable};
use im::HashMap;
use log::debug;
use std::sync::Arc;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tunables shared by the rewrite engine and the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum recursion depth before `RecursionLimit` is raised.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A callable defined with [`Context::define_operator`]. The body is stored in
/// canonical prefix form.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOperator {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    config: EngineConfig,
    operators: OperatorRegistry,
    precedence: PrecedenceTable,
    operands: OperandEnvironment,
    functions: HashMap<String, Arc<UserOperator>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Drops every registration, keeping the engine configuration.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    // ------------------------------------------------------------------------
    // Registration API
    // ------------------------------------------------------------------------

    pub fn register_operator<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators.register(symbols);
    }

    pub fn set_precedence<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precedence.set(symbols);
    }

    pub fn extend_precedence<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precedence.extend(symbols);
    }

    /// Binds alternating name/value pairs; fails with `OddArity` on an odd
    /// count. Returns the value of the first pair.
    pub fn define_operands(&mut self, pairs: &[Expr]) -> Result<Expr, DeffixError> {
        self.operands.define(pairs)
    }

    /// Defines a callable under `name` and registers it as an operator.
    ///
    /// The body may use mixed notation. It is normalized once, here, with the
    /// parameters shadowing operands of the same name and `name` itself
    /// already registered so recursive uses are recognized.
    pub fn define_operator(
        &mut self,
        name: impl Into<String>,
        params: Vec<String>,
        body: &Expr,
    ) -> Result<(), DeffixError> {
        let name = name.into();
        let kind = OperatorKind::User(name.clone());

        let mut scope = self.clone();
        for param in &params {
            scope.operands.remove(param);
        }
        scope.operators.define(&name, kind.clone());
        let body = scope.rewrite(body)?;

        debug!("defined operator '{}' ({}) as {}", name, params.join(" "), body);
        self.operators.define(&name, kind);
        self.functions
            .insert(name.clone(), Arc::new(UserOperator { name, params, body }));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Rewriting
    // ------------------------------------------------------------------------

    /// Normalizes a mixed-notation expression into canonical prefix form.
    pub fn rewrite(&self, expr: &Expr) -> Result<Expr, DeffixError> {
        Rewriter::new(self).rewrite(expr)
    }

    /// Like [`Context::rewrite`], also returning every dispatch step taken.
    pub fn rewrite_traced(&self, expr: &Expr) -> Result<(Expr, RewriteTrace), DeffixError> {
        let mut rewriter = Rewriter::new(self).with_trace();
        let result = rewriter.rewrite(expr)?;
        Ok((result, rewriter.into_trace()))
    }

    // ------------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn precedence(&self) -> &PrecedenceTable {
        &self.precedence
    }

    pub fn operands(&self) -> &OperandEnvironment {
        &self.operands
    }

    pub fn user_operator(&self, name: &str) -> Option<&Arc<UserOperator>> {
        self.functions.get(name)
    }
}
