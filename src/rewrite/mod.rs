//! The rewrite engine: normalizes mixed prefix, infix, and postfix notation
//! into canonical prefix form.
//!
//! ## Dispatch
//!
//! Each expression is matched against five cases, in order:
//!
//! 1. **Scalar**: operands are replaced by their bound value, anything else
//!    is returned as is.
//! 2. **Singleton**: `(x)` unwraps to the rewrite of `x`; `[x]` stays a
//!    one-element sequence.
//! 3. **Postfix**: the last element is an operator: `(a b op)` → `(op a b)`.
//! 4. **Infix**: the second element is an operator and neither end is. One
//!    list-nest reduction is applied around the operator chosen by the
//!    precedence table (or the second element when no entry matches), then
//!    the shorter list is dispatched again.
//! 5. **Prefix**: the first element is an operator: `(op a b)`.
//!
//! Anything else passes through untouched.
//!
//! Each infix step shortens the list by two elements, so a flat chain always
//! reaches a non-infix shape. Forms built by list-nest are dispatched at the
//! depth of the list they came from, so only nesting present in the input
//! counts towards `max_depth`.

use crate::ast::{Expr, ListKind};
use crate::errors::{DeffixError, ErrorKind};
use crate::runtime::context::Context;
use classify::is_operator;
use log::{debug, trace};
use serde::Serialize;
use std::fmt;

pub mod classify;
pub mod nest;

// ============================================================================
// TRACE
// ============================================================================

/// Which dispatch case fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RewriteRule {
    Substitute,
    Singleton,
    Postfix,
    Infix { index: usize, nested: Expr },
    Prefix,
    Passthrough,
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteRule::Substitute => write!(f, "substitute"),
            RewriteRule::Singleton => write!(f, "singleton"),
            RewriteRule::Postfix => write!(f, "postfix"),
            RewriteRule::Infix { index, .. } => write!(f, "infix @{}", index),
            RewriteRule::Prefix => write!(f, "prefix"),
            RewriteRule::Passthrough => write!(f, "passthrough"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteStep {
    pub depth: usize,
    pub rule: RewriteRule,
    pub input: Expr,
}

/// Ordered record of every dispatch step of one rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RewriteTrace {
    pub steps: Vec<RewriteStep>,
}

impl RewriteTrace {
    /// Number of list-nest reductions performed.
    pub fn nest_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.rule, RewriteRule::Infix { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ============================================================================
// REWRITER
// ============================================================================

/// A list element during dispatch: either taken from the input or built by
/// a list-nest reduction.
#[derive(Debug, Clone)]
enum Node {
    Input(Expr),
    Nested(Vec<Node>),
}

impl Node {
    fn as_symbol(&self) -> Option<&str> {
        match self {
            Node::Input(expr) => expr.as_symbol(),
            Node::Nested(_) => None,
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Node::Input(expr) => expr.clone(),
            Node::Nested(items) => Expr::form(items.iter().map(Node::to_expr).collect()),
        }
    }

    fn into_expr(self) -> Expr {
        match self {
            Node::Input(expr) => expr,
            Node::Nested(items) => Expr::form(items.into_iter().map(Node::into_expr).collect()),
        }
    }

    fn list(items: &[Node], kind: ListKind) -> Expr {
        Expr::List(items.iter().map(Node::to_expr).collect(), kind)
    }
}

pub struct Rewriter<'c> {
    context: &'c Context,
    trace: Option<RewriteTrace>,
}

impl<'c> Rewriter<'c> {
    pub fn new(context: &'c Context) -> Self {
        Self {
            context,
            trace: None,
        }
    }

    pub fn with_trace(mut self) -> Self {
        self.trace = Some(RewriteTrace::default());
        self
    }

    pub fn into_trace(self) -> RewriteTrace {
        self.trace.unwrap_or_default()
    }

    pub fn rewrite(&mut self, expr: &Expr) -> Result<Expr, DeffixError> {
        self.dispatch(expr, 0)
    }

    fn dispatch(&mut self, expr: &Expr, depth: usize) -> Result<Expr, DeffixError> {
        let limit = self.context.config().max_depth;
        if depth > limit {
            return Err(DeffixError::new(ErrorKind::RecursionLimit { limit }));
        }

        // Case 1
        match expr {
            Expr::List(items, kind) => {
                let nodes = items.iter().cloned().map(Node::Input).collect();
                self.dispatch_list(nodes, *kind, depth)
            }
            _ => Ok(self.rewrite_scalar(expr, depth)),
        }
    }

    fn dispatch_node(&mut self, node: Node, depth: usize) -> Result<Expr, DeffixError> {
        match node {
            Node::Input(expr) => self.dispatch(&expr, depth + 1),
            Node::Nested(items) => self.dispatch_list(items, ListKind::Form, depth),
        }
    }

    fn dispatch_nodes(&mut self, items: Vec<Node>, depth: usize) -> Result<Vec<Expr>, DeffixError> {
        items
            .into_iter()
            .map(|item| self.dispatch_node(item, depth))
            .collect()
    }

    // Case 4 loops instead of recursing: each reduction is dispatched again
    // at the same depth.
    fn dispatch_list(
        &mut self,
        mut items: Vec<Node>,
        kind: ListKind,
        depth: usize,
    ) -> Result<Expr, DeffixError> {
        loop {
            let len = items.len();

            // Case 2
            if len == 1 {
                self.record_list(depth, RewriteRule::Singleton, &items, kind);
                let inner = self.dispatch_node(items.remove(0), depth)?;
                return Ok(match kind {
                    ListKind::Sequence => Expr::sequence(vec![inner]),
                    ListKind::Form => inner,
                });
            }

            if len == 0 {
                self.record_list(depth, RewriteRule::Passthrough, &items, kind);
                return Ok(Expr::List(Vec::new(), kind));
            }

            let first_op = self.is_operator(&items[0]);
            let second_op = self.is_operator(&items[1]);
            let last_op = self.is_operator(&items[len - 1]);

            // Case 3
            if last_op {
                self.record_list(depth, RewriteRule::Postfix, &items, kind);
                let operator = items.remove(len - 1).into_expr();
                let args = self.dispatch_nodes(items, depth)?;
                return Ok(Expr::apply(operator, args));
            }

            // Case 4
            if second_op && !first_op {
                let index = self.split_index(&items);
                let nested = nest::nest_with(&items, index, Node::Nested)?;
                debug!(
                    "list-nest at {}: {} => {}",
                    index,
                    Node::list(&items, kind),
                    Node::list(&nested, kind)
                );
                if self.tracing() {
                    let rule = RewriteRule::Infix {
                        index,
                        nested: Node::list(&nested, kind),
                    };
                    self.record_list(depth, rule, &items, kind);
                }
                items = nested;
                continue;
            }

            // Case 5
            if first_op {
                self.record_list(depth, RewriteRule::Prefix, &items, kind);
                let operator = items.remove(0).into_expr();
                let args = self.dispatch_nodes(items, depth)?;
                return Ok(Expr::apply(operator, args));
            }

            self.record_list(depth, RewriteRule::Passthrough, &items, kind);
            let items = items.into_iter().map(Node::into_expr).collect();
            return Ok(Expr::List(items, kind));
        }
    }

    fn rewrite_scalar(&mut self, expr: &Expr, depth: usize) -> Expr {
        let bound = expr
            .as_symbol()
            .and_then(|symbol| self.context.operands().lookup(symbol));
        match bound {
            Some(value) => {
                self.record(depth, RewriteRule::Substitute, expr);
                value.clone()
            }
            None => expr.clone(),
        }
    }

    fn is_operator(&self, node: &Node) -> bool {
        matches!(node, Node::Input(expr) if is_operator(expr, self.context))
    }

    /// The first precedence entry present in the list decides where to nest;
    /// with no match the second element is used, giving left-to-right binding.
    fn split_index(&self, items: &[Node]) -> usize {
        self.context
            .precedence()
            .iter()
            .find_map(|entry| {
                items
                    .iter()
                    .position(|item| item.as_symbol() == Some(entry.as_str()))
            })
            .unwrap_or(1)
    }

    fn tracing(&self) -> bool {
        self.trace.is_some() || log::log_enabled!(log::Level::Trace)
    }

    fn record_list(&mut self, depth: usize, rule: RewriteRule, items: &[Node], kind: ListKind) {
        if self.tracing() {
            self.record(depth, rule, &Node::list(items, kind));
        }
    }

    fn record(&mut self, depth: usize, rule: RewriteRule, input: &Expr) {
        trace!("{:width$}{} {}", "", rule, input, width = depth * 2);
        if let Some(trace) = self.trace.as_mut() {
            trace.steps.push(RewriteStep {
                depth,
                rule,
                input: input.clone(),
            });
        }
    }
}
