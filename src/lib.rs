//! Deffix: a mixed-notation expression normalizer.
//!
//! Expressions whose operators appear before, between, or after their
//! operands are rewritten into canonical prefix form, guided by an explicit
//! [`Context`] that holds the operator registry, the precedence table, and the
//! operand environment.
//!
//! ```rust
//! use deffix::{Context, Expr};
//!
//! let mut context = Context::new();
//! context.register_operator(["plus"]);
//! let expr = Expr::form(vec![Expr::number(2.0), Expr::symbol("plus"), Expr::number(3.0)]);
//! let rewritten = context.rewrite(&expr).unwrap();
//! assert_eq!(rewritten.pretty(), "(plus 2 3)");
//! ```

pub use crate::ast::value::Value;
pub use crate::ast::{Expr, ListKind, Span, Spanned};
pub use crate::errors::{DeffixError, ErrorKind, SourceContext};
pub use crate::runtime::context::{Context, EngineConfig};

pub mod ast;
pub mod atoms;
pub mod cli;
pub mod engine;
pub mod errors;
pub mod repl;
pub mod rewrite;
pub mod runtime;
pub mod syntax;
