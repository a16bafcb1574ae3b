//! Runtime state and evaluation.
//!
//! - **`registry`**: operator registry, precedence table, operand environment
//! - **`context`**: the configuration object threaded through every call
//! - **`eval`**: evaluation of canonical prefix expressions to values

pub mod context;
pub mod eval;
pub mod registry;
