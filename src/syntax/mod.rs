//! Surface syntax: a pest grammar for mixed-notation s-expressions.

pub mod parser;

pub use parser::{parse, parse_str};

/// Directive symbol produced by the `#>` reader shorthand.
pub const REGISTER_OPERATOR: &str = "register-operator";
/// Directive symbol produced by the `#<` reader shorthand.
pub const SET_PRECEDENCE: &str = "defprecedence";
