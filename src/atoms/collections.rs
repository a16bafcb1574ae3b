//! # Sequence Constructors
//!
//! `list` and `tuple` collect their arguments; `range` builds an integral
//! sequence from `stop`, `start stop`, or `start stop step`.

use crate::ast::value::Value;
use crate::atoms::math::arity_error;
use crate::atoms::PureAtomFn;
use crate::errors::{DeffixError, ErrorKind};

/// Collects the arguments into a list.
///
/// Example:
///   (list 1 2 3) ; => [1 2 3]
pub const ATOM_LIST: PureAtomFn = |args| Ok(Value::List(args.to_vec()));

/// Builds a range of integers, excluding `stop`.
///
/// Example:
///   (range 1 7 2) ; => [1 3 5]
pub const ATOM_RANGE: PureAtomFn = |args| {
    let bounds = args
        .iter()
        .map(extract_integer)
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arity_error("range", "1 to 3", args.len())),
    };
    if step == 0 {
        return Err(DeffixError::new(ErrorKind::TypeMismatch {
            operation: "range".into(),
            expected: "non-zero step".into(),
            actual: "0".into(),
        }));
    }

    let span = if step > 0 { stop.saturating_sub(start) } else { start.saturating_sub(stop) };
    let count = span.max(0).unsigned_abs().div_ceil(step.unsigned_abs());
    if count > MAX_RANGE_LEN as u64 {
        return Err(DeffixError::new(ErrorKind::TypeMismatch {
            operation: "range".into(),
            expected: format!("at most {} elements", MAX_RANGE_LEN),
            actual: count.to_string(),
        }));
    }

    let mut items = Vec::with_capacity(count as usize);
    let mut current = Some(start);
    while let Some(n) = current.filter(|n| (step > 0 && *n < stop) || (step < 0 && *n > stop)) {
        items.push(Value::Number(n as f64));
        current = n.checked_add(step);
    }
    Ok(Value::List(items))
};

/// Largest sequence `range` will build.
pub const MAX_RANGE_LEN: usize = 1 << 24;

/// Bounds must be integers exactly representable as `f64`.
const MAX_BOUND: f64 = 9_007_199_254_740_992.0;

fn extract_integer(value: &Value) -> Result<i64, DeffixError> {
    match value {
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_BOUND => Ok(*n as i64),
        other => Err(DeffixError::new(ErrorKind::TypeMismatch {
            operation: "range".into(),
            expected: "integer Number within ±2^53".into(),
            actual: other.to_string(),
        })),
    }
}
