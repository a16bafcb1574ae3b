//! # Mathematical Operations
//!
//! Built-in arithmetic and comparison operators. All of them are pure
//! functions over already-evaluated arguments.
//!
//! - **Arithmetic**: `+`, `-`, `*`, `/`, `%`
//! - **Comparison**: `=`, `!=`, `<`, `>`, `<=`, `>=` (chained)
//! - **Math Functions**: `abs`, `min`, `max`, `pow`, `divmod`

use crate::ast::value::Value;
use crate::atoms::PureAtomFn;
use crate::errors::{DeffixError, ErrorKind};
use std::cmp::Ordering;

// ============================================================================
// HELPERS
// ============================================================================

fn extract_number(value: &Value, atom_name: &str) -> Result<f64, DeffixError> {
    value
        .as_number()
        .ok_or_else(|| type_error(atom_name, "Number", value))
}

fn type_error(atom_name: &str, expected: &str, found: &Value) -> DeffixError {
    DeffixError::new(ErrorKind::TypeMismatch {
        operation: atom_name.to_string(),
        expected: expected.to_string(),
        actual: found.type_name().to_string(),
    })
}

pub(crate) fn arity_error(atom_name: &str, expected: &str, actual: usize) -> DeffixError {
    DeffixError::new(ErrorKind::ArityMismatch {
        operation: atom_name.to_string(),
        expected: expected.to_string(),
        actual,
    })
}

fn expect_exact<'a>(args: &'a [Value], n: usize, atom_name: &str) -> Result<&'a [Value], DeffixError> {
    if args.len() != n {
        return Err(arity_error(atom_name, &n.to_string(), args.len()));
    }
    Ok(args)
}

/// Floored modulo, matching the sign of the divisor.
fn floored_mod(a: f64, b: f64) -> Result<f64, DeffixError> {
    if b == 0.0 {
        return Err(DeffixError::new(ErrorKind::DivisionByZero));
    }
    Ok(a - b * (a / b).floor())
}

fn fold_numbers(args: &[Value], atom_name: &str, init: f64, f: fn(f64, f64) -> f64) -> Result<Value, DeffixError> {
    let mut acc = init;
    for arg in args {
        acc = f(acc, extract_number(arg, atom_name)?);
    }
    Ok(Value::Number(acc))
}

fn compare(a: &Value, b: &Value, atom_name: &str) -> Result<Ordering, DeffixError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| type_error(atom_name, "comparable Number", a)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Number(_), other) | (Value::String(_), other) => {
            Err(type_error(atom_name, a.type_name(), other))
        }
        (other, _) => Err(type_error(atom_name, "Number or String", other)),
    }
}

/// Applies `accept` to every adjacent pair, as in `(< 1 2 3)`.
fn compare_chain(args: &[Value], atom_name: &str, accept: fn(Ordering) -> bool) -> Result<Value, DeffixError> {
    if args.is_empty() {
        return Err(arity_error(atom_name, "at least 1", 0));
    }
    for pair in args.windows(2) {
        if !accept(compare(&pair[0], &pair[1], atom_name)?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// `min`/`max` accept either several numbers or a single list of numbers.
fn extremum(args: &[Value], atom_name: &str, pick: Ordering) -> Result<Value, DeffixError> {
    let items = match args {
        [Value::List(items)] => items.as_slice(),
        _ => args,
    };
    let Some((first, rest)) = items.split_first() else {
        return Err(arity_error(atom_name, "at least 1", 0));
    };
    let mut best = extract_number(first, atom_name)?;
    for item in rest {
        let n = extract_number(item, atom_name)?;
        if n.partial_cmp(&best) == Some(pick) {
            best = n;
        }
    }
    Ok(Value::Number(best))
}

// ============================================================================
// ARITHMETIC OPERATIONS
// ============================================================================

/// Adds numbers, or concatenates strings.
///
/// Usage: (+ <a> <b> ...)
///
/// Example:
///   (+ 1 2 3) ; => 6
///   (+ "a" "b") ; => "ab"
pub const ATOM_ADD: PureAtomFn = |args| {
    if let Some(Value::String(_)) = args.first() {
        let mut out = String::new();
        for arg in args {
            match arg {
                Value::String(s) => out.push_str(s),
                other => return Err(type_error("+", "String", other)),
            }
        }
        return Ok(Value::String(out));
    }
    fold_numbers(args, "+", 0.0, |a, b| a + b)
};

/// Subtracts; with one argument, negates.
///
/// Example:
///   (- 5 2) ; => 3
///   (- 5) ; => -5
pub const ATOM_SUB: PureAtomFn = |args| {
    let Some((first, rest)) = args.split_first() else {
        return Err(arity_error("-", "at least 1", 0));
    };
    let first = extract_number(first, "-")?;
    if rest.is_empty() {
        return Ok(Value::Number(-first));
    }
    fold_numbers(rest, "-", first, |a, b| a - b)
};

/// Multiplies numbers.
///
/// Example:
///   (* 2 3 4) ; => 24
pub const ATOM_MUL: PureAtomFn = |args| fold_numbers(args, "*", 1.0, |a, b| a * b);

/// Divides left to right; with one argument, returns the reciprocal.
///
/// Example:
///   (/ 12 2 3) ; => 2
pub const ATOM_DIV: PureAtomFn = |args| {
    let Some((first, rest)) = args.split_first() else {
        return Err(arity_error("/", "at least 1", 0));
    };
    let (mut acc, divisors) = if rest.is_empty() {
        (1.0, args)
    } else {
        (extract_number(first, "/")?, rest)
    };
    for divisor in divisors {
        let d = extract_number(divisor, "/")?;
        if d == 0.0 {
            return Err(DeffixError::new(ErrorKind::DivisionByZero));
        }
        acc /= d;
    }
    Ok(Value::Number(acc))
};

/// Floored modulo of two numbers.
///
/// Example:
///   (% -7 3) ; => 2
pub const ATOM_MOD: PureAtomFn = |args| {
    let args = expect_exact(args, 2, "%")?;
    let a = extract_number(&args[0], "%")?;
    let b = extract_number(&args[1], "%")?;
    Ok(Value::Number(floored_mod(a, b)?))
};

// ============================================================================
// COMPARISON OPERATIONS
// ============================================================================

pub const ATOM_EQ: PureAtomFn = |args| {
    if args.is_empty() {
        return Err(arity_error("=", "at least 1", 0));
    }
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
};

pub const ATOM_NE: PureAtomFn = |args| {
    if args.is_empty() {
        return Err(arity_error("!=", "at least 1", 0));
    }
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] != pair[1])))
};

pub const ATOM_LT: PureAtomFn = |args| compare_chain(args, "<", |o| o == Ordering::Less);

pub const ATOM_GT: PureAtomFn = |args| compare_chain(args, ">", |o| o == Ordering::Greater);

pub const ATOM_LE: PureAtomFn = |args| compare_chain(args, "<=", |o| o != Ordering::Greater);

pub const ATOM_GE: PureAtomFn = |args| compare_chain(args, ">=", |o| o != Ordering::Less);

// ============================================================================
// MATH FUNCTIONS
// ============================================================================

pub const ATOM_ABS: PureAtomFn = |args| {
    let args = expect_exact(args, 1, "abs")?;
    Ok(Value::Number(extract_number(&args[0], "abs")?.abs()))
};

pub const ATOM_MIN: PureAtomFn = |args| extremum(args, "min", Ordering::Less);

pub const ATOM_MAX: PureAtomFn = |args| extremum(args, "max", Ordering::Greater);

/// Raises a number to a power.
///
/// Example:
///   (pow 2 10) ; => 1024
pub const ATOM_POW: PureAtomFn = |args| {
    let args = expect_exact(args, 2, "pow")?;
    let base = extract_number(&args[0], "pow")?;
    let exp = extract_number(&args[1], "pow")?;
    Ok(Value::Number(base.powf(exp)))
};

/// Floored quotient and remainder.
///
/// Example:
///   (divmod 7 2) ; => [3 1]
pub const ATOM_DIVMOD: PureAtomFn = |args| {
    let args = expect_exact(args, 2, "divmod")?;
    let a = extract_number(&args[0], "divmod")?;
    let b = extract_number(&args[1], "divmod")?;
    let remainder = floored_mod(a, b)?;
    Ok(Value::List(vec![
        Value::Number((a / b).floor()),
        Value::Number(remainder),
    ]))
};

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(ns: &[f64]) -> Vec<Value> {
        ns.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn subtraction_negates_a_single_argument() {
        assert_eq!(ATOM_SUB(&nums(&[5.0])).unwrap(), Value::Number(-5.0));
        assert_eq!(ATOM_SUB(&nums(&[10.0, 3.0, 2.0])).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let err = ATOM_DIV(&nums(&[1.0, 0.0])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        let err = ATOM_MOD(&nums(&[1.0, 0.0])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn modulo_follows_the_divisor_sign() {
        assert_eq!(ATOM_MOD(&nums(&[-7.0, 3.0])).unwrap(), Value::Number(2.0));
        assert_eq!(
            ATOM_DIVMOD(&nums(&[7.0, 2.0])).unwrap(),
            Value::List(nums(&[3.0, 1.0]))
        );
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(ATOM_LT(&nums(&[1.0, 2.0, 3.0])).unwrap(), Value::Bool(true));
        assert_eq!(ATOM_LT(&nums(&[1.0, 3.0, 2.0])).unwrap(), Value::Bool(false));
        assert_eq!(ATOM_GE(&nums(&[3.0, 3.0, 1.0])).unwrap(), Value::Bool(true));
    }

    #[test]
    fn mixed_type_comparison_is_a_type_error() {
        let args = vec![Value::Number(1.0), Value::String("a".into())];
        let err = ATOM_LT(&args).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn strings_concatenate() {
        let args = vec![Value::String("ab".into()), Value::String("cd".into())];
        assert_eq!(ATOM_ADD(&args).unwrap(), Value::String("abcd".into()));
    }

    #[test]
    fn extremum_accepts_a_single_list() {
        let args = vec![Value::List(nums(&[4.0, 9.0, 1.0]))];
        assert_eq!(ATOM_MAX(&args).unwrap(), Value::Number(9.0));
        assert_eq!(ATOM_MIN(&nums(&[4.0, 9.0, 1.0])).unwrap(), Value::Number(1.0));
    }
}
