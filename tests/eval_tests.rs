//! End-to-end tests of the execution pipeline: directives, rewriting, and
//! evaluation of whole programs.

use deffix::engine::{ExecutionPipeline, NullSink, OutputBuffer};
use deffix::errors::ErrorCategory;
use deffix::{EngineConfig, ErrorKind, Value};

// ---
// Test Setup
// ---

fn run(source: &str) -> String {
    let mut pipeline = ExecutionPipeline::default();
    let mut output = OutputBuffer::new();
    pipeline
        .execute(source, "test.dfx", &mut output)
        .unwrap_or_else(|e| panic!("execution failed: {e}"));
    output.buffer
}

fn run_err(source: &str) -> ErrorKind {
    let mut pipeline = ExecutionPipeline::default();
    pipeline
        .execute(source, "test.dfx", &mut NullSink)
        .expect_err("execution should fail")
        .kind
}

// ---
// Notation
// ---

#[test]
fn arithmetic_in_every_notation() {
    assert_eq!(run("(+ 1 2)\n(1 + 2)\n(1 2 +)"), "3\n3\n3");
}

#[test]
fn precedence_directive_changes_later_forms() {
    assert_eq!(run("(2 + 3 * 4)\n(defprecedence * /)\n(2 + 3 * 4)"), "20\n14");
}

#[test]
fn reader_forms_register_and_reset() {
    let source = "#<[* /]\n(2 + 3 * 4)\n#<[+]\n(2 * 3 + 4)";
    assert_eq!(run(source), "14\n14");
}

#[test]
fn extended_precedence_keeps_earlier_entries() {
    let source = "(defprecedence *)\n(defprecedence+ -)\n(10 - 2 * 3)\n(10 - 4 - 3)";
    assert_eq!(run(source), "4\n3");
}

#[test]
fn deffix_evaluates_bare_items() {
    assert_eq!(run("(deffix 1 + 2 * 3)"), "9");
}

// ---
// Operands and operators
// ---

#[test]
fn operands_are_substituted_before_evaluation() {
    assert_eq!(run("(defoperand x 4 y 6)\n(x * y)"), "24");
}

#[test]
fn operands_are_substituted_verbatim() {
    assert_eq!(run("(defoperand half (/ 10 2))\n(half + 1)"), "6");
}

#[test]
fn defoperand_yields_first_value_without_output() {
    let mut pipeline = ExecutionPipeline::default();
    let mut output = OutputBuffer::new();
    let value = pipeline
        .execute("(defoperand x 1 y 2)", "test.dfx", &mut output)
        .unwrap();
    assert_eq!(value, Value::Nil);
    assert!(output.as_str().is_empty());
    assert!(pipeline.context().operands().contains("y"));
}

#[test]
fn user_operators_work_in_infix_position() {
    let source = "(defoperator avg [a b] (a + b) / 2)\n(3 avg 5)\n(avg 1 2)\n(4 8 avg)";
    assert_eq!(run(source), "4\n1.5\n6");
}

#[test]
fn parameters_shadow_operands() {
    let source = "(defoperand a 100)\n(defoperator double [a] (a * 2))\n(double 4)\n(a double)";
    assert_eq!(run(source), "8\n200");
}

#[test]
fn sequence_constructors() {
    assert_eq!(run("(1 2 3 list)\n(range 4)\n(1 7 2 range)\n(7 divmod 2)"), "[1 2 3]\n[0 1 2 3]\n[1 3 5]\n[3 1]");
}

#[test]
fn sequences_rewrite_their_singleton_element() {
    assert_eq!(run("[(1 + 1)]"), "[2]");
}

#[test]
fn strings_and_comparisons() {
    assert_eq!(run("(\"deff\" + \"ix\")\n(< 1 2 3)\n(3 = 4)"), "deffix\ntrue\nfalse");
}

// ---
// Errors
// ---

#[test]
fn odd_operand_list_fails() {
    assert_eq!(run_err("(defoperand x 1 y)"), ErrorKind::OddArity { count: 3 });
}

#[test]
fn registered_operator_without_definition_is_not_callable() {
    assert_eq!(
        run_err("#>plus\n(1 plus 2)"),
        ErrorKind::NotCallable {
            found: "plus".to_string()
        }
    );
}

#[test]
fn unknown_head_is_undefined() {
    let kind = run_err("(frobnicate 1 2)");
    assert_eq!(kind.category(), ErrorCategory::Runtime);
    assert!(matches!(kind, ErrorKind::UndefinedSymbol { .. }));
}

#[test]
fn division_by_zero() {
    assert_eq!(run_err("(1 / 0)"), ErrorKind::DivisionByZero);
}

#[test]
fn user_operator_arity_is_checked() {
    let kind = run_err("(defoperator inc [n] (n + 1))\n(inc 1 2)");
    assert!(matches!(kind, ErrorKind::ArityMismatch { .. }));
}

#[test]
fn malformed_defoperator_is_rejected() {
    assert!(matches!(run_err("(defoperator 1 [a] a)"), ErrorKind::InvalidDirective { .. }));
    assert!(matches!(run_err("(defoperator f a)"), ErrorKind::InvalidDirective { .. }));
    assert!(matches!(run_err("(defprecedence 1)"), ErrorKind::InvalidDirective { .. }));
}

#[test]
fn unbounded_recursion_hits_the_limit() {
    let mut pipeline = ExecutionPipeline::new(EngineConfig { max_depth: 32 });
    let err = pipeline
        .execute("(defoperator spin [n] (spin n))\n(spin 1)", "test.dfx", &mut NullSink)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit { limit: 32 });
}

#[test]
fn errors_carry_their_source_location() {
    let mut pipeline = ExecutionPipeline::default();
    let err = pipeline
        .execute("(1 + 1)\n(1 / 0)", "test.dfx", &mut NullSink)
        .unwrap_err();
    let rendered = format!("{:?}", miette::Report::new(err));
    assert!(rendered.contains("test.dfx"));
    assert!(rendered.contains("deffix::runtime"));
}

// ---
// Rewrite-only entry points
// ---

#[test]
fn rewrite_source_applies_directives_without_evaluating() {
    let mut pipeline = ExecutionPipeline::default();
    let forms = pipeline
        .rewrite_source("#>plus\n(defoperand x 5)\n(2 plus 3)\n(x)\n(undefined 1)", "test.dfx")
        .unwrap();
    let printed: Vec<String> = forms.iter().map(|f| f.pretty()).collect();
    assert_eq!(printed, vec!["(plus 2 3)", "5", "(undefined 1)"]);
}

#[test]
fn trace_source_records_each_form() {
    let mut pipeline = ExecutionPipeline::default();
    let traces = pipeline
        .trace_source("(defprecedence *)\n(1 + 2 * 3)\n(deffix 4 + 5)", "test.dfx")
        .unwrap();
    assert_eq!(traces.len(), 2);
    let (input, canonical, trace) = &traces[0];
    assert_eq!(input.pretty(), "(1 + 2 * 3)");
    assert_eq!(canonical.pretty(), "(+ 1 (* 2 3))");
    assert_eq!(trace.nest_count(), 2);
    assert_eq!(traces[1].1.pretty(), "(+ 4 5)");
}
