//! User-facing output for the CLI: result sinks, rewrite listings, and
//! colored traces.

use crate::ast::Expr;
use crate::atoms::{builtin_names, resolve_builtin};
use crate::engine::OutputSink;
use crate::rewrite::{RewriteRule, RewriteTrace};
use crate::runtime::context::Context;
use difference::{Changeset, Difference};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

// ============================================================================
// OUTPUT SINKS
// ============================================================================

/// StdoutSink: writes each result to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints the dispatch steps of one rewrite. Consecutive steps are diffed
/// word by word so each list-nest reduction stands out.
pub fn print_trace(input: &Expr, canonical: &Expr, trace: &RewriteTrace) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "=== {} ===", input.pretty());
    let _ = stdout.reset();

    let mut last = String::new();
    for (i, step) in trace.steps.iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "--- Step {}: {} (depth {}) ---", i, step.rule, step.depth);
        let _ = stdout.reset();

        let current = step.input.pretty();
        if last.is_empty() {
            let _ = writeln!(stdout, "{}", current);
        } else {
            let changeset = Changeset::new(&last, &current, " ");
            print_diff(&mut stdout, &changeset.diffs);
        }
        if let RewriteRule::Infix { nested, .. } = &step.rule {
            let _ = writeln!(stdout, "  nest → {}", nested.pretty());
        }
        last = current;
    }

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = writeln!(stdout, "=> {}", canonical.pretty());
    let _ = stdout.reset();
    let _ = writeln!(stdout);
}

/// Prints canonical forms, one per line, or as a JSON array.
pub fn print_rewrites(forms: &[Expr], json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(forms)?);
    } else {
        for form in forms {
            println!("{}", form.pretty());
        }
    }
    Ok(())
}

pub fn print_builtins() {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for name in builtin_names() {
        let Some(kind) = resolve_builtin(name) else {
            continue;
        };
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(stdout, "{:<8}", name);
        let _ = stdout.reset();
        let _ = writeln!(stdout, "{}", kind);
    }
}

/// Prints the registries of a context for the REPL's `:context` command.
pub fn print_context(context: &Context) {
    let operators: Vec<&str> = context.operators().symbols().map(String::as_str).collect();
    println!("operators:  {}", join_or_none(&operators));
    println!("precedence: {}", join_or_none(&context.precedence().as_sequence()));
    let operands = context.operands().sorted();
    if operands.is_empty() {
        println!("operands:   (none)");
    }
    for (name, value) in operands {
        println!("operand:    {} = {}", name, value.pretty());
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(" ")
    }
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                let _ = stdout.reset();
                let _ = write!(stdout, "{} ", x);
            }
            Difference::Add(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = write!(stdout, "{} ", x);
            }
            Difference::Rem(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = write!(stdout, "{} ", x);
            }
        }
    }
    let _ = stdout.reset();
    let _ = writeln!(stdout);
}
