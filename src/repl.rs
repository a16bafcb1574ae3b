//! Deffix REPL (Read-Eval-Print Loop)
//!
//! An interactive shell that keeps one pipeline, and so one set of
//! operators, precedence, and operands, across inputs.

use std::io::{self, Write};

use crate::cli::output::{print_context, StdoutSink};
use crate::engine::ExecutionPipeline;
use crate::errors::print_error;

/// REPL state that persists across evaluations
pub struct ReplState {
    pipeline: ExecutionPipeline,
    line_number: usize,
}

impl ReplState {
    pub fn new(pipeline: ExecutionPipeline) -> Self {
        Self {
            pipeline,
            line_number: 1,
        }
    }

    /// Runs one complete input in the persistent context.
    pub fn eval_line(&mut self, input: &str) -> bool {
        let source_name = format!("<repl:{}>", self.line_number);
        self.line_number += 1;
        match self.pipeline.execute(input, &source_name, &mut StdoutSink) {
            Ok(_) => true,
            Err(e) => {
                print_error(e);
                false
            }
        }
    }
}

pub fn run_repl(pipeline: ExecutionPipeline) {
    println!("Deffix REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit, :clear to reset the context");
    println!();

    let mut state = ReplState::new(pipeline);
    let mut input_buffer = String::new();

    loop {
        if input_buffer.is_empty() {
            print!("deffix> ");
        } else {
            print!("     -> ");
        }
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();

                if input_buffer.is_empty() && line.starts_with(':') {
                    match handle_repl_command(line, &mut state) {
                        ReplCommand::Continue => continue,
                        ReplCommand::Quit => break,
                    }
                }

                if !input_buffer.is_empty() {
                    input_buffer.push('\n');
                }
                input_buffer.push_str(line);

                // A blank line forces evaluation of an unbalanced buffer so
                // the parser can report it.
                if is_complete_expression(&input_buffer) || line.is_empty() {
                    if !input_buffer.trim().is_empty() {
                        state.eval_line(&input_buffer);
                    }
                    input_buffer.clear();
                }
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}

enum ReplCommand {
    Continue,
    Quit,
}

fn handle_repl_command(command: &str, state: &mut ReplState) -> ReplCommand {
    match command.to_ascii_lowercase().as_str() {
        ":help" | ":h" => {
            println!("Deffix REPL Commands:");
            println!("  :help, :h     Show this help");
            println!("  :quit, :q     Exit the REPL");
            println!("  :clear, :c    Forget operators, precedence, and operands");
            println!("  :context      Show operators, precedence, and operands");
            println!();
            println!("Enter expressions in prefix, infix, or postfix notation.");
            println!("Multi-line input continues until brackets balance.");
            ReplCommand::Continue
        }
        ":quit" | ":q" => ReplCommand::Quit,
        ":clear" | ":c" => {
            state.pipeline.context_mut().reset();
            println!("Context cleared.");
            ReplCommand::Continue
        }
        ":context" => {
            print_context(state.pipeline.context());
            ReplCommand::Continue
        }
        _ => {
            println!("Unknown command: {}. Type :help for available commands.", command);
            ReplCommand::Continue
        }
    }
}

/// True when brackets balance outside strings and comments.
fn is_complete_expression(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;

    for ch in trimmed.chars() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ';' if !in_string => in_comment = true,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete_expression() {
        assert!(is_complete_expression("42"));
        assert!(is_complete_expression("(1 + 2)"));
        assert!(is_complete_expression("(defoperand xs [1 2 3])"));
        assert!(is_complete_expression("\"a (string\""));
        assert!(is_complete_expression("(1 + 2) ; trailing ("));

        assert!(!is_complete_expression("(1 +"));
        assert!(!is_complete_expression("[1 2"));
        assert!(!is_complete_expression("\"unclosed string"));
        assert!(!is_complete_expression(""));
    }

    #[test]
    fn state_survives_between_inputs() {
        let mut state = ReplState::new(ExecutionPipeline::default());
        assert!(state.eval_line("(defoperand x 2)"));
        assert!(state.eval_line("(x * 3)"));
        assert!(state.pipeline.context().operands().contains("x"));
        assert!(!state.eval_line("(undefined-thing 1)"));
        assert_eq!(state.line_number, 4);
    }
}
