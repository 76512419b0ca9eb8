use std::{cell::RefCell, rc::Rc};

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use sprig_interpreter::{BuiltinRegistry, Environment, Evaluator, EvaluatorConfig};
use sprig_parser::{
    ast::Program,
    parse,
    span::{BytePos, Span},
    ParseError,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn repl(config: EvaluatorConfig, print_ast: bool) -> Result<(), ReadlineError> {
    println!("sprig v{}", VERSION);
    let builtins: Vec<&str> = {
        let registry = BuiltinRegistry::new();
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();
        names
    };
    println!("builtins: {}", builtins.join(", "));

    // One global scope for the whole session so bindings carry over between lines
    let env = Environment::new_shared();
    let mut evaluator = Evaluator::with_config(config, std::io::stdout());

    // `()` can be used when no completer is required
    let mut rl = Editor::<()>::new();
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                if line.trim() == "exit" || line.trim() == "quit" {
                    break;
                }
                // Skip empty lines
                else if line.trim().is_empty() {
                    continue;
                }

                rl.add_history_entry(line.as_str());

                let (prog, errors) = parse(&line);
                if !errors.is_empty() {
                    print_parse_errors(&line, &errors);
                    continue;
                }
                if print_ast {
                    print_program(&prog);
                }

                let result = evaluator.eval(&prog, &env);
                println!("{}", result.inspect());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Parse and evaluate a whole script.
///
/// Returns `false` if the script had parse errors or evaluated to an error.
pub fn run_script(
    source: &str,
    env: &Rc<RefCell<Environment>>,
    config: EvaluatorConfig,
    print_ast: bool,
) -> bool {
    let (prog, errors) = parse(source);
    if !errors.is_empty() {
        print_parse_errors(source, &errors);
        return false;
    }
    if print_ast {
        print_program(&prog);
    }

    debug!("running script with {} statement(s)", prog.statements.len());
    let result = Evaluator::with_config(config, std::io::stdout()).eval(&prog, env);
    if result.is_error() {
        eprintln!("{}", result.inspect());
        return false;
    }

    true
}

fn print_parse_errors(source: &str, errors: &[ParseError]) {
    eprintln!("Parser errors:");
    for error in errors {
        eprintln!("\t{}", error);
        if let Some(marker) = underline(source, error.span()) {
            for line in marker.lines() {
                eprintln!("\t{}", line);
            }
        }
    }
}

/// The source line holding `span`, with carets under the spanned text
fn underline(source: &str, span: Span) -> Option<String> {
    let start = span.start().offset();
    let line_start = source.get(..start)?.rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);

    // Only the first line of a span running over several lines is marked
    let end = span.end().offset().min(line_end);
    let marked = Span::new(span.start(), BytePos::new(end)).slice(source)?;

    let indent = source[line_start..start].chars().count();
    let width = marked.chars().count().max(1);

    Some(format!(
        "{}\n{}{}",
        &source[line_start..line_end],
        " ".repeat(indent),
        "^".repeat(width)
    ))
}

fn print_program(prog: &Program) {
    for statement in &prog.statements {
        println!("{}", statement);
    }
}
