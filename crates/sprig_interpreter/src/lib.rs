use std::{cell::RefCell, rc::Rc};

use sprig_parser::ast::Program;

mod builtin;
mod environment;
mod error;
mod evaluator;
pub mod object;

pub use builtin::{Builtin, BuiltinRegistry};
pub use environment::Environment;
pub use error::RuntimeError;
pub use evaluator::{Evaluator, EvaluatorConfig};

use object::Object;

/// Evaluate `program` against `env` with a default evaluator that prints to stdout.
///
/// Bindings made by the program stay in `env`, so calling this repeatedly with the
/// same environment behaves like consecutive REPL lines.
pub fn evaluate(program: &Program, env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    Evaluator::new().eval(program, env)
}
