use std::{collections::HashMap, fmt::Display, io::Write, rc::Rc};

use log::trace;

use crate::{
    error::RuntimeError,
    object::{Array, Object},
};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Builtin {
    Puts,
    Len,
    First,
    Last,
    Rest,
    Push,
    Type,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Puts,
        Builtin::Len,
        Builtin::First,
        Builtin::Last,
        Builtin::Rest,
        Builtin::Push,
        Builtin::Type,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Puts => "puts",
            Builtin::Len => "len",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
            Builtin::Push => "push",
            Builtin::Type => "type",
        }
    }

    /// Run the builtin. `puts` writes to `out`; every other builtin is pure.
    pub fn apply(
        &self,
        args: Vec<Rc<Object>>,
        out: &mut dyn Write,
    ) -> Result<Rc<Object>, RuntimeError> {
        trace!("applying builtin {} to {} argument(s)", self.name(), args.len());

        match self {
            Builtin::Puts => {
                for arg in &args {
                    writeln!(out, "{}", arg.inspect())
                        .map_err(|err| RuntimeError::Output(err.to_string()))?;
                }
                Ok(Rc::new(Object::Null))
            }
            Builtin::Len => {
                let arg = self.single_argument(&args)?;
                match arg.as_ref() {
                    Object::String(str) => Ok(Rc::new(Object::Integer(str.chars().count() as i64))),
                    Object::Array(arr) => Ok(Rc::new(Object::Integer(arr.elements.len() as i64))),
                    _ => Err(self.invalid_argument(arg)),
                }
            }
            Builtin::First => {
                let elements = self.array_argument(&args)?;
                Ok(elements.first().map_or_else(null, Rc::clone))
            }
            Builtin::Last => {
                let elements = self.array_argument(&args)?;
                Ok(elements.last().map_or_else(null, Rc::clone))
            }
            Builtin::Rest => {
                let elements = self.array_argument(&args)?;
                if elements.is_empty() {
                    return Ok(null());
                }
                Ok(Rc::new(Object::Array(Array {
                    elements: elements[1..].to_vec(),
                })))
            }
            Builtin::Push => {
                check_arity(&args, 2)?;
                match args[0].as_ref() {
                    Object::Array(arr) => {
                        // Arrays are values: push returns a copy and leaves the original alone
                        let mut elements = arr.elements.clone();
                        elements.push(Rc::clone(&args[1]));
                        Ok(Rc::new(Object::Array(Array { elements })))
                    }
                    _ => Err(self.invalid_argument(&args[0])),
                }
            }
            Builtin::Type => {
                let arg = self.single_argument(&args)?;
                Ok(Rc::new(Object::String(arg.typename().to_owned())))
            }
        }
    }

    fn single_argument<'a>(&self, args: &'a [Rc<Object>]) -> Result<&'a Rc<Object>, RuntimeError> {
        check_arity(args, 1)?;
        Ok(&args[0])
    }

    fn array_argument<'a>(&self, args: &'a [Rc<Object>]) -> Result<&'a [Rc<Object>], RuntimeError> {
        let arg = self.single_argument(args)?;
        match arg.as_ref() {
            Object::Array(arr) => Ok(&arr.elements),
            _ => Err(self.invalid_argument(arg)),
        }
    }

    fn invalid_argument(&self, arg: &Object) -> RuntimeError {
        RuntimeError::InvalidArgumentType {
            builtin: self.name(),
            got: arg.typename(),
        }
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "builtin function {}", self.name())
    }
}

fn check_arity(args: &[Rc<Object>], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::BadArity {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn null() -> Rc<Object> {
    Rc::new(Object::Null)
}

/// The builtins visible to one evaluator, keyed by name.
///
/// Each builtin object is allocated once here and handed out by reference afterwards.
#[derive(Debug)]
pub struct BuiltinRegistry {
    table: HashMap<&'static str, Rc<Object>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let table = Builtin::ALL
            .iter()
            .map(|builtin| (builtin.name(), Rc::new(Object::Builtin(*builtin))))
            .collect();

        BuiltinRegistry { table }
    }

    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        self.table.get(name).map(Rc::clone)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}
