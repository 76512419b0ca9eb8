use std::{cell::RefCell, collections::HashMap, fmt::Display, rc::Rc};

use crate::{builtin::Builtin, environment::Environment, error::RuntimeError};

use sprig_parser::ast::{BlockStatement, IdentifierLiteral};

#[derive(Debug, PartialEq)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Carries no data, so every null is the same value
    Null,
    Array(Array),
    Hash(Hash),
    Function(Function),
    Builtin(Builtin),
    /// Special object to encapsulate a return-ed value while it goes up scopes.
    /// This is never seen by the user.
    ReturnValue(Rc<Object>),
    Error(RuntimeError),
}

impl Object {
    pub fn typename(&self) -> &'static str {
        use Object::*;

        match self {
            Integer(_) => "INTEGER",
            Float(_) => "FLOAT",
            Boolean(_) => "BOOLEAN",
            String(_) => "STRING",
            Null => "NULL",
            Array(_) => "ARRAY",
            Hash(_) => "HASH",
            Function(_) => "FUNCTION",
            Builtin(_) => "BUILTIN",
            ReturnValue(_) => "RETURN_VALUE",
            Error(_) => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Errors and return values both abandon whatever expression is being evaluated
    /// and travel up to the nearest call (or the program) untouched.
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::ReturnValue(_))
    }

    /// Only `false` and `null` are falsy; everything else, `0` and `""` included, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Boolean(false) | Self::Null)
    }

    /// The key this object hashes to, if it can be used as a hash key at all.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Self::Integer(value) => Some(HashKey::Integer(*value)),
            Self::Boolean(value) => Some(HashKey::Boolean(*value)),
            Self::String(value) => Some(HashKey::String(value.clone())),
            _ => None,
        }
    }

    /// Textual rendering of the object, as shown by the REPL and `puts`.
    ///
    /// # Examples
    /// ```rust
    /// use sprig_interpreter::object::Object;
    ///
    /// assert_eq!(Object::Float(2.0).inspect(), "2.0");
    /// assert_eq!(Object::String("hello world".to_string()).inspect(), "hello world");
    /// assert_eq!(Object::Null.inspect(), "null");
    /// ```
    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Object::*;

        match self {
            Integer(value) => write!(f, "{}", value),
            Float(value) => write!(f, "{}", ryu::Buffer::new().format(*value)),
            Boolean(value) => write!(f, "{}", value),
            String(value) => write!(f, "{}", value),
            Null => write!(f, "null"),
            Array(array) => write!(f, "{}", array),
            Hash(hash) => write!(f, "{}", hash),
            Function(func) => write!(f, "{}", func),
            Builtin(builtin) => write!(f, "{}", builtin),
            ReturnValue(obj) => write!(f, "{}", obj),
            Error(error) => write!(f, "ERROR: {}", error),
        }
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct Array {
    pub elements: Vec<Rc<Object>>,
}

impl Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let elements: Vec<String> = self.elements.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", elements.join(", "))
    }
}

/// The subset of objects usable as hash keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Display for HashKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashKey::Integer(value) => write!(f, "{}", value),
            HashKey::Boolean(value) => write!(f, "{}", value),
            HashKey::String(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct Hash {
    pub pairs: HashMap<HashKey, Rc<Object>>,
}

impl Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pairs: Vec<String> = self
            .pairs
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        // HashMap iteration order changes between runs
        pairs.sort();

        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// A closure: the function literal plus the environment it was defined in
pub struct Function {
    pub parameters: Vec<IdentifierLiteral>,
    pub body: Rc<BlockStatement>,
    pub env: Rc<RefCell<Environment>>,
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();

        write!(f, "fun({}){{ {} }}", params.join(", "), self.body)
    }
}

// The captured environment can hold this function again, so it is left out
impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish()
    }
}

impl PartialEq for Function {
    /// Two functions are equal only if they come from the same literal and share a scope.
    fn eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && Rc::ptr_eq(&self.env, &other.env)
    }
}
