use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::object::Object;

/// One frame of the scope chain.
///
/// Frames are shared through `Rc<RefCell<_>>` so closures can keep their
/// defining scope alive after the call that created it returns.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Rc<Object>>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: HashMap::new(),
            outer: None,
        }
    }

    /// Create a new environment that is enclosed by a given outer environment
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Self {
        Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    /// A fresh global scope, ready to be shared with an evaluator
    pub fn new_shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        match self.store.get(name) {
            Some(obj) => Some(Rc::clone(obj)),
            // If not found in this environment, look for it in the outer environment
            None => match self.outer {
                Some(ref outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    /// Bind `name` in this frame, shadowing any outer binding of the same name.
    pub fn set(&mut self, name: String, value: Rc<Object>) {
        self.store.insert(name, value);
    }

    pub fn depth(&self) -> usize {
        match &self.outer {
            // Recursively add the depth
            Some(parent_env) => 1 + parent_env.borrow().depth(),
            None => 1,
        }
    }
}
