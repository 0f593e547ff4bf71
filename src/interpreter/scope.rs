use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

/// One link of the lexical scope chain.
///
/// Every `local` statement starts a new link, so a closure keeps seeing the
/// binding that was visible when it was created even if a later `local`
/// reuses the name. Bindings are shared cells: assignments through any
/// closure are observed by all of them.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Rc<RefCell<Value>>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// The root scope, holding the globals.
    pub fn root(globals: impl IntoIterator<Item = (String, Value)>) -> Rc<Self> {
        Rc::new(Scope {
            vars: globals
                .into_iter()
                .map(|(name, value)| (name, Rc::new(RefCell::new(value))))
                .collect(),
            parent: None,
        })
    }

    /// Extend `parent` with new bindings.
    pub fn extend(parent: &Rc<Scope>, bindings: impl IntoIterator<Item = (String, Value)>) -> Rc<Self> {
        Rc::new(Scope {
            vars: bindings
                .into_iter()
                .map(|(name, value)| (name, Rc::new(RefCell::new(value))))
                .collect(),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Resolve a name by searching from innermost to outermost scope
    pub fn resolve(&self, name: &str) -> Option<Rc<RefCell<Value>>> {
        match self.vars.get(name) {
            Some(cell) => Some(Rc::clone(cell)),
            None => self.parent.as_ref().and_then(|parent| parent.resolve(name)),
        }
    }

    pub fn get(&self, name: &str) -> Value {
        self.resolve(name)
            .map(|cell| cell.borrow().clone())
            .unwrap_or(Value::Nil)
    }
}
