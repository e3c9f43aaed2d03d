use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope: a name → value map plus a link to the enclosing scope.
///
/// Scopes are shared (`Rc<RefCell<_>>`) because closures and bound methods
/// keep them alive after the block or call that created them has finished.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn enclosing(&self) -> Option<Rc<RefCell<Environment>>> {
        self.enclosing.clone()
    }

    /// Binds `name` in *this* scope, overwriting any previous binding here.
    /// Parents are never touched, which is what makes shadowing work.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Names bound directly in this scope.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Walks the whole chain; `Undefined variable` if no scope binds `name`.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}

/// Follows exactly `distance` parent links from `env`.
///
/// # Panics
///
/// If the chain is shorter than `distance`: the resolver and the interpreter
/// disagree about scope shape, which is an interpreter bug.
pub fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
    let mut current = Rc::clone(env);

    for hop in 0..distance {
        let next = current.borrow().enclosing().unwrap_or_else(|| {
            panic!("scope chain ended after {hop} of {distance} hops; resolver/interpreter mismatch")
        });
        current = next;
    }

    current
}

/// Reads `name` from the scope exactly `distance` hops up.
///
/// # Panics
///
/// If that scope does not bind `name` (see [`ancestor`]).
pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
    debug!("get_at distance={} name={}", distance, name);

    let scope = ancestor(env, distance);
    let scope = scope.borrow();

    match scope.values.get(name) {
        Some(value) => value.clone(),
        None => panic!("resolved variable '{name}' missing at distance {distance}"),
    }
}

/// Writes `name` in the scope exactly `distance` hops up.
///
/// # Panics
///
/// If that scope does not bind `name` (see [`ancestor`]).
pub fn assign_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str, value: Value) {
    debug!("assign_at distance={} name={}", distance, name);

    let scope = ancestor(env, distance);
    let mut scope = scope.borrow_mut();

    match scope.values.get_mut(name) {
        Some(slot) => *slot = value,
        None => panic!("resolved variable '{name}' missing at distance {distance}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn shared(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn define_shadows_without_touching_parent() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(get_at(&inner, 0, "a"), Value::Number(2.0));
        assert_eq!(get_at(&inner, 1, "a"), Value::Number(1.0));
    }

    #[test]
    fn get_walks_the_whole_chain() {
        let outer = shared(Environment::new());
        outer
            .borrow_mut()
            .define("greeting", Value::String("hi".into()));
        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));

        let value = inner
            .borrow()
            .get(&Token::synthetic("greeting", 1))
            .unwrap();
        assert_eq!(value, Value::String("hi".into()));
    }

    #[test]
    fn get_of_unknown_name_is_undefined_variable() {
        let env = Environment::new();
        let err = env.get(&Token::synthetic("nope", 3)).unwrap_err();

        assert_eq!(err.message(), "Undefined variable 'nope'.");
        assert!(!err.is_static());
    }

    #[test]
    fn assign_updates_the_declaring_scope() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("n", Value::Number(0.0));
        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));

        inner
            .borrow_mut()
            .assign(&Token::synthetic("n", 1), Value::Number(5.0))
            .unwrap();

        assert_eq!(get_at(&outer, 0, "n"), Value::Number(5.0));
        assert!(inner.borrow().values.is_empty());
    }

    #[test]
    fn assign_at_writes_exact_ancestor() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("x", Value::Nil);
        let middle = shared(Environment::with_enclosing(Rc::clone(&outer)));
        middle.borrow_mut().define("x", Value::Nil);
        let inner = shared(Environment::with_enclosing(Rc::clone(&middle)));

        assign_at(&inner, 2, "x", Value::Bool(true));

        assert_eq!(get_at(&outer, 0, "x"), Value::Bool(true));
        assert_eq!(get_at(&middle, 0, "x"), Value::Nil);
    }

    #[test]
    fn scope_outlives_its_creator_while_shared() {
        let captured = {
            let block = shared(Environment::new());
            block.borrow_mut().define("kept", Value::Number(7.0));
            Rc::clone(&block)
        };

        assert_eq!(get_at(&captured, 0, "kept"), Value::Number(7.0));
    }

    #[test]
    #[should_panic(expected = "resolver/interpreter mismatch")]
    fn ancestor_past_root_is_fatal() {
        let root = shared(Environment::new());
        ancestor(&root, 1);
    }
}
