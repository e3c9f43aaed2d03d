use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxFunction};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the constructor method.
pub const INITIALIZER: &str = "init";

pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: &str,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            methods,
        }
    }

    pub fn superclass(&self) -> Option<&Rc<LoxClass>> {
        self.superclass.as_ref()
    }

    /// Own methods first, then each superclass in turn.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// A class takes the arguments of its (possibly inherited) initializer.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    /// Allocates a new instance and runs `init` on it if there is one.
    pub fn instantiate<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(LoxInstance::new(Rc::clone(class)));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property read: fields shadow methods; methods come back bound to
    /// `instance`.
    pub fn get(instance: &Rc<LoxInstance>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.class.find_method(&name.lexeme) {
            let bound = method.bind(Rc::clone(instance));
            return Ok(Value::Callable(Callable::Function(Rc::new(bound))));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
