//! The uniform invocation contract shared by every callable Lox value.
//!
//! Natives, user functions (plain or bound methods) and classes used as
//! constructors all sit behind [`Callable`], so the interpreter's call site
//! only ever checks arity and dispatches.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::class::{LoxClass, LoxInstance};
use crate::environment::{self, Environment};
use crate::error::{LoxError, Result};
use crate::expr::FunctionExpr;
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Host function signature.  The `String` error becomes a runtime error
/// reported at the call's closing parenthesis.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    /// Exact number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invokes the callable.  Arity has already been checked by the caller.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&arguments).map_err(|message| LoxError::runtime(paren, message))
            }
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Class(class) => LoxClass::instantiate(class, interpreter, arguments),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Function(function) => write!(f, "{}", function),
            Callable::Class(class) => write!(f, "{}", class.name),
        }
    }
}

// Closures can (indirectly) contain themselves, so Debug stays shallow.
impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self)
    }
}

/// A user-defined function or method together with the scope it closes over.
pub struct LoxFunction {
    name: Option<String>,
    declaration: Rc<FunctionExpr>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Option<&str>,
        declaration: Rc<FunctionExpr>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            name: name.map(str::to_string),
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Returns a new function whose closure is a child scope binding `this`
    /// to `instance`.  `self` is left untouched, so one method can be bound
    /// to any number of instances at once.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            name: self.name.clone(),
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!(
            "Calling function '{}' with {} argument(s)",
            self.name().unwrap_or("<anonymous>"),
            arguments.len()
        );

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow =
            interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment)))?;

        // An initializer always yields its instance, whatever `return` said.
        if self.is_initializer {
            return Ok(environment::get_at(&self.closure, 0, "this"));
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal | Flow::Break => Value::Nil,
        })
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<fn>"),
        }
    }
}
