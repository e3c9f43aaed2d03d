use std::fmt;
use std::rc::Rc;

use crate::callable::Callable;
use crate::class::LoxInstance;

/// Every runtime value a Lox program can produce.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<LoxInstance>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(Callable::Class(_)) => "class",
            Value::Callable(_) => "function",
            Value::Instance(_) => "instance",
        }
    }

    /// Rendering used inside error messages: like `Display`, but strings are
    /// quoted so `"1"` and `1` can be told apart.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

/// No coercion across types.  Callables and instances compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(callable) => write!(f, "{}", callable),

            Value::Instance(instance) => write!(f, "{}", instance),
        }
    }
}
