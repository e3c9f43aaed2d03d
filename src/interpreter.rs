//! Tree-walking evaluator.
//!
//! Statements execute to a [`Flow`]: `return` and `break` are ordinary values
//! that `Block`/`If`/`While` hand upward until a loop (for `Break`) or a call
//! boundary (for `Return`) absorbs them.  Only genuine runtime errors travel
//! on the `Err` side.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::callable::{Callable, LoxFunction, NativeFn, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{self, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::resolver::Locals;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell off the end; continue with the next statement.
    Normal,
    /// A `return` is unwinding to the nearest call.
    Return(Value),
    /// A `break` is unwinding to the nearest loop.
    Break,
}

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: Locals,
    out: W,
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter printing to `out`, with the `clock` native
    /// already defined.
    pub fn new(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        };

        interpreter.define_native("clock", 0, |_args: &[Value]| {
            let now = Utc::now();
            Ok(Value::Number(now.timestamp_micros() as f64 / 1_000_000.0))
        });

        interpreter
    }

    /// Registers a host function in the global scope.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Merges a resolver distance table.  Tables accumulate, so each REPL
    /// entry can be resolved on its own.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Names currently defined in the global scope.
    pub fn global_names(&self) -> Vec<String> {
        let globals = self.globals.borrow();
        globals.names().map(str::to_string).collect()
    }

    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops execution and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let flow @ (Flow::Return(_) | Flow::Break) = self.execute(stmt)? {
                // The resolver rejects top-level `return`/`break`.
                debug!("Ignoring stray {:?} at top level", flow);
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let superclass = match superclass {
                    Some(expr) => Some(self.evaluate_superclass(expr, name)?),
                    None => None,
                };

                let methods: HashMap<String, Rc<LoxFunction>> = methods
                    .iter()
                    .map(|method| {
                        let function = LoxFunction::new(
                            Some(&method.name.lexeme),
                            Rc::clone(&method.function),
                            Rc::clone(&self.environment),
                            method.name.lexeme == INITIALIZER,
                        );
                        (method.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = LoxClass::new(&name.lexeme, superclass, methods);

                self.environment.borrow_mut().define(
                    &name.lexeme,
                    Value::Callable(Callable::Class(Rc::new(class))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = LoxFunction::new(
                    Some(&decl.name.lexeme),
                    Rc::clone(&decl.function),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` in `environment`, restoring the current scope
    /// afterwards whichever way the block ends.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(LoxError::runtime(
                            operator,
                            format!(
                                "Operand of '{}' must be a number, got {}.",
                                operator.lexeme,
                                other.repr()
                            ),
                        )),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Function(function) => {
                let function = LoxFunction::new(
                    None,
                    Rc::clone(function),
                    Rc::clone(&self.environment),
                    false,
                );
                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    /// Locals are read at their resolved distance; anything unresolved is
    /// a global.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(environment::get_at(
                &self.environment,
                distance,
                &name.lexeme,
            )),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_superclass(&mut self, expr: &Expr, class_name: &Token) -> Result<Rc<LoxClass>> {
        match self.evaluate(expr)? {
            Value::Callable(Callable::Class(class)) => Ok(class),
            _ => {
                let at = match expr {
                    Expr::Variable { name, .. } => name,
                    _ => class_name,
                };
                Err(LoxError::runtime(at, "Superclass must be a class."))
            }
        }
    }
}

/// Arithmetic, comparison and equality over already-evaluated operands.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (left, right) => Err(LoxError::runtime(
                operator,
                format!(
                    "Operands of '+' must be two numbers or two strings, got {} and {}.",
                    left.repr(),
                    right.repr()
                ),
            )),
        },

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => {
            let (a, b) = number_operands(operator, &left, &right)?;
            match operator.token_type {
                TokenType::MINUS => Ok(Value::Number(a - b)),
                TokenType::STAR => Ok(Value::Number(a * b)),
                TokenType::SLASH => Ok(Value::Number(a / b)),
                TokenType::GREATER => Ok(Value::Bool(a > b)),
                TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                TokenType::LESS => Ok(Value::Bool(a < b)),
                TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
            }
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            operator,
            format!(
                "Operands of '{}' must be numbers, got {} and {}.",
                operator.lexeme,
                left.repr(),
                right.repr()
            ),
        )),
    }
}
