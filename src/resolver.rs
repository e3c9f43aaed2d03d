//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return` / `break` / `this`).  Every error is collected; the walk never
//!    stops early.
//! 3. Record, for *each* variable occurrence, whether it is a local (and at what
//!    depth) or a global, so the interpreter never falls back to dynamic lookup
//!    that would see a later shadowing local.
//!
//! Globals get no entry: top-level names may be introduced between REPL
//! entries, so they are looked up by name at run time.  The resolver still
//! remembers which top-level names exist (from earlier entries and from this
//! pass) to reject `var a = a;` when nothing can supply `a`.

use crate::class::INITIALIZER;
use crate::error::LoxError;
use crate::expr::{Expr, ExprId, FunctionExpr};
use crate::stmt::Stmt;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Distance table: node identity → number of scopes between use and declaration.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// Are we inside a class body?  Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver context: the scope stack and the enclosing-construct state,
/// threaded through every recursive call.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    globals: HashSet<String>,
    initializing: Option<String>, // top-level `var` whose initializer is being resolved
    locals: Locals,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            globals: HashSet::new(),
            initializing: None,
            locals: Locals::new(),
            errors: Vec::new(),
        }
    }

    /// A resolver that already knows the given top-level names, e.g. the
    /// globals of a running REPL session.
    pub fn with_globals<I: IntoIterator<Item = String>>(names: I) -> Self {
        let mut resolver = Self::new();
        resolver.globals.extend(names);
        resolver
    }

    /// Walk all top‑level statements, returning the distance table and every
    /// static error found.  A non-empty error list means the program must not
    /// run.
    pub fn resolve(mut self, statements: &[Stmt]) -> (Locals, Vec<LoxError>) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        info!(
            "Resolve pass done: {} local reference(s), {} error(s)",
            self.locals.len(),
            self.errors.len()
        );

        (self.locals, self.errors)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Break { keyword } => {
                if self.loop_depth == 0 {
                    self.error(keyword, "'break' must be used inside a loop.");
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Resolving class '{}'", name.lexeme);

                let enclosing = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class can't inherit from itself.");
                        }
                    }
                    self.resolve_expr(superclass);
                }

                self.begin_scope();
                self.insert_defined("this");

                for method in methods {
                    let kind = if method.name.lexeme == INITIALIZER {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(&method.function, kind);
                }

                self.end_scope();

                self.current_class = enclosing;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Function(decl) => {
                // name is visible *inside* its own body, for recursion
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(&decl.function, FunctionType::Function);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(expr) = initializer {
                    let top_level_fresh =
                        self.scopes.is_empty() && !self.globals.contains(&name.lexeme);
                    let enclosing = if top_level_fresh {
                        self.initializing.replace(name.lexeme.clone())
                    } else {
                        self.initializing.take()
                    };

                    self.resolve_expr(expr);
                    self.initializing = enclosing;
                }
                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if in_own_initializer {
                    // `{ var a = 1; { var a = a + 1; } }` reads the outer `a`.
                    if !self.resolve_enclosing(*id, name) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                    return;
                }

                let reads_global_being_defined = self.scopes.is_empty()
                    && self.initializing.as_deref() == Some(name.lexeme.as_str());
                if reads_global_being_defined {
                    self.error(name, "Can't read global variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Function(function) => {
                self.resolve_function(function, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.  Loop depth
    /// starts over: a `break` cannot cross a function boundary.
    fn resolve_function(&mut self, function: &FunctionExpr, kind: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_loop_depth = self.loop_depth;
        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loop_depth;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Variable redeclared in same scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            self.globals.insert(name.lexeme.clone());
        }
        self.insert_defined(&name.lexeme);
    }

    fn insert_defined(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        debug!("Static error at '{}': {}", token.lexeme, message);
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either a local at depth `d`, or
    /// (no entry) a global if not found in *any* scope.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    /// Resolves `name` past the innermost scope, where it is still being
    /// declared.  `false` if neither an enclosing scope nor a known global
    /// binds it.
    fn resolve_enclosing(&mut self, id: ExprId, name: &Token) -> bool {
        for (depth, scope) in self.scopes.iter().rev().enumerate().skip(1) {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' past its declaration at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return true;
            }
        }

        self.globals.contains(&name.lexeme)
    }
}

/// Convenience wrapper: resolve `statements` with a fresh [`Resolver`].
pub fn resolve(statements: &[Stmt]) -> (Locals, Vec<LoxError>) {
    Resolver::new().resolve(statements)
}
