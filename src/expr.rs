//! Expression nodes of the Lox AST.
//!
//! Nodes are immutable once the parser has built them.  The resolver keys its
//! distance table on [`ExprId`], the identity of a variable-using node, never
//! on structural equality: two textually identical `a` references in different
//! scopes are different nodes with different distances.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::stmt::Stmt;
use crate::token::Token;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a `Variable`, `Assign` or `This` node.
///
/// Ids come from a process-wide counter, so nodes parsed in separate REPL
/// entries never collide in the interpreter's accumulated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

/// Parameters and body shared by function declarations, methods and
/// anonymous `fun` expressions.
///
/// Held behind an `Rc` so every closure created from the declaration points
/// at the same node instead of copying the body.
#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// `name = value`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Infix arithmetic, comparison and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Function-, method- or constructor call.
    Call {
        callee: Box<Expr>,
        /// The closing `)`, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Literal(LiteralValue),

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        /// The `?` token.
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    This { id: ExprId, keyword: Token },

    Unary { operator: Token, right: Box<Expr> },

    Variable { id: ExprId, name: Token },

    /// Anonymous function value: `fun (a, b) { ... }`.
    Function(Rc<FunctionExpr>),
}

impl Expr {
    /// Build a variable reference with a fresh identity.
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }
}
