use std::rc::Rc;

use crate::expr::{Expr, FunctionExpr};
use crate::token::Token;

/// A named function: a top-level/local `fun` declaration or a class method.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Token,
    pub function: Rc<FunctionExpr>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),

    Break {
        keyword: Token,
    },

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<FunctionDecl>,
    },

    Expression(Expr),

    Function(FunctionDecl),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Print(Expr),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
