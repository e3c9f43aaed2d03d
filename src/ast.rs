use crate::expr::{Expr, FunctionExpr, LiteralValue};
use crate::stmt::Stmt;

/// Renders the AST as parenthesised prefix notation, e.g. `(+ 1.0 (group 2.0))`.
pub struct Ast;

impl Ast {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));
                for argument in arguments {
                    out.push(' ');
                    out.push_str(&self.print(argument));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Literal(literal) => match literal {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
                LiteralValue::Str(s) => s.to_string(),
                LiteralValue::True => "true".to_string(),
                LiteralValue::False => "false".to_string(),
                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Variable { name, .. } => name.lexeme.to_string(),

            Expr::Function(function) => format!("(fun {})", self.function(function)),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => format!("(block{})", self.stmts(statements)),

            Stmt::Break { .. } => "(break)".to_string(),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    out.push_str(&format!(" < {}", self.print(superclass)));
                }
                for method in methods {
                    out.push_str(&format!(
                        " (method {} {})",
                        method.name.lexeme,
                        self.function(&method.function)
                    ));
                }
                out.push(')');
                out
            }

            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Function(decl) => format!(
                "(fun {} {})",
                decl.name.lexeme,
                self.function(&decl.function)
            ),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", self.print(value)),
                None => "(return)".to_string(),
            },

            Stmt::Var { name, initializer } => match initializer {
                Some(initializer) => format!("(var {} {})", name.lexeme, self.print(initializer)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print(condition),
                self.print_stmt(body)
            ),
        }
    }

    fn function(&self, function: &FunctionExpr) -> String {
        let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();
        format!("({}){}", params.join(" "), self.stmts(&function.body))
    }

    fn stmts(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| format!(" {}", self.print_stmt(stmt)))
            .collect()
    }
}
