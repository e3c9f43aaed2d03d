//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! failure modes into one of the variants defined here, which gives a uniform
//! `Result<T>` alias throughout the crate and ergonomic interplay with
//! `anyhow` in the binary.
//!
//! Control flow (`return`, `break`) is **not** modelled here: it travels in
//! [`crate::interpreter::Flow`].
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error at the token where parsing gave up.
    #[error("[line {line}] Error {}: {message}", location(.lexeme))]
    Parse {
        message: String,
        line: usize,
        lexeme: String,
    },

    /// Static‑analysis failure reported by the resolver.
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Resolve {
        message: String,
        line: usize,
        lexeme: String,
    },

    /// Runtime evaluation error, carrying the offending token's position.
    #[error("{message}\n[line {line}] at '{lexeme}'")]
    Runtime {
        message: String,
        line: usize,
        lexeme: String,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on the
    /// output sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.  `token` is the one that could
    /// not be parsed; `EOF` is reported as "at end".
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        LoxError::Parse {
            message,
            line: token.line,
            lexeme: token.lexeme.clone(),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        LoxError::Resolve {
            message,
            line: token.line,
            lexeme: token.lexeme.clone(),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        LoxError::Runtime {
            message,
            line: token.line,
            lexeme: token.lexeme.clone(),
        }
    }

    /// `true` for errors detected before any statement runs.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }

    /// Process exit status the driver uses for this error (sysexits.h).
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,
            LoxError::Runtime { .. } => 70,
            LoxError::Io(_) => 74,
        }
    }

    /// The human-readable message without position decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            LoxError::Io(e) => e.to_string(),
        }
    }
}

fn location(lexeme: &str) -> String {
    if lexeme.is_empty() {
        "at end".to_string()
    } else {
        format!("at '{lexeme}'")
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
