#![allow(dead_code)]

use rox::error::LoxError;
use rox::interpreter::Interpreter;

/// Runs `source` on a fresh interpreter, returning what it printed and how
/// the run ended.
pub fn run(source: &str) -> (String, Result<(), Vec<LoxError>>) {
    let mut interpreter = Interpreter::new(Vec::new());
    let result = rox::run(&mut interpreter, source);
    let output = String::from_utf8(interpreter.into_output()).expect("output is UTF-8");
    (output, result)
}

/// Output of a program that must succeed.
pub fn output_of(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(errors) = result {
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        panic!("program failed:\n{}", rendered.join("\n"));
    }
    output
}

/// Printed lines of a program that must succeed.
pub fn lines_of(source: &str) -> Vec<String> {
    output_of(source).lines().map(str::to_string).collect()
}

/// Messages of the static errors a program must produce.  Asserts that
/// nothing was executed.
pub fn static_errors(source: &str) -> Vec<String> {
    let (output, result) = run(source);
    let errors = result.expect_err("expected static errors");
    assert!(output.is_empty(), "program ran despite static errors: {output:?}");
    assert!(errors.iter().all(LoxError::is_static), "{errors:?}");
    errors.iter().map(LoxError::message).collect()
}

/// Output produced before a runtime error, and that error.
pub fn runtime_error(source: &str) -> (String, LoxError) {
    let (output, result) = run(source);
    let mut errors = result.expect_err("expected a runtime error");
    assert_eq!(errors.len(), 1, "{errors:?}");
    let error = errors.remove(0);
    assert!(matches!(error, LoxError::Runtime { .. }), "{error:?}");
    (output, error)
}
