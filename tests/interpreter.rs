mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{lines_of, output_of, runtime_error, static_errors};

    use rox::interpreter::Interpreter;
    use rox::value::Value;

    #[test]
    fn test_arithmetic_and_printing() {
        assert_eq!(
            lines_of("print 1 + 2 * 3; print 7 / 2; print -(4 - 6); print \"ab\" + \"cd\";"),
            vec!["7", "3.5", "2", "abcd"]
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(lines_of("print 1 / 0; print -1 / 0;"), vec!["inf", "-inf"]);
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            lines_of(
                "print !nil; print !false; print !0; print !\"\"; \
                 if (0) print \"zero is truthy\";"
            ),
            vec!["true", "true", "false", "false", "zero is truthy"]
        );
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(
            lines_of(
                "print nil == nil; print 1 == 1; print \"a\" == \"a\"; \
                 print 1 == \"1\"; print nil == false; print 0 == false;"
            ),
            vec!["true", "true", "true", "false", "false", "false"]
        );
    }

    #[test]
    fn test_callables_compare_by_identity() {
        assert_eq!(
            lines_of(
                "fun f() {} fun g() {} var h = f; \
                 print f == h; print f == g; print clock == clock;"
            ),
            vec!["true", "false", "true"]
        );
    }

    #[test]
    fn test_logical_operators_yield_operands() {
        assert_eq!(
            lines_of("print nil or \"x\"; print 1 and 2; print false and boom(); print 3 or boom();"),
            vec!["x", "2", "false", "3"]
        );
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(
            lines_of("{ var a = 1; { var a = a + 1; print a; } print a; }"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_closures_share_mutable_state() {
        let source = "
            fun counter() {
                var i = 0;
                fun inc() {
                    i = i + 1;
                    return i;
                }
                return inc;
            }
            var c = counter();
            print c();
            print c();
            var d = counter();
            print d();
        ";

        assert_eq!(lines_of(source), vec!["1", "2", "1"]);
    }

    #[test]
    fn test_two_closures_over_one_scope() {
        let source = "
            var get; var set;
            {
                var shared = \"before\";
                fun g() { return shared; }
                fun s(v) { shared = v; }
                get = g; set = s;
            }
            set(\"after\");
            print get();
        ";

        assert_eq!(lines_of(source), vec!["after"]);
    }

    #[test]
    fn test_closure_binds_lexically_not_dynamically() {
        let source = "
            var a = \"global\";
            {
                fun show() { print a; }
                show();
                var a = \"block\";
                show();
            }
        ";

        assert_eq!(lines_of(source), vec!["global", "global"]);
    }

    #[test]
    fn test_recursion() {
        let source = "
            fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
            print fib(15);
        ";

        assert_eq!(lines_of(source), vec!["610"]);
    }

    #[test]
    fn test_anonymous_functions_are_values() {
        let source = "
            fun apply(f, x) { return f(x); }
            print apply(fun (n) { return n * 10; }, 4);
            var anon = fun () {};
            print anon;
            print anon();
        ";

        assert_eq!(lines_of(source), vec!["40", "<fn>", "nil"]);
    }

    #[test]
    fn test_ternary_short_circuits() {
        let source = "
            var calls = 0;
            fun sideEffect() { calls = calls + 1; return \"b\"; }
            print true ? \"a\" : sideEffect();
            print false ? sideEffect() : \"c\";
            print calls;
        ";

        assert_eq!(lines_of(source), vec!["a", "c", "0"]);
    }

    #[test]
    fn test_while_and_for_loops() {
        assert_eq!(
            lines_of("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            vec!["0", "1", "2"]
        );
        assert_eq!(
            lines_of("for (var i = 0; i < 3; i = i + 1) print i * i;"),
            vec!["0", "1", "4"]
        );
    }

    #[test]
    fn test_break_exits_only_innermost_loop() {
        let source = "
            for (var i = 0; i < 3; i = i + 1) {
                var j = 0;
                while (true) {
                    if (j == 2) break;
                    j = j + 1;
                }
                print i + j * 10;
            }
        ";

        assert_eq!(lines_of(source), vec!["20", "21", "22"]);
    }

    #[test]
    fn test_return_unwinds_through_loops_and_blocks() {
        let source = "
            fun find() {
                var i = 0;
                while (true) {
                    {
                        if (i == 3) { return i; }
                    }
                    i = i + 1;
                }
            }
            print find();
            fun nothing() { return; }
            print nothing();
        ";

        assert_eq!(lines_of(source), vec!["3", "nil"]);
    }

    #[test]
    fn test_static_error_prevents_execution() {
        let errors = static_errors("print \"side effect\"; { var a = a; }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_operand_type_errors_name_operator_and_values() {
        let (output, error) = runtime_error("print 1; print \"a\" - 1; print 2;");

        assert_eq!(output, "1\n");
        assert_eq!(
            error.message(),
            "Operands of '-' must be numbers, got \"a\" and 1."
        );
        assert_eq!(error.to_string(), "Operands of '-' must be numbers, got \"a\" and 1.\n[line 1] at '-'");

        let (_, error) = runtime_error("print 1 + nil;");
        assert_eq!(
            error.message(),
            "Operands of '+' must be two numbers or two strings, got 1 and nil."
        );

        let (_, error) = runtime_error("print -\"x\";");
        assert_eq!(error.message(), "Operand of '-' must be a number, got \"x\".");

        let (_, error) = runtime_error("print 1 < true;");
        assert_eq!(
            error.message(),
            "Operands of '<' must be numbers, got 1 and true."
        );
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, error) = runtime_error("var x = \"str\"; x();");
        assert_eq!(error.message(), "Can only call functions and classes.");
    }

    #[test]
    fn test_arity_mismatch_reports_expected_and_actual() {
        let (_, error) = runtime_error("fun one(a) {} one();");
        assert_eq!(error.message(), "Expected 1 arguments but got 0.");

        let (_, error) = runtime_error("fun one(a) {} one(1, 2);");
        assert_eq!(error.message(), "Expected 1 arguments but got 2.");

        let (_, error) = runtime_error("clock(1);");
        assert_eq!(error.message(), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, error) = runtime_error("print missing;");
        assert_eq!(error.message(), "Undefined variable 'missing'.");

        let (_, error) = runtime_error("missing = 1;");
        assert_eq!(error.message(), "Undefined variable 'missing'.");
    }

    #[test]
    fn test_runtime_error_restores_scope_for_next_run() {
        let mut interpreter = Interpreter::new(Vec::new());

        assert!(rox::run(&mut interpreter, "var x = \"global\"; { var x = \"local\"; nil(); }").is_err());
        rox::run(&mut interpreter, "print x;").unwrap();

        let output = String::from_utf8(interpreter.into_output()).unwrap();
        assert_eq!(output, "global\n");
    }

    #[test]
    fn test_session_keeps_globals_and_closures_between_runs() {
        let mut interpreter = Interpreter::new(Vec::new());

        rox::run(
            &mut interpreter,
            "fun make() { var n = 0; fun next() { n = n + 1; return n; } return next; }",
        )
        .unwrap();
        rox::run(&mut interpreter, "var next = make(); next();").unwrap();
        rox::run(&mut interpreter, "var make = 1; print next();").unwrap();

        let output = String::from_utf8(interpreter.into_output()).unwrap();
        assert_eq!(output, "2\n");
    }

    #[test]
    fn test_clock_is_a_native_number() {
        assert_eq!(
            lines_of("var t = clock(); print t > 0; print clock;"),
            vec!["true", "<native fn clock>"]
        );
    }

    #[test]
    fn test_custom_native_function() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.define_native("half", 1, |args: &[Value]| match &args[0] {
            Value::Number(n) => Ok(Value::Number(n / 2.0)),
            other => Err(format!("half() expects a number, got {}.", other.type_name())),
        });

        rox::run(&mut interpreter, "print half(9);").unwrap();
        let errors = rox::run(&mut interpreter, "half(\"x\");").unwrap_err();

        assert_eq!(errors[0].message(), "half() expects a number, got string.");
        assert_eq!(interpreter.output(), b"4.5\n");
    }

    #[test]
    fn test_session_initializer_reads_previous_global() {
        let mut interpreter = Interpreter::new(Vec::new());

        rox::run(&mut interpreter, "var a = 1;").unwrap();
        rox::run(&mut interpreter, "var a = a + 1; print a;").unwrap();
        let errors = rox::run(&mut interpreter, "var b = b;").unwrap_err();

        assert_eq!(
            errors[0].message(),
            "Can't read global variable in its own initializer."
        );
        assert_eq!(interpreter.output(), b"2\n");
    }

    #[test]
    fn test_globals_can_be_redeclared() {
        assert_eq!(output_of("var a = 1; var a = a + 1; print a;"), "2\n");
    }
}
