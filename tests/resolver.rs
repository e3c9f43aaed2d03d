mod common;

#[cfg(test)]
mod resolver_tests {
    use super::common::static_errors;

    use rox::expr::Expr;
    use rox::parse_source;
    use rox::resolver::{resolve, Resolver};
    use rox::stmt::Stmt;

    fn printed_variable(stmt: &Stmt) -> &Expr {
        match stmt {
            Stmt::Print(expr) => expr,
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_distance_counts_enclosing_scopes() {
        let program = parse_source("{ var a = 1; { { print a; } } }").unwrap();
        let (locals, errors) = resolve(&program);
        assert!(errors.is_empty());

        let Stmt::Block(outer) = &program[0] else {
            panic!()
        };
        let Stmt::Block(middle) = &outer[1] else {
            panic!()
        };
        let Stmt::Block(inner) = &middle[0] else {
            panic!()
        };
        let Expr::Variable { id, .. } = printed_variable(&inner[0]) else {
            panic!()
        };

        assert_eq!(locals.get(id), Some(&2));
    }

    #[test]
    fn test_globals_get_no_distance() {
        let program = parse_source("var g = 1; print g;").unwrap();
        let (locals, errors) = resolve(&program);

        assert!(errors.is_empty());
        assert!(locals.is_empty());
    }

    #[test]
    fn test_identical_names_resolve_per_node() {
        let program = parse_source("{ var a = 1; print a; { var a = 2; print a; } }").unwrap();
        let (locals, _) = resolve(&program);

        let Stmt::Block(outer) = &program[0] else {
            panic!()
        };
        let Stmt::Block(inner) = &outer[2] else {
            panic!()
        };
        let Expr::Variable { id: outer_id, .. } = printed_variable(&outer[1]) else {
            panic!()
        };
        let Expr::Variable { id: inner_id, .. } = printed_variable(&inner[1]) else {
            panic!()
        };

        assert_ne!(outer_id, inner_id);
        assert_eq!(locals.get(outer_id), Some(&0));
        assert_eq!(locals.get(inner_id), Some(&0));
    }

    #[test]
    fn test_self_referential_initializer() {
        assert_eq!(
            static_errors("{ var a = a; }"),
            vec!["Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_shadowing_initializer_reads_enclosing_scope() {
        let program = parse_source("{ var a = 1; { var a = a + 1; print a; } }").unwrap();
        let (locals, errors) = resolve(&program);
        assert!(errors.is_empty(), "{:?}", errors);

        let Stmt::Block(outer) = &program[0] else {
            panic!()
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!()
        };
        let Stmt::Var {
            initializer: Some(Expr::Binary { left, .. }),
            ..
        } = &inner[0]
        else {
            panic!("expected var with binary initializer, got {:?}", inner[0])
        };
        let Expr::Variable { id: read_id, .. } = left.as_ref() else {
            panic!()
        };
        let Expr::Variable { id: print_id, .. } = printed_variable(&inner[1]) else {
            panic!()
        };

        assert_eq!(locals.get(read_id), Some(&1), "initializer reads the outer a");
        assert_eq!(locals.get(print_id), Some(&0), "later reads see the inner a");
    }

    #[test]
    fn test_global_self_reference_is_rejected_before_running() {
        assert_eq!(
            static_errors("print 1; var a = a;"),
            vec!["Can't read global variable in its own initializer."]
        );
    }

    #[test]
    fn test_initializers_may_read_an_existing_binding() {
        for source in [
            "var a = 1; var a = a + 1;",
            "var a = 1; { var a = a; }",
            "var f = fun () { return f; };",
            "fun outer() { var g = fun () { return g; }; }",
        ] {
            let program = parse_source(source).unwrap();
            let (_, errors) = resolve(&program);
            assert!(errors.is_empty(), "{source}: {:?}", errors);
        }
    }

    #[test]
    fn test_known_globals_satisfy_self_reference() {
        let program = parse_source("var a = a + 1;").unwrap();

        let (_, errors) = Resolver::with_globals(vec!["a".to_string()]).resolve(&program);
        assert!(errors.is_empty());

        let (_, errors) = Resolver::new().resolve(&program);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            static_errors("{ var x = 1; var x = 2; }"),
            vec!["Variable redeclared in same scope."]
        );
    }

    #[test]
    fn test_redeclaration_in_nested_scope_is_shadowing() {
        let program = parse_source("{ var x = 1; { var x = 2; } }").unwrap();
        let (_, errors) = resolve(&program);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parameter_clash() {
        assert_eq!(
            static_errors("fun f(a, a) {}"),
            vec!["Variable redeclared in same scope."]
        );
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            static_errors("print 1; return 2;"),
            vec!["Can't return from top-level code."]
        );
    }

    #[test]
    fn test_value_return_in_initializer() {
        assert_eq!(
            static_errors("class A { init() { return 5; } }"),
            vec!["Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_fine() {
        let program = parse_source("class A { init() { return; } }").unwrap();
        let (_, errors) = resolve(&program);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            static_errors("print this;"),
            vec!["Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("fun f() { return this; }"),
            vec!["Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            static_errors("if (true) { break; }"),
            vec!["'break' must be used inside a loop."]
        );
    }

    #[test]
    fn test_break_does_not_cross_function_boundary() {
        assert_eq!(
            static_errors("while (true) { fun f() { break; } }"),
            vec!["'break' must be used inside a loop."]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            static_errors("class A < A {}"),
            vec!["A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_all_errors_are_reported_in_one_pass() {
        let errors = static_errors(
            "return 1;\n\
             { var a = a; var b; var b; }\n\
             print this;\n\
             break;\n\
             class C { init() { return 1; } }",
        );

        assert_eq!(
            errors,
            vec![
                "Can't return from top-level code.",
                "Can't read local variable in its own initializer.",
                "Variable redeclared in same scope.",
                "Can't use 'this' outside of a class.",
                "'break' must be used inside a loop.",
                "Can't return a value from an initializer.",
            ]
        );
    }

    #[test]
    fn test_static_error_carries_location() {
        let program = parse_source("print 1;\n{ var x; var x; }").unwrap();
        let (_, errors) = resolve(&program);

        assert_eq!(
            errors[0].to_string(),
            "[line 2] Error at 'x': Variable redeclared in same scope."
        );
    }
}
