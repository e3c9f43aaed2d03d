mod common;

#[cfg(test)]
mod class_tests {
    use super::common::{lines_of, runtime_error, static_errors};

    use rox::callable::Callable;
    use rox::interpreter::Interpreter;
    use rox::token::Token;
    use rox::value::Value;

    #[test]
    fn test_initializer_sets_fields() {
        assert_eq!(
            lines_of("class A { init(x) { this.x = x; } } print A(5).x;"),
            vec!["5"]
        );
    }

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(
            lines_of("class Point { m() {} } print Point; print Point(); print Point;"),
            vec!["Point", "Point instance", "Point"]
        );
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let source = "
            class A {
                init(x) {
                    this.x = x;
                    if (x > 1) return;
                    this.small = true;
                }
            }
            var big = A(5);
            print big;
            print big.x;
            var small = A(0);
            print small.small;
            print big.init(7) == big;
            print big.x;
        ";

        assert_eq!(
            lines_of(source),
            vec!["A instance", "5", "true", "true", "7"]
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        let (_, error) = runtime_error("class P { init(a, b) {} } P(1);");
        assert_eq!(error.message(), "Expected 2 arguments but got 1.");

        let (_, error) = runtime_error("class Empty {} Empty(1);");
        assert_eq!(error.message(), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_methods_see_this() {
        let source = "
            class Counter {
                init() { this.n = 0; }
                bump() { this.n = this.n + 1; return this; }
            }
            var c = Counter();
            c.bump().bump().bump();
            print c.n;
        ";

        assert_eq!(lines_of(source), vec!["3"]);
    }

    #[test]
    fn test_bound_method_keeps_its_receiver() {
        let source = "
            class Box {
                init(v) { this.v = v; }
                get() { return this.v; }
            }
            var a = Box(\"a\");
            var b = Box(\"b\");
            var getA = a.get;
            var getB = b.get;
            a.v = \"a2\";
            print getA();
            print getB();
            print getA;
        ";

        assert_eq!(lines_of(source), vec!["a2", "b", "<fn get>"]);
    }

    #[test]
    fn test_closure_inside_method_captures_this() {
        let source = "
            class Greeter {
                init(name) { this.name = name; }
                later() {
                    fun say() { print \"hi \" + this.name; }
                    return say;
                }
            }
            var say = Greeter(\"ann\").later();
            say();
        ";

        assert_eq!(lines_of(source), vec!["hi ann"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = "
            class A { m() { return \"method\"; } }
            var a = A();
            print a.m();
            a.m = fun () { return \"field\"; };
            print a.m();
            print A().m();
        ";

        assert_eq!(lines_of(source), vec!["method", "field", "method"]);
    }

    #[test]
    fn test_inherited_methods_and_overrides() {
        let source = "
            class Animal {
                init(name) { this.name = name; }
                speak() { return this.name + \" makes a sound\"; }
                kind() { return \"animal\"; }
            }
            class Dog < Animal {
                speak() { return this.name + \" barks\"; }
            }
            class Puppy < Dog {}
            var p = Puppy(\"rex\");
            print p.speak();
            print p.kind();
            print Animal(\"cat\").speak();
        ";

        assert_eq!(
            lines_of(source),
            vec!["rex barks", "animal", "cat makes a sound"]
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, error) = runtime_error("var NotAClass = 1; class B < NotAClass {}");
        assert_eq!(error.message(), "Superclass must be a class.");
    }

    #[test]
    fn test_property_errors() {
        let (_, error) = runtime_error("class A {} print A().missing;");
        assert_eq!(error.message(), "Undefined property 'missing'.");

        let (_, error) = runtime_error("var s = \"str\"; print s.length;");
        assert_eq!(error.message(), "Only instances have properties.");

        let (_, error) = runtime_error("var n = 3; n.x = 1;");
        assert_eq!(error.message(), "Only instances have fields.");
    }

    #[test]
    fn test_initializer_static_rules() {
        assert_eq!(
            static_errors("class A { init() { return 5; } }"),
            vec!["Can't return a value from an initializer."]
        );
        assert_eq!(
            static_errors("class A { m() { fun f() { return this; } return 1; } } print this;"),
            vec!["Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_local_class_declaration() {
        let source = "
            fun make() {
                class Local { hello() { return \"local\"; } }
                return Local();
            }
            print make().hello();
        ";

        assert_eq!(lines_of(source), vec!["local"]);
    }

    #[test]
    fn test_class_value_exposes_hierarchy() {
        let mut interpreter = Interpreter::new(Vec::new());
        rox::run(
            &mut interpreter,
            "class Base { init(a) {} } class Derived < Base {} var d = Derived(1);",
        )
        .unwrap();

        let derived = interpreter
            .globals()
            .borrow()
            .get(&Token::synthetic("Derived", 1))
            .unwrap();

        let Value::Callable(callable @ Callable::Class(class)) = &derived else {
            panic!("expected a class, got {:?}", derived);
        };

        assert_eq!(callable.arity(), 1, "inherits init's arity");
        assert_eq!(class.superclass().map(|s| s.name.as_str()), Some("Base"));
        assert!(class.find_method("init").is_some());
        assert_eq!(derived.type_name(), "class");

        let d = interpreter
            .globals()
            .borrow()
            .get(&Token::synthetic("d", 1))
            .unwrap();
        let Value::Instance(instance) = &d else {
            panic!("expected an instance, got {:?}", d);
        };
        assert!(std::rc::Rc::ptr_eq(instance.class(), class));
    }
}
