use std::{
    sync::atomic::Ordering,
    time::Duration,
};

use rill::interpreter::{Interpreter, RuntimeError, ScopeMode, Value};

fn run_program(source: &str) -> (Result<Vec<Value>, RuntimeError>, Interpreter) {
    let tokens = rill::tokenizer::tokenize(source).expect("tokenize should work on valid syntax");
    let program = rill::parser::program(&tokens).expect("parse should work on valid syntax");
    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&program);
    (result, interpreter)
}

fn run_valid_program(source: &str) -> Vec<Value> {
    let (result, _) = run_program(source);
    result.expect("run should work on valid program")
}

#[test]
fn test_number_literal_round_trip() {
    assert_eq!(run_valid_program("print(42);"), vec![Value::Number(42.0)]);
    assert_eq!(run_valid_program("print(2.5);"), vec![Value::Number(2.5)]);
}

#[test]
fn test_string_literal_round_trip() {
    assert_eq!(
        run_valid_program("print(\"hello\");"),
        vec![Value::String("hello".to_string())]
    );
}

#[test]
fn test_precedence() {
    assert_eq!(
        run_valid_program("print(2 + 3 * 4);"),
        vec![Value::Number(14.0)]
    );
    assert_eq!(
        run_valid_program("print((2 + 3) * 4);"),
        vec![Value::Number(20.0)]
    );
}

#[test]
fn test_left_associativity() {
    assert_eq!(
        run_valid_program("print(10 - 3 - 2);"),
        vec![Value::Number(5.0)]
    );
    assert_eq!(
        run_valid_program("print(100 / 10 / 2);"),
        vec![Value::Number(5.0)]
    );
}

#[test]
fn test_variable_mutation() {
    let source = "var x = 1; x = x + 1; print(x);";
    assert_eq!(run_valid_program(source), vec![Value::Number(2.0)]);
}

#[test]
fn test_conditional() {
    let source = r#"
    var x = 3;
    if (x > 5) {
        print("big");
    } else {
        print("small");
    }
    "#;
    assert_eq!(
        run_valid_program(source),
        vec![Value::String("small".to_string())]
    );
}

#[test]
fn test_if_without_else_is_a_no_op_when_false() {
    let source = "var x = 1; if (x > 5) { print(x); }";
    assert_eq!(run_valid_program(source), vec![]);
}

#[test]
fn test_loop_accumulation() {
    let source = r#"
    var i = 0;
    var sum = 0;
    while (i < 5) {
        sum = sum + i;
        i = i + 1;
    }
    print(sum);
    "#;
    assert_eq!(run_valid_program(source), vec![Value::Number(10.0)]);
}

#[test]
fn test_while_with_false_condition_never_runs() {
    let source = "var x = 0; while (x > 0) { print(x); }";
    assert_eq!(run_valid_program(source), vec![]);
}

#[test]
fn test_string_concatenation() {
    let source = "var name = \"test\"; print(\"Hello \" + name);";
    assert_eq!(
        run_valid_program(source),
        vec![Value::String("Hello test".to_string())]
    );
}

#[test]
fn test_concatenated_numbers_drop_the_trailing_point() {
    assert_eq!(
        run_valid_program("print(\"n=\" + 3);"),
        vec![Value::String("n=3".to_string())]
    );
    assert_eq!(
        run_valid_program("print(\"q=\" + 10 / 4);"),
        vec![Value::String("q=2.5".to_string())]
    );
}

#[test]
fn test_comparison_produces_booleans() {
    let source = "print(1 < 2); print(2 == 3);";
    assert_eq!(
        run_valid_program(source),
        vec![Value::Boolean(true), Value::Boolean(false)]
    );
}

#[test]
fn test_logical_operators_use_truthiness() {
    assert_eq!(
        run_valid_program("print(1 && \"\");"),
        vec![Value::Boolean(false)]
    );
    assert_eq!(
        run_valid_program("print(0 || \"x\");"),
        vec![Value::Boolean(true)]
    );
}

#[test]
fn test_truthy_number_condition() {
    let source = "var n = 2; if (n) { print(\"yes\"); } else { print(\"no\"); }";
    assert_eq!(
        run_valid_program(source),
        vec![Value::String("yes".to_string())]
    );
}

#[test]
fn test_undefined_variable_produces_no_output() {
    let (result, _) = run_program("print(undefinedName);");
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedVariable("undefinedName".to_string()))
    );
}

#[test]
fn test_assignment_to_undeclared_variable_fails() {
    let (result, _) = run_program("y = 1;");
    assert_eq!(result, Err(RuntimeError::UndefinedVariable("y".to_string())));
}

#[test]
fn test_division_by_zero() {
    let (result, _) = run_program("print(1 / 0);");
    assert_eq!(result, Err(RuntimeError::DivisionByZero));
}

#[test]
fn test_type_mismatch_on_mixed_comparison() {
    let (result, _) = run_program("print(1 == \"1\");");
    assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
}

#[test]
fn test_logical_right_operand_errors_are_not_skipped() {
    let (result, _) = run_program("var x = 0; print(x && missing);");
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedVariable("missing".to_string()))
    );
}

#[test]
fn test_environment_keeps_effects_before_a_runtime_error() {
    let source = "var x = 1; var y = x + 1; print(missing);";
    let (result, interpreter) = run_program(source);
    assert!(matches!(result, Err(RuntimeError::UndefinedVariable(_))));
    assert_eq!(
        interpreter.environment().get("x"),
        Some(&Value::Number(1.0))
    );
    assert_eq!(
        interpreter.environment().get("y"),
        Some(&Value::Number(2.0))
    );
}

#[test]
fn test_flat_scope_leaks_block_declarations() {
    let source = "var x = 1; if (x == 1) { var inner = 2; } print(inner);";
    let (result, interpreter) = run_program(source);
    assert_eq!(result, Ok(vec![Value::Number(2.0)]));
    assert_eq!(
        interpreter.environment().get("inner"),
        Some(&Value::Number(2.0))
    );
}

#[test]
fn test_lexical_scope_drops_block_declarations() {
    let source = "var x = 1; if (x == 1) { var inner = 2; } print(inner);";
    let tokens = rill::tokenizer::tokenize(source).unwrap();
    let program = rill::parser::program(&tokens).unwrap();
    let mut interpreter = Interpreter::with_scope_mode(ScopeMode::Lexical);
    let result = interpreter.run(&program);
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedVariable("inner".to_string()))
    );
}

#[test]
fn test_lexical_scope_assigns_through_to_outer_bindings() {
    let source = "var i = 0; while (i < 3) { i = i + 1; } print(i);";
    let tokens = rill::tokenizer::tokenize(source).unwrap();
    let program = rill::parser::program(&tokens).unwrap();
    let mut interpreter = Interpreter::with_scope_mode(ScopeMode::Lexical);
    assert_eq!(interpreter.run(&program), Ok(vec![Value::Number(3.0)]));
}

#[test]
fn test_nested_loops() {
    let source = r#"
    var total = 0;
    var i = 0;
    while (i < 3) {
        var j = 0;
        while (j < 3) {
            total = total + 1;
            j = j + 1;
        }
        i = i + 1;
    }
    print(total);
    "#;
    assert_eq!(run_valid_program(source), vec![Value::Number(9.0)]);
}

#[test]
fn test_chained_conditionals_nest_in_the_else_block() {
    let source = r#"
    var score = 75;
    if (score >= 90) {
        print("A");
    } else {
        if (score >= 70) {
            print("B");
        } else {
            print("C");
        }
    }
    "#;
    assert_eq!(run_valid_program(source), vec![Value::String("B".to_string())]);
}

#[test]
fn test_cancellation_before_the_first_statement() {
    let tokens = rill::tokenizer::tokenize("print(1);").unwrap();
    let program = rill::parser::program(&tokens).unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.cancel_flag().store(true, Ordering::Relaxed);
    assert_eq!(interpreter.run(&program), Err(RuntimeError::Cancelled));
}

#[test]
fn test_cancellation_stops_an_infinite_loop() {
    let tokens = rill::tokenizer::tokenize("var i = 0; while (0 < 1) { i = i + 1; }").unwrap();
    let program = rill::parser::program(&tokens).unwrap();
    let mut interpreter = Interpreter::new();
    let cancel = interpreter.cancel_flag();

    let handle = std::thread::spawn(move || interpreter.run(&program));
    std::thread::sleep(Duration::from_millis(50));
    cancel.store(true, Ordering::Relaxed);

    let result = handle.join().expect("interpreter thread should not panic");
    assert_eq!(result, Err(RuntimeError::Cancelled));
}

#[test]
fn test_example_script_from_the_language_docs() {
    let source = r#"
    var x = 10;
    var y = 20;
    var z = x + y * 2;
    print(z); // 50

    if (z > 30) {
        print("big z");
    } else {
        print("small z");
    }

    var count = 0;
    while (count < 5) {
        count = count + 1;
    }
    print(count);
    "#;
    assert_eq!(
        run_valid_program(source),
        vec![
            Value::Number(50.0),
            Value::String("big z".to_string()),
            Value::Number(5.0),
        ]
    );
}
