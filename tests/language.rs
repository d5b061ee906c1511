use treelox::error::{self, LoxError, Stage};
use treelox::{Lox, Outcome};

fn run(src: &str) -> (String, Outcome) {
    let mut lox = Lox::with_output(Vec::new());
    let outcome = lox.run(src);
    let out = String::from_utf8(lox.into_output()).expect("output is valid UTF-8");
    (out, outcome)
}

fn assert_output(src: &str, expected: &str) {
    let (out, outcome) = run(src);
    assert!(outcome.is_ok(), "script failed: {:?}", outcome);
    assert_eq!(out, expected, "unexpected output for:\n{}", src);
}

#[test]
fn arithmetic_follows_precedence() {
    assert_output("print 6 / 3 - 1;", "1\n");
    assert_output("print 2 + 3 * 4;", "14\n");
    assert_output("print (2 + 3) * 4 - 10 / 4;", "17.5\n");
    assert_output("print -2 * -(3);", "6\n");
}

#[test]
fn string_concatenation() {
    assert_output("print \"foo\" + \"bar\";", "foobar\n");
    assert_output("print \"val:\" + 3;", "val:3\n");
    assert_output("print 0.5 + \"!\";", "0.5!\n");
}

#[test]
fn block_scoping() {
    assert_output("var a = 1; { var a = 2; print a; } print a;", "2\n1\n");
    assert_output("var a = 1; { a = 2; } print a;", "2\n");
    assert_output(
        r#"
        var a = "global a";
        var b = "global b";
        var c = "global c";
        {
          var a = "outer a";
          var b = "outer b";
          {
            var a = "inner a";
            print a;
            print b;
            print c;
          }
          print a;
          print b;
          print c;
        }
        print a;
        print b;
        print c;
        "#,
        "inner a\nouter b\nglobal c\nouter a\nouter b\nglobal c\nglobal a\nglobal b\nglobal c\n",
    );
}

#[test]
fn short_circuit_skips_the_right_operand() {
    assert_output("print false and (1/0);", "false\n");
    assert_output("var hit = false; true or (hit = true); print hit;", "false\n");
    assert_output("print nil or \"default\";", "default\n");
}

#[test]
fn uninitialized_variables_are_nil() {
    assert_output("var a; print a; print a == nil;", "nil\ntrue\n");
}

#[test]
fn undefined_variables_are_runtime_errors() {
    let (out, outcome) = run("print 1;\nprint missing;\nprint 2;");
    assert_eq!(out, "1\n");
    assert!(outcome.syntax_errors.is_empty());

    let err = outcome.runtime_error.expect("runtime error");
    assert_eq!(err, LoxError::new(error::UndefinedVariable("missing".to_owned()), 2));
    assert_eq!(err.stage(), Stage::Runtime);
    assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 2]");

    let (_, outcome) = run("missing = 1;");
    assert!(outcome.runtime_error.is_some());
}

#[test]
fn while_loops() {
    assert_output("while (false) print \"never\";", "");
    assert_output(
        "var i = 0; var sum = 0; while (i < 5) { sum = sum + i; i = i + 1; } print sum;",
        "10\n",
    );
}

#[test]
fn fibonacci() {
    assert_output(
        r#"
        var a = 0;
        var b = 1;
        var n = 0;
        while (n < 10) {
          print a;
          var next = a + b;
          a = b;
          b = next;
          n = n + 1;
        }
        "#,
        "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n",
    );
}

#[test]
fn if_else_chains() {
    let src = |n: i32| {
        format!(
            "var n = {}; if (n < 0) print \"neg\"; else if (n == 0) print \"zero\"; else print \"pos\";",
            n
        )
    };
    assert_output(&src(-3), "neg\n");
    assert_output(&src(0), "zero\n");
    assert_output(&src(8), "pos\n");
}

#[test]
fn if_without_else() {
    assert_output("if (false) print 1; if (nil) print 2; print 3;", "3\n");
    assert_output("var a = 0; if (a) a = 1; print a;", "1\n");
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    assert_output(&format!("print {}1{};", "(".repeat(50), ")".repeat(50)), "1\n");

    let (out, outcome) = run(&format!("print {}1{};\nprint 2;", "(".repeat(200), ")".repeat(200)));
    assert_eq!(outcome.syntax_errors.len(), 1);
    assert_eq!(outcome.syntax_errors[0].ty, error::TooMuchNesting);
    assert_eq!(out, "2\n");
}

#[test]
fn synchronization_keeps_later_statements() {
    let (out, outcome) = run("print 1\nprint 2;");
    assert_eq!(outcome.syntax_errors.len(), 1);
    assert_eq!(
        outcome.syntax_errors[0].to_string(),
        "[line 2] Error at 'print': Expect ';' after value."
    );
    assert_eq!(out, "2\n");
}

#[test]
fn several_syntax_errors_are_reported() {
    let (out, outcome) = run("var 1 = 2;\nprint (;\n1 = 2;\nprint \"ok\";\n\"unterminated");
    let stages = outcome.syntax_errors.iter().map(LoxError::stage).collect::<Vec<_>>();
    assert_eq!(stages, vec![Stage::Parse, Stage::Parse, Stage::Parse, Stage::Scan]);
    assert_eq!(outcome.syntax_errors[2].ty, error::InvalidAssignmentTarget);
    assert_eq!(out, "ok\n");
}

#[test]
fn comments_are_ignored() {
    assert_output(
        "// leading\nprint /* inline /* nested */ */ 1; // trailing\n/* multi\nline */ print 2;",
        "1\n2\n",
    );
}

#[test]
fn runtime_error_inside_nested_block_keeps_session_usable() {
    let mut lox = Lox::with_output(Vec::new());
    let outcome = lox.run("var a = \"outer\"; { var a = 1; { print a + true; } }");
    assert_eq!(
        outcome.runtime_error,
        Some(LoxError::new(error::InvalidAddOperands, 1))
    );

    assert!(lox.run("print a;").is_ok());
    assert_eq!(lox.into_output(), b"outer\n");
}
