//! End-to-end tests: template source in, rendered text out.

mod common;

use std::fs;

use common::{render_err, render_ok};
use ecogen::script::{DEFAULT_MAX_CALL_DEPTH, MAX_NESTING};
use ecogen::{
    Engine, Environment, Error, Runner, ScriptErrorKind, Span, Syntax, Template, Value, render,
    render_file,
};

// -----------------------------------------------------------
// Core rendering behaviour.
// -----------------------------------------------------------

#[test]
fn literal_text_is_unchanged() {
    let input = "No code here.\n\t\"Quotes\", back\\slashes and | pipes # hashes\n";
    assert_eq!(render_ok(input), input);
}

#[test]
fn empty_template_renders_empty() {
    assert_eq!(render_ok(""), "");
}

#[test]
fn directive_scope_is_shared_with_expressions() {
    assert_eq!(render_ok("~let x = 3;\nvalue: #|x|#"), "value: 3");
}

#[test]
fn loop_repeats_enclosed_literal() {
    let source = "~for (i = 0; i < 3; i++) {\n  n=#|i|#\n~}";
    assert_eq!(render_ok(source), "  n=0\n  n=1\n  n=2\n");
}

#[test]
fn conditional_chain() {
    let source = "~let t = 7;\n\
                  ~if (t < 4) {\n\
                  t is less than 4\n\
                  ~} else if (t > 6) {\n\
                  t is greater than 6\n\
                  ~}\n\
                  ~else {\n\
                  t is 4, 5, or 6\n\
                  ~}";
    assert_eq!(render_ok(source), "t is greater than 6\n");
}

#[test]
fn block_directive_defines_helpers() {
    let source = "~-\n\
                  function shout(s) {\n\
                    return s.toUpperCase() + '!'\n\
                  }\n\
                  ~-\n\
                  #|shout('hey')|#";
    assert_eq!(render_ok(source), "HEY!");
}

#[test]
fn expression_values_are_stringified() {
    assert_eq!(
        render_ok("#|1/4|# #|10/5|# #|[1, 'a']|# #|null|# #|undefined|# #|true|# #|{a: 1}|#"),
        "0.25 2 1,a null undefined true [object Object]"
    );
}

#[test]
fn rendering_is_deterministic() {
    let template = Template::compile("~let n = 2;\n#|n * 21|# #|'x'.repeat(n)|#");
    let first = template.render(&mut Environment::new()).expect("render");
    let second = template.render(&mut Environment::new()).expect("render");
    assert_eq!(first, "42 xx");
    assert_eq!(first, second);
}

#[test]
fn reused_environment_starts_with_empty_output() {
    let template = Template::compile("~let n = (typeof n === 'undefined') ? 1 : n + 1;\n#|n|#");
    let mut env = Environment::new();
    assert_eq!(template.render(&mut env).expect("first"), "1");
    assert_eq!(template.render(&mut env).expect("second"), "2");
}

#[test]
fn caller_variables_are_visible() {
    let mut env = Environment::new()
        .with("name", "Ada")
        .with("langs", vec!["en", "fr"]);
    let out = render(
        "#|name|# speaks:\n~for (const l of langs) {\n- #|l|#\n~}",
        &mut env,
    )
    .expect("render");
    assert_eq!(out, "Ada speaks:\n- en\n- fr\n");
}

#[test]
fn declarations_persist_in_environment() {
    let mut env = Environment::new();
    render("~let total = 0;\n~for (const x of [1, 2, 3]) total += x;\n", &mut env)
        .expect("render");
    assert_eq!(env.get("total"), Some(&Value::from(6)));
    assert_eq!(env.get("_output"), Some(&Value::from("")));
}

#[test]
fn custom_syntax_renders() {
    let syntax = Syntax::new()
        .line_sentinel('%')
        .expression_markers(['{', '{'], ['}', '}']);
    let template = Template::compile_with("%for (let i of [1, 2]) {\n~{{i}}~\n%}", &syntax);
    assert_eq!(
        template.render(&mut Environment::new()).expect("render"),
        "~1~\n~2~\n"
    );
}

#[test]
fn runner_with_configured_engine() {
    let template = Template::compile("~function down(n) { return n == 0 ? 0 : down(n - 1); }\n#|down(50)|#");
    let shallow = Runner::with_evaluator(Engine::new().max_call_depth(10));
    let err = template
        .render_with(&shallow, &mut Environment::new())
        .unwrap_err();
    assert_eq!(err.kind, ScriptErrorKind::CallDepthExceeded(10));

    let deep = Runner::with_evaluator(Engine::new().max_call_depth(60));
    let out = template
        .render_with(&deep, &mut Environment::new())
        .expect("render");
    assert_eq!(out, "0");
}

// -----------------------------------------------------------
// Mixed templates with loops, comments and helpers.
// -----------------------------------------------------------

#[test]
fn loop_with_arithmetic() {
    let source = "\n~for (let i = 0; i < 5; i++) {\n  Problem #|i*i + i|# thing\n~}";
    assert_eq!(
        render_ok(source),
        "\n  Problem 0 thing\n  Problem 2 thing\n  Problem 6 thing\n  Problem 12 thing\n  Problem 20 thing\n"
    );
}

#[test]
fn generated_code_as_output() {
    let source = "\n~for (let i = 0; i < 2; i++) {\n  console.log(\"The value of i is:\", #|i|#);\n  console.log('Another time:', #|i|#);\n~}";
    assert_eq!(
        render_ok(source),
        "\n  console.log(\"The value of i is:\", 0);\n  console.log('Another time:', 0);\n  \
         console.log(\"The value of i is:\", 1);\n  console.log('Another time:', 1);\n"
    );
}

#[test]
fn mixed_directives_and_comments() {
    let source = "\n\
                  ~// This is a comment\n\
                  ~var i = 42;\n\
                  ~          let a = 3;\n\
                  ~let name = 'Shafik';\n\
                  ~let d = [1,2,3];\n\
                  The value of d is: #|d.toString()|#\n\
                  I think that #|String(\"something\")|# is the meaning of life.\n\
                  Hello, my name is #|name|# and I am a person.\n\
                  ~for (let i = 0; i < a; i++) {\n\
                  \x20 loop index: #|i|#\n\
                  ~}\n\
                  ~ //thing: comment: #||#\n\
                  ~\n\
                  i is still #|i|#";
    assert_eq!(
        render_ok(source),
        "\n\
         The value of d is: 1,2,3\n\
         I think that something is the meaning of life.\n\
         Hello, my name is Shafik and I am a person.\n  \
         loop index: 0\n  \
         loop index: 1\n  \
         loop index: 2\n\
         i is still 42"
    );
}

#[test]
fn functions_declared_on_directive_lines() {
    let source = "\n\
                  ~let k = 4;\n\
                  ~function foo(x) { return x/k; }\n\
                  ~function bar(x) { return x*k; }\n\
                  ~function baz(x) { return x+k; }\n\
                  \n\
                  Result of foo(baz(bar(3))): #|foo(baz(bar(3)))|#";
    assert_eq!(render_ok(source), "\n\nResult of foo(baz(bar(3))): 4");
}

// -----------------------------------------------------------
// Errors and source tracing.
// -----------------------------------------------------------

#[test]
fn undefined_variable_fails() {
    let err = render_err("before\n~let a = b;\nafter");
    assert_eq!(err.kind, ScriptErrorKind::UndefinedVariable("b".into()));
    assert!(!err.is_syntax());
}

#[test]
fn failed_render_has_no_partial_output() {
    let mut env = Environment::new();
    let result = render("printed?\n#|missing|#", &mut env);
    assert!(matches!(result, Err(Error::Eval(_))));
}

#[test]
fn error_is_located_in_template() {
    let template = Template::compile("A\n~let a = 1;\n#|a + nope|#");
    let err = template.render(&mut Environment::new()).unwrap_err();
    assert_eq!(err.span.row, 2);
    assert_eq!(template.locate(&err), Some(Span::new(2, 0)));
}

#[test]
fn error_in_block_is_located_at_block_start() {
    let template = Template::compile("x\n~-\nlet a = 1;\nlet b = a.nope();\n~-\n");
    let err = template.render(&mut Environment::new()).unwrap_err();
    assert_eq!(err.kind, ScriptErrorKind::NotCallable("number.nope".into()));
    assert_eq!(template.locate(&err), Some(Span::new(1, 0)));
}

#[test]
fn unbalanced_braces_are_syntax_errors() {
    let err = render_err("~for (let i = 0; i < 2; i++) {\nno close\n");
    assert!(err.is_syntax(), "{err}");
    assert!(matches!(err.kind, ScriptErrorKind::UnexpectedEnd { .. }));
}

#[test]
fn break_outside_loop_is_syntax_error() {
    let err = render_err("~break;\n");
    assert_eq!(err.kind, ScriptErrorKind::BreakOutsideLoop);
    assert!(err.is_syntax());
}

#[test]
fn error_display_includes_position() {
    let err = render_err("~let a = b;\n");
    assert_eq!(err.to_string(), "b is not defined at line 1, column 9");
}

// -----------------------------------------------------------
// Resource limits.
// -----------------------------------------------------------

#[test]
fn recursion_up_to_default_limit_succeeds() {
    let source = format!(
        "~function f(n) {{ return n == 0 ? 0 : f(n - 1); }}\n#|f({})|#",
        DEFAULT_MAX_CALL_DEPTH - 1
    );
    assert_eq!(render_ok(&source), "0");
}

#[test]
fn recursion_past_default_limit_fails() {
    let source = format!(
        "~function f(n) {{ return n == 0 ? 0 : f(n - 1); }}\n#|f({DEFAULT_MAX_CALL_DEPTH})|#"
    );
    assert_eq!(
        render_err(&source).kind,
        ScriptErrorKind::CallDepthExceeded(DEFAULT_MAX_CALL_DEPTH)
    );
}

#[test]
fn deeply_nested_expression_fails() {
    let source = format!("#|{}1{}|#", "(".repeat(3000), ")".repeat(3000));
    assert_eq!(
        render_err(&source).kind,
        ScriptErrorKind::NestingTooDeep(MAX_NESTING)
    );
    let source = format!("#|{}1{}|#", "[".repeat(3000), "]".repeat(3000));
    assert_eq!(
        render_err(&source).kind,
        ScriptErrorKind::NestingTooDeep(MAX_NESTING)
    );
}

#[test]
fn huge_array_index_fails() {
    let err = render_err("~let xs = [];\n~xs[1e300] = 1;\n");
    assert_eq!(err.kind, ScriptErrorKind::Type("invalid array length".into()));
}

#[test]
fn huge_strings_fail() {
    for expr in ["'x'.repeat(1e19)", "'x'.padStart(1e15)", "'x'.padEnd(1e15, 'ab')"] {
        let err = render_err(&format!("#|{expr}|#"));
        assert_eq!(
            err.kind,
            ScriptErrorKind::Type("invalid string length".into()),
            "{expr}"
        );
    }
}

// -----------------------------------------------------------
// File-based rendering.
// -----------------------------------------------------------

#[test]
fn render_file_with_json_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("letter.eco");
    let env = dir.path().join("env.json");
    fs::write(
        &template,
        "Hello #|name|#, you have #|items.length|# items:\n\
         ~for (const item of items) {\n\
         - #|item.padEnd(6, '.')|##|prices[item].toFixed(2)|#\n\
         ~}\n",
    )
    .expect("write template");
    fs::write(
        &env,
        r#"{"name": "Ada", "items": ["tea", "cake"], "prices": {"tea": 2, "cake": 3.5}}"#,
    )
    .expect("write env");

    let out = render_file(&template, Some(env.as_path())).expect("render");
    assert_eq!(out, "Hello Ada, you have 2 items:\n- tea...2.00\n- cake..3.50\n");
}

#[test]
fn render_file_without_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("plain.eco");
    fs::write(&template, "~let n = 6 * 7;\nn = #|n|#\n").expect("write template");
    assert_eq!(render_file(&template, None).expect("render"), "n = 42\n");
}

#[test]
fn render_file_missing_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.eco");
    let err = render_file(&missing, None).unwrap_err();
    match err {
        Error::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected an io error, got {other}"),
    }
}

#[test]
fn render_file_rejects_non_object_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("t.eco");
    let env = dir.path().join("env.json");
    fs::write(&template, "x").expect("write template");
    fs::write(&env, "[1, 2, 3]").expect("write env");
    assert!(matches!(
        render_file(&template, Some(env.as_path())),
        Err(Error::Environment(_))
    ));
}
