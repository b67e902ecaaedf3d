//! Script language behaviour, exercised through the engine directly.

use ecogen::script::{Engine, ScriptErrorKind, Value, parse};
use ecogen::{Environment, Evaluator};

fn eval(code: &str) -> Environment {
    let mut env = Environment::new();
    Engine::new()
        .execute(code, &mut env)
        .unwrap_or_else(|e| panic!("script failed: {e}\n--- script ---\n{code}"));
    env
}

/// Evaluate `expr` and return its value.
fn value(expr: &str) -> Value {
    let env = eval(&format!("result = {expr};"));
    env.get("result").cloned().unwrap_or_default()
}

fn error(code: &str) -> ScriptErrorKind {
    let mut env = Environment::new();
    match Engine::new().execute(code, &mut env) {
        Ok(()) => panic!("expected {code:?} to fail"),
        Err(e) => e.kind,
    }
}

// -----------------------------------------------------------
// Operators and coercions.
// -----------------------------------------------------------

#[test]
fn arithmetic_precedence() {
    assert_eq!(value("1 + 2 * 3"), Value::from(7));
    assert_eq!(value("(1 + 2) * 3"), Value::from(9));
    assert_eq!(value("2 ** 3 ** 2"), Value::from(512));
    assert_eq!(value("7 % 3 - 10 / 4"), Value::from(-1.5));
}

#[test]
fn string_concatenation() {
    assert_eq!(value("'a' + 1 + 2"), Value::from("a12"));
    assert_eq!(value("1 + 2 + 'a'"), Value::from("3a"));
    assert_eq!(value("'n=' + [1, 2]"), Value::from("n=1,2"));
}

#[test]
fn equality_and_comparison() {
    assert_eq!(value("'1' == 1"), Value::from(true));
    assert_eq!(value("'1' === 1"), Value::from(false));
    assert_eq!(value("null == undefined"), Value::from(true));
    assert_eq!(value("null === undefined"), Value::from(false));
    assert_eq!(value("'abc' < 'abd'"), Value::from(true));
    assert_eq!(value("[1, 2] === [1, 2]"), Value::from(true));
}

#[test]
fn ternary_is_right_associative() {
    assert_eq!(
        value("5 > 3 ? 'big' : 5 > 1 ? 'medium' : 'small'"),
        Value::from("big")
    );
    assert_eq!(
        value("2 > 3 ? 'big' : 2 > 1 ? 'medium' : 'small'"),
        Value::from("medium")
    );
}

#[test]
fn special_numbers() {
    assert_eq!(value("1 / 0"), Value::Number(f64::INFINITY));
    assert!(matches!(value("0 / 0"), Value::Number(n) if n.is_nan()));
    assert_eq!(value("String(0 / 0)"), Value::from("NaN"));
    assert_eq!(value("isNaN('x' * 2)"), Value::from(true));
}

// -----------------------------------------------------------
// Statements and scoping.
// -----------------------------------------------------------

#[test]
fn optional_semicolons() {
    let env = eval("let a = 1\nlet b = a + 1\nc = a + b");
    assert_eq!(env.get("c"), Some(&Value::from(3)));
}

#[test]
fn multiple_declarators() {
    let env = eval("let a = 1, b, c = a + 1;");
    assert_eq!(env.get("a"), Some(&Value::from(1)));
    assert_eq!(env.get("b"), Some(&Value::Undefined));
    assert_eq!(env.get("c"), Some(&Value::from(2)));
}

#[test]
fn var_in_block_reaches_environment() {
    let env = eval("{ var a = 1; let b = 2; }");
    assert_eq!(env.get("a"), Some(&Value::from(1)));
    assert!(!env.contains("b"));
}

#[test]
fn shadowing_in_nested_blocks() {
    let env = eval(
        "let out = '';\n\
         let x = 'outer';\n\
         {\n\
           let x = 'inner';\n\
           out += x;\n\
         }\n\
         out += '-' + x;",
    );
    assert_eq!(env.get("out"), Some(&Value::from("inner-outer")));
}

#[test]
fn nested_loops_with_break() {
    let env = eval(
        "let pairs = [];\n\
         for (let i = 0; i < 3; i++) {\n\
           for (let j = 0; j < 3; j++) {\n\
             if (j > i) break;\n\
             pairs.push(i * 10 + j);\n\
           }\n\
         }",
    );
    assert_eq!(
        env.get("pairs"),
        Some(&Value::from(vec![0, 10, 11, 20, 21, 22]))
    );
}

#[test]
fn return_from_inside_loop() {
    let env = eval(
        "function find(xs, wanted) {\n\
           for (const x of xs) {\n\
             if (x === wanted) return 'found ' + x;\n\
           }\n\
           return 'missing';\n\
         }\n\
         a = find([1, 2, 3], 2);\n\
         b = find([1, 2, 3], 9);",
    );
    assert_eq!(env.get("a"), Some(&Value::from("found 2")));
    assert_eq!(env.get("b"), Some(&Value::from("missing")));
}

#[test]
fn functions_do_not_see_caller_locals() {
    let err = error(
        "function peek() { return hidden; }\n\
         { let hidden = 1; peek(); }",
    );
    assert_eq!(err, ScriptErrorKind::UndefinedVariable("hidden".into()));
}

#[test]
fn missing_arguments_are_undefined() {
    let env = eval("function f(a, b) { return typeof b; } r = f(1);");
    assert_eq!(env.get("r"), Some(&Value::from("undefined")));
}

// -----------------------------------------------------------
// Builtins.
// -----------------------------------------------------------

#[test]
fn math_functions() {
    assert_eq!(value("Math.floor(2.7) + Math.ceil(2.1)"), Value::from(5));
    assert_eq!(value("Math.min(4, 2, 8)"), Value::from(2));
    assert_eq!(value("Math.sqrt(16) + Math.abs(-1)"), Value::from(5));
    assert_eq!(value("Math.trunc(-4.7)"), Value::from(-4));
}

#[test]
fn json_stringify_sorts_keys() {
    assert_eq!(
        value("JSON.stringify({ b: 1, a: [1, 'x', null] })"),
        Value::from(r#"{"a":[1,"x",null],"b":1}"#)
    );
}

#[test]
fn conversions() {
    assert_eq!(value("Number('  42 ')"), Value::from(42));
    assert_eq!(value("parseFloat('3.5kg')"), Value::from(3.5));
    assert_eq!(value("parseInt('101', 2)"), Value::from(5));
    assert_eq!(value("Boolean('')"), Value::from(false));
    assert_eq!(value("String([1, [2, 3]])"), Value::from("1,2,3"));
}

#[test]
fn string_methods() {
    assert_eq!(value("'  pad '.trim().padStart(5, '*')"), Value::from("**pad"));
    assert_eq!(value("'a-b-c'.split('-').length"), Value::from(3));
    assert_eq!(value("'hello'.charAt(1) + 'hello'[4]"), Value::from("eo"));
    assert_eq!(value("'Hello'.startsWith('He') && 'Hello'.endsWith('lo')"), Value::from(true));
    assert_eq!(value("'abc'.length"), Value::from(3));
}

#[test]
fn array_methods() {
    let env = eval("let xs = [3, 1, 2]; last = xs.pop(); n = xs.push(7, 8); s = xs.slice(-2).join('|');");
    assert_eq!(env.get("xs"), Some(&Value::from(vec![3, 1, 7, 8])));
    assert_eq!(env.get("last"), Some(&Value::from(2)));
    assert_eq!(env.get("n"), Some(&Value::from(4)));
    assert_eq!(env.get("s"), Some(&Value::from("7|8")));
}

#[test]
fn push_into_nested_array() {
    let env = eval("let o = { items: [] }; o.items.push('a'); o.items.push('b');");
    assert_eq!(
        value_of(&env, "o"),
        Value::from(serde_json::json!({ "items": ["a", "b"] }))
    );
}

fn value_of(env: &Environment, name: &str) -> Value {
    env.get(name).cloned().unwrap_or_default()
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn syntax_errors() {
    assert!(matches!(
        error("let = 3;"),
        ScriptErrorKind::UnexpectedToken { .. }
    ));
    assert!(matches!(error("let a = (1 + 2"), ScriptErrorKind::UnexpectedEnd { .. }));
    assert_eq!(error("1 = 2;"), ScriptErrorKind::InvalidAssignmentTarget);
    assert_eq!(error("let s = 'open"), ScriptErrorKind::UnterminatedString);
    assert_eq!(error("let a = 1 @ 2"), ScriptErrorKind::UnexpectedCharacter('@'));
}

#[test]
fn placement_errors() {
    assert_eq!(error("continue;"), ScriptErrorKind::ContinueOutsideLoop);
    assert_eq!(error("return 1;"), ScriptErrorKind::ReturnOutsideFunction);
    assert_eq!(
        error("function f() { break; }"),
        ScriptErrorKind::BreakOutsideLoop
    );
}

#[test]
fn runtime_type_errors() {
    assert!(matches!(error("null.x;"), ScriptErrorKind::Type(_)));
    assert!(matches!(error("for (const x of 3) {}"), ScriptErrorKind::Type(_)));
    assert_eq!(error("'a'();"), ScriptErrorKind::NotCallable("expression".into()));
}

#[test]
fn parse_reports_position() {
    let err = parse("let a = 1;\nlet b = ;").unwrap_err();
    assert_eq!((err.span.row, err.span.column), (1, 8));
    assert!(err.is_syntax());
}
