use gijigo::{
    error::{Error, ParseError, RuntimeError},
    evaluate_formula,
    interpreter::value::core::Value,
    program::Program,
    run_source,
};

fn assert_success(src: &str) -> Program {
    match run_source(src) {
        Ok((program, _)) => program,
        Err(e) => panic!("Script failed: {e}"),
    }
}

fn assert_failure(src: &str) -> Error {
    match run_source(src) {
        Ok(_) => panic!("Script succeeded but was expected to fail"),
        Err(e) => e,
    }
}

fn assert_binding(src: &str, name: &str, expected: Value) {
    let program = assert_success(src);
    assert_eq!(program.main().store().get(name), Some(&expected), "binding of '{name}'");
}

fn formula(src: &str) -> Value {
    evaluate_formula(src).unwrap_or_else(|e| panic!("Formula '{src}' failed: {e}"))
}

fn array(values: &[i64]) -> Value {
    Value::from(values.iter().copied().map(Value::Integer).collect::<Vec<_>>())
}

#[test]
fn arithmetic_follows_precedence() {
    assert_eq!(formula("1+2+3*4*5-6-7"), Value::Integer(50));
    assert_eq!(formula("((1+2)*3-4)*5"), Value::Integer(25));
    assert_eq!(formula("－3 ＋ 5 × 2"), Value::Integer(7));
    assert_eq!(formula("7 / 2"), Value::Real(3.5));
    assert_eq!(formula("7 ÷ 2 の商"), Value::Integer(3));
    assert_eq!(formula("-7 ÷ 2 の余り"), Value::Integer(1));
    assert_eq!(formula("7 mod 3"), Value::Integer(1));
    assert_eq!(formula("1 + 0.5"), Value::Real(1.5));
}

#[test]
fn logic_and_bitwise_operators() {
    assert_eq!(formula("6 & 3"), Value::Integer(2));
    assert_eq!(formula("6 | 3"), Value::Integer(7));
    assert_eq!(formula("true かつ not false"), Value::Bool(true));
    assert_eq!(formula("1 > 2 または 2 > 1"), Value::Bool(true));
    assert_eq!(formula("1 < 2 and 3 < 2 | true"), Value::Bool(true));
}

#[test]
fn comparison_chains_are_pairwise() {
    assert_eq!(formula("2<3<4"), Value::Bool(true));
    assert_eq!(formula("2<3>4"), Value::Bool(false));
    assert_eq!(formula("1 = 1.0"), Value::Bool(true));
    assert_eq!(formula("1 ≠ 2"), Value::Bool(true));
}

#[test]
fn natural_language_predicates_match_symbols() {
    assert_eq!(formula("1 が 1以上"), formula("1>=1"));
    assert_eq!(formula("1 が 1未満"), formula("1<1"));
    assert_eq!(formula("3 が 2 より大きい"), Value::Bool(true));
    assert_eq!(formula("6 が 3 で割り切れる"), Value::Bool(true));
    assert_eq!(formula("7 が 3 で割り切れない"), Value::Bool(true));
    assert_eq!(formula("2 が 2 と等しくない"), Value::Bool(false));
}

#[test]
fn declarations_and_assignments() {
    assert_binding("整数型: x ← 1 + 2", "x", Value::Integer(3));
    assert_binding("整数型: x, y ← 4\nx ← y * 2", "x", Value::Integer(8));
    assert_binding("実数型: r\n", "r", Value::Undefined);
    assert_binding("論理型: b ← 3 が 2 以上", "b", Value::Bool(true));
    assert_binding("x <- 5\nx ＜－ x - 1", "x", Value::Integer(4));
}

#[test]
fn arrays_index_from_one() {
    let src = "整数型の配列: a ← {{1,2},{3,4},{5,6}}\n\
               整数型: rows ← aの行数, cols ← aの列数, e ← a[2][1]\n";
    let program = assert_success(src);
    let store = program.main().store();
    assert_eq!(store.get("rows"), Some(&Value::Integer(3)));
    assert_eq!(store.get("cols"), Some(&Value::Integer(2)));
    assert_eq!(store.get("e"), Some(&Value::Integer(3)));
}

#[test]
fn arrays_are_copied_on_assignment() {
    let src = "整数型の配列: a ← {1, 2, 3}, b\nb ← a\nb[1] ← 9\n";
    let program = assert_success(src);
    let store = program.main().store();
    assert_eq!(store.get("a"), Some(&array(&[1, 2, 3])));
    assert_eq!(store.get("b"), Some(&array(&[9, 2, 3])));
}

#[test]
fn append_grows_the_target() {
    assert_binding("整数型の配列: a ← {}\naの末尾に 1 を追加する\na の末尾に 2 を追加する",
                   "a",
                   array(&[1, 2]));
    assert_binding("整数型の二次元配列: m ← {{1}, {}}\nm[2]の末尾に 5 を追加する",
                   "m",
                   Value::from(vec![array(&[1]), array(&[5])]));
}

#[test]
fn control_blocks() {
    let src = "\
整数型: n ← 0, i ← 0
while (i < 4)
    i ← i + 1
    if (i mod 2 = 0)
        n ← n + i
    endif
endwhile
";
    assert_binding(src, "n", Value::Integer(6));

    let src = "\
整数型: x ← 3, label
if (x が 1 と等しい)
    label ← 1
elseif (x が 2 と等しい)
    label ← 2
elseif (x が 3 と等しい)
    label ← 3
endif
";
    assert_binding(src, "label", Value::Integer(3));
}

#[test]
fn for_loop_sums_odd_numbers() {
    let src = "整数型: s ← 0\nfor (v を 1 から 10 まで 2 ずつ増やす)\n    s ← s + v\nendfor\n";
    assert_binding(src, "s", Value::Integer(25));
}

#[test]
fn functions_return_first_reached_value() {
    let src = "\
○整数型: sign(整数型: n)
    if (n < 0)
        return -1
    elseif (n = 0)
        return 0
    endif
    return 1
整数型: a ← sign(-5), b ← sign(0), c ← sign(8)
";
    let program = assert_success(src);
    let store = program.main().store();
    assert_eq!(store.get("a"), Some(&Value::Integer(-1)));
    assert_eq!(store.get("b"), Some(&Value::Integer(0)));
    assert_eq!(store.get("c"), Some(&Value::Integer(1)));
}

#[test]
fn functions_get_their_own_copies() {
    let src = "\
○fill(整数型の配列: a)
    a[1] ← 0
整数型の配列: data ← {7, 8}
fill(data)
";
    assert_binding(src, "data", array(&[7, 8]));
}

#[test]
fn main_program_may_return() {
    let (_, result) = run_source("整数型: x ← 4\nreturn x * x\nx ← 0\n").unwrap();
    assert_eq!(result, Some(Value::Integer(16)));
}

#[test]
fn runtime_errors_stop_execution() {
    assert!(matches!(assert_failure("x ← y + 1"),
                     Error::Runtime(RuntimeError::UnknownVariable { line: 1, .. })));
    assert!(matches!(assert_failure("整数型の配列: a ← {1}\n整数型: x ← a[2]"),
                     Error::Runtime(RuntimeError::IndexOutOfBounds { max: 1, found: 2, line: 2 })));
    assert!(matches!(assert_failure("整数型: x ← 1\n整数型: y ← x[1]"),
                     Error::Runtime(RuntimeError::ExpectedArray { line: 2 })));
    assert!(matches!(assert_failure("整数型: x ← 1 ÷ 0"),
                     Error::Runtime(RuntimeError::DivisionByZero { line: 1 })));
    assert!(matches!(assert_failure("○f(整数型: a)\n    return a\nf()\n"),
                     Error::Runtime(RuntimeError::ArgumentCountMismatch { line: 3, .. })));
    assert!(matches!(assert_failure("整数型の配列: a ← {1}\na ← 2"),
                     Error::Runtime(RuntimeError::TypeError { line: 2, .. })));
}

#[test]
fn compile_errors_name_the_line() {
    let src = "整数型: i ← 0\nwhile (i < 3)\n    i ← i + 1\nendwhil\n";
    assert!(matches!(assert_failure(src), Error::Parse(ParseError::WhileBlock { line: 4 })));

    assert!(matches!(assert_failure("if (true)\n    x ← 1\n"),
                     Error::Parse(ParseError::IfBlock { .. })));
    assert!(matches!(assert_failure("x ← 1\n    y ← 2\n"),
                     Error::Parse(ParseError::Indentation { line: 2 })));
    assert!(matches!(assert_failure("x ← (1 + 2"),
                     Error::Parse(ParseError::UnmatchedParenthesis { line: 1 })));
    assert!(matches!(assert_failure("x ← g(1)"),
                     Error::Parse(ParseError::InvalidFunctionCall { line: 1, .. })));
    assert!(matches!(assert_failure("for (i を 1 から)\nendfor\n"),
                     Error::Parse(ParseError::InvalidForHeader { line: 1 })));
}

#[test]
fn comments_and_blank_lines_keep_line_numbers() {
    let src = "// header\n\n整数型: x ← 1 // one\n\nx ← z\n";
    assert!(matches!(assert_failure(src),
                     Error::Runtime(RuntimeError::UnknownVariable { line: 5, .. })));
}
