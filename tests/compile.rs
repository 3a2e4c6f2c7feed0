use jackc::{compile, CompileError, LexErrorKind, ParseError, StageError};

const LIST: &str = include_str!("fixtures/List.jack");

fn lines(source: &str) -> Vec<String> {
    compile(source, "Test.jack")
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn compile_error(source: &str) -> StageError {
    compile(source, "Test.jack").unwrap_err().stage
}

/// Checks that a line belongs to the textual VM instruction grammar.
fn is_vm_instruction(line: &str) -> bool {
    const SEGMENTS: [&str; 8] = [
        "constant", "argument", "local", "static", "this", "that", "pointer", "temp",
    ];
    const ARITHMETIC: [&str; 9] = ["add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not"];
    let words: Vec<&str> = line.split(' ').collect();
    let is_number = |w: &str| w.parse::<u16>().is_ok_and(|n| n <= 32767);
    match words.as_slice() {
        [op] => ARITHMETIC.contains(op) || *op == "return",
        ["push" | "pop", segment, index] => SEGMENTS.contains(segment) && is_number(index),
        ["label" | "goto" | "if-goto", label] => !label.is_empty(),
        ["function" | "call", name, count] => name.contains('.') && is_number(count),
        _ => false,
    }
}

#[test]
fn empty_function_returns_zero() {
    assert_eq!(
        lines("class Main { function void main() { return; } }"),
        vec!["function Main.main 0", "push constant 0", "return"]
    );
}

#[test]
fn let_lowers_operands_then_operator() {
    assert_eq!(
        lines("class Main { function void main() { var int x; let x = 1 + 2; return; } }"),
        vec![
            "function Main.main 1",
            "push constant 1",
            "push constant 2",
            "add",
            "pop local 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn if_else_label_layout() {
    let code = lines(
        "class Main { function void main() { var int x, y;
            if (x) { let y = 1; } else { let y = 2; } return; } }",
    );
    assert_eq!(
        &code[1..12],
        [
            "push local 0",
            "if-goto IF_TRUE0",
            "goto IF_FALSE0",
            "label IF_TRUE0",
            "push constant 1",
            "pop local 1",
            "goto IF_END0",
            "label IF_FALSE0",
            "push constant 2",
            "pop local 1",
            "label IF_END0",
        ]
    );
}

#[test]
fn method_call_on_a_field() {
    let code = lines(
        "class Boss { field Worker obj;
            method void go() { do obj.run(5); return; } }",
    );
    assert_eq!(
        code,
        vec![
            "function Boss.go 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "push constant 5",
            "call Worker.run 2",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn integer_constants_stop_at_32767() {
    let code = lines("class Main { function int max() { return 32767; } }");
    assert_eq!(code[1], "push constant 32767");

    match compile_error("class Main { function int max() { return 32768; } }") {
        StageError::Lex(err) => {
            assert_eq!(err.kind, LexErrorKind::IntegerOutOfRange("32768".to_owned()))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn trailing_tokens_are_rejected() {
    assert!(matches!(
        compile_error("class Main { } }"),
        StageError::Parse(ParseError::TrailingInput { .. })
    ));
    assert!(matches!(
        compile_error("class Main { } let"),
        StageError::Parse(ParseError::TrailingInput { .. })
    ));
}

#[test]
fn unknown_characters_report_their_offset() {
    match compile_error("class Main { $ }") {
        StageError::Lex(err) => {
            assert_eq!(err.offset, 13);
            assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('$'));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn errors_are_labeled_with_the_filename() {
    let err: CompileError =
        compile("class Main { function void f() { let q = 1; return; } }", "src/Main.jack")
            .unwrap_err();
    assert_eq!(err.filename, "src/Main.jack");
    let message = err.to_string();
    assert!(message.starts_with("src/Main.jack: "), "{}", message);
    assert!(message.contains("'q'"), "{}", message);
}

#[test]
fn fixture_compiles_to_valid_instructions() {
    let code = lines(LIST);
    assert!(!code.is_empty());
    for line in &code {
        assert!(is_vm_instruction(line), "not a VM instruction: {:?}", line);
    }
    let functions: Vec<&str> = code
        .iter()
        .filter(|l| l.starts_with("function "))
        .map(String::as_str)
        .collect();
    assert_eq!(
        functions,
        vec![
            "function List.new 0",
            "function List.getData 0",
            "function List.getNext 0",
            "function List.print 1",
            "function List.sum 3",
            "function List.count 0",
            "function List.dispose 0",
        ]
    );
}

#[test]
fn fixture_constructor_and_statics() {
    let code = lines(LIST);
    assert_eq!(
        &code[..12],
        [
            "function List.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
            "push argument 1",
            "pop this 1",
            "push static 0",
            "push constant 1",
            "add",
            "pop static 0",
        ]
    );
}

#[test]
fn fixture_calls_through_variables_use_their_type() {
    let code = lines(LIST);
    let print_start = code
        .iter()
        .position(|l| l == "function List.print 1")
        .unwrap();
    assert_eq!(
        &code[print_start + 12..print_start + 17],
        [
            "push local 0",
            "call List.getData 1",
            "call Output.printInt 1",
            "pop temp 0",
            "push constant 32",
        ]
    );
    assert!(code.contains(&"call Array.dispose 1".to_owned()));
    assert!(code.contains(&"call Memory.deAlloc 1".to_owned()));
}

#[test]
fn compiling_twice_is_identical() {
    assert_eq!(
        compile(LIST, "List.jack").unwrap(),
        compile(LIST, "List.jack").unwrap()
    );
}

#[test]
fn labels_restart_in_each_subroutine() {
    let code = lines(LIST);
    let sum_start = code.iter().position(|l| l == "function List.sum 3").unwrap();
    let dispose_start = code
        .iter()
        .position(|l| l == "function List.dispose 0")
        .unwrap();
    assert!(code[sum_start..dispose_start].contains(&"label IF_END0".to_owned()));
    assert!(code[dispose_start..].contains(&"label IF_TRUE0".to_owned()));
    assert!(!code[dispose_start..].contains(&"label IF_END0".to_owned()));
}

#[test]
fn deeply_nested_calls_are_an_error_not_a_crash() {
    let source = format!(
        "class A {{ function int f(Array a) {{ return {}1{}; }} }}",
        "f(".repeat(250),
        ")".repeat(250)
    );
    assert!(matches!(
        compile_error(&source),
        StageError::Parse(ParseError::NestingTooDeep { .. })
    ));
}
