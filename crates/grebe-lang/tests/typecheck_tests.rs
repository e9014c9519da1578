use grebe_lang::check::{type_of_expr, type_of_program, CheckError, Checker};
use grebe_lang::errors::ErrorCode;
use grebe_lang::parser::parse;
use grebe_lang::types::TypeEnv;

fn well_typed(src: &str) -> String {
    match type_of_program(src) {
        Ok(ty) => ty,
        Err(e) => panic!("expected {src:?} to be well-typed, got: {e}"),
    }
}

fn ill_typed(src: &str) -> (ErrorCode, String) {
    match type_of_program(src) {
        Err(CheckError::Type(e)) => (e.code, e.message),
        Ok(ty) => panic!("expected {src:?} to be ill-typed, got type {ty}"),
        Err(CheckError::Parse(e)) => panic!("expected a type error for {src:?}, got: {e}"),
    }
}

#[test]
fn identity_application_is_number() {
    assert_eq!(well_typed("((lambda ((x : number)) : number x) 5)"), "number");
}

#[test]
fn conditional_with_matching_branches() {
    assert_eq!(well_typed("(if #t 1 2)"), "number");
}

#[test]
fn conditional_with_mismatched_branches_names_both_types() {
    let (code, message) = ill_typed("(if #t 1 \"a\")");
    assert_eq!(code, ErrorCode::E0200);
    assert!(message.contains("number"), "message: {message}");
    assert!(message.contains("string"), "message: {message}");
    // The offending expression is embedded in the message
    assert!(message.contains("(if #t 1 \"a\")"), "message: {message}");
}

#[test]
fn program_with_annotated_define() {
    let src = "(define (id : (number -> number)) (lambda (x) x)) (id 5)";
    assert_eq!(well_typed(src), "number");
}

#[test]
fn defines_thread_left_to_right() {
    let src = "(define (one : number) 1) \
               (define (two : number) (+ one one)) \
               (+ one two)";
    assert_eq!(well_typed(src), "number");
}

#[test]
fn later_define_is_not_visible_earlier() {
    let src = "(+ one one) (define (one : number) 1)";
    let (code, _) = ill_typed(src);
    assert_eq!(code, ErrorCode::E0201);
}

#[test]
fn program_result_skips_trailing_defines() {
    let src = "\"result\" (define (x : number) 5)";
    assert_eq!(well_typed(src), "string");
}

#[test]
fn letrec_non_lambda_binding_is_rejected() {
    let (code, message) = ill_typed("(letrec ((x 5)) x)");
    assert_eq!(code, ErrorCode::E0202);
    assert!(
        message.contains("letrec only supports procedure bindings"),
        "message: {message}"
    );
}

#[test]
fn letrec_factorial() {
    let src = "(letrec ((fact (lambda ((n : number)) : number \
                  (if (= n 0) 1 (* n (fact (- n 1))))))) \
                 (fact 5))";
    assert_eq!(well_typed(src), "number");
}

#[test]
fn quoted_literal_asymmetry() {
    // A top-level quoted numeral is *not* typed as number, but the same
    // numeral nested inside a quoted pair is.
    assert_eq!(well_typed("'5"), "literal");
    assert_eq!(well_typed("'(5 . 6)"), "(Pair number number)");
}

#[test]
fn cons_builds_a_pair_type() {
    assert_eq!(well_typed("(cons 1 2)"), "(Pair number number)");
}

#[test]
fn arity_mismatch_beats_argument_types() {
    // Both arguments would unify with number; the count is still wrong.
    let (code, _) = ill_typed("((lambda ((x : number)) : number x) 1 2)");
    assert_eq!(code, ErrorCode::E0202);
}

#[test]
fn occurs_check_rejects_infinite_type() {
    // f's result feeds back into its own return type through cons.
    let (code, message) = ill_typed("(letrec ((f (lambda (x) (cons (f 1) 1)))) 1)");
    assert_eq!(code, ErrorCode::E0203);
    assert!(message.contains("occurs check failed"), "message: {message}");
}

#[test]
fn applying_a_non_procedure_value() {
    let (code, message) = ill_typed("(5 6)");
    assert_eq!(code, ErrorCode::E0200);
    assert!(
        message.contains("application of non-procedure"),
        "message: {message}"
    );
}

#[test]
fn deep_nesting_terminates() {
    let mut src = String::from("1");
    for _ in 0..200 {
        src = format!("(+ {src} 1)");
    }
    assert_eq!(well_typed(&src), "number");
}

#[test]
fn inference_is_deterministic_across_runs() {
    let src = "(letrec ((even? (lambda ((n : number)) : boolean \
                  (if (= n 0) #t (odd? (- n 1))))) \
                (odd? (lambda ((n : number)) : boolean \
                  (if (= n 0) #f (even? (- n 1)))))) \
                 (even? 10))";
    let first = well_typed(src);
    let second = well_typed(src);
    assert_eq!(first, second);
    assert_eq!(first, "boolean");
}

#[test]
fn expr_entry_point_checks_one_expression() {
    assert_eq!(type_of_expr("(cons #t \"s\")").unwrap(), "(Pair boolean string)");
}

#[test]
fn parse_errors_surface_through_entry_points() {
    match type_of_program("(+ 1") {
        Err(CheckError::Parse(e)) => assert_eq!(e.code, ErrorCode::E0102),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn checker_can_thread_forms_like_a_repl() {
    let mut checker = Checker::new();
    let mut env = TypeEnv::empty();

    let forms = parse("(define (x : number) 5)").unwrap();
    let (next, result) = checker.infer_form(&forms[0], &env).unwrap();
    assert!(result.is_none(), "define yields no result type");
    env = next;

    let forms = parse("(+ x 1)").unwrap();
    let (_, result) = checker.infer_form(&forms[0], &env).unwrap();
    let ty = result.expect("expression yields a type");
    assert_eq!(checker.resolve(&ty).to_string(), "number");
}

#[test]
fn display_signature_is_fresh_per_use() {
    // Two display call sites must not share a type variable.
    assert_eq!(well_typed("((lambda () : void (display 1) (display \"s\") (newline)))"), "void");
}
