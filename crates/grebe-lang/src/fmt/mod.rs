//! Wadler-Lindig style pretty printer for Grebe source code.
//!
//! Works on reader datums, so quoted data and type annotations format the
//! same way as code. Comments are lost (the lexer strips them).

use crate::ast::{Datum, DatumKind};
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Document algebra
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Doc {
    Nil,
    Text(String),
    /// Soft line break: rendered as a space when flat, newline when broken.
    Line,
    Indent(i32, Box<Doc>),
    Concat(Box<Doc>, Box<Doc>),
    /// Try to render contents flat first; break if it exceeds the width.
    Group(Box<Doc>),
}

fn nil() -> Doc {
    Doc::Nil
}

fn text(s: impl Into<String>) -> Doc {
    Doc::Text(s.into())
}

fn line() -> Doc {
    Doc::Line
}

fn indent(n: i32, d: Doc) -> Doc {
    Doc::Indent(n, Box::new(d))
}

fn concat(a: Doc, b: Doc) -> Doc {
    Doc::Concat(Box::new(a), Box::new(b))
}

fn group(d: Doc) -> Doc {
    Doc::Group(Box::new(d))
}

/// Concatenate a sequence of docs with a separator in between.
fn intersperse(docs: Vec<Doc>, sep: Doc) -> Doc {
    let mut iter = docs.into_iter();
    let first = match iter.next() {
        Some(d) => d,
        None => return nil(),
    };
    iter.fold(first, |acc, d| concat(concat(acc, sep.clone()), d))
}

/// Concatenate docs with no separator.
fn concat_all(docs: Vec<Doc>) -> Doc {
    docs.into_iter().fold(nil(), concat)
}

// ---------------------------------------------------------------------------
// Rendering (fits / format)
// ---------------------------------------------------------------------------

const DEFAULT_WIDTH: usize = 80;
const INDENT_SIZE: i32 = 2;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Flat,
    Break,
}

/// Stack entry for the renderer: (indent level, mode, document).
type DocCmd<'a> = (i32, Mode, &'a Doc);

fn render(doc: &Doc, width: usize) -> String {
    let mut out = String::new();
    let mut stack: Vec<DocCmd> = vec![(0, Mode::Break, doc)];
    let mut col: usize = 0;

    while let Some((ind, mode, d)) = stack.pop() {
        match d {
            Doc::Nil => {}
            Doc::Text(s) => {
                out.push_str(s);
                col += s.len();
            }
            Doc::Line => match mode {
                Mode::Flat => {
                    out.push(' ');
                    col += 1;
                }
                Mode::Break => {
                    out.push('\n');
                    for _ in 0..ind {
                        out.push(' ');
                    }
                    col = ind as usize;
                }
            },
            Doc::Indent(n, inner) => {
                stack.push((ind + n, mode, inner));
            }
            Doc::Concat(a, b) => {
                // Push b first so a is processed first (stack is LIFO).
                stack.push((ind, mode, b));
                stack.push((ind, mode, a));
            }
            Doc::Group(inner) => {
                if fits(width as i32 - col as i32, &[(ind, Mode::Flat, inner)]) {
                    stack.push((ind, Mode::Flat, inner));
                } else {
                    stack.push((ind, Mode::Break, inner));
                }
            }
        }
    }

    out
}

/// Check whether the document fits within `remaining` columns when
/// rendered flat.
fn fits(mut remaining: i32, cmds: &[DocCmd]) -> bool {
    let mut stack: Vec<DocCmd> = cmds.iter().rev().cloned().collect();

    while remaining >= 0 {
        let (ind, mode, d) = match stack.pop() {
            Some(cmd) => cmd,
            None => return true,
        };
        match d {
            Doc::Nil => {}
            Doc::Text(s) => {
                remaining -= s.len() as i32;
            }
            Doc::Line => match mode {
                Mode::Flat => {
                    remaining -= 1; // space
                }
                Mode::Break => return true, // line break always fits
            },
            Doc::Indent(n, inner) => {
                stack.push((ind + n, mode, inner));
            }
            Doc::Concat(a, b) => {
                stack.push((ind, mode, b));
                stack.push((ind, mode, a));
            }
            Doc::Group(inner) => {
                stack.push((ind, Mode::Flat, inner));
            }
        }
    }

    false
}

// ---------------------------------------------------------------------------
// Datum -> Doc conversion
// ---------------------------------------------------------------------------

/// Escape special characters in a string literal for output.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn datum_to_doc(datum: &Datum) -> Doc {
    match &datum.kind {
        DatumKind::Number(_) | DatumKind::Bool(_) | DatumKind::Symbol(_) => {
            text(datum.to_string())
        }
        DatumKind::Str(s) => text(format!("\"{}\"", escape_string(s))),
        DatumKind::List(items) => list_to_doc(items),
        DatumKind::DottedList(items, tail) => dotted_to_doc(items, tail),
    }
}

/// Format a list `(head args...)` with form-specific rules.
fn list_to_doc(items: &[Datum]) -> Doc {
    if items.is_empty() {
        return text("()");
    }

    let head_name = match &items[0].kind {
        DatumKind::Symbol(s) => Some(s.as_str()),
        _ => None,
    };

    match head_name {
        // (quote x) prints back as 'x
        Some("quote") if items.len() == 2 => concat(text("'"), datum_to_doc(&items[1])),
        Some("define") => define_to_doc(items),
        Some("lambda") => lambda_to_doc(items),
        Some("let") | Some("letrec") => let_to_doc(items),
        Some("if") => if_to_doc(items),
        _ => generic_list_to_doc(items),
    }
}

/// `(define var val)` — var on the first line, value indented if it breaks.
fn define_to_doc(items: &[Datum]) -> Doc {
    if items.len() != 3 {
        return generic_list_to_doc(items);
    }

    let header = concat_all(vec![
        text("(define "),
        datum_to_doc(&items[1]),
    ]);
    group(concat_all(vec![
        header,
        indent(INDENT_SIZE, concat(line(), datum_to_doc(&items[2]))),
        text(")"),
    ]))
}

/// `(lambda (params) [: type] body...)` — header on the first line, body
/// indented.
fn lambda_to_doc(items: &[Datum]) -> Doc {
    if items.len() < 3 {
        return generic_list_to_doc(items);
    }

    let mut header = vec![text("(lambda "), datum_to_doc(&items[1])];
    let mut body_start = 2;
    if matches!(&items[2].kind, DatumKind::Symbol(s) if s == ":") && items.len() >= 4 {
        header.push(text(" : "));
        header.push(datum_to_doc(&items[3]));
        body_start = 4;
    }

    let body_docs: Vec<Doc> = items[body_start..].iter().map(datum_to_doc).collect();
    let body = intersperse(body_docs, line());

    group(concat_all(vec![
        concat_all(header),
        indent(INDENT_SIZE, concat(line(), body)),
        text(")"),
    ]))
}

/// `(let (bindings) body...)` and `(letrec ...)` — bindings on the first
/// line, body indented.
fn let_to_doc(items: &[Datum]) -> Doc {
    if items.len() < 3 {
        return generic_list_to_doc(items);
    }

    let keyword = datum_to_doc(&items[0]);
    let bindings = datum_to_doc(&items[1]);

    let body_docs: Vec<Doc> = items[2..].iter().map(datum_to_doc).collect();
    let body = intersperse(body_docs, line());

    group(concat_all(vec![
        text("("),
        keyword,
        text(" "),
        bindings,
        indent(INDENT_SIZE, concat(line(), body)),
        text(")"),
    ]))
}

/// `(if test then else)` — test on the first line, branches indented.
fn if_to_doc(items: &[Datum]) -> Doc {
    if items.len() != 4 {
        return generic_list_to_doc(items);
    }

    let branches = intersperse(
        vec![datum_to_doc(&items[2]), datum_to_doc(&items[3])],
        line(),
    );

    group(concat_all(vec![
        text("(if "),
        datum_to_doc(&items[1]),
        indent(INDENT_SIZE, concat(line(), branches)),
        text(")"),
    ]))
}

/// Generic list: inline if it fits, head on the first line + args indented.
fn generic_list_to_doc(items: &[Datum]) -> Doc {
    if items.len() == 1 {
        return concat_all(vec![text("("), datum_to_doc(&items[0]), text(")")]);
    }

    let head = datum_to_doc(&items[0]);
    let arg_docs: Vec<Doc> = items[1..].iter().map(datum_to_doc).collect();
    let args = intersperse(arg_docs, line());

    group(concat_all(vec![
        text("("),
        head,
        indent(INDENT_SIZE, concat(line(), args)),
        text(")"),
    ]))
}

/// Improper list `(a b . c)`.
fn dotted_to_doc(items: &[Datum], tail: &Datum) -> Doc {
    let docs: Vec<Doc> = items.iter().map(datum_to_doc).collect();
    group(concat_all(vec![
        text("("),
        intersperse(docs, line()),
        text(" . "),
        datum_to_doc(tail),
        text(")"),
    ]))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Format a read Grebe program back to source code.
///
/// Inserts blank lines between top-level `define` forms.
pub fn format_program(data: &[Datum]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (i, datum) in data.iter().enumerate() {
        let doc = datum_to_doc(datum);
        let _ = write!(out, "{}", render(&doc, DEFAULT_WIDTH));

        if i + 1 < data.len() {
            out.push('\n');
            if is_top_level_define(datum) || is_top_level_define(&data[i + 1]) {
                out.push('\n');
            }
        }
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn is_top_level_define(datum: &Datum) -> bool {
    if let DatumKind::List(items) = &datum.kind {
        if let Some(head) = items.first() {
            if let DatumKind::Symbol(s) = &head.kind {
                return s == "define";
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::read_program;

    fn fmt(src: &str) -> String {
        let data = read_program(src).expect("read failed");
        format_program(&data)
    }

    fn assert_idempotent(src: &str) {
        let first = fmt(src);
        let second = fmt(&first);
        assert_eq!(first, second, "formatting is not idempotent for: {src}");
    }

    #[test]
    fn idempotent_simple() {
        assert_idempotent("(+ 1 2)");
    }

    #[test]
    fn idempotent_define() {
        assert_idempotent("(define (id : (number -> number)) (lambda (x) x))");
    }

    #[test]
    fn idempotent_lambda_with_annotation() {
        assert_idempotent("(lambda ((x : number)) : number x)");
    }

    #[test]
    fn idempotent_let() {
        assert_idempotent("(let (((x : number) 5)) (+ x 1))");
    }

    #[test]
    fn idempotent_letrec() {
        assert_idempotent(
            "(letrec ((f (lambda ((n : number)) : number (if (= n 0) 1 (f (- n 1)))))) (f 3))",
        );
    }

    #[test]
    fn idempotent_quote() {
        assert_idempotent("'(1 2 (3 . 4))");
    }

    #[test]
    fn format_simple_application() {
        assert_eq!(fmt("(+ 1 2)"), "(+ 1 2)\n");
    }

    #[test]
    fn format_quote_uses_sugar() {
        assert_eq!(fmt("(quote (5 . 6))"), "'(5 . 6)\n");
    }

    #[test]
    fn format_empty_list() {
        assert_eq!(fmt("'()"), "'()\n");
    }

    #[test]
    fn format_blank_lines_between_defines() {
        let result = fmt("(define x 1) (define y 2)");
        assert!(
            result.contains("\n\n"),
            "expected blank line between defines, got: {result}"
        );
    }

    #[test]
    fn format_breaks_long_bodies() {
        let src = "(define (long-name : (number * number * number -> number)) (lambda (a b c) (+ (+ (* a a) (* b b)) (* c c))))";
        let result = fmt(src);
        assert!(
            result.trim_end().contains('\n'),
            "expected a break, got: {result}"
        );
        // Still idempotent after breaking
        assert_eq!(fmt(&result), result);
    }

    #[test]
    fn format_string_escaping() {
        let result = fmt(r#"(display "hi")"#);
        assert_eq!(result, "(display \"hi\")\n");
    }

    #[test]
    fn format_empty_program() {
        assert_eq!(fmt(""), "");
    }

    #[test]
    fn render_group_fits() {
        let d = group(concat_all(vec![text("a"), line(), text("b")]));
        assert_eq!(render(&d, 80), "a b");
    }

    #[test]
    fn render_group_breaks() {
        let d = group(concat_all(vec![text("a"), line(), text("b")]));
        assert_eq!(render(&d, 2), "a\nb");
    }
}
