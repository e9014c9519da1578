//! Lowering of reader datums into the expression AST.

use super::ParseError;
use crate::ast::{Binding, Datum, DatumKind, Expr, ExprKind, TypeAnn, VarDecl};
use crate::errors::ErrorCode;
use crate::syntax::Span;

/// Operator names the surface syntax treats as primitive references.
/// `list` is recognized here but has no signature-table entry, so applying
/// it is an unknown-primitive type error rather than an unbound variable.
const PRIMITIVE_OPS: &[&str] = &[
    "+", "-", "*", "/", ">", "<", "=", "and", "or", "not", "eq?", "string=?", "number?",
    "boolean?", "string?", "symbol?", "pair?", "list?", "cons", "car", "cdr", "list", "display",
    "newline",
];

pub fn is_primitive_op(name: &str) -> bool {
    PRIMITIVE_OPS.contains(&name)
}

fn malformed(message: impl Into<String>, span: Span) -> ParseError {
    ParseError {
        code: ErrorCode::E0103,
        message: message.into(),
        span,
    }
}

pub fn expr_from_datum(datum: &Datum) -> Result<Expr, ParseError> {
    let span = datum.span;
    match &datum.kind {
        DatumKind::Number(n) => Ok(Expr::new(ExprKind::Num(*n), span)),
        DatumKind::Bool(b) => Ok(Expr::new(ExprKind::Bool(*b), span)),
        DatumKind::Str(s) => Ok(Expr::new(ExprKind::Str(s.clone()), span)),
        DatumKind::Symbol(s) => {
            if is_primitive_op(s) {
                Ok(Expr::new(ExprKind::Prim(s.clone()), span))
            } else {
                Ok(Expr::new(ExprKind::Var(s.clone()), span))
            }
        }
        DatumKind::DottedList(..) => Err(malformed("dotted list in expression position", span)),
        DatumKind::List(items) => {
            let Some(head) = items.first() else {
                return Err(malformed("empty application", span));
            };
            if let DatumKind::Symbol(s) = &head.kind {
                match s.as_str() {
                    "quote" => return parse_quote(items, span),
                    "if" => return parse_if(items, span),
                    "lambda" => return parse_lambda(items, span),
                    "let" => return parse_let(items, span, false),
                    "letrec" => return parse_let(items, span, true),
                    "define" => return parse_define(items, span),
                    _ => {}
                }
            }
            let rator = expr_from_datum(head)?;
            let rands = items[1..]
                .iter()
                .map(expr_from_datum)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::new(
                ExprKind::App {
                    rator: Box::new(rator),
                    rands,
                },
                span,
            ))
        }
    }
}

fn parse_quote(items: &[Datum], span: Span) -> Result<Expr, ParseError> {
    if items.len() != 2 {
        return Err(malformed("quote takes exactly one datum", span));
    }
    Ok(Expr::new(ExprKind::Lit(items[1].clone()), span))
}

fn parse_if(items: &[Datum], span: Span) -> Result<Expr, ParseError> {
    if items.len() != 4 {
        return Err(malformed("if takes a test, a then and an else", span));
    }
    Ok(Expr::new(
        ExprKind::If {
            test: Box::new(expr_from_datum(&items[1])?),
            then: Box::new(expr_from_datum(&items[2])?),
            alt: Box::new(expr_from_datum(&items[3])?),
        },
        span,
    ))
}

/// `(lambda (params...) body...)` or `(lambda (params...) : type body...)`
fn parse_lambda(items: &[Datum], span: Span) -> Result<Expr, ParseError> {
    if items.len() < 3 {
        return Err(malformed("lambda needs a parameter list and a body", span));
    }
    let DatumKind::List(param_data) = &items[1].kind else {
        return Err(malformed("lambda parameters must be a list", items[1].span));
    };
    let params = param_data
        .iter()
        .map(var_decl)
        .collect::<Result<Vec<_>, _>>()?;

    let mut body_start = 2;
    let mut ret = None;
    if matches!(&items[2].kind, DatumKind::Symbol(s) if s == ":") {
        if items.len() < 4 {
            return Err(malformed("lambda return annotation needs a type", span));
        }
        ret = Some(type_ann(&items[3])?);
        body_start = 4;
    }

    let body = items[body_start..]
        .iter()
        .map(expr_from_datum)
        .collect::<Result<Vec<_>, _>>()?;
    if body.is_empty() {
        return Err(malformed("lambda body must not be empty", span));
    }
    Ok(Expr::new(ExprKind::Lambda { params, ret, body }, span))
}

/// `(let ((decl val) ...) body...)`; letrec has the same surface shape.
fn parse_let(items: &[Datum], span: Span, rec: bool) -> Result<Expr, ParseError> {
    let form = if rec { "letrec" } else { "let" };
    if items.len() < 3 {
        return Err(malformed(
            format!("{form} needs a binding list and a body"),
            span,
        ));
    }
    let DatumKind::List(binding_data) = &items[1].kind else {
        return Err(malformed(
            format!("{form} bindings must be a list"),
            items[1].span,
        ));
    };
    let mut bindings = Vec::with_capacity(binding_data.len());
    for b in binding_data {
        let DatumKind::List(pair) = &b.kind else {
            return Err(malformed("binding must be (var val)", b.span));
        };
        if pair.len() != 2 {
            return Err(malformed("binding must be (var val)", b.span));
        }
        bindings.push(Binding {
            var: var_decl(&pair[0])?,
            val: expr_from_datum(&pair[1])?,
        });
    }
    let body = items[2..]
        .iter()
        .map(expr_from_datum)
        .collect::<Result<Vec<_>, _>>()?;
    if body.is_empty() {
        return Err(malformed(format!("{form} body must not be empty"), span));
    }
    let kind = if rec {
        ExprKind::Letrec { bindings, body }
    } else {
        ExprKind::Let { bindings, body }
    };
    Ok(Expr::new(kind, span))
}

/// `(define var val)` or `(define (var : type) val)`
fn parse_define(items: &[Datum], span: Span) -> Result<Expr, ParseError> {
    if items.len() != 3 {
        return Err(malformed("define takes a variable and a value", span));
    }
    Ok(Expr::new(
        ExprKind::Define {
            var: var_decl(&items[1])?,
            val: Box::new(expr_from_datum(&items[2])?),
        },
        span,
    ))
}

/// A binding position: `name` or `(name : type)`.
fn var_decl(datum: &Datum) -> Result<VarDecl, ParseError> {
    match &datum.kind {
        DatumKind::Symbol(s) if s != ":" => Ok(VarDecl {
            name: s.clone(),
            ann: None,
            span: datum.span,
        }),
        DatumKind::List(items) if items.len() == 3 => {
            let DatumKind::Symbol(name) = &items[0].kind else {
                return Err(malformed("binding name must be a symbol", items[0].span));
            };
            if !matches!(&items[1].kind, DatumKind::Symbol(s) if s == ":") {
                return Err(malformed(
                    "expected ':' between name and type",
                    items[1].span,
                ));
            }
            Ok(VarDecl {
                name: name.clone(),
                ann: Some(type_ann(&items[2])?),
                span: datum.span,
            })
        }
        _ => Err(malformed(
            "malformed binding: expected name or (name : type)",
            datum.span,
        )),
    }
}

/// Type annotation syntax: atomic names, `(T1 * ... * Tn -> Tr)`,
/// `(Empty -> Tr)`, `(Pair T1 T2)`, or an opaque type-variable name.
pub fn type_ann(datum: &Datum) -> Result<TypeAnn, ParseError> {
    match &datum.kind {
        DatumKind::Symbol(s) => Ok(match s.as_str() {
            "number" => TypeAnn::Number,
            "boolean" => TypeAnn::Boolean,
            "string" => TypeAnn::String,
            "void" => TypeAnn::Void,
            _ => TypeAnn::Var(s.clone()),
        }),
        DatumKind::List(items) => {
            if matches!(&items.first().map(|d| &d.kind), Some(DatumKind::Symbol(s)) if s == "Pair")
            {
                if items.len() != 3 {
                    return Err(malformed("Pair type takes two components", datum.span));
                }
                return Ok(TypeAnn::Pair(
                    Box::new(type_ann(&items[1])?),
                    Box::new(type_ann(&items[2])?),
                ));
            }
            let arrow = items
                .iter()
                .position(|d| matches!(&d.kind, DatumKind::Symbol(s) if s == "->"))
                .ok_or_else(|| malformed("malformed procedure type: missing ->", datum.span))?;
            let after = &items[arrow + 1..];
            if after.len() != 1 {
                return Err(malformed(
                    "malformed procedure type: expected one return type",
                    datum.span,
                ));
            }
            let ret = type_ann(&after[0])?;
            let before = &items[..arrow];
            let params = if matches!(before, [d] if matches!(&d.kind, DatumKind::Symbol(s) if s == "Empty"))
            {
                Vec::new()
            } else {
                let params = before
                    .iter()
                    .filter(|d| !matches!(&d.kind, DatumKind::Symbol(s) if s == "*"))
                    .map(type_ann)
                    .collect::<Result<Vec<_>, _>>()?;
                if params.is_empty() {
                    return Err(malformed(
                        "procedure type needs parameters or Empty",
                        datum.span,
                    ));
                }
                params
            };
            Ok(TypeAnn::Proc(params, Box::new(ret)))
        }
        _ => Err(malformed("malformed type annotation", datum.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn symbols_classify_as_prim_or_var() {
        let exprs = parse("+ foo cons").unwrap();
        assert!(matches!(exprs[0].kind, ExprKind::Prim(ref s) if s == "+"));
        assert!(matches!(exprs[1].kind, ExprKind::Var(ref s) if s == "foo"));
        assert!(matches!(exprs[2].kind, ExprKind::Prim(ref s) if s == "cons"));
    }

    #[test]
    fn parse_annotated_lambda() {
        let exprs = parse("(lambda ((x : number)) : number x)").unwrap();
        let ExprKind::Lambda { params, ret, body } = &exprs[0].kind else {
            panic!("expected lambda");
        };
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "x");
        assert_eq!(params[0].ann, Some(TypeAnn::Number));
        assert_eq!(ret, &Some(TypeAnn::Number));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn parse_unannotated_lambda() {
        let exprs = parse("(lambda (x y) x)").unwrap();
        let ExprKind::Lambda { params, ret, .. } = &exprs[0].kind else {
            panic!("expected lambda");
        };
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p.ann.is_none()));
        assert!(ret.is_none());
    }

    #[test]
    fn parse_zero_parameter_lambda() {
        let exprs = parse("(lambda () : void (display \"x\"))").unwrap();
        let ExprKind::Lambda { params, .. } = &exprs[0].kind else {
            panic!("expected lambda");
        };
        assert!(params.is_empty());
    }

    #[test]
    fn parse_define_with_proc_annotation() {
        let exprs = parse("(define (id : (number -> number)) (lambda (x) x))").unwrap();
        let ExprKind::Define { var, .. } = &exprs[0].kind else {
            panic!("expected define");
        };
        assert_eq!(var.name, "id");
        assert_eq!(
            var.ann,
            Some(TypeAnn::Proc(
                vec![TypeAnn::Number],
                Box::new(TypeAnn::Number)
            ))
        );
    }

    #[test]
    fn parse_multi_parameter_proc_annotation() {
        let exprs = parse("(define (f : (number * number -> boolean)) f)").unwrap();
        let ExprKind::Define { var, .. } = &exprs[0].kind else {
            panic!("expected define");
        };
        assert_eq!(
            var.ann,
            Some(TypeAnn::Proc(
                vec![TypeAnn::Number, TypeAnn::Number],
                Box::new(TypeAnn::Boolean)
            ))
        );
    }

    #[test]
    fn parse_empty_proc_annotation() {
        let exprs = parse("(define (f : (Empty -> void)) f)").unwrap();
        let ExprKind::Define { var, .. } = &exprs[0].kind else {
            panic!("expected define");
        };
        assert_eq!(var.ann, Some(TypeAnn::Proc(vec![], Box::new(TypeAnn::Void))));
    }

    #[test]
    fn parse_pair_annotation() {
        let exprs = parse("(define (p : (Pair number boolean)) p)").unwrap();
        let ExprKind::Define { var, .. } = &exprs[0].kind else {
            panic!("expected define");
        };
        assert_eq!(
            var.ann,
            Some(TypeAnn::Pair(
                Box::new(TypeAnn::Number),
                Box::new(TypeAnn::Boolean)
            ))
        );
    }

    #[test]
    fn unknown_annotation_name_is_a_type_variable() {
        let exprs = parse("(define (f : (T -> boolean)) f)").unwrap();
        let ExprKind::Define { var, .. } = &exprs[0].kind else {
            panic!("expected define");
        };
        assert_eq!(
            var.ann,
            Some(TypeAnn::Proc(
                vec![TypeAnn::Var("T".to_string())],
                Box::new(TypeAnn::Boolean)
            ))
        );
    }

    #[test]
    fn parse_let_bindings() {
        let exprs = parse("(let (((x : number) 5) (y 7)) (+ x y))").unwrap();
        let ExprKind::Let { bindings, body } = &exprs[0].kind else {
            panic!("expected let");
        };
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].var.name, "x");
        assert_eq!(bindings[0].var.ann, Some(TypeAnn::Number));
        assert_eq!(bindings[1].var.name, "y");
        assert!(bindings[1].var.ann.is_none());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn quote_form_and_sugar_agree() {
        let a = parse("(quote (5 . 6))").unwrap();
        let b = parse("'(5 . 6)").unwrap();
        assert!(matches!(&a[0].kind, ExprKind::Lit(_)));
        let (ExprKind::Lit(da), ExprKind::Lit(db)) = (&a[0].kind, &b[0].kind) else {
            panic!("expected quoted literals");
        };
        // Spans differ between the two spellings; the datums agree
        assert_eq!(da.to_string(), db.to_string());
        assert_eq!(da.to_string(), "(5 . 6)");
    }

    #[test]
    fn empty_application_errors() {
        let err = parse("()").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0103);
    }

    #[test]
    fn dotted_list_in_expression_position_errors() {
        let err = parse("(f . x)").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0103);
    }

    #[test]
    fn if_with_wrong_arity_errors() {
        let err = parse("(if #t 1)").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0103);
    }

    #[test]
    fn lambda_without_body_errors() {
        let err = parse("(lambda (x))").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0103);
    }

    #[test]
    fn annotation_missing_arrow_errors() {
        let err = parse("(define (f : (number number)) f)").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0103);
    }

    #[test]
    fn display_round_trips_surface_syntax() {
        let src = "(define (id : (number -> number)) (lambda (x) x))";
        let exprs = parse(src).unwrap();
        assert_eq!(exprs[0].to_string(), src);
    }
}
