use crate::ast::{Binding, Datum, DatumKind, Expr, ExprKind, TypeAnn, VarDecl};
use crate::errors::ErrorCode;
use crate::parser::{self, ParseError};
use crate::syntax::Span;
use crate::types::{unify, Bindings, TExp, TypeEnv, TypeError, UnifyError};

use std::fmt;

/// Either stage of failure for the source-text entry points.
#[derive(Debug)]
pub enum CheckError {
    Parse(ParseError),
    Type(TypeError),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Parse(e) => write!(f, "{e}"),
            CheckError::Type(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CheckError {}

impl From<ParseError> for CheckError {
    fn from(e: ParseError) -> Self {
        CheckError::Parse(e)
    }
}

impl From<TypeError> for CheckError {
    fn from(e: TypeError) -> Self {
        CheckError::Type(e)
    }
}

// ── Checker ──────────────────────────────────────────────────────────

/// Type checker for fully annotated programs. One `Checker` owns one
/// `Bindings` arena; every type variable allocated during a run lives and
/// dies with it, so independent checks never share binding slots.
pub struct Checker {
    bindings: Bindings,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            bindings: Bindings::new(),
        }
    }

    /// Get the resolved form of a type after checking.
    pub fn resolve(&self, ty: &TExp) -> TExp {
        self.bindings.resolve(ty)
    }

    // ── Annotation elaboration ───────────────────────────────────────

    /// Elaborate a written annotation to a type expression. A variable
    /// name allocates a fresh cell per occurrence; names are not shared,
    /// even within one annotation.
    fn instantiate_ann(&mut self, ann: &TypeAnn) -> TExp {
        match ann {
            TypeAnn::Number => TExp::Number,
            TypeAnn::Boolean => TExp::Boolean,
            TypeAnn::String => TExp::Str,
            TypeAnn::Void => TExp::Void,
            TypeAnn::Var(_) => self.bindings.fresh(),
            TypeAnn::Proc(params, ret) => {
                let params = params.iter().map(|p| self.instantiate_ann(p)).collect();
                let ret = self.instantiate_ann(ret);
                TExp::Proc(params, Box::new(ret))
            }
            TypeAnn::Pair(left, right) => {
                TExp::pair(self.instantiate_ann(left), self.instantiate_ann(right))
            }
        }
    }

    /// The declared type of a binding position; an unannotated one is a
    /// fresh type variable.
    fn decl_type(&mut self, var: &VarDecl) -> TExp {
        match &var.ann {
            Some(ann) => self.instantiate_ann(ann),
            None => self.bindings.fresh(),
        }
    }

    /// Unify two types, rendering a failure against the expression being
    /// checked.
    fn check_equal(&mut self, te1: &TExp, te2: &TExp, exp: &Expr) -> Result<(), TypeError> {
        match unify(&mut self.bindings, te1, te2) {
            Ok(()) => Ok(()),
            Err(UnifyError::Mismatch { left, right }) => Err(TypeError::at(
                ErrorCode::E0200,
                format!(
                    "incompatible types: {} and {} in {}",
                    self.bindings.resolve(&left),
                    self.bindings.resolve(&right),
                    exp
                ),
                exp.span,
            )),
            Err(UnifyError::Occurs { var, in_type }) => Err(TypeError::at(
                ErrorCode::E0203,
                format!(
                    "occurs check failed: {var} in {}",
                    self.bindings.resolve(&in_type)
                ),
                exp.span,
            )),
        }
    }

    // ── Per-form typing rules ────────────────────────────────────────

    /// Infer the type of an expression. Each variant yields exactly one
    /// type expression; the first failure anywhere propagates.
    pub fn infer(&mut self, exp: &Expr, env: &TypeEnv) -> Result<TExp, TypeError> {
        match &exp.kind {
            ExprKind::Num(_) => Ok(TExp::Number),
            ExprKind::Bool(_) => Ok(TExp::Boolean),
            ExprKind::Str(_) => Ok(TExp::Str),
            ExprKind::Var(name) => env.lookup(name).cloned().ok_or_else(|| {
                TypeError::at(
                    ErrorCode::E0201,
                    format!("unbound variable '{name}'"),
                    exp.span,
                )
            }),
            ExprKind::Prim(op) => self.primitive_type(op, exp.span),
            ExprKind::Lit(datum) => Ok(self.infer_literal(datum, false)),
            ExprKind::If { test, then, alt } => self.infer_if(exp, test, then, alt, env),
            ExprKind::Lambda { params, ret, body } => {
                self.infer_lambda(exp, params, ret.as_ref(), body, env)
            }
            ExprKind::App { rator, rands } => self.infer_app(exp, rator, rands, env),
            ExprKind::Let { bindings, body } => self.infer_let(exp, bindings, body, env),
            ExprKind::Letrec { bindings, body } => self.infer_letrec(exp, bindings, body, env),
            ExprKind::Define { var, val } => {
                // In expression position a define checks but binds nothing;
                // only the program driver extends the environment.
                self.infer_define_binding(var, val, exp, env)?;
                Ok(TExp::Void)
            }
        }
    }

    /// Type of an expression sequence: every element must check, the last
    /// one's type is the sequence's type.
    fn infer_seq(&mut self, exps: &[Expr], env: &TypeEnv) -> Result<TExp, TypeError> {
        let mut last = None;
        for e in exps {
            last = Some(self.infer(e, env)?);
        }
        last.ok_or_else(|| TypeError::bare(ErrorCode::E0205, "empty expression sequence"))
    }

    fn infer_if(
        &mut self,
        exp: &Expr,
        test: &Expr,
        then: &Expr,
        alt: &Expr,
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        let test_t = self.infer(test, env)?;
        let then_t = self.infer(then, env)?;
        let alt_t = self.infer(alt, env)?;
        self.check_equal(&test_t, &TExp::Boolean, exp)?;
        self.check_equal(&then_t, &alt_t, exp)?;
        Ok(then_t)
    }

    fn infer_lambda(
        &mut self,
        exp: &Expr,
        params: &[VarDecl],
        ret: Option<&TypeAnn>,
        body: &[Expr],
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        let param_tes: Vec<TExp> = params.iter().map(|p| self.decl_type(p)).collect();
        let ret_te = match ret {
            Some(ann) => self.instantiate_ann(ann),
            None => self.bindings.fresh(),
        };
        let frame = params
            .iter()
            .map(|p| p.name.clone())
            .zip(param_tes.iter().cloned())
            .collect();
        let body_t = self.infer_seq(body, &env.extend(frame))?;
        self.check_equal(&body_t, &ret_te, exp)?;
        // The procedure type is built from the declared types, not the
        // possibly more specific inferred body type.
        Ok(TExp::Proc(param_tes, Box::new(ret_te)))
    }

    fn infer_app(
        &mut self,
        exp: &Expr,
        rator: &Expr,
        rands: &[Expr],
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        let rator_t = self.infer(rator, env)?;
        // The raw inferred type is inspected here, without dereferencing:
        // a variable bound to a procedure type is still not a procedure.
        let (param_tes, ret_te) = match rator_t {
            TExp::Proc(params, ret) => (params, ret),
            other => {
                return Err(TypeError::at(
                    ErrorCode::E0200,
                    format!(
                        "application of non-procedure: {} in {}",
                        self.bindings.resolve(&other),
                        exp
                    ),
                    exp.span,
                ))
            }
        };
        if rands.len() != param_tes.len() {
            return Err(TypeError::at(
                ErrorCode::E0202,
                format!("wrong number of arguments passed to procedure: {exp}"),
                exp.span,
            ));
        }
        for (rand, param_te) in rands.iter().zip(param_tes.iter()) {
            let rand_t = self.infer(rand, env)?;
            self.check_equal(&rand_t, param_te, exp)?;
        }
        Ok(*ret_te)
    }

    fn infer_let(
        &mut self,
        exp: &Expr,
        bindings: &[Binding],
        body: &[Expr],
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        let mut frame = Vec::with_capacity(bindings.len());
        for b in bindings {
            let declared = self.decl_type(&b.var);
            let val_t = self.infer(&b.val, env)?;
            self.check_equal(&declared, &val_t, exp)?;
            frame.push((b.var.name.clone(), declared));
        }
        // All bindings enter the environment together, after every value
        // has checked against its declaration.
        self.infer_seq(body, &env.extend(frame))
    }

    fn infer_letrec(
        &mut self,
        exp: &Expr,
        bindings: &[Binding],
        body: &[Expr],
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        for b in bindings {
            if !matches!(b.val.kind, ExprKind::Lambda { .. }) {
                return Err(TypeError::at(
                    ErrorCode::E0202,
                    format!("letrec only supports procedure bindings: {exp}"),
                    exp.span,
                ));
            }
        }
        // One combined frame holds every bound procedure's declared type,
        // so all bodies see all signatures (mutual recursion).
        let mut sigs = Vec::with_capacity(bindings.len());
        let mut frame = Vec::with_capacity(bindings.len());
        for b in bindings {
            if let ExprKind::Lambda { params, ret, body } = &b.val.kind {
                let param_tes: Vec<TExp> = params.iter().map(|p| self.decl_type(p)).collect();
                let ret_te = match ret {
                    Some(ann) => self.instantiate_ann(ann),
                    None => self.bindings.fresh(),
                };
                frame.push((
                    b.var.name.clone(),
                    TExp::Proc(param_tes.clone(), Box::new(ret_te.clone())),
                ));
                sigs.push((params, param_tes, ret_te, body));
            }
        }
        let combined = env.extend(frame);
        // All bodies are inferred before any return type is checked.
        let mut body_tes = Vec::with_capacity(sigs.len());
        for (params, param_tes, _, lam_body) in &sigs {
            let inner = params
                .iter()
                .map(|p| p.name.clone())
                .zip(param_tes.iter().cloned())
                .collect();
            body_tes.push(self.infer_seq(lam_body, &combined.extend(inner))?);
        }
        for (body_t, (_, _, ret_te, _)) in body_tes.iter().zip(sigs.iter()) {
            self.check_equal(body_t, ret_te, exp)?;
        }
        self.infer_seq(body, &combined)
    }

    fn infer_define_binding(
        &mut self,
        var: &VarDecl,
        val: &Expr,
        exp: &Expr,
        env: &TypeEnv,
    ) -> Result<TExp, TypeError> {
        let declared = self.decl_type(var);
        let val_t = self.infer(val, env)?;
        self.check_equal(&declared, &val_t, exp)?;
        Ok(declared)
    }

    // ── Quoted-literal typing ────────────────────────────────────────

    /// Type of quoted data. Total: no quoted datum is ill-typed. A bare
    /// top-level atom is always `literal`, whatever its kind; the same
    /// atom nested inside a pair gets a concrete type when it is a number
    /// or boolean.
    fn infer_literal(&self, datum: &Datum, in_pair: bool) -> TExp {
        match &datum.kind {
            DatumKind::List(items) if items.is_empty() => TExp::Void,
            DatumKind::List(items) => self.infer_literal_seq(items, None),
            DatumKind::DottedList(items, tail) => self.infer_literal_seq(items, Some(tail)),
            DatumKind::Number(_) if in_pair => TExp::Number,
            DatumKind::Bool(_) if in_pair => TExp::Boolean,
            _ => TExp::Literal,
        }
    }

    /// Cons view of quoted list data: (a b . c) is (Pair a (Pair b c)),
    /// and a proper list's terminator is the empty list, typed void.
    fn infer_literal_seq(&self, items: &[Datum], tail: Option<&Datum>) -> TExp {
        match items {
            [] => match tail {
                Some(t) => self.infer_literal(t, true),
                None => TExp::Void,
            },
            [head, rest @ ..] => TExp::pair(
                self.infer_literal(head, true),
                self.infer_literal_seq(rest, tail),
            ),
        }
    }

    // ── Primitive signature table ────────────────────────────────────

    /// Signature of a primitive operator. Polymorphic signatures allocate
    /// fresh variables per elaboration; two use sites never share cells.
    fn primitive_type(&mut self, op: &str, span: Span) -> Result<TExp, TypeError> {
        let te = match op {
            "+" | "-" | "*" | "/" => TExp::proc(vec![TExp::Number, TExp::Number], TExp::Number),
            ">" | "<" | "=" => TExp::proc(vec![TExp::Number, TExp::Number], TExp::Boolean),
            "and" | "or" => TExp::proc(vec![TExp::Boolean, TExp::Boolean], TExp::Boolean),
            "not" => TExp::proc(vec![TExp::Boolean], TExp::Boolean),
            "newline" => TExp::proc(vec![], TExp::Void),
            "display" => {
                let t = self.bindings.fresh();
                TExp::proc(vec![t], TExp::Void)
            }
            "number?" | "boolean?" | "string?" | "list?" | "pair?" | "symbol?" => {
                let t = self.bindings.fresh();
                TExp::proc(vec![t], TExp::Boolean)
            }
            "eq?" | "string=?" => {
                let t1 = self.bindings.fresh();
                let t2 = self.bindings.fresh();
                TExp::proc(vec![t1, t2], TExp::Boolean)
            }
            "cons" => {
                let t1 = self.bindings.fresh();
                let t2 = self.bindings.fresh();
                TExp::proc(vec![t1.clone(), t2.clone()], TExp::pair(t1, t2))
            }
            "car" => {
                let t1 = self.bindings.fresh();
                let t2 = self.bindings.fresh();
                TExp::proc(vec![TExp::pair(t1.clone(), t2)], t1)
            }
            "cdr" => {
                let t1 = self.bindings.fresh();
                let t2 = self.bindings.fresh();
                TExp::proc(vec![TExp::pair(t1, t2.clone())], t2)
            }
            _ => {
                return Err(TypeError::at(
                    ErrorCode::E0204,
                    format!("primitive not supported: {op}"),
                    span,
                ))
            }
        };
        Ok(te)
    }

    // ── Program driver ───────────────────────────────────────────────

    /// One top-level step: a define checks its value against its declared
    /// type and extends the running environment, yielding no result type;
    /// any other form yields its type under the current environment.
    pub fn infer_form(
        &mut self,
        form: &Expr,
        env: &TypeEnv,
    ) -> Result<(TypeEnv, Option<TExp>), TypeError> {
        match &form.kind {
            ExprKind::Define { var, val } => {
                let declared = self.infer_define_binding(var, val, form, env)?;
                Ok((env.extend(vec![(var.name.clone(), declared)]), None))
            }
            _ => {
                let te = self.infer(form, env)?;
                Ok((env.clone(), Some(te)))
            }
        }
    }

    /// Type of a program: top-level forms in order, defines threading the
    /// environment, the last non-define form's type as the result. A
    /// program with no result — no forms at all, or only defines — fails.
    pub fn infer_program(&mut self, forms: &[Expr], env: &TypeEnv) -> Result<TExp, TypeError> {
        let mut env = env.clone();
        let mut last: Option<TExp> = None;
        for form in forms {
            let (next, te) = self.infer_form(form, &env)?;
            env = next;
            if let Some(te) = te {
                last = Some(te);
            }
        }
        last.ok_or_else(|| TypeError::bare(ErrorCode::E0205, "no expressions in program"))
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

// ── Source-text entry points ─────────────────────────────────────────

/// Parse `source` and infer the type of its first expression under an
/// empty environment, rendering the result.
pub fn type_of_expr(source: &str) -> Result<String, CheckError> {
    let exprs = parser::parse(source)?;
    let first = exprs.first().ok_or_else(|| {
        CheckError::Type(TypeError::bare(ErrorCode::E0205, "no expressions in program"))
    })?;
    let mut checker = Checker::new();
    let te = checker.infer(first, &TypeEnv::empty())?;
    Ok(checker.resolve(&te).to_string())
}

/// Parse `source` as a program and infer its type under an empty
/// environment, rendering the result.
pub fn type_of_program(source: &str) -> Result<String, CheckError> {
    let exprs = parser::parse(source)?;
    let mut checker = Checker::new();
    let te = checker.infer_program(&exprs, &TypeEnv::empty())?;
    Ok(checker.resolve(&te).to_string())
}
