use crate::syntax::Span;
use std::fmt;

/// Reader-level S-expression. Quoted literals keep their `Datum` form, so
/// this type doubles as the value model for quoted data.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub kind: DatumKind,
    pub span: Span,
}

impl Datum {
    pub fn new(kind: DatumKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatumKind {
    Number(f64),
    Bool(bool),
    Str(String),
    Symbol(String),
    /// Proper list: (a b c) — () is the empty list
    List(Vec<Datum>),
    /// Improper list: (a b . c); items are non-empty
    DottedList(Vec<Datum>, Box<Datum>),
}

/// Write an f64 the way Scheme numerals read: integral values without the
/// trailing ".0".
pub(crate) fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.is_finite() {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DatumKind::Number(n) => write_number(f, *n),
            DatumKind::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            DatumKind::Str(s) => write!(f, "\"{s}\""),
            DatumKind::Symbol(s) => write!(f, "{s}"),
            DatumKind::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            DatumKind::DottedList(items, tail) => {
                write!(f, "(")?;
                for item in items {
                    write!(f, "{item} ")?;
                }
                write!(f, ". {tail})")
            }
        }
    }
}

/// Type annotation as written in the source. Elaborated to a `TExp` by the
/// checker; a `Var` name elaborates to a fresh type variable per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnn {
    Number,
    Boolean,
    String,
    Void,
    Var(String),
    /// (T1 * ... * Tn -> Tr); an empty parameter list is written (Empty -> Tr)
    Proc(Vec<TypeAnn>, Box<TypeAnn>),
    /// (Pair T1 T2)
    Pair(Box<TypeAnn>, Box<TypeAnn>),
}

impl fmt::Display for TypeAnn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnn::Number => write!(f, "number"),
            TypeAnn::Boolean => write!(f, "boolean"),
            TypeAnn::String => write!(f, "string"),
            TypeAnn::Void => write!(f, "void"),
            TypeAnn::Var(name) => write!(f, "{name}"),
            TypeAnn::Proc(params, ret) => {
                write!(f, "(")?;
                if params.is_empty() {
                    write!(f, "Empty")?;
                } else {
                    for (i, p) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, " * ")?;
                        }
                        write!(f, "{p}")?;
                    }
                }
                write!(f, " -> {ret})")
            }
            TypeAnn::Pair(left, right) => write!(f, "(Pair {left} {right})"),
        }
    }
}

/// A binding position: a variable name with an optional declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ann: Option<TypeAnn>,
    pub span: Span,
}

impl fmt::Display for VarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ann {
            Some(ann) => write!(f, "({} : {ann})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One let/letrec binding: `(var val)` or `((var : type) val)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var: VarDecl,
    pub val: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Num(f64),
    Bool(bool),
    Str(String),
    /// Variable reference
    Var(String),
    /// Primitive operator reference
    Prim(String),
    /// Quoted literal data
    Lit(Datum),
    If {
        test: Box<Expr>,
        then: Box<Expr>,
        alt: Box<Expr>,
    },
    Lambda {
        params: Vec<VarDecl>,
        ret: Option<TypeAnn>,
        body: Vec<Expr>,
    },
    App {
        rator: Box<Expr>,
        rands: Vec<Expr>,
    },
    Let {
        bindings: Vec<Binding>,
        body: Vec<Expr>,
    },
    Letrec {
        bindings: Vec<Binding>,
        body: Vec<Expr>,
    },
    Define {
        var: VarDecl,
        val: Box<Expr>,
    },
}

fn write_seq(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for e in exprs {
        write!(f, " {e}")?;
    }
    Ok(())
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[Binding]) -> fmt::Result {
    write!(f, "(")?;
    for (i, b) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({} {})", b.var, b.val)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Num(n) => write_number(f, *n),
            ExprKind::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            ExprKind::Str(s) => write!(f, "\"{s}\""),
            ExprKind::Var(name) => write!(f, "{name}"),
            ExprKind::Prim(op) => write!(f, "{op}"),
            ExprKind::Lit(datum) => write!(f, "'{datum}"),
            ExprKind::If { test, then, alt } => write!(f, "(if {test} {then} {alt})"),
            ExprKind::Lambda { params, ret, body } => {
                write!(f, "(lambda (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")?;
                if let Some(ret) = ret {
                    write!(f, " : {ret}")?;
                }
                write_seq(f, body)?;
                write!(f, ")")
            }
            ExprKind::App { rator, rands } => {
                write!(f, "({rator}")?;
                write_seq(f, rands)?;
                write!(f, ")")
            }
            ExprKind::Let { bindings, body } => {
                write!(f, "(let ")?;
                write_bindings(f, bindings)?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            ExprKind::Letrec { bindings, body } => {
                write!(f, "(letrec ")?;
                write_bindings(f, bindings)?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            ExprKind::Define { var, val } => write!(f, "(define {var} {val})"),
        }
    }
}
