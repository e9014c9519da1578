use crate::errors::ErrorCode;
use crate::syntax::Span;
use std::fmt;
use std::rc::Rc;

/// Unique type variable identifier: an index into a `Bindings` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Type expression for Grebe.
#[derive(Debug, Clone, PartialEq)]
pub enum TExp {
    Number,
    Boolean,
    Str,
    Void,
    /// Opaque "untyped literal" marker for quoted data
    Literal,
    /// Unification variable
    Var(TyVar),
    /// Cons-cell type: (Pair left right)
    Pair(Box<TExp>, Box<TExp>),
    /// Procedure type: params -> return; arity is the list length
    Proc(Vec<TExp>, Box<TExp>),
}

impl TExp {
    pub fn pair(left: TExp, right: TExp) -> Self {
        TExp::Pair(Box::new(left), Box::new(right))
    }

    pub fn proc(params: Vec<TExp>, ret: TExp) -> Self {
        TExp::Proc(params, Box::new(ret))
    }
}

impl fmt::Display for TExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TExp::Number => write!(f, "number"),
            TExp::Boolean => write!(f, "boolean"),
            TExp::Str => write!(f, "string"),
            TExp::Void => write!(f, "void"),
            TExp::Literal => write!(f, "literal"),
            TExp::Var(v) => write!(f, "{v}"),
            TExp::Pair(left, right) => write!(f, "(Pair {left} {right})"),
            TExp::Proc(params, ret) => {
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
        }
    }
}

/// Arena of single-assignment binding slots, one per type variable.
/// Each inference run owns exactly one arena; slots are bound at most once
/// and never reused across independent checks.
pub struct Bindings {
    slots: Vec<Option<TExp>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn fresh_var(&mut self) -> TyVar {
        let v = TyVar(self.slots.len() as u32);
        self.slots.push(None);
        v
    }

    pub fn fresh(&mut self) -> TExp {
        TExp::Var(self.fresh_var())
    }

    fn bind(&mut self, v: TyVar, ty: TExp) {
        let idx = v.0 as usize;
        if idx < self.slots.len() {
            self.slots[idx] = Some(ty);
        }
    }

    /// Walk a type, replacing any bound type variables with their contents.
    pub fn resolve(&self, ty: &TExp) -> TExp {
        match ty {
            TExp::Var(v) => {
                let idx = v.0 as usize;
                if idx < self.slots.len() {
                    if let Some(ref bound) = self.slots[idx] {
                        return self.resolve(bound);
                    }
                }
                ty.clone()
            }
            TExp::Pair(left, right) => {
                TExp::pair(self.resolve(left), self.resolve(right))
            }
            TExp::Proc(params, ret) => TExp::Proc(
                params.iter().map(|p| self.resolve(p)).collect(),
                Box::new(self.resolve(ret)),
            ),
            _ => ty.clone(),
        }
    }

    /// Occurs check: is TyVar v reachable from ty, following bound slots?
    /// A variable counts as reachable from itself.
    fn occurs_in(&self, v: TyVar, ty: &TExp) -> bool {
        match self.resolve(ty) {
            TExp::Var(u) => u == v,
            TExp::Pair(left, right) => self.occurs_in(v, &left) || self.occurs_in(v, &right),
            TExp::Proc(params, ret) => {
                params.iter().any(|p| self.occurs_in(v, p)) || self.occurs_in(v, &ret)
            }
            _ => false,
        }
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure of structural unification; converted to a `TypeError` with
/// rendered context by the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum UnifyError {
    Mismatch { left: TExp, right: TExp },
    Occurs { var: TyVar, in_type: TExp },
}

/// Unify two types under the given bindings. The single `bind` below is the
/// only place the arena is written.
pub fn unify(bindings: &mut Bindings, t1: &TExp, t2: &TExp) -> Result<(), UnifyError> {
    let a = bindings.resolve(t1);
    let b = bindings.resolve(t2);

    match (&a, &b) {
        // An unbound variable binds to the other side after the occurs
        // check; the first operand's variable wins when both are variables.
        (TExp::Var(v), other) => {
            if bindings.occurs_in(*v, other) {
                return Err(UnifyError::Occurs {
                    var: *v,
                    in_type: other.clone(),
                });
            }
            bindings.bind(*v, other.clone());
            Ok(())
        }
        (other, TExp::Var(v)) => {
            if bindings.occurs_in(*v, other) {
                return Err(UnifyError::Occurs {
                    var: *v,
                    in_type: other.clone(),
                });
            }
            bindings.bind(*v, other.clone());
            Ok(())
        }
        (TExp::Number, TExp::Number)
        | (TExp::Boolean, TExp::Boolean)
        | (TExp::Str, TExp::Str)
        | (TExp::Void, TExp::Void)
        | (TExp::Literal, TExp::Literal) => Ok(()),
        // Components unify left to right; the first failure is reported.
        (TExp::Pair(l1, r1), TExp::Pair(l2, r2)) => {
            unify(bindings, l1, l2)?;
            unify(bindings, r1, r2)
        }
        (TExp::Proc(p1, r1), TExp::Proc(p2, r2)) => {
            if p1.len() != p2.len() {
                return Err(UnifyError::Mismatch {
                    left: a.clone(),
                    right: b.clone(),
                });
            }
            for (x, y) in p1.iter().zip(p2.iter()) {
                unify(bindings, x, y)?;
            }
            unify(bindings, r1, r2)
        }
        _ => Err(UnifyError::Mismatch {
            left: a.clone(),
            right: b.clone(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct TypeError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Option<Span>,
}

impl TypeError {
    pub fn at(code: ErrorCode, msg: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: msg.into(),
            span: Some(span),
        }
    }

    pub fn bare(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            span: None,
        }
    }

    /// Add a span to this error if it doesn't already have one.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type error: {}", self.message)
    }
}

impl std::error::Error for TypeError {}

/// Type environment: a chain of frames mapping names to type expressions.
/// Extension allocates a new frame in front of the chain; existing frames
/// are never mutated, so an extended environment can be handed out while
/// the outer one stays live.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    frame: Option<Rc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    vars: Vec<(String, TExp)>,
    outer: Option<Rc<Frame>>,
}

impl TypeEnv {
    pub fn empty() -> Self {
        Self { frame: None }
    }

    /// Walk the frames outward; within a frame, the first entry for a name
    /// wins.
    pub fn lookup(&self, name: &str) -> Option<&TExp> {
        let mut frame = self.frame.as_deref();
        while let Some(f) = frame {
            if let Some((_, te)) = f.vars.iter().find(|(n, _)| n == name) {
                return Some(te);
            }
            frame = f.outer.as_deref();
        }
        None
    }

    pub fn extend(&self, vars: Vec<(String, TExp)>) -> TypeEnv {
        TypeEnv {
            frame: Some(Rc::new(Frame {
                vars,
                outer: self.frame.clone(),
            })),
        }
    }
}
