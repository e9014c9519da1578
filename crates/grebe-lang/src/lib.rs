//! Core library for the Grebe language.
//!
//! Grebe is a small, fully type-annotated mini-Scheme. Source text is read
//! into S-expression datums (`parser::read_program`), lowered into a typed
//! AST (`parser::parse`), and checked by a unification-based type checker
//! (`check::Checker`). There is no evaluator: the pipeline ends at the
//! inferred type of a program.
//!
//! ```
//! use grebe_lang::check;
//!
//! let ty = check::type_of_program("((lambda ((x : number)) : number x) 5)").unwrap();
//! assert_eq!(ty, "number");
//! ```

pub mod ast;
pub mod check;
pub mod errors;
pub mod fmt;
pub mod parser;
pub mod syntax;
pub mod types;
