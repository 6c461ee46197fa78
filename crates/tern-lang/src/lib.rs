//! Front-end and type-inference core for Tern, a statically-typed
//! functional sublanguage embedded in a dynamic host environment.
//!
//! The pipeline: the `parser` reads source text into surface forms;
//! `lower` turns value forms into the checked AST and type forms into
//! types, consulting the host-macro hook on unknown application heads;
//! `check` performs Hindley–Milner inference by unification; `elab`
//! dispatches top-level forms, maintains the session environment, and
//! emits code-generation descriptors for the host-side generator.

pub mod ast;
pub mod check;
pub mod elab;
pub mod env;
pub mod errors;
pub mod lower;
pub mod macros;
pub mod parser;
pub mod prelude;
pub mod syntax;
pub mod types;
