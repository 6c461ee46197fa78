use crate::ast::Expr;

/// The one seam between the core and the host language: when the value
/// parser sees an application whose head the host has registered as a
/// macro, it hands the whole form to `expand` and re-parses the result.
/// Expansion must be pure and deterministic.
pub trait MacroHost {
    fn is_macro(&self, name: &str) -> bool;

    fn expand(&self, form: &Expr) -> Result<Expr, String>;
}

/// A host with no registered macros; `expand` is the identity.
pub struct NullHost;

impl MacroHost for NullHost {
    fn is_macro(&self, _name: &str) -> bool {
        false
    }

    fn expand(&self, form: &Expr) -> Result<Expr, String> {
        Ok(form.clone())
    }
}
