//! strexpr_compiler: One-call entry points for the expression compiler.
//!
//! Ties the stages together: tokenize the source, build the typed tree
//! against a type registry, and optionally turn the tree into a callable
//! closure.
//!
//! ```ignore
//! let add = strexpr_compiler::compile(
//!     "(a, b) => a + b",
//!     &Signature::new(vec![TypeDescriptor::int(), TypeDescriptor::int()], TypeDescriptor::int()),
//! )?;
//! assert_eq!(add.invoke(&[Value::Int(1), Value::Int(2)])?, Value::Int(3));
//! ```

use std::sync::Arc;

use strexpr_ast::node::Lambda;
use strexpr_checker::{Registry, TypeRegistry};
use strexpr_diagnostics::Diagnostic;
use strexpr_evaluator::CompiledLambda;
use strexpr_options::ParseOptions;
use strexpr_parser::parse_lambda;
use strexpr_scanner::tokenize;

pub use strexpr_evaluator::EvalError;
pub use strexpr_parser::Signature;

/// A configured compiler: a type registry plus the options every parse uses.
///
/// Cheap to clone; the registry is shared.
#[derive(Clone)]
pub struct ExpressionCompiler {
    registry: Arc<dyn TypeRegistry>,
    options: ParseOptions,
}

impl ExpressionCompiler {
    /// The standard registry with default options (no namespaces imported).
    pub fn new() -> Self {
        let registry: Arc<dyn TypeRegistry> = Registry::standard();
        Self {
            registry,
            options: ParseOptions::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Import `namespaces` in addition to the ones already configured.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for namespace in namespaces {
            self.options.add_namespace(namespace.as_ref());
        }
        self
    }

    pub fn registry(&self) -> &Arc<dyn TypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Build the typed tree for `source` under `signature`.
    pub fn parse(&self, source: &str, signature: &Signature) -> Result<Lambda, Diagnostic> {
        tracing::debug!(len = source.len(), parameters = signature.parameters.len(), "parsing expression");
        let tokens = tokenize(source)?;
        let lambda = parse_lambda(&tokens, signature, self.registry.as_ref(), &self.options);
        if let Err(ref diagnostic) = lambda {
            tracing::debug!(code = diagnostic.code, offset = ?diagnostic.offset(), "parse failed");
        }
        lambda
    }

    /// Parse `source` and turn the tree into a callable.
    pub fn compile(&self, source: &str, signature: &Signature) -> Result<CompiledLambda, Diagnostic> {
        let lambda = self.parse(source, signature)?;
        Ok(strexpr_evaluator::compile(&lambda, Arc::clone(&self.registry)))
    }
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExpressionCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCompiler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Parse with the standard registry and default options.
pub fn parse(source: &str, signature: &Signature) -> Result<Lambda, Diagnostic> {
    ExpressionCompiler::new().parse(source, signature)
}

/// Compile with the standard registry and default options.
pub fn compile(source: &str, signature: &Signature) -> Result<CompiledLambda, Diagnostic> {
    ExpressionCompiler::new().compile(source, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_ast::types::TypeDescriptor;
    use strexpr_ast::value::Value;

    #[test]
    fn test_namespaces_accumulate() {
        let compiler = ExpressionCompiler::new()
            .with_namespaces(["System"])
            .with_namespaces(["System", "System.Collections.Generic"]);
        assert_eq!(compiler.options().namespaces, vec!["System", "System.Collections.Generic"]);
    }

    #[test]
    fn test_free_functions_use_the_standard_library() {
        let add = compile("(a, b) => a + b", &Signature::new(vec![TypeDescriptor::int(); 2], TypeDescriptor::int()))
            .unwrap();
        assert_eq!(add.invoke(&[Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
        assert!(parse("Math.PI", &Signature::returning(TypeDescriptor::double())).is_err());
    }
}
