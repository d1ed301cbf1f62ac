//! Reading type names from the token stream.

use crate::cursor::TokenCursor;
use strexpr_ast::syntax_kind::TokenKind;
use strexpr_ast::types::{TypeDefId, TypeDescriptor};
use strexpr_checker::TypeRegistry;
use strexpr_core::text::TextSpan;
use strexpr_diagnostics::{messages, Diagnostic, Result};
use strexpr_scanner::Token;

/// Resolves dotted, possibly generic and nullable type names against a
/// registry and a list of namespaces to try.
pub struct TypeResolver<'a> {
    registry: &'a dyn TypeRegistry,
    namespaces: &'a [String],
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a dyn TypeRegistry, namespaces: &'a [String]) -> Self {
        Self { registry, namespaces }
    }

    /// Resolve a dotted name with a generic arity: as written first (aliases,
    /// then the registry containers), then under each namespace in order.
    pub fn resolve_name(&self, name: &str, arity: usize) -> Option<TypeDefId> {
        self.registry.resolve_type_by_name(name, arity).or_else(|| {
            self.namespaces
                .iter()
                .find_map(|ns| self.registry.resolve_type_by_name(&format!("{}.{}", ns, name), arity))
        })
    }

    /// Read a type name. Starts from `seed` when given (already consumed),
    /// otherwise from the next token. Dotted segments are appended one at a
    /// time until the accumulated name resolves.
    ///
    /// With `ignore_failure` an unresolvable name yields `Ok(None)` and the
    /// cursor is rewound to where it started.
    pub fn read_type(
        &self,
        cursor: &mut TokenCursor<'_>,
        seed: Option<&Token>,
        ignore_failure: bool,
    ) -> Result<Option<TypeDescriptor>> {
        let start = cursor.index();
        let first = match seed {
            Some(token) => token,
            None => cursor.next(),
        };
        if first.kind != TokenKind::Identifier {
            return self.fail(cursor, start, ignore_failure, first.span, first.display_text(), first);
        }

        let mut name = first.text.clone();
        let mut span = first.span;
        loop {
            let mut args = Vec::new();
            if cursor.is_generic_argument_list() {
                let open = cursor.next();
                loop {
                    match self.read_type(cursor, None, ignore_failure)? {
                        Some(arg) => args.push(arg),
                        None => {
                            cursor.seek(start)?;
                            return Ok(None);
                        }
                    }
                    let separator = cursor.next();
                    if separator.is(",") {
                        continue;
                    }
                    if separator.is(">") {
                        span = span.union(&separator.span);
                        break;
                    }
                    if ignore_failure {
                        cursor.seek(start)?;
                        return Ok(None);
                    }
                    return Err(Diagnostic::at(
                        separator.span,
                        separator.display_text(),
                        &messages::_0_EXPECTED_TO_CLOSE_1,
                        &[">", &open.text],
                    ));
                }
            }

            let (base, nullable) = match name.strip_suffix('?') {
                Some(base) => (base, true),
                None => (name.as_str(), false),
            };
            if let Some(def) = self.resolve_name(base, args.len()) {
                let ty = TypeDescriptor::generic(def, args);
                let ty = if nullable && self.registry.is_value_type(&ty) {
                    TypeDescriptor::nullable(ty)
                } else {
                    ty
                };
                tracing::trace!("Resolved type '{}' to {:?}", name, ty);
                return Ok(Some(ty));
            }

            if args.is_empty() && cursor.peek_next(1).is(".") && cursor.peek_next(2).kind == TokenKind::Identifier {
                cursor.next();
                let segment = cursor.next();
                name.push('.');
                name.push_str(&segment.text);
                span = span.union(&segment.span);
                continue;
            }

            return self.fail(cursor, start, ignore_failure, span, &name, first);
        }
    }

    fn fail(
        &self,
        cursor: &mut TokenCursor<'_>,
        start: isize,
        ignore_failure: bool,
        span: TextSpan,
        name: &str,
        first: &Token,
    ) -> Result<Option<TypeDescriptor>> {
        if ignore_failure {
            cursor.seek(start)?;
            return Ok(None);
        }
        if first.kind != TokenKind::Identifier {
            return Err(Diagnostic::at(span, name, &messages::UNEXPECTED_TOKEN, &[name]));
        }
        Err(Diagnostic::at(span, name, &messages::TYPE_NOT_FOUND, &[name]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_checker::Registry;
    use strexpr_scanner::tokenize;

    fn read(source: &str, namespaces: &[&str], ignore_failure: bool) -> (Result<Option<TypeDescriptor>>, isize) {
        let registry = Registry::standard();
        let namespaces: Vec<String> = namespaces.iter().map(|s| s.to_string()).collect();
        let resolver = TypeResolver::new(registry.as_ref(), &namespaces);
        let tokens = tokenize(source).unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        let result = resolver.read_type(&mut cursor, None, ignore_failure);
        (result, cursor.index())
    }

    #[test]
    fn test_aliases_and_nullable() {
        assert_eq!(read("int", &[], false).0.unwrap(), Some(TypeDescriptor::int()));
        assert_eq!(
            read("double?", &[], false).0.unwrap(),
            Some(TypeDescriptor::nullable(TypeDescriptor::double()))
        );
        // Reference types are not wrapped.
        assert_eq!(read("string?", &[], false).0.unwrap(), Some(TypeDescriptor::string()));
    }

    #[test]
    fn test_dotted_and_namespaced_names() {
        let (full, index) = read("System.Math.PI", &[], false);
        assert!(full.unwrap().is_some());
        // Stops as soon as `System.Math` resolves.
        assert_eq!(index, 2);

        assert!(read("Math", &["System"], false).0.unwrap().is_some());
        let err = read("Math", &[], false).0.unwrap_err();
        assert_eq!(err.kind, strexpr_diagnostics::ErrorKind::TypeNotFound);
    }

    #[test]
    fn test_generic_arguments() {
        let registry = Registry::standard();
        let ty = read("List<int>", &["System.Collections.Generic"], false).0.unwrap().unwrap();
        assert_eq!(registry.type_name(&ty), "List<int>");
        let ty = read("Dictionary<string,int?>", &["System.Collections.Generic"], false)
            .0
            .unwrap()
            .unwrap();
        assert_eq!(registry.type_name(&ty), "Dictionary<string, int?>");
    }

    #[test]
    fn test_ignore_failure_rewinds() {
        let (result, index) = read("x + 1", &[], true);
        assert_eq!(result.unwrap(), None);
        assert_eq!(index, -1);
        let (result, index) = read("3.2", &[], true);
        assert_eq!(result.unwrap(), None);
        assert_eq!(index, -1);
    }
}
