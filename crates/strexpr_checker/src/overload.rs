//! Method and constructor overload resolution.
//!
//! Resolution is first-found, not best-match: candidates are tried in
//! declaration order through a fixed sequence of passes (explicit generic
//! instantiation, exact match, implicit widening, generic inference) and the
//! first candidate a pass accepts wins.

use crate::conversions::is_standard_implicit_from;
use crate::registry::{ConstructorHandle, MethodHandle, TypeRegistry};
use strexpr_ast::node::{Expr, MethodRef};
use strexpr_ast::types::{TypeDefId, TypeDescriptor};

/// A method bound to its arguments.
#[derive(Debug)]
pub struct ResolvedMethod<'r> {
    pub handle: MethodHandle<'r>,
    /// Method type arguments; empty for non-generic methods.
    pub type_args: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
    /// Arguments converted to the parameter types.
    pub args: Vec<Expr>,
}

impl ResolvedMethod<'_> {
    pub fn to_ref(&self) -> MethodRef {
        self.handle.to_ref(self.type_args.clone())
    }
}

#[derive(Debug)]
pub struct ResolvedConstructor<'r> {
    pub handle: ConstructorHandle<'r>,
    pub args: Vec<Expr>,
}

struct Candidate<'r> {
    handle: MethodHandle<'r>,
    type_args: Vec<TypeDescriptor>,
    params: Vec<TypeDescriptor>,
    instantiated: bool,
}

/// Pick the overload among `candidates` (already filtered by name and
/// staticness) that accepts `args`.
///
/// `generic_args` are the explicit type arguments of `name<...>(...)`;
/// generic candidates of that arity are instantiated and tried first.
pub fn find_best_method<'r>(
    registry: &dyn TypeRegistry,
    candidates: Vec<MethodHandle<'r>>,
    generic_args: Option<&[TypeDescriptor]>,
    args: Vec<Expr>,
) -> Option<ResolvedMethod<'r>> {
    let mut ordered: Vec<Candidate<'r>> = Vec::with_capacity(candidates.len());
    if let Some(generic_args) = generic_args {
        for handle in &candidates {
            if handle.def.is_generic() && handle.def.generic_params.len() == generic_args.len() {
                ordered.push(Candidate {
                    params: handle.param_types(generic_args),
                    type_args: generic_args.to_vec(),
                    handle: handle.clone(),
                    instantiated: true,
                });
            }
        }
    }
    for handle in candidates {
        ordered.push(Candidate {
            params: handle.param_types(&[]),
            type_args: Vec::new(),
            handle,
            instantiated: false,
        });
    }

    // Exact match.
    if let Some(found) = ordered.iter().position(|c| {
        c.params.len() == args.len() && c.params.iter().zip(&args).all(|(param, arg)| *param == arg.ty)
    }) {
        tracing::trace!("Bound '{}' by exact match", ordered[found].handle.def.name);
        return Some(bind(ordered.swap_remove(found), args));
    }

    // Implicit widening, non-generic candidates only.
    if let Some(found) = ordered.iter().position(|c| {
        !c.handle.def.is_generic()
            && c.params.len() == args.len()
            && c.params.iter().zip(&args).all(|(param, arg)| accepts(registry, param, arg))
    }) {
        tracing::trace!("Bound '{}' by implicit conversion", ordered[found].handle.def.name);
        return Some(bind(ordered.swap_remove(found), args));
    }

    // Generic inference, fewest open parameters first.
    let mut generic: Vec<(usize, Candidate<'r>)> = ordered
        .into_iter()
        .filter(|c| !c.instantiated && c.handle.def.is_generic() && c.params.len() == args.len())
        .map(|c| (c.params.iter().filter(|p| p.is_open()).count(), c))
        .collect();
    generic.sort_by_key(|(open, _)| *open);
    for (_, candidate) in generic {
        let arity = candidate.handle.def.generic_params.len();
        if let Some(type_args) = infer_type_args(&candidate.params, &args, arity) {
            tracing::trace!("Bound '{}' by type inference", candidate.handle.def.name);
            let params = candidate.handle.param_types(&type_args);
            return Some(bind(
                Candidate {
                    params,
                    type_args,
                    handle: candidate.handle,
                    instantiated: true,
                },
                args,
            ));
        }
    }

    None
}

fn bind<'r>(candidate: Candidate<'r>, args: Vec<Expr>) -> ResolvedMethod<'r> {
    let args = args
        .into_iter()
        .zip(&candidate.params)
        .map(|(arg, param)| arg.convert(param.clone()))
        .collect();
    ResolvedMethod {
        return_type: candidate.handle.return_type(&candidate.type_args),
        handle: candidate.handle,
        type_args: candidate.type_args,
        args,
    }
}

/// Whether a parameter accepts an argument without an explicit cast.
fn accepts(registry: &dyn TypeRegistry, param: &TypeDescriptor, arg: &Expr) -> bool {
    *param == arg.ty
        || is_standard_implicit_from(param, &arg.ty)
        || param.is(TypeDefId::OBJECT)
        || (arg.is_null_literal() && registry.is_nullable_or_reference(param))
}

/// Infer method type arguments from concrete argument types. The first
/// occurrence of a parameter fixes it; later occurrences must agree.
fn infer_type_args(params: &[TypeDescriptor], args: &[Expr], arity: usize) -> Option<Vec<TypeDescriptor>> {
    let mut inferred: Vec<Option<TypeDescriptor>> = vec![None; arity];
    for (param, arg) in params.iter().zip(args) {
        if param.is_open() {
            if !unify(param, &arg.ty, &mut inferred) {
                return None;
            }
        } else if *param != arg.ty {
            return None;
        }
    }
    inferred.into_iter().collect()
}

fn unify(pattern: &TypeDescriptor, actual: &TypeDescriptor, inferred: &mut [Option<TypeDescriptor>]) -> bool {
    match pattern {
        TypeDescriptor::MethodParam(index) => match inferred.get_mut(*index as usize) {
            Some(Some(bound)) => bound == actual,
            Some(slot) => {
                *slot = Some(actual.clone());
                true
            }
            None => false,
        },
        TypeDescriptor::Named { def, args } => {
            actual.def_id() == Some(*def)
                && actual.args().len() == args.len()
                && args.iter().zip(actual.args()).all(|(p, a)| unify(p, a, inferred))
        }
        TypeDescriptor::TypeParam(_) => false,
    }
}

/// Pick the first constructor whose parameter types, nullability stripped,
/// equal the argument types. Arguments are converted to the exact parameter
/// types, which lifts plain values into nullable parameters.
pub fn find_constructor<'r>(
    registry: &dyn TypeRegistry,
    constructors: Vec<ConstructorHandle<'r>>,
    args: Vec<Expr>,
) -> Option<ResolvedConstructor<'r>> {
    let (handle, params) = constructors.into_iter().find_map(|ctor| {
        let params = ctor.param_types();
        let matches = params.len() == args.len()
            && params.iter().zip(&args).all(|(param, arg)| {
                param.strip_nullable() == arg.ty.strip_nullable()
                    || (arg.is_null_literal() && registry.is_nullable_or_reference(param))
            });
        matches.then_some((ctor, params))
    })?;
    let args = args
        .into_iter()
        .zip(params)
        .map(|(arg, param)| arg.convert(param))
        .collect();
    Some(ResolvedConstructor { handle, args })
}
