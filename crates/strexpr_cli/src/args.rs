//! `--arg TYPE=VALUE` bindings.

use std::str::FromStr;

use rust_decimal::Decimal;
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::Value;
use strexpr_checker::TypeRegistry;
use strexpr_parser::{TokenCursor, TypeResolver};
use strexpr_scanner::tokenize;

/// A lambda argument given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: TypeDescriptor,
    pub value: Value,
}

/// Split `TYPE=VALUE` at the first `=`, resolve the type and parse the value
/// as a literal of that type.
pub fn parse_binding(arg: &str, registry: &dyn TypeRegistry, namespaces: &[String]) -> Result<Binding, String> {
    let (type_name, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=VALUE, found '{}'", arg))?;
    let ty = resolve_type(type_name.trim(), registry, namespaces)?;
    let value = parse_value(text, &ty, registry)?;
    Ok(Binding { ty, value })
}

/// Resolve a written type name (`int`, `int?`, `List<string>`) the way the
/// expression parser does.
pub fn resolve_type(name: &str, registry: &dyn TypeRegistry, namespaces: &[String]) -> Result<TypeDescriptor, String> {
    let tokens = tokenize(name).map_err(|d| d.message_text)?;
    let mut cursor = TokenCursor::new(&tokens);
    let resolver = TypeResolver::new(registry, namespaces);
    match resolver.read_type(&mut cursor, None, false) {
        Ok(Some(ty)) if cursor.peek_next(1).is_end() => Ok(ty),
        Ok(_) => Err(format!("'{}' is not a type name", name)),
        Err(diagnostic) => Err(diagnostic.message_text),
    }
}

fn parse_value(text: &str, ty: &TypeDescriptor, registry: &dyn TypeRegistry) -> Result<Value, String> {
    if text == "null" {
        return if registry.is_nullable_or_reference(ty) {
            Ok(Value::Null)
        } else {
            Err(format!("'{}' cannot be null", registry.type_name(ty)))
        };
    }
    let invalid = || format!("'{}' is not a valid {}", text, registry.type_name(ty));
    let inner = ty.strip_nullable();
    if inner.is(TypeDefId::STRING) || inner.is(TypeDefId::OBJECT) {
        return Ok(Value::string(text));
    }
    if inner.is(TypeDefId::BOOL) {
        return match text {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        };
    }
    let Some(kind) = inner.numeric_kind() else {
        return Err(format!("values of type '{}' cannot be given on the command line", registry.type_name(ty)));
    };
    let value = match kind {
        NumericKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        NumericKind::SByte => text.parse().ok().map(Value::SByte),
        NumericKind::Byte => text.parse().ok().map(Value::Byte),
        NumericKind::Short => text.parse().ok().map(Value::Short),
        NumericKind::UShort => text.parse().ok().map(Value::UShort),
        NumericKind::Int => text.parse().ok().map(Value::Int),
        NumericKind::UInt => text.parse().ok().map(Value::UInt),
        NumericKind::Long => text.parse().ok().map(Value::Long),
        NumericKind::ULong => text.parse().ok().map(Value::ULong),
        NumericKind::Float => text.parse().ok().map(Value::Float),
        NumericKind::Double => text.parse().ok().map(Value::Double),
        NumericKind::Decimal => Decimal::from_str(text).ok().map(Value::Decimal),
    };
    value.ok_or_else(invalid)
}
