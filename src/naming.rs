//! Identifier synthesis for services, operations, and generated artifacts.
//!
//! One algorithm, two separators: `-` for wire-level service names (used for
//! duplicate detection), no separator for the base identifier that names
//! generated artifacts. Declarative overrides always win over derivation.

use crate::facade::{MethodSignature, TypeSystem};

/// Separator between name segments in a synthesized identifier.
const WIRE_SEPARATOR: &str = "-";

/// Characters that never survive into a synthesized identifier.
const SEPARATOR_CHARS: [char; 5] = ['-', '.', '/', '\\', '`'];

/// The wire-level service name for a service boundary type.
///
/// A declared marker name (and namespace, when present) takes precedence;
/// otherwise the name is derived from the type name and its generic
/// arguments.
pub fn service_name<TS: TypeSystem>(ts: &TS, ty: &TS::TypeRef) -> String {
    let marker = ts.service_marker(ty);
    let name = marker
        .as_ref()
        .and_then(|m| m.name.clone())
        .unwrap_or_else(|| synthesize(ts, ty, WIRE_SEPARATOR));
    match marker.and_then(|m| m.namespace) {
        Some(ns) => format!("{ns}.{name}"),
        None => name,
    }
}

/// The operation name for a method: declared marker name or the method name.
pub fn operation_name<TS: TypeSystem>(
    ts: &TS,
    owner: &TS::TypeRef,
    method: &MethodSignature<TS::TypeRef>,
) -> String {
    ts.operation_marker(owner, method)
        .and_then(|m| m.name)
        .unwrap_or_else(|| method.name.clone())
}

/// The base identifier used to name generated artifacts for a root type.
///
/// Same algorithm as [`service_name`] derivation, with segments concatenated
/// directly instead of separated.
pub fn base_identifier<TS: TypeSystem>(ts: &TS, ty: &TS::TypeRef) -> String {
    synthesize(ts, ty, "")
}

fn synthesize<TS: TypeSystem>(ts: &TS, ty: &TS::TypeRef, separator: &str) -> String {
    let mut out = strip_interface_prefix(&sanitize(&ts.type_name(ty))).to_owned();
    for arg in ts.generic_args(ty) {
        out.push_str(separator);
        out.push_str(&flatten(ts, &arg, separator));
    }
    out
}

/// Flatten one type (recursively, including nested generics) into a single
/// identifier segment.
fn flatten<TS: TypeSystem>(ts: &TS, ty: &TS::TypeRef, separator: &str) -> String {
    if let Some(info) = ts.array_info(ty) {
        let mut out = String::from("Array");
        if info.rank > 1 {
            out.push_str(&info.rank.to_string());
        }
        out.push_str(&flatten(ts, &info.element, separator));
        return out;
    }

    let mut out = ts
        .data_name_override(ty)
        .unwrap_or_else(|| sanitize(&ts.type_name(ty)));
    for arg in ts.generic_args(ty) {
        out.push_str(separator);
        out.push_str(&flatten(ts, &arg, separator));
    }
    out
}

/// Strip the single-letter interface naming convention prefix (`IFoo` →
/// `Foo`), but only when the next character is uppercase so names like
/// `Inventory` survive.
fn strip_interface_prefix(name: &str) -> &str {
    let mut chars = name.chars();
    if let (Some('I'), Some(next)) = (chars.next(), chars.next())
        && next.is_uppercase()
    {
        return &name[1..];
    }
    name
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if SEPARATOR_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
