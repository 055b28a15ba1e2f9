//! Interface tree resolution: expand a root type into its interface closure
//! and partition it into service boundaries and orphan interfaces.
//!
//! Two passes over the closure: explicitly marked services are extracted
//! first, then every remaining interface with at least one operation-shaped
//! method is attached under its most-derived explicit-service ancestor.
//! Interfaces that match neither stay in `orphans` for the caller to report.

use crate::facade::TypeSystem;
use crate::naming;

/// A service boundary discovered during resolution: the type and the name it
/// will serve under. Attached interfaces carry their parent's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCandidate<T> {
    pub service_name: String,
    pub ty: T,
}

/// The partitioned interface closure of one root type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceTree<T> {
    pub services: Vec<ServiceCandidate<T>>,
    /// Interfaces that are neither declared services nor attachable to one.
    pub orphans: Vec<T>,
}

/// Expand `root` into its full interface closure and partition it.
pub fn resolve_interface_tree<TS: TypeSystem>(
    ts: &TS,
    root: &TS::TypeRef,
) -> InterfaceTree<TS::TypeRef> {
    let closure = ts.interface_closure(root);

    let mut services = Vec::new();
    let mut remaining = Vec::new();
    for ty in closure {
        if ts.service_marker(&ty).is_some() {
            let service_name = naming::service_name(ts, &ty);
            tracing::debug!(service = %service_name, ty = ?ty, "declared service boundary");
            services.push(ServiceCandidate { service_name, ty });
        } else {
            remaining.push(ty);
        }
    }

    // Only the explicitly declared services are candidate parents; interfaces
    // attached below never adopt further interfaces themselves.
    let explicit = services.clone();

    let mut orphans = Vec::new();
    for ty in remaining {
        if !has_operation_shaped_method(ts, &ty) {
            orphans.push(ty);
            continue;
        }
        match find_attachment(ts, &explicit, &ty) {
            Some(parent) => {
                tracing::debug!(service = %parent.service_name, ty = ?ty, "attached interface");
                services.push(ServiceCandidate {
                    service_name: parent.service_name.clone(),
                    ty,
                });
            }
            None => orphans.push(ty),
        }
    }

    InterfaceTree { services, orphans }
}

/// Cheap operation-likeness probe: does the interface declare any method
/// carrying an operation marker? Full signature validation happens later in
/// the classifier.
fn has_operation_shaped_method<TS: TypeSystem>(ts: &TS, ty: &TS::TypeRef) -> bool {
    ts.methods_of(ty)
        .iter()
        .any(|m| ts.operation_marker(ty, m).is_some())
}

/// Find the explicit service this interface should attach under: among the
/// services that implement the interface, the most-derived one. When no
/// single candidate is most-derived (unrelated ancestors), the first one in
/// declaration order wins, which keeps resolution deterministic without
/// failing the build.
fn find_attachment<'a, TS: TypeSystem>(
    ts: &TS,
    explicit: &'a [ServiceCandidate<TS::TypeRef>],
    interface: &TS::TypeRef,
) -> Option<&'a ServiceCandidate<TS::TypeRef>> {
    let candidates: Vec<&ServiceCandidate<TS::TypeRef>> = explicit
        .iter()
        .filter(|c| ts.is_assignable(interface, &c.ty))
        .collect();

    if let Some(&most_derived) = candidates.iter().find(|c| {
        candidates
            .iter()
            .all(|other| ts.is_assignable(&other.ty, &c.ty))
    }) {
        return Some(most_derived);
    }
    candidates.first().copied()
}
