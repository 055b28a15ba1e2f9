//! Contract assembly: the one-way pipeline from a root type to an immutable
//! [`ContractDescription`].
//!
//! Pure orchestration over the other modules. No step here ever throws a
//! method-local problem past the batch; every rejection is recorded as data
//! so callers always get a complete, best-effort contract.

use crate::classify::{self, ClassifyError};
use crate::conflict;
use crate::facade::TypeSystem;
use crate::naming;
use crate::resolve;
use crate::schema::{ContractDescription, PlainMethod, RejectedMethod, ServiceNode};

/// Build the complete contract for `root`.
///
/// Deterministic: two builds from the same type graph produce structurally
/// identical contracts, with every collection in ordinal name order.
pub fn build_contract<TS: TypeSystem>(
    ts: &TS,
    root: &TS::TypeRef,
) -> ContractDescription<TS::TypeRef> {
    let tree = resolve::resolve_interface_tree(ts, root);

    let mut services: Vec<ServiceNode<TS::TypeRef>> = Vec::with_capacity(tree.services.len());
    for candidate in tree.services {
        let mut node = ServiceNode {
            service_name: candidate.service_name,
            ty: candidate.ty,
            operations: Vec::new(),
            rejected: Vec::new(),
            plain_methods: Vec::new(),
            sync_over_async: Vec::new(),
        };

        for method in ts.methods_of(&node.ty) {
            if ts.operation_marker(&node.ty, &method).is_none() {
                node.plain_methods.push(PlainMethod {
                    method,
                    diagnostic: ClassifyError::NotAnOperation.to_string(),
                });
                continue;
            }
            let operation_name = naming::operation_name(ts, &node.ty, &method);
            match classify::classify_operation(ts, &node.service_name, &operation_name, &method) {
                Ok(op) => node.operations.push(op),
                Err(error) => {
                    tracing::debug!(
                        service = %node.service_name,
                        method = %method.name,
                        error = %error,
                        "rejected method"
                    );
                    node.rejected.push(RejectedMethod { method, error });
                }
            }
        }

        tracing::debug!(
            service = %node.service_name,
            operations = node.operations.len(),
            rejected = node.rejected.len(),
            "classified service"
        );
        services.push(node);
    }

    conflict::resolve_conflicts(ts, &mut services);

    // Ordinal sort everywhere so two builds from the same input are
    // byte-identical.
    let mut interfaces = tree.orphans;
    interfaces.sort_by_key(|ty| ts.type_name(ty));
    services.sort_by(|a, b| {
        a.service_name
            .cmp(&b.service_name)
            .then_with(|| ts.type_name(&a.ty).cmp(&ts.type_name(&b.ty)))
    });
    for service in &mut services {
        service
            .operations
            .sort_by(|a, b| a.operation_name.cmp(&b.operation_name));
        service
            .rejected
            .sort_by(|a, b| {
                a.method
                    .name
                    .cmp(&b.method.name)
                    .then_with(|| a.diagnostic().cmp(&b.diagnostic()))
            });
        service
            .plain_methods
            .sort_by(|a, b| a.method.name.cmp(&b.method.name));
        service
            .sync_over_async
            .sort_by(|a, b| a.sync_method.name.cmp(&b.sync_method.name));
    }

    ContractDescription {
        base_name: naming::base_identifier(ts, root),
        root: root.clone(),
        interfaces,
        services,
    }
}
