//! Whole-contract conflict resolution.
//!
//! Runs after every service is classified. Pass one demotes operations whose
//! case-insensitive (service name, operation name) identity collides. Pass
//! two pairs legacy blocking methods with the asynchronous operation they
//! front for, so they stop being reported as unsupported.

use std::collections::{BTreeMap, BTreeSet};

use crate::classify::{self, ClassifyError};
use crate::facade::{MethodSignature, TypeSystem};
use crate::schema::{OperationKind, RejectedMethod, ServiceNode, SyncOverAsync};

/// Naming convention linking a blocking facade to its asynchronous
/// counterpart: `Ping` pairs with `PingAsync`.
pub const ASYNC_METHOD_SUFFIX: &str = "Async";

/// Run both conflict passes over the fully classified services.
pub fn resolve_conflicts<TS: TypeSystem>(ts: &TS, services: &mut [ServiceNode<TS::TypeRef>]) {
    demote_duplicates(ts, services);
    pair_sync_over_async(ts, services);
}

/// Group all accepted operations across all services by their
/// case-insensitive (service name, operation name) identity and demote every
/// member of a colliding group to a rejection listing the whole group.
///
/// Identity compares both fields of the key; operations that share a name
/// across differently named services do not collide.
fn demote_duplicates<TS: TypeSystem>(ts: &TS, services: &mut [ServiceNode<TS::TypeRef>]) {
    let mut groups: BTreeMap<(String, String), Vec<(usize, usize)>> = BTreeMap::new();
    for (si, service) in services.iter().enumerate() {
        for (oi, op) in service.operations.iter().enumerate() {
            let key = (
                op.service_name.to_ascii_lowercase(),
                op.operation_name.to_ascii_lowercase(),
            );
            groups.entry(key).or_default().push((si, oi));
        }
    }

    let mut demoted: Vec<BTreeSet<usize>> = services.iter().map(|_| BTreeSet::new()).collect();
    let mut rejections: Vec<Vec<RejectedMethod<TS::TypeRef>>> =
        services.iter().map(|_| Vec::new()).collect();

    for members in groups.into_values().filter(|m| m.len() > 1) {
        let signatures: Vec<String> = members
            .iter()
            .map(|&(si, oi)| ts.display_signature(&services[si].operations[oi].method))
            .collect();
        for &(si, oi) in &members {
            let op = &services[si].operations[oi];
            tracing::debug!(
                service = %op.service_name,
                operation = %op.operation_name,
                "demoting duplicate operation"
            );
            rejections[si].push(RejectedMethod {
                method: op.method.clone(),
                error: ClassifyError::DuplicateOperation {
                    service_name: op.service_name.clone(),
                    operation_name: op.operation_name.clone(),
                    signatures: signatures.clone(),
                },
            });
            demoted[si].insert(oi);
        }
    }

    for (si, service) in services.iter_mut().enumerate() {
        if demoted[si].is_empty() {
            continue;
        }
        let operations = std::mem::take(&mut service.operations);
        service.operations = operations
            .into_iter()
            .enumerate()
            .filter(|(oi, _)| !demoted[si].contains(oi))
            .map(|(_, op)| op)
            .collect();
        service.rejected.append(&mut rejections[si]);
    }
}

/// For every remaining plain method that would classify as a valid
/// synchronous unary operation, look for its asynchronous counterpart and
/// record the pairing instead of leaving the method unsupported.
fn pair_sync_over_async<TS: TypeSystem>(ts: &TS, services: &mut [ServiceNode<TS::TypeRef>]) {
    for service in services.iter_mut() {
        if service.plain_methods.is_empty() || service.operations.is_empty() {
            continue;
        }
        let mut remaining = Vec::with_capacity(service.plain_methods.len());
        for plain in std::mem::take(&mut service.plain_methods) {
            match try_pair(ts, service, &plain.method) {
                Some(pairing) => {
                    tracing::debug!(
                        service = %service.service_name,
                        sync = %pairing.sync_method.name,
                        operation = %pairing.async_operation_name,
                        "paired sync-over-async facade"
                    );
                    service.sync_over_async.push(pairing);
                }
                None => remaining.push(plain),
            }
        }
        service.plain_methods = remaining;
    }
}

fn try_pair<TS: TypeSystem>(
    ts: &TS,
    service: &ServiceNode<TS::TypeRef>,
    method: &MethodSignature<TS::TypeRef>,
) -> Option<SyncOverAsync<TS::TypeRef>> {
    let candidate =
        classify::classify_operation(ts, &service.service_name, &method.name, method).ok()?;
    if candidate.is_async || candidate.kind != OperationKind::Unary {
        return None;
    }

    // Match on the operation name, not the method name, so a counterpart
    // renamed through its operation marker still pairs.
    let expected = format!("{}{}", method.name, ASYNC_METHOD_SUFFIX);
    let counterpart = service.operations.iter().find(|op| {
        op.operation_name.eq_ignore_ascii_case(&expected)
            && op.kind == OperationKind::Unary
            && op.is_async
            && op.request == candidate.request
            && op.response == candidate.response
    })?;

    Some(SyncOverAsync {
        sync_method: method.clone(),
        async_operation_name: counterpart.operation_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::{ParameterSpec, ReturnShape};
    use crate::registry::{TypeId, TypeRegistry};
    use crate::schema::PlainMethod;

    fn node(name: &str, ty: TypeId) -> ServiceNode<TypeId> {
        ServiceNode {
            ty,
            service_name: name.to_owned(),
            operations: Vec::new(),
            rejected: Vec::new(),
            plain_methods: Vec::new(),
            sync_over_async: Vec::new(),
        }
    }

    fn op(
        reg: &TypeRegistry,
        service: &str,
        name: &str,
        method: MethodSignature<TypeId>,
    ) -> crate::schema::OperationDescription<TypeId> {
        classify::classify_operation(reg, service, name, &method).unwrap()
    }

    #[test]
    fn case_insensitive_duplicates_are_demoted_with_joined_diagnostic() {
        let mut reg = TypeRegistry::new();
        let int32 = reg.data("Int32");
        let svc_ty = reg.interface("ISvc", &[]);

        let m1 = MethodSignature::new("Add", vec![], ReturnShape::Type(int32));
        let m2 = MethodSignature::new(
            "ADD",
            vec![ParameterSpec::value("x", int32)],
            ReturnShape::Type(int32),
        );
        let mut services = vec![node("Svc", svc_ty)];
        services[0].operations.push(op(&reg, "Svc", "Add", m1));
        services[0].operations.push(op(&reg, "Svc", "ADD", m2));

        resolve_conflicts(&reg, &mut services);

        assert!(services[0].operations.is_empty());
        assert_eq!(services[0].rejected.len(), 2);
        let diag = services[0].rejected[0].diagnostic();
        assert!(diag.contains("Int32 Add()"), "{diag}");
        assert!(diag.contains(" and "), "{diag}");
        assert!(diag.contains("Int32 ADD(Int32 x)"), "{diag}");
    }

    #[test]
    fn same_operation_name_in_different_services_does_not_collide() {
        let mut reg = TypeRegistry::new();
        let int32 = reg.data("Int32");
        let a = reg.interface("IA", &[]);
        let b = reg.interface("IB", &[]);

        let m = MethodSignature::new("Get", vec![], ReturnShape::Type(int32));
        let mut services = vec![node("A", a), node("B", b)];
        services[0].operations.push(op(&reg, "A", "Get", m.clone()));
        services[1].operations.push(op(&reg, "B", "Get", m));

        resolve_conflicts(&reg, &mut services);

        assert_eq!(services[0].operations.len(), 1);
        assert_eq!(services[1].operations.len(), 1);
        assert!(services[0].rejected.is_empty());
        assert!(services[1].rejected.is_empty());
    }

    #[test]
    fn sync_facade_pairs_with_async_counterpart() {
        let mut reg = TypeRegistry::new();
        let string = reg.data("String");
        let task_string = reg.task_of(string);
        let svc_ty = reg.interface("ISvc", &[]);

        let async_method = MethodSignature::new("PingAsync", vec![], ReturnShape::Type(task_string));
        let sync_method = MethodSignature::new("Ping", vec![], ReturnShape::Type(string));

        let mut services = vec![node("Svc", svc_ty)];
        services[0]
            .operations
            .push(op(&reg, "Svc", "PingAsync", async_method));
        services[0].plain_methods.push(PlainMethod {
            method: sync_method,
            diagnostic: ClassifyError::NotAnOperation.to_string(),
        });

        resolve_conflicts(&reg, &mut services);

        assert!(services[0].plain_methods.is_empty());
        assert_eq!(services[0].sync_over_async.len(), 1);
        let pairing = &services[0].sync_over_async[0];
        assert_eq!(pairing.sync_method.name, "Ping");
        assert_eq!(pairing.async_operation_name, "PingAsync");
    }

    #[test]
    fn marker_renamed_counterpart_still_pairs() {
        let mut reg = TypeRegistry::new();
        let string = reg.data("String");
        let task_string = reg.task_of(string);
        let svc_ty = reg.interface("ISvc", &[]);

        // The async method serves under the operation name "PingAsync" even
        // though the declared method is "DoPingAsync".
        let async_method =
            MethodSignature::new("DoPingAsync", vec![], ReturnShape::Type(task_string));
        let sync_method = MethodSignature::new("Ping", vec![], ReturnShape::Type(string));

        let mut services = vec![node("Svc", svc_ty)];
        services[0]
            .operations
            .push(op(&reg, "Svc", "PingAsync", async_method));
        services[0].plain_methods.push(PlainMethod {
            method: sync_method,
            diagnostic: ClassifyError::NotAnOperation.to_string(),
        });

        resolve_conflicts(&reg, &mut services);

        assert!(services[0].plain_methods.is_empty());
        assert_eq!(services[0].sync_over_async.len(), 1);
        assert_eq!(services[0].sync_over_async[0].async_operation_name, "PingAsync");
    }

    #[test]
    fn mismatched_shapes_do_not_pair() {
        let mut reg = TypeRegistry::new();
        let string = reg.data("String");
        let int32 = reg.data("Int32");
        let task_string = reg.task_of(string);
        let svc_ty = reg.interface("ISvc", &[]);

        let async_method = MethodSignature::new("PingAsync", vec![], ReturnShape::Type(task_string));
        // Response shape differs: Int32 vs String.
        let sync_method = MethodSignature::new("Ping", vec![], ReturnShape::Type(int32));

        let mut services = vec![node("Svc", svc_ty)];
        services[0]
            .operations
            .push(op(&reg, "Svc", "PingAsync", async_method));
        services[0].plain_methods.push(PlainMethod {
            method: sync_method,
            diagnostic: ClassifyError::NotAnOperation.to_string(),
        });

        resolve_conflicts(&reg, &mut services);

        assert_eq!(services[0].plain_methods.len(), 1);
        assert!(services[0].sync_over_async.is_empty());
    }

    #[test]
    fn streaming_facade_does_not_pair() {
        let mut reg = TypeRegistry::new();
        let int32 = reg.data("Int32");
        let stream = reg.async_stream(int32);
        let task_int = reg.task_of(int32);
        let svc_ty = reg.interface("ISvc", &[]);

        let async_method = MethodSignature::new("SumAsync", vec![], ReturnShape::Type(task_int));
        // A client-streaming method cannot be a blocking facade.
        let sync_method = MethodSignature::new(
            "Sum",
            vec![ParameterSpec::value("values", stream)],
            ReturnShape::Type(int32),
        );

        let mut services = vec![node("Svc", svc_ty)];
        services[0]
            .operations
            .push(op(&reg, "Svc", "SumAsync", async_method));
        services[0].plain_methods.push(PlainMethod {
            method: sync_method,
            diagnostic: ClassifyError::NotAnOperation.to_string(),
        });

        resolve_conflicts(&reg, &mut services);

        assert_eq!(services[0].plain_methods.len(), 1);
        assert!(services[0].sync_over_async.is_empty());
    }
}
