//! End-to-end contract assembly scenarios.

use insta::assert_snapshot;
use wireplan::build_contract;
use wireplan::facade::{
    ContextKind, MethodSignature, OperationMarker, ParameterSpec, ReturnShape, ServiceMarker,
};
use wireplan::registry::{TypeId, TypeRegistry};
use wireplan::render_contract;
use wireplan::schema::OperationKind;

fn void_op(reg: &mut TypeRegistry, ty: TypeId, name: &str) {
    reg.add_operation(
        ty,
        MethodSignature::new(name, vec![], ReturnShape::Void),
        OperationMarker::default(),
    );
}

#[test]
fn inherited_interfaces_serve_under_the_declared_contract() {
    let mut reg = TypeRegistry::new();
    let s1 = reg.interface("IService1", &[]);
    void_op(&mut reg, s1, "M1");
    let s2 = reg.interface("IService2", &[]);
    void_op(&mut reg, s2, "M2");
    let root = reg.interface("IContract", &[s1, s2]);
    reg.mark_service(root, ServiceMarker::default());

    let contract = build_contract(&reg, &root);

    assert!(contract.interfaces.is_empty());
    assert_eq!(contract.services.len(), 3);
    assert!(
        contract
            .services
            .iter()
            .all(|s| s.service_name == "Contract")
    );

    let by_ty = |ty: TypeId| {
        contract
            .services
            .iter()
            .find(|s| s.ty == ty)
            .expect("service present")
    };
    assert!(by_ty(root).operations.is_empty());
    assert_eq!(by_ty(s1).operations[0].operation_name, "M1");
    assert_eq!(by_ty(s2).operations[0].operation_name, "M2");
}

#[test]
fn shared_interface_attaches_to_first_unrelated_ancestor() {
    let mut reg = TypeRegistry::new();
    let shared = reg.interface("IShared", &[]);
    void_op(&mut reg, shared, "M");
    let c1 = reg.interface("IContract1", &[shared]);
    reg.mark_service(c1, ServiceMarker::default());
    let c2 = reg.interface("IContract2", &[shared]);
    reg.mark_service(c2, ServiceMarker::default());
    let root = reg.interface("IRoot", &[c1, c2]);

    let contract = build_contract(&reg, &root);

    let attached = contract
        .services
        .iter()
        .find(|s| s.ty == shared)
        .expect("shared attaches to a declared service");
    assert_eq!(attached.service_name, "Contract1");
}

#[test]
fn unary_with_context_parameter() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let string = reg.data("String");
    let token = reg.context("CancellationToken", ContextKind::Cancellation);
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new(
            "F",
            vec![
                ParameterSpec::value("x", string),
                ParameterSpec::value("t", token),
            ],
            ReturnShape::Type(int32),
        ),
        OperationMarker::default(),
    );

    let contract = build_contract(&reg, &svc);
    let op = &contract.services[0].operations[0];
    assert_eq!(op.kind, OperationKind::Unary);
    assert_eq!(op.request.types(), &[string]);
    assert_eq!(op.request_indices, vec![0]);
    assert_eq!(op.context_indices, vec![1]);
    assert_eq!(op.response.types(), &[int32]);
}

#[test]
fn duplex_streaming_unwraps_element_types() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let string = reg.data("String");
    let in_stream = reg.async_stream(string);
    let out_stream = reg.async_stream(int32);
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new(
            "G",
            vec![ParameterSpec::value("s", in_stream)],
            ReturnShape::Type(out_stream),
        ),
        OperationMarker::default(),
    );

    let contract = build_contract(&reg, &svc);
    let op = &contract.services[0].operations[0];
    assert_eq!(op.kind, OperationKind::DuplexStreaming);
    assert_eq!(op.request.types(), &[string]);
    assert_eq!(op.response.types(), &[int32]);
    assert!(op.header_request.is_none());
    assert!(op.header_response.is_none());
}

#[test]
fn tuple_return_with_stream_becomes_server_streaming_with_header() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let string = reg.data("String");
    let items = reg.async_stream(int32);
    let tuple = reg.tuple(&[items, string]);
    let task = reg.task_of(tuple);
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new("H", vec![], ReturnShape::Type(task)),
        OperationMarker::default(),
    );

    let contract = build_contract(&reg, &svc);
    let op = &contract.services[0].operations[0];
    assert_eq!(op.kind, OperationKind::ServerStreaming);
    assert!(op.is_async);
    assert_eq!(op.response.types(), &[int32]);
    assert_eq!(op.response_stream_slot, Some(0));
    let header = op.header_response.as_ref().expect("header present");
    assert_eq!(header.message.types(), &[string]);
    assert_eq!(header.indices, vec![1]);
}

#[test]
fn sync_facade_pairs_instead_of_being_unsupported() {
    let mut reg = TypeRegistry::new();
    let string = reg.data("String");
    let task_string = reg.task_of(string);
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new("PingAsync", vec![], ReturnShape::Type(task_string)),
        OperationMarker::default(),
    );
    // Legacy blocking facade: same shapes, no operation marker.
    reg.add_method(
        svc,
        MethodSignature::new("Ping", vec![], ReturnShape::Type(string)),
    );

    let contract = build_contract(&reg, &svc);
    let service = &contract.services[0];
    assert!(service.rejected.is_empty());
    assert!(service.plain_methods.is_empty());
    assert_eq!(service.sync_over_async.len(), 1);
    assert_eq!(service.sync_over_async[0].sync_method.name, "Ping");
    assert_eq!(service.sync_over_async[0].async_operation_name, "PingAsync");
}

#[test]
fn duplicate_identities_are_demoted_everywhere() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    // Two declared services resolving to the same wire name, each with the
    // same operation name.
    let a = reg.interface("IStoreA", &[]);
    reg.mark_service(
        a,
        ServiceMarker {
            name: Some("Store".into()),
            namespace: None,
        },
    );
    let b = reg.interface("IStoreB", &[]);
    reg.mark_service(
        b,
        ServiceMarker {
            name: Some("Store".into()),
            namespace: None,
        },
    );
    for ty in [a, b] {
        reg.add_operation(
            ty,
            MethodSignature::new("Get", vec![], ReturnShape::Type(int32)),
            OperationMarker::default(),
        );
    }
    let root = reg.interface("IRoot", &[a, b]);

    let contract = build_contract(&reg, &root);

    let accepted: Vec<_> = contract
        .services
        .iter()
        .flat_map(|s| s.operations.iter())
        .collect();
    assert!(accepted.is_empty());
    let rejected: Vec<_> = contract
        .services
        .iter()
        .flat_map(|s| s.rejected.iter())
        .collect();
    assert_eq!(rejected.len(), 2);
    assert!(rejected[0].diagnostic().contains(" and "));
}

#[test]
fn no_two_accepted_operations_share_an_identity() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    for name in ["Get", "GET", "Put"] {
        reg.add_operation(
            svc,
            MethodSignature::new(name, vec![], ReturnShape::Type(int32)),
            OperationMarker::default(),
        );
    }

    let contract = build_contract(&reg, &svc);
    let mut seen = std::collections::BTreeSet::new();
    for service in &contract.services {
        for op in &service.operations {
            let key = (
                op.service_name.to_ascii_lowercase(),
                op.operation_name.to_ascii_lowercase(),
            );
            assert!(seen.insert(key), "duplicate accepted identity");
        }
    }
    // Get/GET demoted, Put survives.
    assert_eq!(contract.services[0].operations.len(), 1);
    assert_eq!(contract.services[0].rejected.len(), 2);
}

#[test]
fn interface_without_operations_is_reported_not_attached() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let plain = reg.interface("IPlain", &[]);
    reg.add_method(
        plain,
        MethodSignature::new("Helper", vec![], ReturnShape::Type(int32)),
    );
    let root = reg.interface("IContract", &[plain]);
    reg.mark_service(root, ServiceMarker::default());

    let contract = build_contract(&reg, &root);

    assert_eq!(contract.interfaces, vec![plain]);
    assert_eq!(contract.services.len(), 1);
    // The plain interface produced no rejections anywhere.
    assert!(contract.services.iter().all(|s| s.rejected.is_empty()));
}

#[test]
fn builds_are_deterministic() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let string = reg.data("String");
    let stream = reg.async_stream(string);
    let s1 = reg.interface("IAlpha", &[]);
    void_op(&mut reg, s1, "B");
    void_op(&mut reg, s1, "A");
    let s2 = reg.interface("IBeta", &[s1]);
    reg.mark_service(s2, ServiceMarker::default());
    reg.add_operation(
        s2,
        MethodSignature::new(
            "Feed",
            vec![
                ParameterSpec::value("tag", int32),
                ParameterSpec::value("rows", stream),
            ],
            ReturnShape::Void,
        ),
        OperationMarker::default(),
    );

    let first = build_contract(&reg, &s2);
    let second = build_contract(&reg, &s2);
    assert_eq!(first, second);
    assert_eq!(render_contract(&reg, &first), render_contract(&reg, &second));

    // Operations come out in ordinal name order.
    let alpha = first
        .services
        .iter()
        .find(|s| s.ty == s1)
        .expect("alpha attached");
    let names: Vec<&str> = alpha
        .operations
        .iter()
        .map(|op| op.operation_name.as_str())
        .collect();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn operation_marker_name_override_is_used() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let svc = reg.interface("ISvc", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new("DoGet", vec![], ReturnShape::Type(int32)),
        OperationMarker {
            name: Some("Get".into()),
        },
    );

    let contract = build_contract(&reg, &svc);
    assert_eq!(contract.services[0].operations[0].operation_name, "Get");
}

#[test]
fn rendered_report_snapshot() {
    let mut reg = TypeRegistry::new();
    let int32 = reg.data("Int32");
    let string = reg.data("String");
    let token = reg.context("CancellationToken", ContextKind::Cancellation);
    let items = reg.async_stream(int32);
    let tuple = reg.tuple(&[items, string]);
    let task_tuple = reg.task_of(tuple);

    let svc = reg.interface("ICalculator", &[]);
    reg.mark_service(svc, ServiceMarker::default());
    reg.add_operation(
        svc,
        MethodSignature::new(
            "Add",
            vec![
                ParameterSpec::value("x", int32),
                ParameterSpec::value("t", token),
            ],
            ReturnShape::Type(int32),
        ),
        OperationMarker::default(),
    );
    reg.add_operation(
        svc,
        MethodSignature::new("Watch", vec![], ReturnShape::Type(task_tuple)),
        OperationMarker::default(),
    );

    let contract = build_contract(&reg, &svc);
    assert_snapshot!(render_contract(&reg, &contract), @r"
    contract Calculator
    service Calculator (ICalculator)
      operation Add: unary
        request [Int32]
        response [Int32]
        context [1]
      operation Watch: server-streaming async
        request []
        response [Int32]
        response-header [String]
    ");
}
