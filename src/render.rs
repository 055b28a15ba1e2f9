//! Deterministic plain-text rendering of a contract.
//!
//! Used by diagnostic reporters and by snapshot tests. The layout is stable:
//! it only depends on the contract itself, which is already ordinally sorted
//! by the assembler.

use std::fmt::Write;

use crate::facade::TypeSystem;
use crate::schema::{ContractDescription, MessageShape, OperationDescription};

/// Render a whole contract as an indented text report.
pub fn render_contract<TS: TypeSystem>(
    ts: &TS,
    contract: &ContractDescription<TS::TypeRef>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "contract {}", contract.base_name);

    for service in &contract.services {
        let _ = writeln!(
            out,
            "service {} ({})",
            service.service_name,
            ts.type_name(&service.ty)
        );
        for op in &service.operations {
            render_operation(ts, &mut out, op);
        }
        for rejected in &service.rejected {
            let _ = writeln!(
                out,
                "  rejected {}: {}",
                ts.display_signature(&rejected.method),
                rejected.diagnostic()
            );
        }
        for plain in &service.plain_methods {
            let _ = writeln!(
                out,
                "  plain {}: {}",
                ts.display_signature(&plain.method),
                plain.diagnostic
            );
        }
        for pairing in &service.sync_over_async {
            let _ = writeln!(
                out,
                "  sync-over-async {} -> {}",
                pairing.sync_method.name, pairing.async_operation_name
            );
        }
    }

    for orphan in &contract.interfaces {
        let _ = writeln!(out, "interface {}", ts.type_name(orphan));
    }

    out
}

fn render_operation<TS: TypeSystem>(
    ts: &TS,
    out: &mut String,
    op: &OperationDescription<TS::TypeRef>,
) {
    let asyncness = if op.is_async { " async" } else { "" };
    let _ = writeln!(out, "  operation {}: {}{}", op.operation_name, op.kind, asyncness);
    let _ = writeln!(out, "    request {}", render_shape(ts, &op.request));
    if let Some(header) = &op.header_request {
        let _ = writeln!(out, "    request-header {}", render_shape(ts, &header.message));
    }
    let _ = writeln!(out, "    response {}", render_shape(ts, &op.response));
    if let Some(header) = &op.header_response {
        let _ = writeln!(
            out,
            "    response-header {}",
            render_shape(ts, &header.message)
        );
    }
    if !op.context_indices.is_empty() {
        let ordinals: Vec<String> = op.context_indices.iter().map(|i| i.to_string()).collect();
        let _ = writeln!(out, "    context [{}]", ordinals.join(", "));
    }
}

fn render_shape<TS: TypeSystem>(ts: &TS, shape: &MessageShape<TS::TypeRef>) -> String {
    let fields: Vec<String> = shape.types().iter().map(|ty| ts.display_type(ty)).collect();
    format!("[{}]", fields.join(", "))
}
