//! Per-method signature classification into the operation algebra.
//!
//! Each method either becomes an [`OperationDescription`] or a structured
//! [`ClassifyError`]; nothing here ever panics or aborts the batch. The
//! classifier partitions parameters into context / stream / data roles,
//! derives the request and response message shapes, and computes the
//! operation kind from which sides stream.

use crate::facade::{AsyncResult, MethodSignature, PassingMode, ReturnShape, TypeSystem};
use crate::schema::{HeaderMessage, MessageShape, OperationDescription, OperationKind};

/// Why a method cannot be expressed as a remote operation.
///
/// Every variant is method-local and non-fatal: the assembler records it as
/// data and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("methods with their own generic parameters are not supported")]
    GenericMethod,

    #[error("parameter {name} is passed by reference, which is not supported")]
    ByRefParameter { name: String },

    #[error("only one streaming parameter is allowed per method")]
    MultipleStreamParameters,

    #[error("a return tuple containing a stream must be wrapped in an asynchronous result")]
    TupleStreamNotAsync,

    #[error("a return tuple with a single stream element carries no header data, unwrap the tuple")]
    SingletonTupleStream,

    #[error("a return tuple may contain at most one stream element")]
    MultipleStreamElements,

    #[error("return type {type_name} is not supported as a response message")]
    UnsupportedResponseType { type_name: String },

    #[error(
        "operation {}/{} is implemented by more than one method: {}",
        .service_name,
        .operation_name,
        .signatures.join(" and ")
    )]
    DuplicateOperation {
        service_name: String,
        operation_name: String,
        signatures: Vec<String>,
    },

    #[error("method is not declared as a service operation")]
    NotAnOperation,
}

/// Classify one method into an operation, or explain why it cannot be one.
pub fn classify_operation<TS: TypeSystem>(
    ts: &TS,
    service_name: &str,
    operation_name: &str,
    method: &MethodSignature<TS::TypeRef>,
) -> Result<OperationDescription<TS::TypeRef>, ClassifyError> {
    if method.declares_generics {
        return Err(ClassifyError::GenericMethod);
    }

    let roles = partition_parameters(ts, method)?;
    let response = derive_response(ts, &method.ret)?;
    let request = derive_request(method, &roles);

    let kind = match (roles.stream.is_some(), response.streaming) {
        (true, true) => OperationKind::DuplexStreaming,
        (true, false) => OperationKind::ClientStreaming,
        (false, true) => OperationKind::ServerStreaming,
        (false, false) => OperationKind::Unary,
    };

    Ok(OperationDescription {
        service_name: service_name.to_owned(),
        operation_name: operation_name.to_owned(),
        method: method.clone(),
        request: request.message,
        request_indices: request.indices,
        header_request: request.header,
        response: response.message,
        response_stream_slot: response.stream_slot,
        header_response: response.header,
        context_indices: roles.context,
        kind,
        is_async: response.is_async,
    })
}

/// Parameter ordinals split by role. Context, stream, and data together
/// partition the full index set.
struct ParameterRoles<T> {
    context: Vec<usize>,
    data: Vec<usize>,
    /// Ordinal of the single streaming parameter plus its element type.
    stream: Option<(usize, T)>,
}

fn partition_parameters<TS: TypeSystem>(
    ts: &TS,
    method: &MethodSignature<TS::TypeRef>,
) -> Result<ParameterRoles<TS::TypeRef>, ClassifyError> {
    let mut roles = ParameterRoles {
        context: Vec::new(),
        data: Vec::new(),
        stream: None,
    };

    for (ordinal, param) in method.params.iter().enumerate() {
        if param.mode == PassingMode::ByRef {
            return Err(ClassifyError::ByRefParameter {
                name: param.name.clone(),
            });
        }
        if ts.context_kind(&param.ty).is_some() {
            roles.context.push(ordinal);
        } else if let Some(item) = ts.async_stream_item(&param.ty) {
            if roles.stream.is_some() {
                return Err(ClassifyError::MultipleStreamParameters);
            }
            roles.stream = Some((ordinal, item));
        } else {
            roles.data.push(ordinal);
        }
    }

    Ok(roles)
}

struct RequestParts<T> {
    message: MessageShape<T>,
    indices: Vec<usize>,
    header: Option<HeaderMessage<T>>,
}

fn derive_request<T: Clone>(
    method: &MethodSignature<T>,
    roles: &ParameterRoles<T>,
) -> RequestParts<T> {
    let data_types = || {
        roles
            .data
            .iter()
            .map(|&i| method.params[i].ty.clone())
            .collect::<Vec<_>>()
    };

    match &roles.stream {
        Some((ordinal, item)) => {
            // The stream feeds the request; any other data parameters ride
            // along as an ordered header message.
            let header = if roles.data.is_empty() {
                None
            } else {
                Some(HeaderMessage {
                    message: MessageShape::new(data_types()),
                    indices: roles.data.clone(),
                })
            };
            RequestParts {
                message: MessageShape::new(vec![item.clone()]),
                indices: vec![*ordinal],
                header,
            }
        }
        None => RequestParts {
            message: MessageShape::new(data_types()),
            indices: roles.data.clone(),
            header: None,
        },
    }
}

struct ResponseParts<T> {
    message: MessageShape<T>,
    stream_slot: Option<usize>,
    header: Option<HeaderMessage<T>>,
    streaming: bool,
    is_async: bool,
}

impl<T> ResponseParts<T> {
    fn empty(is_async: bool) -> Self {
        Self {
            message: MessageShape::empty(),
            stream_slot: None,
            header: None,
            streaming: false,
            is_async,
        }
    }
}

fn derive_response<TS: TypeSystem>(
    ts: &TS,
    ret: &ReturnShape<TS::TypeRef>,
) -> Result<ResponseParts<TS::TypeRef>, ClassifyError> {
    let (value, is_async) = match ret {
        ReturnShape::Void => return Ok(ResponseParts::empty(false)),
        ReturnShape::Type(ty) => match ts.async_result(ty) {
            Some(AsyncResult::Empty) => return Ok(ResponseParts::empty(true)),
            Some(AsyncResult::Value(inner)) => (inner, true),
            None => (ty.clone(), false),
        },
    };

    if let Some(elements) = ts.tuple_elements(&value) {
        let mut streams: Vec<(usize, TS::TypeRef)> = elements
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| ts.async_stream_item(e).map(|item| (slot, item)))
            .collect();

        if streams.len() > 1 {
            return Err(ClassifyError::MultipleStreamElements);
        }
        if let Some((slot, item)) = streams.pop() {
            if !is_async {
                return Err(ClassifyError::TupleStreamNotAsync);
            }
            if elements.len() == 1 {
                return Err(ClassifyError::SingletonTupleStream);
            }
            let header_indices: Vec<usize> = (0..elements.len()).filter(|&i| i != slot).collect();
            let header_types: Vec<TS::TypeRef> = header_indices
                .iter()
                .map(|&i| elements[i].clone())
                .collect();
            return Ok(ResponseParts {
                message: MessageShape::new(vec![item]),
                stream_slot: Some(slot),
                header: Some(HeaderMessage {
                    message: MessageShape::new(header_types),
                    indices: header_indices,
                }),
                streaming: true,
                is_async,
            });
        }
        // A tuple without a stream is a plain data response.
    }

    if let Some(item) = ts.async_stream_item(&value) {
        return Ok(ResponseParts {
            message: MessageShape::new(vec![item]),
            stream_slot: None,
            header: None,
            streaming: true,
            is_async,
        });
    }

    // Plain data response: must not be a context shape, a nested
    // asynchronous result, or a raw byte stream.
    if ts.context_kind(&value).is_some()
        || ts.async_result(&value).is_some()
        || ts.is_raw_byte_stream(&value)
    {
        return Err(ClassifyError::UnsupportedResponseType {
            type_name: ts.display_type(&value),
        });
    }

    Ok(ResponseParts {
        message: MessageShape::new(vec![value]),
        stream_slot: None,
        header: None,
        streaming: false,
        is_async,
    })
}
