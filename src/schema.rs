//! The immutable contract model.
//!
//! Everything here is built once per root type by [`crate::assemble`] and
//! never mutated afterwards. Downstream consumers (emission backends,
//! diagnostic reporters) only read it. A change in the underlying type graph
//! requires a full rebuild; there is no incremental mutation API.

use crate::classify::ClassifyError;
use crate::facade::MethodSignature;

/// An ordered list of wire field types.
///
/// Element order is the wire field order and is fixed at construction; there
/// is deliberately no mutation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageShape<T> {
    elements: Vec<T>,
}

impl<T> MessageShape<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Element types in wire field order.
    pub fn types(&self) -> &[T] {
        &self.elements
    }

    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// The four shapes a remote call can take on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Unary,
    ClientStreaming,
    ServerStreaming,
    DuplexStreaming,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationKind::Unary => "unary",
            OperationKind::ClientStreaming => "client-streaming",
            OperationKind::ServerStreaming => "server-streaming",
            OperationKind::DuplexStreaming => "duplex-streaming",
        };
        f.write_str(s)
    }
}

/// A secondary message carried alongside a streamed payload, plus the source
/// ordinals (parameter indices on the request side, tuple element indices on
/// the response side) its fields came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMessage<T> {
    pub message: MessageShape<T>,
    pub indices: Vec<usize>,
}

/// One method accepted as a remote operation, with its derived wire shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescription<T> {
    pub service_name: String,
    pub operation_name: String,
    /// The source signature this operation was derived from.
    pub method: MethodSignature<T>,
    /// The request message. For a streaming request this is the stream's
    /// element type; otherwise the data parameters in declaration order.
    pub request: MessageShape<T>,
    /// Parameter ordinals feeding the request message.
    pub request_indices: Vec<usize>,
    /// Present only when a streaming parameter coexists with data parameters.
    pub header_request: Option<HeaderMessage<T>>,
    /// The response message. For a streaming response this is the stream's
    /// element type.
    pub response: MessageShape<T>,
    /// Ordinal of the stream among the return tuple's elements, when the
    /// response is a tuple-wrapped stream.
    pub response_stream_slot: Option<usize>,
    /// Present only when a streaming response carries header data.
    pub header_response: Option<HeaderMessage<T>>,
    /// Ordinals of every context parameter, in declaration order.
    pub context_indices: Vec<usize>,
    pub kind: OperationKind,
    /// True when the declared return was wrapped in an asynchronous result.
    pub is_async: bool,
}

/// A method that cannot be expressed as an operation, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMethod<T> {
    pub method: MethodSignature<T>,
    pub error: ClassifyError,
}

impl<T> RejectedMethod<T> {
    /// Human-readable diagnostic for build-time reporting.
    pub fn diagnostic(&self) -> String {
        self.error.to_string()
    }
}

/// A structurally valid method that is not a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMethod<T> {
    pub method: MethodSignature<T>,
    pub diagnostic: String,
}

/// A legacy blocking method paired with the asynchronous operation it
/// forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOverAsync<T> {
    pub sync_method: MethodSignature<T>,
    /// Operation name of the asynchronous counterpart within the same service.
    pub async_operation_name: String,
}

/// A resolved service boundary and everything classified under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode<T> {
    pub ty: T,
    pub service_name: String,
    pub operations: Vec<OperationDescription<T>>,
    pub rejected: Vec<RejectedMethod<T>>,
    pub plain_methods: Vec<PlainMethod<T>>,
    pub sync_over_async: Vec<SyncOverAsync<T>>,
}

/// The complete contract for one root type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescription<T> {
    pub root: T,
    /// Synthesized base identifier for generated artifacts.
    pub base_name: String,
    /// Interfaces reachable from the root that are neither declared services
    /// nor attachable to one. Reported as "not a service contract".
    pub interfaces: Vec<T>,
    pub services: Vec<ServiceNode<T>>,
}
