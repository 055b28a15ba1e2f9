//! Capability surface the contract pipeline requires from a host type system.
//!
//! The pipeline never inspects types directly. Everything it needs — interface
//! closures, assignability, generic arguments, async/stream/tuple probes,
//! declarative markers — goes through [`TypeSystem`]. A live-reflection host
//! and a static-analysis host implement the same trait and get identical
//! contract semantics; neither reimplements any classification logic.

use std::fmt::Debug;
use std::fmt::Write;
use std::hash::Hash;

/// How a parameter is passed at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassingMode {
    Value,
    /// By-reference passing (in/out/ref style). Always rejected for operations.
    ByRef,
}

/// One parameter of a method signature, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterSpec<T> {
    pub name: String,
    pub ty: T,
    pub mode: PassingMode,
}

impl<T> ParameterSpec<T> {
    pub fn value(name: impl Into<String>, ty: T) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: PassingMode::Value,
        }
    }

    pub fn by_ref(name: impl Into<String>, ty: T) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: PassingMode::ByRef,
        }
    }
}

/// The declared return shape of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnShape<T> {
    /// The method returns no value.
    Void,
    /// The method returns a value of the given type.
    Type(T),
}

/// An abstract view of one method, as reported by the host type system.
///
/// Parameter ordinals are positions in `params`; the pipeline never reorders
/// this list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature<T> {
    pub name: String,
    pub params: Vec<ParameterSpec<T>>,
    pub ret: ReturnShape<T>,
    /// True when the method declares its own generic parameters. Such methods
    /// can never be operations.
    pub declares_generics: bool,
}

impl<T> MethodSignature<T> {
    pub fn new(name: impl Into<String>, params: Vec<ParameterSpec<T>>, ret: ReturnShape<T>) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            declares_generics: false,
        }
    }

    pub fn with_generics(mut self) -> Self {
        self.declares_generics = true;
        self
    }
}

/// The control-parameter shapes a host recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// A cancellation signal.
    Cancellation,
    /// A call-options bag (deadlines, headers, credentials).
    CallOptions,
    /// A server- or client-side call context object.
    CallContext,
}

/// Declarative "this interface is a service boundary" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ServiceMarker {
    /// Declared service name, overriding the derived one.
    pub name: Option<String>,
    /// Declared namespace, prefixed to the service name when present.
    pub namespace: Option<String>,
}

/// Declarative "this method is an operation" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OperationMarker {
    /// Declared operation name, overriding the method name.
    pub name: Option<String>,
}

/// Element type and rank of an array type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayInfo<T> {
    pub element: T,
    /// 1 for `T[]`, 2 for `T[,]`, and so on.
    pub rank: u32,
}

/// What an asynchronous-result wrapper resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsyncResult<T> {
    /// An asynchronous result of no value.
    Empty,
    /// An asynchronous result of the given type.
    Value(T),
}

/// The type-introspection capabilities the contract pipeline consumes.
///
/// `TypeRef` is an opaque handle: the pipeline compares handles only through
/// `Eq` and [`TypeSystem::is_assignable`], and never assumes identity
/// semantics beyond what the host provides. Implementations must be safe for
/// concurrent read access; the pipeline performs no mutation through them.
pub trait TypeSystem {
    type TypeRef: Clone + PartialEq + Eq + Hash + Debug;

    /// The full transitive, deduplicated set of interfaces reachable from
    /// `root`, including `root` itself when it is an interface.
    fn interface_closure(&self, root: &Self::TypeRef) -> Vec<Self::TypeRef>;

    /// Methods declared directly on `ty` (non-static, excluding inherited).
    fn methods_of(&self, ty: &Self::TypeRef) -> Vec<MethodSignature<Self::TypeRef>>;

    /// True when a value of `source` can be assigned to `target`.
    fn is_assignable(&self, target: &Self::TypeRef, source: &Self::TypeRef) -> bool;

    /// Generic type arguments of `ty`, empty for non-generic types.
    fn generic_args(&self, ty: &Self::TypeRef) -> Vec<Self::TypeRef>;

    /// Element and rank when `ty` is an array type.
    fn array_info(&self, ty: &Self::TypeRef) -> Option<ArrayInfo<Self::TypeRef>>;

    /// Element types when `ty` is a fixed-arity tuple.
    fn tuple_elements(&self, ty: &Self::TypeRef) -> Option<Vec<Self::TypeRef>>;

    /// What `ty` resolves to when it is an asynchronous-result wrapper.
    fn async_result(&self, ty: &Self::TypeRef) -> Option<AsyncResult<Self::TypeRef>>;

    /// The item type when `ty` is an asynchronous lazy sequence.
    fn async_stream_item(&self, ty: &Self::TypeRef) -> Option<Self::TypeRef>;

    /// The control-parameter kind `ty` matches, if any.
    fn context_kind(&self, ty: &Self::TypeRef) -> Option<ContextKind>;

    /// True for raw byte-stream types, which cannot be wire messages.
    fn is_raw_byte_stream(&self, ty: &Self::TypeRef) -> bool;

    /// The service-boundary marker declared on `ty`, if any.
    fn service_marker(&self, ty: &Self::TypeRef) -> Option<ServiceMarker>;

    /// The operation marker declared on `method` of `owner`, if any.
    fn operation_marker(
        &self,
        owner: &Self::TypeRef,
        method: &MethodSignature<Self::TypeRef>,
    ) -> Option<OperationMarker>;

    /// Declared contract-name override on a data type, if any.
    fn data_name_override(&self, ty: &Self::TypeRef) -> Option<String>;

    /// The bare declared name of `ty` (no namespace, no generic arguments).
    fn type_name(&self, ty: &Self::TypeRef) -> String;

    /// Deterministic human-readable rendering of `ty` for diagnostics.
    fn display_type(&self, ty: &Self::TypeRef) -> String;

    /// Deterministic human-readable rendering of a full method signature.
    fn display_signature(&self, method: &MethodSignature<Self::TypeRef>) -> String {
        let mut out = String::new();
        match &method.ret {
            ReturnShape::Void => out.push_str("void"),
            ReturnShape::Type(ty) => out.push_str(&self.display_type(ty)),
        }
        let _ = write!(out, " {}(", method.name);
        for (i, param) in method.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if param.mode == PassingMode::ByRef {
                out.push_str("ref ");
            }
            let _ = write!(out, "{} {}", self.display_type(&param.ty), param.name);
        }
        out.push(')');
        out
    }
}
