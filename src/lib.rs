#![deny(unsafe_code)]

//! Wire-contract front-end for RPC service interfaces.
//!
//! # What This Crate Decides
//!
//! Given a root type and a view of the host type system, this crate decides
//! *what the wire contract must look like*: which methods become remote
//! operations, what shape each request/response message takes, which
//! parameters are control/context versus payload versus streaming, and how
//! duplicate names and legacy blocking facades are resolved. It does not
//! serialize anything, perform calls, or emit code — those live in the
//! emission and runtime layers that consume the produced
//! [`ContractDescription`].
//!
//! # The Pipeline
//!
//! ```text
//! root type ──▶ resolve ──▶ classify + naming ──▶ conflict ──▶ assemble
//!              interface      per-method wire       duplicate      immutable
//!              closure        shapes                demotion,      ContractDescription
//!                                                   sync pairing
//! ```
//!
//! The whole pipeline is a pure, synchronous function of
//! (root type, [`TypeSystem`]) and is safe to run concurrently for different
//! roots. Method-level problems never abort a build: they are recorded as
//! [`RejectedMethod`] data and the assembler always returns a complete,
//! best-effort contract.
//!
//! # One Algorithm, Any Backend
//!
//! All type introspection goes through the [`TypeSystem`] facade. A
//! live-reflection host and a static-analysis host plug in their own
//! `TypeRef` handles and get identical contract semantics; the bundled
//! [`registry::TypeRegistry`] is the symbolic reference backend.
//!
//! ```
//! use wireplan::facade::{ContextKind, MethodSignature, ParameterSpec, ReturnShape, ServiceMarker};
//! use wireplan::registry::TypeRegistry;
//!
//! let mut reg = TypeRegistry::new();
//! let int32 = reg.data("Int32");
//! let token = reg.context("CancellationToken", ContextKind::Cancellation);
//!
//! let calculator = reg.interface("ICalculator", &[]);
//! reg.mark_service(calculator, ServiceMarker::default());
//! reg.add_operation(
//!     calculator,
//!     MethodSignature::new(
//!         "Add",
//!         vec![
//!             ParameterSpec::value("x", int32),
//!             ParameterSpec::value("y", int32),
//!             ParameterSpec::value("ct", token),
//!         ],
//!         ReturnShape::Type(int32),
//!     ),
//!     Default::default(),
//! );
//!
//! let contract = wireplan::build_contract(&reg, &calculator);
//! assert_eq!(contract.services.len(), 1);
//! let op = &contract.services[0].operations[0];
//! assert_eq!(op.operation_name, "Add");
//! assert_eq!(op.context_indices, vec![2]);
//! ```

pub mod assemble;
pub mod classify;
pub mod conflict;
pub mod facade;
pub mod naming;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod schema;

pub use assemble::build_contract;
pub use classify::ClassifyError;
pub use facade::TypeSystem;
pub use render::render_contract;
pub use schema::{
    ContractDescription, MessageShape, OperationDescription, OperationKind, RejectedMethod,
    ServiceNode,
};
