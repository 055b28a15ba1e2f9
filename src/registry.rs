//! A symbolic model backend for the [`TypeSystem`] facade.
//!
//! Hosts with real introspection (runtime reflection, compiler symbol tables)
//! implement [`TypeSystem`] against their own type handles. The registry is
//! the reference backend: types are declared by hand, interned into cheap
//! [`TypeId`] handles, and queried through the same facade the pipeline uses
//! against any other host. It doubles as the test substrate for the whole
//! crate.

use crate::facade::{
    ArrayInfo, AsyncResult, ContextKind, MethodSignature, OperationMarker, ServiceMarker,
    TypeSystem,
};

/// Opaque handle into a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

#[derive(Debug, Clone, PartialEq)]
struct TypeDecl {
    name: String,
    kind: TypeKind,
    generic_args: Vec<TypeId>,
    name_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum TypeKind {
    Data,
    Interface(InterfaceDecl),
    Array { element: TypeId, rank: u32 },
    Tuple { elements: Vec<TypeId> },
    AsyncResult { value: Option<TypeId> },
    AsyncStream { item: TypeId },
    Context(ContextKind),
    ByteStream,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct InterfaceDecl {
    extends: Vec<TypeId>,
    marker: Option<ServiceMarker>,
    methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq)]
struct MethodDecl {
    signature: MethodSignature<TypeId>,
    marker: Option<OperationMarker>,
}

/// Hand-declared symbolic type graph.
///
/// Built mutably, then used read-only through the [`TypeSystem`] facade.
/// Overloaded methods are distinguished by their full signature.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDecl>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a structural declaration: identical non-interface declarations
    /// share one handle, so structurally equal types compare equal.
    fn intern(&mut self, decl: TypeDecl) -> TypeId {
        if !matches!(decl.kind, TypeKind::Interface(_))
            && let Some(pos) = self.types.iter().position(|d| *d == decl)
        {
            return TypeId(pos as u32);
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(decl);
        id
    }

    pub fn data(&mut self, name: &str) -> TypeId {
        self.intern(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::Data,
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    pub fn data_with_override(&mut self, name: &str, contract_name: &str) -> TypeId {
        self.intern(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::Data,
            generic_args: Vec::new(),
            name_override: Some(contract_name.to_owned()),
        })
    }

    pub fn generic_data(&mut self, name: &str, args: &[TypeId]) -> TypeId {
        self.intern(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::Data,
            generic_args: args.to_vec(),
            name_override: None,
        })
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.array_with_rank(element, 1)
    }

    pub fn array_with_rank(&mut self, element: TypeId, rank: u32) -> TypeId {
        let commas = ",".repeat(rank.saturating_sub(1) as usize);
        let name = format!("{}[{}]", self.types[element.0 as usize].name, commas);
        self.intern(TypeDecl {
            name,
            kind: TypeKind::Array { element, rank },
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    pub fn tuple(&mut self, elements: &[TypeId]) -> TypeId {
        let names: Vec<&str> = elements
            .iter()
            .map(|id| self.types[id.0 as usize].name.as_str())
            .collect();
        self.intern(TypeDecl {
            name: format!("({})", names.join(", ")),
            kind: TypeKind::Tuple {
                elements: elements.to_vec(),
            },
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    /// An asynchronous result of the given value type.
    ///
    /// Named differently from the [`TypeSystem::async_result`] query so the
    /// builder stays callable where the trait is in scope.
    pub fn task_of(&mut self, value: TypeId) -> TypeId {
        self.intern(TypeDecl {
            name: "Task".to_owned(),
            kind: TypeKind::AsyncResult { value: Some(value) },
            generic_args: vec![value],
            name_override: None,
        })
    }

    /// An asynchronous result of no value.
    pub fn async_unit(&mut self) -> TypeId {
        self.intern(TypeDecl {
            name: "Task".to_owned(),
            kind: TypeKind::AsyncResult { value: None },
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    /// An asynchronous lazy sequence of the given item type.
    pub fn async_stream(&mut self, item: TypeId) -> TypeId {
        self.intern(TypeDecl {
            name: "AsyncStream".to_owned(),
            kind: TypeKind::AsyncStream { item },
            generic_args: vec![item],
            name_override: None,
        })
    }

    pub fn context(&mut self, name: &str, kind: ContextKind) -> TypeId {
        self.intern(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::Context(kind),
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    pub fn byte_stream(&mut self, name: &str) -> TypeId {
        self.intern(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::ByteStream,
            generic_args: Vec::new(),
            name_override: None,
        })
    }

    /// Declare a fresh interface. Interfaces are never interned.
    pub fn interface(&mut self, name: &str, extends: &[TypeId]) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDecl {
            name: name.to_owned(),
            kind: TypeKind::Interface(InterfaceDecl {
                extends: extends.to_vec(),
                ..Default::default()
            }),
            generic_args: Vec::new(),
            name_override: None,
        });
        id
    }

    pub fn set_generic_args(&mut self, ty: TypeId, args: &[TypeId]) {
        self.types[ty.0 as usize].generic_args = args.to_vec();
    }

    /// Mark an interface as a declared service boundary.
    ///
    /// # Panics
    ///
    /// Panics when `ty` is not an interface; that is a declaration bug.
    pub fn mark_service(&mut self, ty: TypeId, marker: ServiceMarker) {
        self.interface_mut(ty).marker = Some(marker);
    }

    /// Add a method without an operation marker.
    pub fn add_method(&mut self, ty: TypeId, signature: MethodSignature<TypeId>) {
        self.interface_mut(ty).methods.push(MethodDecl {
            signature,
            marker: None,
        });
    }

    /// Add a method carrying an operation marker.
    pub fn add_operation(
        &mut self,
        ty: TypeId,
        signature: MethodSignature<TypeId>,
        marker: OperationMarker,
    ) {
        self.interface_mut(ty).methods.push(MethodDecl {
            signature,
            marker: Some(marker),
        });
    }

    fn interface_mut(&mut self, ty: TypeId) -> &mut InterfaceDecl {
        match &mut self.types[ty.0 as usize].kind {
            TypeKind::Interface(decl) => decl,
            other => panic!("{ty:?} is not an interface: {other:?}"),
        }
    }

    fn decl(&self, ty: &TypeId) -> &TypeDecl {
        &self.types[ty.0 as usize]
    }

    fn interface_decl(&self, ty: &TypeId) -> Option<&InterfaceDecl> {
        match &self.decl(ty).kind {
            TypeKind::Interface(decl) => Some(decl),
            _ => None,
        }
    }

    /// True when `source` transitively extends `target`.
    fn extends_transitively(&self, target: &TypeId, source: &TypeId) -> bool {
        let Some(decl) = self.interface_decl(source) else {
            return false;
        };
        decl.extends
            .iter()
            .any(|base| base == target || self.extends_transitively(target, base))
    }
}

impl TypeSystem for TypeRegistry {
    type TypeRef = TypeId;

    fn interface_closure(&self, root: &TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut queue = vec![*root];
        while let Some(ty) = queue.pop() {
            let Some(decl) = self.interface_decl(&ty) else {
                continue;
            };
            if out.contains(&ty) {
                continue;
            }
            out.push(ty);
            // Reverse so declaration order survives the stack pop.
            queue.extend(decl.extends.iter().rev());
        }
        out
    }

    fn methods_of(&self, ty: &TypeId) -> Vec<MethodSignature<TypeId>> {
        self.interface_decl(ty)
            .map(|decl| decl.methods.iter().map(|m| m.signature.clone()).collect())
            .unwrap_or_default()
    }

    fn is_assignable(&self, target: &TypeId, source: &TypeId) -> bool {
        target == source || self.extends_transitively(target, source)
    }

    fn generic_args(&self, ty: &TypeId) -> Vec<TypeId> {
        self.decl(ty).generic_args.clone()
    }

    fn array_info(&self, ty: &TypeId) -> Option<ArrayInfo<TypeId>> {
        match self.decl(ty).kind {
            TypeKind::Array { element, rank } => Some(ArrayInfo { element, rank }),
            _ => None,
        }
    }

    fn tuple_elements(&self, ty: &TypeId) -> Option<Vec<TypeId>> {
        match &self.decl(ty).kind {
            TypeKind::Tuple { elements } => Some(elements.clone()),
            _ => None,
        }
    }

    fn async_result(&self, ty: &TypeId) -> Option<AsyncResult<TypeId>> {
        match self.decl(ty).kind {
            TypeKind::AsyncResult { value: Some(value) } => Some(AsyncResult::Value(value)),
            TypeKind::AsyncResult { value: None } => Some(AsyncResult::Empty),
            _ => None,
        }
    }

    fn async_stream_item(&self, ty: &TypeId) -> Option<TypeId> {
        match self.decl(ty).kind {
            TypeKind::AsyncStream { item } => Some(item),
            _ => None,
        }
    }

    fn context_kind(&self, ty: &TypeId) -> Option<ContextKind> {
        match self.decl(ty).kind {
            TypeKind::Context(kind) => Some(kind),
            _ => None,
        }
    }

    fn is_raw_byte_stream(&self, ty: &TypeId) -> bool {
        matches!(self.decl(ty).kind, TypeKind::ByteStream)
    }

    fn service_marker(&self, ty: &TypeId) -> Option<ServiceMarker> {
        self.interface_decl(ty).and_then(|decl| decl.marker.clone())
    }

    fn operation_marker(
        &self,
        owner: &TypeId,
        method: &MethodSignature<TypeId>,
    ) -> Option<OperationMarker> {
        self.interface_decl(owner)?
            .methods
            .iter()
            .find(|m| m.signature == *method)
            .and_then(|m| m.marker.clone())
    }

    fn data_name_override(&self, ty: &TypeId) -> Option<String> {
        self.decl(ty).name_override.clone()
    }

    fn type_name(&self, ty: &TypeId) -> String {
        self.decl(ty).name.clone()
    }

    fn display_type(&self, ty: &TypeId) -> String {
        let decl = self.decl(ty);
        match &decl.kind {
            TypeKind::Array { element, rank } => {
                format!(
                    "{}[{}]",
                    self.display_type(element),
                    ",".repeat(rank.saturating_sub(1) as usize)
                )
            }
            TypeKind::Tuple { elements } => {
                let parts: Vec<String> = elements.iter().map(|e| self.display_type(e)).collect();
                format!("({})", parts.join(", "))
            }
            _ if decl.generic_args.is_empty() => decl.name.clone(),
            _ => {
                let args: Vec<String> = decl
                    .generic_args
                    .iter()
                    .map(|a| self.display_type(a))
                    .collect();
                format!("{}<{}>", decl.name, args.join(", "))
            }
        }
    }
}
