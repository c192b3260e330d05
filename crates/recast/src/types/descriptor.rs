// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.
//!
//! A [`TypeDescriptor`] has a process-unique identity, a display name, a
//! [`TypeKind`] and a method set. Descriptors are shared as [`TypeRef`]
//! (`Arc<TypeDescriptor>`) and compared by identity, never structurally.
//!
//! Self-referential shapes are built by declaring a descriptor first and
//! defining its kind once the referring descriptors exist:
//!
//! ```rust
//! use recast::types::{FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind};
//! use std::sync::Arc;
//!
//! let node = Arc::new(TypeDescriptor::declared("Node"));
//! let next = Arc::new(TypeDescriptor::pointer(node.clone()));
//! let value = Arc::new(TypeDescriptor::primitive(PrimitiveKind::I64));
//! assert!(node.define(TypeKind::Record(vec![
//!     FieldDescriptor::new("value", value),
//!     FieldDescriptor::new("next", next),
//! ])));
//! assert!(node.is_record());
//! ```

use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared handle to a descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// Implementation of a method: receives the receiver value, returns the result.
pub type MethodFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);
static UNDEFINED: TypeKind = TypeKind::Undefined;

/// Process-unique descriptor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u64);

impl TypeId {
    fn next() -> Self {
        Self(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identity value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// Pointer-sized unsigned integer; also carries raw addresses.
    Usize,
    F32,
    F64,
    Char,
    String,
}

impl PrimitiveKind {
    /// Default display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "String",
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::Usize
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Integer, float or char.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self == Self::Char
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelDir {
    Both,
    Send,
    Recv,
}

impl ChannelDir {
    /// Whether a channel of direction `from` can stand in for `self`.
    pub fn accepts(self, from: ChannelDir) -> bool {
        from == ChannelDir::Both || from == self
    }
}

/// Callable signature.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
}

impl Signature {
    pub fn new(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Self {
        Self { params, results }
    }
}

/// A named method, optionally with an implementation.
///
/// Methods without an implementation still count for dynamic-value
/// conformance checks.
#[derive(Clone)]
pub struct Method {
    pub name: String,
    pub func: Option<MethodFn>,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            func: None,
        }
    }

    pub fn with_impl<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Some(Arc::new(func)),
        }
    }

    /// Invoke the implementation, if any.
    pub fn call(&self, receiver: &Value) -> Option<Value> {
        self.func.as_ref().map(|f| f(receiver))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("implemented", &self.func.is_some())
            .finish()
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// Fixed-length array, stored inline.
    Array { elem: TypeRef, len: usize },
    /// Dynamically sized list behind a shared handle.
    List { elem: TypeRef },
    /// Associative container behind a shared handle.
    Map { key: TypeRef, value: TypeRef },
    /// Record with named fields, stored inline.
    Record(Vec<FieldDescriptor>),
    /// Nullable indirection cell.
    Pointer { elem: TypeRef },
    /// Tagged union of (concrete type, value) restricted to types providing `methods`.
    Dynamic { methods: Vec<String> },
    /// Callable.
    Callable(Signature),
    /// Opaque channel handle.
    Channel { elem: TypeRef, dir: ChannelDir },
    /// Untyped address.
    RawPointer,
    /// Declared but not yet defined.
    Undefined,
}

/// A complete type descriptor.
pub struct TypeDescriptor {
    id: TypeId,
    name: String,
    kind: OnceLock<TypeKind>,
    methods: Vec<Method>,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(kind);
        Self {
            id: TypeId::next(),
            name: name.into(),
            kind: slot,
            methods: Vec::new(),
        }
    }

    /// Create a descriptor whose kind is supplied later through [`define`](Self::define).
    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            id: TypeId::next(),
            name: name.into(),
            kind: OnceLock::new(),
            methods: Vec::new(),
        }
    }

    /// Define the kind of a declared descriptor. Returns false if already defined.
    pub fn define(&self, kind: TypeKind) -> bool {
        self.kind.set(kind).is_ok()
    }

    /// Unnamed primitive.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new("", TypeKind::Primitive(kind))
    }

    /// Named primitive (a distinct type with the same layout).
    pub fn named_primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    pub fn list(elem: TypeRef) -> Self {
        Self::new("", TypeKind::List { elem })
    }

    pub fn array(elem: TypeRef, len: usize) -> Self {
        Self::new("", TypeKind::Array { elem, len })
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::new("", TypeKind::Map { key, value })
    }

    pub fn pointer(elem: TypeRef) -> Self {
        Self::new("", TypeKind::Pointer { elem })
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Record(fields))
    }

    /// Dynamic value accepting any concrete type providing `methods`.
    pub fn dynamic<I, S>(name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut methods: Vec<String> = methods.into_iter().map(Into::into).collect();
        methods.sort();
        methods.dedup();
        Self::new(name, TypeKind::Dynamic { methods })
    }

    pub fn callable(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Self {
        Self::new("", TypeKind::Callable(Signature::new(params, results)))
    }

    pub fn channel(elem: TypeRef, dir: ChannelDir) -> Self {
        Self::new("", TypeKind::Channel { elem, dir })
    }

    /// Attach a method declaration without implementation.
    pub fn with_method_name(mut self, name: impl Into<String>) -> Self {
        self.methods.push(Method::new(name));
        self
    }

    /// Attach an implemented method.
    pub fn with_method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.methods.push(Method::with_impl(name, func));
        self
    }

    pub(crate) fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared name (empty for structural types).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        self.kind.get().unwrap_or(&UNDEFINED)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// True when every name in `required` is in this type's method set.
    ///
    /// For dynamic types the method set is the declared capability list.
    pub fn implements(&self, required: &[String]) -> bool {
        match self.kind() {
            TypeKind::Dynamic { methods } => required.iter().all(|name| methods.contains(name)),
            _ => required.iter().all(|name| self.method(name).is_some()),
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind() {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind(), TypeKind::Record(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind(), TypeKind::Pointer { .. })
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind(), TypeKind::Dynamic { .. })
    }

    /// Get fields if this is a record.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match self.kind() {
            TypeKind::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by raw name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Element type of arrays, lists, pointers and channels.
    pub fn elem(&self) -> Option<&TypeRef> {
        match self.kind() {
            TypeKind::Array { elem, .. }
            | TypeKind::List { elem }
            | TypeKind::Pointer { elem }
            | TypeKind::Channel { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Whether the zero value of this type is "absent".
    pub fn is_nilable(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::List { .. }
                | TypeKind::Map { .. }
                | TypeKind::Pointer { .. }
                | TypeKind::Dynamic { .. }
                | TypeKind::Callable(_)
                | TypeKind::Channel { .. }
                | TypeKind::RawPointer
        )
    }

    /// Whether a raw copy of a value of this type shares heap storage.
    pub fn has_references(&self) -> bool {
        match self.kind() {
            TypeKind::Primitive(_) | TypeKind::Undefined => false,
            TypeKind::Array { elem, .. } => elem.has_references(),
            TypeKind::Record(fields) => fields.iter().any(|f| f.type_desc.has_references()),
            _ => true,
        }
    }

    /// Count pointer levels; returns the depth and the innermost element type.
    pub fn pointer_depth(self: &Arc<Self>) -> (usize, TypeRef) {
        let mut depth = 0;
        let mut current = Arc::clone(self);
        while let TypeKind::Pointer { elem } = current.kind() {
            let next = Arc::clone(elem);
            current = next;
            depth += 1;
        }
        (depth, current)
    }

    /// `dyn {Error}` style method-set check used for callable error slots.
    pub fn is_error_like(&self) -> bool {
        match self.kind() {
            TypeKind::Dynamic { methods } => methods.len() == 1 && methods[0] == "Error",
            _ => false,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id.0)
            .field("name", &self.to_string())
            .field("methods", &self.methods.len())
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            return f.write_str(&self.name);
        }
        match self.kind() {
            TypeKind::Primitive(p) => f.write_str(p.name()),
            TypeKind::Array { elem, len } => write!(f, "[{}; {}]", elem, len),
            TypeKind::List { elem } => write!(f, "Vec<{}>", elem),
            TypeKind::Map { key, value } => write!(f, "Map<{}, {}>", key, value),
            TypeKind::Record(fields) => {
                f.write_str("struct {")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", field.name, field.type_desc)?;
                }
                f.write_str(" }")
            }
            TypeKind::Pointer { elem } => write!(f, "Ptr<{}>", elem),
            TypeKind::Dynamic { methods } if methods.is_empty() => f.write_str("dyn Any"),
            TypeKind::Dynamic { methods } => write!(f, "dyn {{{}}}", methods.join(" + ")),
            TypeKind::Callable(sig) => {
                f.write_str("fn(")?;
                write_list(f, &sig.params)?;
                f.write_str(") -> (")?;
                write_list(f, &sig.results)?;
                f.write_str(")")
            }
            TypeKind::Channel { elem, dir } => match dir {
                ChannelDir::Both => write!(f, "Chan<{}>", elem),
                ChannelDir::Send => write!(f, "SendChan<{}>", elem),
                ChannelDir::Recv => write!(f, "RecvChan<{}>", elem),
            },
            TypeKind::RawPointer => f.write_str("RawPtr"),
            TypeKind::Undefined => write!(f, "<undefined#{}>", self.id.0),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[TypeRef]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

/// Field descriptor for record members.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declared field name.
    pub name: String,
    /// Field type.
    pub type_desc: TypeRef,
    /// Name override used for matching (tag alias).
    pub alias: Option<String>,
    /// Private fields only participate when the scope allows them.
    pub exported: bool,
    /// Anonymous member whose fields are promoted into the parent.
    pub embedded: bool,
    /// Must receive a value during conversion.
    pub required: bool,
    /// Excluded from matching entirely.
    pub skipped: bool,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, type_desc: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_desc,
            alias: None,
            exported: true,
            embedded: false,
            required: false,
            skipped: false,
        }
    }

    /// Embedded member named after its type (pointer types use the pointee name).
    pub fn embed(type_desc: TypeRef) -> Self {
        let (_, inner) = type_desc.pointer_depth();
        let mut field = Self::new(inner.name().to_string(), type_desc);
        field.embedded = true;
        field
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skipped = true;
        self
    }

    /// Alias when present, otherwise the declared name.
    pub fn resolved_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i64_type() -> TypeRef {
        Arc::new(TypeDescriptor::primitive(PrimitiveKind::I64))
    }

    #[test]
    fn test_identity_not_structure() {
        let a = TypeDescriptor::primitive(PrimitiveKind::I64);
        let b = TypeDescriptor::primitive(PrimitiveKind::I64);
        assert_ne!(a, b);
        assert_eq!(a.primitive_kind(), b.primitive_kind());
    }

    #[test]
    fn test_display_structural() {
        let list = TypeDescriptor::list(i64_type());
        assert_eq!(list.to_string(), "Vec<i64>");
        let map = TypeDescriptor::map(
            Arc::new(TypeDescriptor::primitive(PrimitiveKind::String)),
            i64_type(),
        );
        assert_eq!(map.to_string(), "Map<String, i64>");
        let named = TypeDescriptor::named_primitive("Port", PrimitiveKind::U16);
        assert_eq!(named.to_string(), "Port");
    }

    #[test]
    fn test_declare_define() {
        let node = Arc::new(TypeDescriptor::declared("Node"));
        assert!(matches!(node.kind(), TypeKind::Undefined));
        let next = Arc::new(TypeDescriptor::pointer(node.clone()));
        assert!(node.define(TypeKind::Record(vec![FieldDescriptor::new("next", next)])));
        assert!(!node.define(TypeKind::RawPointer));
        assert!(node.is_record());
        // Display of a cyclic type stops at the name.
        assert_eq!(format!("{}", node.fields().map(|f| &f[0].type_desc).unwrap()), "Ptr<Node>");
    }

    #[test]
    fn test_pointer_depth() {
        let inner = i64_type();
        let p2 = Arc::new(TypeDescriptor::pointer(Arc::new(TypeDescriptor::pointer(
            inner.clone(),
        ))));
        let (depth, elem) = p2.pointer_depth();
        assert_eq!(depth, 2);
        assert_eq!(elem, inner);
    }

    #[test]
    fn test_method_set() {
        let ty = TypeDescriptor::named_primitive("Celsius", PrimitiveKind::F64)
            .with_method("String", |v| Value::from(format!("{:?}C", v.as_f64().unwrap_or(0.0))))
            .with_method_name("Scale");
        assert!(ty.implements(&["String".to_string(), "Scale".to_string()]));
        assert!(!ty.implements(&["Error".to_string()]));
        let out = ty.method("String").and_then(|m| m.call(&Value::F64(1.5)));
        assert_eq!(out, Some(Value::from("1.5C")));
    }

    #[test]
    fn test_has_references() {
        assert!(!i64_type().has_references());
        assert!(TypeDescriptor::list(i64_type()).has_references());
        assert!(!TypeDescriptor::array(i64_type(), 3).has_references());
        let rec = TypeDescriptor::record(
            "R",
            vec![FieldDescriptor::new(
                "p",
                Arc::new(TypeDescriptor::pointer(i64_type())),
            )],
        );
        assert!(rec.has_references());
    }
}
