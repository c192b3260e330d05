// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime values.
//!
//! Inline shapes (primitives, arrays, records) are owned by their [`Value`].
//! Heap shapes (lists, maps, pointer cells) live behind a [`Shared`] handle:
//! cloning a `Value` copies inline data and aliases heap storage, which is
//! exactly what a raw memory copy does. `nil` is `None`.

mod access;

pub use access::{read_path, write_path, FieldPath, PathStep};

use crate::types::{PrimitiveKind, TypeDescriptor, TypeId, TypeKind, TypeRef};
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Reference-counted, lock-guarded heap cell. Cloning aliases.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Shared read access. Recursive so nested reads of one cell never deadlock.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read_recursive()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// True when both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity address of the storage.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.read() == *other.read()
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read_recursive() {
            Some(guard) => fmt::Debug::fmt(&*guard, f),
            None => write!(f, "<locked@{:#x}>", self.addr()),
        }
    }
}

/// List storage.
pub type ListRef = Shared<Vec<Value>>;
/// Map storage.
pub type MapRef = Shared<MapEntries>;
/// Pointer cell.
pub type Cell = Shared<Value>;

/// Insertion-ordered map entries; keys compare by deep equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapEntries {
    entries: Vec<(Value, Value)>,
}

impl MapEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert, replacing the value of an equal key. Returns the previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup by string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub(crate) fn as_slice(&self) -> &[(Value, Value)] {
        &self.entries
    }
}

impl FromIterator<(Value, Value)> for MapEntries {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = MapEntries::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Concrete type and payload of a non-nil dynamic value.
#[derive(Debug, Clone)]
pub struct DynamicBox {
    pub ty: TypeRef,
    pub value: Value,
}

impl PartialEq for DynamicBox {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.value == other.value
    }
}

type FuncImpl = dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync;

/// Callable value. Equality is identity.
#[derive(Clone)]
pub struct Func(Arc<FuncImpl>);

impl Func {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        (self.0)(args)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func@{:p}", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Opaque handle (channels). Equality is identity.
#[derive(Clone)]
pub struct Handle(Arc<dyn Any + Send + Sync>);

impl Handle {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle@{:p}", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A runtime value of any shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Primitives
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(Arc<str>),

    // Inline composites
    Array(Vec<Value>),
    Record(Vec<Value>),

    // Heap composites and handles
    List(Option<ListRef>),
    Map(Option<MapRef>),
    Pointer(Option<Cell>),
    Dynamic(Option<Box<DynamicBox>>),
    Callable(Option<Func>),
    Channel(Option<Handle>),
    RawPointer(usize),
}

fn zero_cache() -> &'static DashMap<TypeId, Value> {
    static ZEROS: OnceLock<DashMap<TypeId, Value>> = OnceLock::new();
    ZEROS.get_or_init(DashMap::new)
}

impl Value {
    /// Zero value of a type. Inline composites are built once per type and cloned.
    pub fn zero(ty: &TypeDescriptor) -> Value {
        match ty.kind() {
            TypeKind::Array { .. } | TypeKind::Record(_) => {
                if let Some(hit) = zero_cache().get(&ty.id()) {
                    return hit.value().clone();
                }
                let built = Self::build_zero(ty);
                zero_cache().insert(ty.id(), built.clone());
                built
            }
            _ => Self::build_zero(ty),
        }
    }

    fn build_zero(ty: &TypeDescriptor) -> Value {
        match ty.kind() {
            TypeKind::Primitive(p) => Self::zero_primitive(*p),
            TypeKind::Array { elem, len } => Value::Array(vec![Value::zero(elem); *len]),
            TypeKind::Record(fields) => {
                Value::Record(fields.iter().map(|f| Value::zero(&f.type_desc)).collect())
            }
            TypeKind::List { .. } => Value::List(None),
            TypeKind::Map { .. } => Value::Map(None),
            TypeKind::Pointer { .. } => Value::Pointer(None),
            TypeKind::Dynamic { .. } => Value::Dynamic(None),
            TypeKind::Callable(_) => Value::Callable(None),
            TypeKind::Channel { .. } => Value::Channel(None),
            TypeKind::RawPointer => Value::RawPointer(0),
            TypeKind::Undefined => Value::Record(Vec::new()),
        }
    }

    pub fn zero_primitive(kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::U8 => Value::U8(0),
            PrimitiveKind::U16 => Value::U16(0),
            PrimitiveKind::U32 => Value::U32(0),
            PrimitiveKind::U64 => Value::U64(0),
            PrimitiveKind::Usize => Value::Usize(0),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::String => Value::String(Arc::from("")),
        }
    }

    /// Non-nil list.
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Some(Shared::new(items)))
    }

    /// Non-nil map.
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Value {
        Value::Map(Some(Shared::new(entries.into_iter().collect())))
    }

    /// Pointer to a fresh cell holding `inner`.
    pub fn pointer(inner: Value) -> Value {
        Value::Pointer(Some(Shared::new(inner)))
    }

    /// Dynamic value holding `value` of concrete type `ty`.
    pub fn dynamic(ty: TypeRef, value: Value) -> Value {
        Value::Dynamic(Some(Box::new(DynamicBox { ty, value })))
    }

    pub fn callable<F>(f: F) -> Value
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        Value::Callable(Some(Func::new(f)))
    }

    pub fn channel<T: Any + Send + Sync>(inner: T) -> Value {
        Value::Channel(Some(Handle::new(inner)))
    }

    /// True for the absent state of nilable shapes.
    pub fn is_nil(&self) -> bool {
        matches!(
            self,
            Value::List(None)
                | Value::Map(None)
                | Value::Pointer(None)
                | Value::Dynamic(None)
                | Value::Callable(None)
                | Value::Channel(None)
                | Value::RawPointer(0)
        )
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::Usize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Pointer(_) => "pointer",
            Value::Dynamic(_) => "dynamic",
            Value::Callable(_) => "callable",
            Value::Channel(_) => "channel",
            Value::RawPointer(_) => "raw pointer",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Inline elements of an array or record.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) | Value::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(Some(list)) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(Some(map)) => Some(map),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            Value::Pointer(Some(cell)) => Some(cell),
            _ => None,
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicBox> {
        match self {
            Value::Dynamic(Some(boxed)) => Some(boxed),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Callable(Some(func)) => Some(func),
            _ => None,
        }
    }

    /// Record field or array element by position.
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.as_slice()?.get(index)
    }

    /// Copy of the value behind a pointer.
    pub fn deref(&self) -> Option<Value> {
        self.as_cell().map(|cell| cell.read().clone())
    }

    /// Snapshot of list elements.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        self.as_list().map(|list| list.read().clone())
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{registry, FieldDescriptor};

    #[test]
    fn test_clone_aliases_heap_storage() {
        let list = Value::list(vec![Value::I64(1)]);
        let copy = list.clone();
        copy.as_list().unwrap().write().push(Value::I64(2));
        assert_eq!(list.list_items().unwrap().len(), 2);

        let arr = Value::Array(vec![Value::I64(1)]);
        let mut arr_copy = arr.clone();
        if let Value::Array(items) = &mut arr_copy {
            items[0] = Value::I64(9);
        }
        assert_eq!(arr.field(0), Some(&Value::I64(1)));
    }

    #[test]
    fn test_zero_values() {
        let rec = TypeDescriptor::record(
            "R",
            vec![
                FieldDescriptor::new("a", registry::primitive(PrimitiveKind::I32)),
                FieldDescriptor::new(
                    "b",
                    Arc::new(TypeDescriptor::list(registry::primitive(PrimitiveKind::U8))),
                ),
            ],
        );
        assert_eq!(
            Value::zero(&rec),
            Value::Record(vec![Value::I32(0), Value::List(None)])
        );
        // Second call is served from the cache and is equal.
        assert_eq!(Value::zero(&rec), Value::zero(&rec));
        assert!(Value::zero(&TypeDescriptor::pointer(registry::primitive(PrimitiveKind::I8))).is_nil());
    }

    #[test]
    fn test_map_entries_replace() {
        let mut map = MapEntries::new();
        assert!(map.insert(Value::from("a"), Value::I64(1)).is_none());
        assert_eq!(map.insert(Value::from("a"), Value::I64(2)), Some(Value::I64(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("a"), Some(&Value::I64(2)));
    }

    #[test]
    fn test_handle_identity() {
        let a = Value::channel(5u8);
        let b = Value::channel(5u8);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
