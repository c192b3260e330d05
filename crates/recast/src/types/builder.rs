// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for record descriptors.

use super::registry;
use super::{FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind, TypeRef};
use crate::value::Value;
use std::sync::Arc;

/// Builder for record [`TypeDescriptor`]s.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    methods: Vec<super::Method>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for a record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add a primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field_with_type(name, registry::primitive(kind))
    }

    /// Add a field with a type descriptor.
    pub fn field_with_type(mut self, name: impl Into<String>, type_desc: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a field matched under `alias` instead of its declared name.
    pub fn aliased_field(
        mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        type_desc: TypeRef,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, type_desc).with_alias(alias));
        self
    }

    /// Add a field that must be matched.
    pub fn required_field(mut self, name: impl Into<String>, type_desc: TypeRef) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, type_desc).required());
        self
    }

    /// Add an unexported field.
    pub fn private_field(mut self, name: impl Into<String>, type_desc: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc).private());
        self
    }

    /// Add an embedded member (a record or a pointer to one).
    pub fn embed(mut self, type_desc: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::embed(type_desc));
        self
    }

    /// Add a fully specified field.
    pub fn push(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Attach an implemented method.
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.methods.push(super::Method::with_impl(name, func));
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::record(self.name, self.fields).with_methods(self.methods)
    }

    /// Build and wrap in an `Arc`.
    pub fn build_ref(self) -> TypeRef {
        Arc::new(self.build())
    }

    /// Define a previously declared descriptor with the collected fields.
    ///
    /// Methods must be attached at declaration time; builder methods are ignored here.
    pub fn define(self, declared: &TypeDescriptor) -> bool {
        declared.define(TypeKind::Record(self.fields))
    }
}
