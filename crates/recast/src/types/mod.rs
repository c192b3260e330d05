// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type system.
//!
//! - **TypeDescriptor**: identity, kind, composition and method set of a shape
//! - **FieldDescriptor**: declared record member with alias/required/embedded markers
//! - **Builder API**: fluent construction of record descriptors
//! - **Registry**: canonical primitives and built-in dynamic types
//!
//! # Example
//!
//! ```rust
//! use recast::types::{registry, PrimitiveKind, TypeDescriptorBuilder};
//!
//! let reading = TypeDescriptorBuilder::new("SensorReading")
//!     .field("sensor_id", PrimitiveKind::U32)
//!     .field("temperature", PrimitiveKind::F64)
//!     .required_field("unit", registry::primitive(PrimitiveKind::String))
//!     .build_ref();
//! assert_eq!(reading.fields().map(|f| f.len()), Some(3));
//! ```

mod builder;
mod descriptor;
pub mod registry;

pub use builder::TypeDescriptorBuilder;
pub use descriptor::{
    ChannelDir, FieldDescriptor, Method, MethodFn, PrimitiveKind, Signature, TypeDescriptor,
    TypeId, TypeKind, TypeRef,
};
