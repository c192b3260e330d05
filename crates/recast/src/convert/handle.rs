// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Opaque handles: channels and raw pointers.
//!
//! These are never restructured. A channel passes through when its layout is
//! compatible with the destination and never under deep copy. Raw pointers
//! carry addresses.

use super::{pointer, Compiler};
use crate::error::{ConvertError, Result};
use crate::layout;
use crate::plan::{Plan, PlanFlags};
use crate::types::{PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;

pub(super) fn compile_channel(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    if c.options().deep_copy || !layout::is_layout_compatible(c.options(), from, to) {
        return Err(c.invalid(from, to));
    }
    Ok(Plan::raw_copy(from))
}

pub(super) fn compile_raw_pointer(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    let from_name = from.to_string();
    let address: fn(&Value) -> Option<usize> = match from.kind() {
        TypeKind::RawPointer => |v| match v {
            Value::RawPointer(addr) => Some(*addr),
            _ => None,
        },
        TypeKind::Primitive(PrimitiveKind::Usize) => |v| match v {
            Value::Usize(addr) => Some(*addr),
            _ => None,
        },
        TypeKind::Pointer { .. } => pointer::address_of,
        _ => return Err(c.invalid(from, to)),
    };
    Ok(Plan::new(PlanFlags::NONE, move |src, dst| {
        let addr = address(src).ok_or_else(|| ConvertError::mismatch(&from_name, src))?;
        *dst = Value::RawPointer(addr);
        Ok(())
    }))
}
