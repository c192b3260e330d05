// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-length array destinations.
//!
//! `min(source length, len)` elements are converted; the rest of the
//! destination keeps its zero value.

use super::list::{compile_from_string, ElementCopy};
use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::plan::{atomically, Plan};
use crate::types::{PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;
use std::sync::Arc;

pub(super) fn compile(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    elem: &TypeRef,
    len: usize,
) -> Result<Plan> {
    match from.kind() {
        TypeKind::List { elem: from_elem } | TypeKind::Array { elem: from_elem, .. } => {
            let copy = ElementCopy::compile(c, from_elem, elem)?;
            let flags = copy.flags();
            let from_name = from.to_string();
            let to = Arc::clone(to);
            Ok(Plan::new(flags, move |src, dst| {
                atomically(&to, dst, |dst| {
                    let converted = match src {
                        Value::List(None) => return Ok(()),
                        Value::List(Some(list)) => copy.convert(&list.read(), len)?,
                        Value::Array(items) => copy.convert(items, len)?,
                        other => return Err(ConvertError::mismatch(&from_name, other)),
                    };
                    match dst {
                        Value::Array(slots) => {
                            for (slot, value) in slots.iter_mut().zip(converted) {
                                *slot = value;
                            }
                            Ok(())
                        }
                        other => Err(ConvertError::mismatch("array", other)),
                    }
                })
            }))
        }
        TypeKind::Primitive(PrimitiveKind::String) => compile_from_string(c, from, to, elem),
        _ => Err(c.invalid(from, to)),
    }
}
