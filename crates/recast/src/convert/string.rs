// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! String destinations.
//!
//! Sources: anything with an implemented `String` method, primitives, and
//! arrays or lists viewed as bytes (UTF-8) or chars. Strings are immutable,
//! so the produced string never shares storage with a source list.

use super::{scalar, string_view_kind, Compiler};
use crate::error::{ConvertError, Result};
use crate::plan::{Plan, PlanFlags};
use crate::types::{registry, PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;
use std::sync::Arc;

pub(super) fn compile_stringer(from: &TypeRef, to: &TypeRef) -> Option<Plan> {
    if from.is_dynamic() {
        return None;
    }
    let method = from.method("String")?.clone();
    method.func.as_ref()?;
    let to_name = to.to_string();
    Some(Plan::new(PlanFlags::NONE, move |src, dst| {
        if src.is_nil() {
            return Err(ConvertError::NilIndirection);
        }
        match method.call(src) {
            Some(out @ Value::String(_)) => {
                *dst = out;
                Ok(())
            }
            Some(other) => Err(ConvertError::mismatch(&to_name, &other)),
            None => Err(ConvertError::Custom("stringer is nil".into())),
        }
    }))
}

pub(super) fn compile(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    match from.kind() {
        TypeKind::Primitive(_) => Ok(scalar::leaf_plan(from, to, PrimitiveKind::String)),
        TypeKind::List { elem } | TypeKind::Array { elem, .. } => {
            let view = string_view_kind(elem);
            let elem_plan = c.plan(elem, &registry::primitive(view))?;
            let from_name = from.to_string();
            let to_name = to.to_string();
            Ok(Plan::new(PlanFlags::NONE, move |src, dst| {
                let text = match src {
                    Value::List(None) => return Ok(()),
                    Value::List(Some(list)) => decode(&list.read(), view, &elem_plan, &from_name, &to_name)?,
                    Value::Array(items) => decode(items, view, &elem_plan, &from_name, &to_name)?,
                    other => return Err(ConvertError::mismatch(&from_name, other)),
                };
                *dst = Value::String(Arc::from(text));
                Ok(())
            }))
        }
        _ => Err(c.invalid(from, to)),
    }
}

fn decode(
    items: &[Value],
    view: PrimitiveKind,
    elem_plan: &Plan,
    from_name: &str,
    to_name: &str,
) -> Result<String> {
    let mut units = Vec::with_capacity(items.len());
    for item in items {
        let mut unit = Value::zero_primitive(view);
        elem_plan.run(item, &mut unit)?;
        units.push(unit);
    }
    if view == PrimitiveKind::Char {
        return Ok(units
            .iter()
            .filter_map(|u| match u {
                Value::Char(c) => Some(*c),
                _ => None,
            })
            .collect());
    }
    let bytes: Vec<u8> = units
        .iter()
        .filter_map(|u| match u {
            Value::U8(b) => Some(*b),
            _ => None,
        })
        .collect();
    String::from_utf8(bytes).map_err(|e| ConvertError::LeafParse {
        from: from_name.to_string(),
        to: to_name.to_string(),
        input: format!("{:?}", e.as_bytes()),
        reason: e.utf8_error().to_string(),
    })
}
