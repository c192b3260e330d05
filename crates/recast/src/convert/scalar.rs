// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bool, integer, float and char destinations.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::leaf::{self, LeafError};
use crate::plan::{Plan, PlanFlags};
use crate::types::{PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;

pub(super) fn compile(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    kind: PrimitiveKind,
) -> Result<Plan> {
    match from.kind() {
        TypeKind::Primitive(_) => Ok(leaf_plan(from, to, kind)),
        TypeKind::RawPointer if kind == PrimitiveKind::Usize => {
            Ok(Plan::new(PlanFlags::NONE, |src, dst| match src {
                Value::RawPointer(addr) => {
                    *dst = Value::Usize(*addr);
                    Ok(())
                }
                other => Err(ConvertError::mismatch("raw pointer", other)),
            }))
        }
        _ => Err(c.invalid(from, to)),
    }
}

/// Primitive-to-primitive plan with parse errors tagged by both type names.
pub(super) fn leaf_plan(from: &TypeRef, to: &TypeRef, kind: PrimitiveKind) -> Plan {
    let from_name = from.to_string();
    let to_name = to.to_string();
    Plan::new(PlanFlags::NONE, move |src, dst| match leaf::convert(src, kind) {
        Ok(value) => {
            *dst = value;
            Ok(())
        }
        Err(LeafError::Parse(reason)) => Err(ConvertError::LeafParse {
            from: from_name.clone(),
            to: to_name.clone(),
            input: leaf::format(src).unwrap_or_default(),
            reason,
        }),
        Err(LeafError::Shape) => Err(ConvertError::mismatch(&from_name, src)),
    })
}
