// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! List destinations.
//!
//! The destination list always gets fresh storage sized to the source. When
//! the elements are aliasable they are cloned in bulk instead of running the
//! element plan per item, unless the element pair has a user override.

use super::{string_view_kind, Compiler};
use crate::error::{ConvertError, Result};
use crate::layout;
use crate::plan::{atomically, Plan, PlanFlags};
use crate::reflect::Reflect;
use crate::types::{PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;
use std::sync::Arc;

/// Per-element conversion shared by list and array destinations.
#[derive(Clone)]
pub(super) struct ElementCopy {
    plan: Plan,
    bulk: bool,
    to_elem: TypeRef,
}

impl ElementCopy {
    pub(super) fn compile(c: &mut Compiler<'_>, from_elem: &TypeRef, to_elem: &TypeRef) -> Result<Self> {
        let plan = c.plan(from_elem, to_elem)?;
        let bulk =
            !plan.flags().is_override && layout::is_aliasable(c.options(), from_elem, to_elem);
        Ok(Self {
            plan,
            bulk,
            to_elem: Arc::clone(to_elem),
        })
    }

    pub(super) fn flags(&self) -> PlanFlags {
        PlanFlags::aliasing(self.plan.flags().produces_alias)
    }

    /// Convert the first `count` items.
    pub(super) fn convert(&self, items: &[Value], count: usize) -> Result<Vec<Value>> {
        let items = &items[..count.min(items.len())];
        if self.bulk {
            return Ok(items.to_vec());
        }
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let mut converted = Value::zero(&self.to_elem);
            self.plan.run(item, &mut converted)?;
            out.push(converted);
        }
        Ok(out)
    }
}

/// Descriptor and builder of a string viewed as bytes or chars.
fn string_view(elem: &TypeRef) -> (TypeRef, fn(&str) -> Value) {
    match string_view_kind(elem) {
        PrimitiveKind::Char => (<Vec<char>>::descriptor(), char_view as fn(&str) -> Value),
        _ => (<Vec<u8>>::descriptor(), byte_view as fn(&str) -> Value),
    }
}

fn char_view(s: &str) -> Value {
    Value::list(s.chars().map(Value::Char).collect())
}

fn byte_view(s: &str) -> Value {
    Value::list(s.bytes().map(Value::U8).collect())
}

/// Plan that converts a string through its byte or char view.
pub(super) fn compile_from_string(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    elem: &TypeRef,
) -> Result<Plan> {
    let (view_type, view) = string_view(elem);
    let view_plan = c.plan(&view_type, to)?;
    let from_name = from.to_string();
    Ok(Plan::new(PlanFlags::NONE, move |src, dst| match src {
        Value::String(s) => view_plan.run(&view(s), dst),
        other => Err(ConvertError::mismatch(&from_name, other)),
    }))
}

pub(super) fn compile(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    elem: &TypeRef,
) -> Result<Plan> {
    match from.kind() {
        TypeKind::List { elem: from_elem } | TypeKind::Array { elem: from_elem, .. } => {
            let copy = ElementCopy::compile(c, from_elem, elem)?;
            let flags = copy.flags();
            let from_name = from.to_string();
            let to = Arc::clone(to);
            Ok(Plan::new(flags, move |src, dst| {
                atomically(&to, dst, |dst| {
                    let items = match src {
                        Value::List(None) => return Ok(()),
                        Value::List(Some(list)) => {
                            let items = list.read();
                            copy.convert(&items, items.len())?
                        }
                        Value::Array(items) => copy.convert(items, items.len())?,
                        other => return Err(ConvertError::mismatch(&from_name, other)),
                    };
                    *dst = Value::list(items);
                    Ok(())
                })
            }))
        }
        TypeKind::Primitive(PrimitiveKind::String) => compile_from_string(c, from, to, elem),
        _ => Err(c.invalid(from, to)),
    }
}
