// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Indirection.
//!
//! Pointer chains of depth `N` on the source and `M` on the destination are
//! reconciled by following all `N` source cells, converting the innermost
//! element once, and wrapping the result in `M` fresh cells. When the
//! innermost elements are aliasable and carry no user override, the
//! innermost source cell itself is reused.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::layout;
use crate::plan::{Plan, PlanFlags};
use crate::types::TypeRef;
use crate::value::{read_path, Cell, PathStep, Value};
use std::sync::Arc;

/// `N` dereference steps ending at `inner`.
fn deref_path(from: &TypeRef, depth: usize) -> Vec<PathStep> {
    let mut path = Vec::with_capacity(depth);
    let mut current = Arc::clone(from);
    for _ in 0..depth {
        let Some(elem) = current.elem().cloned() else {
            break;
        };
        path.push(PathStep::Deref(Arc::clone(&elem)));
        current = elem;
    }
    path
}

fn wrap(mut value: Value, levels: usize) -> Value {
    for _ in 0..levels {
        value = Value::pointer(value);
    }
    value
}

/// Pointer source into a non-pointer destination.
pub(super) fn compile_deref(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    let (depth, inner) = from.pointer_depth();
    let elem = c.plan(&inner, to)?;
    let path = deref_path(from, depth);
    let strict = c.options().strict_nil_check && !to.is_nilable();

    Ok(Plan::new(PlanFlags::aliasing(elem.flags().produces_alias), move |src, dst| {
        match read_path(src, &path, |value| elem.run(value, dst))? {
            Some(result) => result,
            None if strict => Err(ConvertError::NilIndirection),
            None => Ok(()),
        }
    }))
}

/// Pointer destination.
pub(super) fn compile(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    let (to_depth, to_inner) = to.pointer_depth();
    let (from_depth, from_inner) = from.pointer_depth();
    if from_depth == 0 {
        return compile_wrap(c, from, &to_inner, to_depth);
    }

    let path = deref_path(from, from_depth);
    let elem_plan = c.plan(&from_inner, &to_inner)?;
    let shares_cell = !elem_plan.flags().is_override
        && layout::is_aliasable(c.options(), &from_inner, &to_inner);
    if shares_cell {
        // Follow all but the last source cell and share the last one.
        let outer = path[..from_depth - 1].to_vec();
        return Ok(Plan::new(PlanFlags::aliasing(true), move |src, dst| {
            let cell: Option<Cell> = read_path(src, &outer, |v| v.as_cell().cloned())?.flatten();
            if let Some(cell) = cell {
                *dst = wrap(Value::Pointer(Some(cell)), to_depth - 1);
            }
            Ok(())
        }));
    }

    Ok(Plan::new(PlanFlags::aliasing(elem_plan.flags().produces_alias), move |src, dst| {
        let converted = read_path(src, &path, |value| elem_plan.apply(value, &to_inner))?;
        // A nil anywhere on the source chain leaves the destination nil.
        if let Some(converted) = converted {
            *dst = wrap(converted?, to_depth);
        }
        Ok(())
    }))
}

/// Non-pointer source: convert into a fresh cell.
fn compile_wrap(c: &mut Compiler<'_>, from: &TypeRef, inner: &TypeRef, depth: usize) -> Result<Plan> {
    let plan = c.plan(from, inner)?;
    let inner = Arc::clone(inner);
    Ok(Plan::new(PlanFlags::aliasing(plan.flags().produces_alias), move |src, dst| {
        let value = plan.apply(src, &inner)?;
        *dst = wrap(value, depth);
        Ok(())
    }))
}

/// Address of a pointer cell, `0` for nil.
pub(super) fn address_of(value: &Value) -> Option<usize> {
    match value {
        Value::Pointer(None) => Some(0),
        Value::Pointer(Some(cell)) => Some(cell.addr()),
        _ => None,
    }
}
