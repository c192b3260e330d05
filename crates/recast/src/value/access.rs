// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field access paths.
//!
//! A promoted field of an embedded pointer member is not at a fixed position
//! in its record: reaching it crosses one or more pointer cells. A
//! [`FieldPath`] is the chain of steps from the outer record to the field.

use super::{Shared, Value};
use crate::error::{ConvertError, Result};
use crate::types::TypeRef;

/// One step of a field path.
#[derive(Debug, Clone)]
pub enum PathStep {
    /// Member at this position of a record.
    Field(usize),
    /// Follow a pointer cell whose pointee has this type.
    Deref(TypeRef),
}

pub type FieldPath = Vec<PathStep>;

/// Apply `f` to the value at `path`. Returns `Ok(None)` when a nil pointer is crossed.
pub fn read_path<R>(root: &Value, path: &[PathStep], f: impl FnOnce(&Value) -> R) -> Result<Option<R>> {
    let Some((step, rest)) = path.split_first() else {
        return Ok(Some(f(root)));
    };
    match (step, root) {
        (PathStep::Field(index), Value::Record(fields)) => match fields.get(*index) {
            Some(field) => read_path(field, rest, f),
            None => Err(ConvertError::mismatch("record field", root)),
        },
        (PathStep::Deref(_), Value::Pointer(None)) => Ok(None),
        (PathStep::Deref(_), Value::Pointer(Some(cell))) => {
            let inner = cell.read();
            read_path(&inner, rest, f)
        }
        (PathStep::Field(_), other) => Err(ConvertError::mismatch("record", other)),
        (PathStep::Deref(_), other) => Err(ConvertError::mismatch("pointer", other)),
    }
}

/// Apply `f` to the value at `path`, allocating zeroed cells for nil pointers on the way.
pub fn write_path<R>(
    root: &mut Value,
    path: &[PathStep],
    f: impl FnOnce(&mut Value) -> R,
) -> Result<R> {
    let Some((step, rest)) = path.split_first() else {
        return Ok(f(root));
    };
    match step {
        PathStep::Field(index) => match root {
            Value::Record(fields) if *index < fields.len() => write_path(&mut fields[*index], rest, f),
            other => Err(ConvertError::mismatch("record", other)),
        },
        PathStep::Deref(elem) => match root {
            Value::Pointer(slot) => {
                let cell = slot.get_or_insert_with(|| Shared::new(Value::zero(elem)));
                let mut inner = cell.write();
                write_path(&mut inner, rest, f)
            }
            other => Err(ConvertError::mismatch("pointer", other)),
        },
    }
}
