// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map destinations.
//!
//! Map sources are converted entry by entry, or by copying the entry table in
//! one pass when both keys and values are aliasable and neither pair has a
//! user override. Record sources become one
//! entry per field, keyed by the field alias (or declared name) converted to
//! the key type.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::fields::field_set;
use crate::layout;
use crate::plan::{atomically, Plan, PlanFlags};
use crate::types::{registry, PrimitiveKind, TypeKind, TypeRef};
use crate::value::{read_path, FieldPath, MapEntries, Shared, Value};
use std::sync::Arc;

/// How the entries of a source map become destination entries.
trait EntryStrategy: Send + Sync {
    fn convert(&self, entries: &MapEntries) -> Result<MapEntries>;
}

/// Keys and values are aliasable: copy the table.
struct BulkEntries;

impl EntryStrategy for BulkEntries {
    fn convert(&self, entries: &MapEntries) -> Result<MapEntries> {
        Ok(entries.clone())
    }
}

/// Convert every key and value.
struct GenericEntries {
    key: Plan,
    value: Plan,
    key_type: TypeRef,
    value_type: TypeRef,
}

impl EntryStrategy for GenericEntries {
    fn convert(&self, entries: &MapEntries) -> Result<MapEntries> {
        let mut out = MapEntries::with_capacity(entries.len());
        for (k, v) in entries.iter() {
            let key = self.key.apply(k, &self.key_type)?;
            let value = self.value.apply(v, &self.value_type)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

pub(super) fn compile(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    key: &TypeRef,
    value: &TypeRef,
) -> Result<Plan> {
    match from.kind() {
        TypeKind::Map {
            key: from_key,
            value: from_value,
        } => compile_from_map(c, from, to, (from_key, from_value), (key, value)),
        TypeKind::Record(_) => compile_from_record(c, from, to, key, value),
        _ => Err(c.invalid(from, to)),
    }
}

fn compile_from_map(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    (from_key, from_value): (&TypeRef, &TypeRef),
    (key, value): (&TypeRef, &TypeRef),
) -> Result<Plan> {
    let key_plan = c.plan(from_key, key)?;
    let value_plan = c.plan(from_value, value)?;
    let flags = PlanFlags::aliasing(
        key_plan.flags().produces_alias || value_plan.flags().produces_alias,
    );
    let bulk = !key_plan.flags().is_override
        && !value_plan.flags().is_override
        && layout::is_aliasable(c.options(), from_key, key)
        && layout::is_aliasable(c.options(), from_value, value);
    let strategy: Arc<dyn EntryStrategy> = if bulk {
        Arc::new(BulkEntries)
    } else {
        Arc::new(GenericEntries {
            key: key_plan,
            value: value_plan,
            key_type: Arc::clone(key),
            value_type: Arc::clone(value),
        })
    };
    let from_name = from.to_string();
    let to = Arc::clone(to);
    Ok(Plan::new(flags, move |src, dst| {
        atomically(&to, dst, |dst| match src {
            Value::Map(None) => Ok(()),
            Value::Map(Some(map)) => {
                let entries = strategy.convert(&map.read())?;
                *dst = Value::Map(Some(Shared::new(entries)));
                Ok(())
            }
            other => Err(ConvertError::mismatch(&from_name, other)),
        })
    }))
}

struct FieldEntry {
    key: Value,
    path: FieldPath,
    plan: Plan,
}

fn compile_from_record(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    key: &TypeRef,
    value: &TypeRef,
) -> Result<Plan> {
    let fields = field_set(from, c.options().allow_private_fields);
    let name_plan = c.plan(&registry::primitive(PrimitiveKind::String), key)?;
    let mut entries = Vec::with_capacity(fields.len());
    let mut produces_alias = false;

    for field in &fields.fields {
        let mut names = vec![field.name()];
        if field.alias.is_some() {
            names.push(&field.raw_name);
        }
        let Some(map_key) = names
            .into_iter()
            .find_map(|name| name_plan.apply(&Value::from(name), key).ok())
        else {
            log::debug!("[map] field {}.{} has no {} key", from, field.name(), key);
            return Err(c.invalid(from, to));
        };
        let plan = c.plan(&field.type_desc, value)?;
        produces_alias |= plan.flags().produces_alias;
        entries.push(FieldEntry {
            key: map_key,
            path: field.path.clone(),
            plan,
        });
    }

    let value_type = Arc::clone(value);
    let to = Arc::clone(to);
    Ok(Plan::new(PlanFlags::aliasing(produces_alias), move |src, dst| {
        atomically(&to, dst, |dst| {
            let mut out = MapEntries::with_capacity(entries.len());
            for entry in &entries {
                let converted = read_path(src, &entry.path, |field| {
                    entry.plan.apply(field, &value_type)
                })?;
                // Fields behind a nil embedded pointer are absent.
                if let Some(converted) = converted {
                    out.insert(entry.key.clone(), converted?);
                }
            }
            *dst = Value::Map(Some(Shared::new(out)));
            Ok(())
        })
    }))
}
