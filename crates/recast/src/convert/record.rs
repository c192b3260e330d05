// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record destinations.
//!
//! Record sources are paired field by field at compile time. Map sources are
//! matched per call: every key is converted to a string and looked up in the
//! destination's names, and a stronger match replaces a weaker one.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::fields::{field_set, match_records, FieldInfo, FieldSet, MatchStrength};
use crate::plan::{atomically, Plan, PlanFlags};
use crate::types::{registry, PrimitiveKind, TypeKind, TypeRef};
use crate::value::{read_path, write_path, FieldPath, Value};
use std::sync::Arc;

pub(super) fn compile(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    match from.kind() {
        TypeKind::Record(_) => compile_from_record(c, from, to),
        TypeKind::Map { key, value } => compile_from_map(c, from, to, key, value),
        _ => Err(c.invalid(from, to)),
    }
}

struct FieldCopy {
    source: FieldPath,
    dest: FieldPath,
    plan: Plan,
}

fn compile_from_record(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    let allow_private = c.options().allow_private_fields;
    let dest = field_set(to, allow_private);
    let source = field_set(from, allow_private);
    let matched = match_records(&dest, &source);

    if let Some(&d) = matched.missing_required.first() {
        return Err(ConvertError::RequiredFieldUnmatched {
            type_name: to.to_string(),
            field: dest.fields[d].name().to_string(),
        });
    }

    let mut copies = Vec::with_capacity(matched.pairs.len());
    let mut produces_alias = false;
    for (d, s) in matched.pairs {
        let (dest_field, source_field) = (&dest.fields[d], &source.fields[s]);
        match c.plan(&source_field.type_desc, &dest_field.type_desc) {
            Ok(plan) => {
                produces_alias |= plan.flags().produces_alias;
                copies.push(FieldCopy {
                    source: source_field.path.clone(),
                    dest: dest_field.path.clone(),
                    plan,
                });
            }
            Err(e) if dest_field.required => return Err(e),
            Err(e) => log::debug!(
                "[record] skipping {}.{} <- {}.{}: {}",
                to,
                dest_field.name(),
                from,
                source_field.name(),
                e
            ),
        }
    }

    if copies.is_empty() && !dest.is_empty() {
        return Err(c.invalid(from, to));
    }

    let to = Arc::clone(to);
    Ok(Plan::new(PlanFlags::aliasing(produces_alias), move |src, dst| {
        atomically(&to, dst, |dst| {
            for copy in &copies {
                // A nil embedded pointer on the source side leaves the field zero.
                let written = read_path(src, &copy.source, |field| {
                    write_path(dst, &copy.dest, |slot| copy.plan.run(field, slot))
                })?;
                if let Some(result) = written {
                    result??;
                }
            }
            Ok(())
        })
    }))
}

fn compile_from_map(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    key: &TypeRef,
    value: &TypeRef,
) -> Result<Plan> {
    let dest = field_set(to, c.options().allow_private_fields);
    let string = registry::primitive(PrimitiveKind::String);
    let key_plan = c.plan(key, &string)?;

    let mut value_plans = Vec::with_capacity(dest.len());
    let mut produces_alias = false;
    for field in &dest.fields {
        match c.plan(value, &field.type_desc) {
            Ok(plan) => {
                produces_alias |= plan.flags().produces_alias;
                value_plans.push(Some(plan));
            }
            Err(e) if field.required => return Err(e),
            Err(e) => {
                log::debug!("[record] skipping {}.{} <- {}: {}", to, field.name(), value, e);
                value_plans.push(None);
            }
        }
    }

    let from_name = from.to_string();
    let to = Arc::clone(to);
    Ok(Plan::new(PlanFlags::aliasing(produces_alias), move |src, dst| {
        let map = match src {
            Value::Map(map) => map.as_ref(),
            other => return Err(ConvertError::mismatch(&from_name, other)),
        };
        atomically(&to, dst, |dst| {
            let entries = map.map(|m| m.read());
            let entries = entries.as_ref().map(|e| e.as_slice()).unwrap_or(&[]);
            let chosen = choose_entries(&dest, entries, &key_plan, &string);

            for (i, field) in dest.fields.iter().enumerate() {
                match (chosen[i], &value_plans[i]) {
                    (Some((_, entry)), Some(plan)) => {
                        let (_, v) = &entries[entry];
                        write_path(dst, &field.path, |slot| plan.run(v, slot))??;
                    }
                    (None, _) if field.required => return Err(missing(&to.to_string(), field)),
                    _ => {}
                }
            }
            Ok(())
        })
    }))
}

/// For every destination field, the strongest-matching entry index.
/// Keys with no string form match no field.
fn choose_entries(
    dest: &FieldSet,
    entries: &[(Value, Value)],
    key_plan: &Plan,
    string: &TypeRef,
) -> Vec<Option<(MatchStrength, usize)>> {
    let mut chosen: Vec<Option<(MatchStrength, usize)>> = vec![None; dest.len()];
    for (entry, (k, _)) in entries.iter().enumerate() {
        let key = match key_plan.apply(k, string) {
            Ok(key) => key,
            Err(e) => {
                log::trace!("[record] ignoring map key {}: {}", k.variant_name(), e);
                continue;
            }
        };
        let Some((field, strength)) = key.as_str().and_then(|name| dest.lookup_key(name)) else {
            continue;
        };
        match chosen[field] {
            Some((current, _)) if current >= strength => {}
            _ => chosen[field] = Some((strength, entry)),
        }
    }
    chosen
}

fn missing(type_name: &str, field: &FieldInfo) -> ConvertError {
    ConvertError::RequiredFieldMissing {
        type_name: type_name.to_string(),
        field: field.name().to_string(),
    }
}
