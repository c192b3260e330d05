// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! Unpacking a dynamic value resolves its plan from the concrete type found at
//! call time, so these plans hold a weak scope handle and a small ring cache
//! of recently seen concrete types.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::plan::{Plan, PlanFlags};
use crate::scope::{UnpackCache, WeakScope};
use crate::types::TypeRef;
use crate::value::{DynamicBox, Value};
use std::sync::Arc;

/// Call-time plan lookup by concrete type.
struct RuntimeLookup {
    scope: WeakScope,
    cache: UnpackCache,
    // `None` converts the concrete type to itself.
    to: Option<TypeRef>,
}

impl RuntimeLookup {
    fn new(c: &Compiler<'_>, to: Option<&TypeRef>) -> Self {
        Self {
            scope: c.scope().downgrade(),
            cache: UnpackCache::new(),
            to: to.cloned(),
        }
    }

    fn plan_for(&self, concrete: &TypeRef) -> Result<Plan> {
        if let Some(plan) = self.cache.get(concrete.id()) {
            return Ok(plan);
        }
        let to = self.to.as_ref().unwrap_or(concrete);
        let plan = self.scope.upgrade()?.plan(concrete, to)?;
        self.cache.put(concrete.id(), plan.clone());
        Ok(plan)
    }

    fn copy(&self, boxed: &DynamicBox) -> Result<DynamicBox> {
        let plan = self.plan_for(&boxed.ty)?;
        Ok(DynamicBox {
            ty: Arc::clone(&boxed.ty),
            value: plan.apply(&boxed.value, &boxed.ty)?,
        })
    }
}

/// Dynamic source into a non-dynamic destination.
pub(super) fn compile_unpack(c: &mut Compiler<'_>, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
    let lookup = RuntimeLookup::new(c, Some(to));
    let strict = c.options().strict_nil_check && !to.is_nilable();
    let from_name = from.to_string();

    Ok(Plan::new(PlanFlags::aliasing(to.has_references()), move |src, dst| match src {
        Value::Dynamic(None) if strict => Err(ConvertError::NilIndirection),
        Value::Dynamic(None) => Ok(()),
        Value::Dynamic(Some(boxed)) => lookup.plan_for(&boxed.ty)?.run(&boxed.value, dst),
        other => Err(ConvertError::mismatch(&from_name, other)),
    }))
}

/// Dynamic destination.
pub(super) fn compile_pack(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    methods: &[String],
) -> Result<Plan> {
    if from.is_dynamic() {
        return Ok(compile_repack(c, from, to, methods));
    }
    if !from.implements(methods) {
        return Err(c.invalid(from, to));
    }

    let ty = Arc::clone(from);
    if !c.options().deep_copy {
        return Ok(Plan::new(PlanFlags::aliasing(from.has_references()), move |src, dst| {
            *dst = Value::dynamic(Arc::clone(&ty), src.clone());
            Ok(())
        }));
    }

    let copy = c.plan(from, from)?;
    Ok(Plan::new(PlanFlags::aliasing(copy.flags().produces_alias), move |src, dst| {
        let value = copy.apply(src, &ty)?;
        *dst = Value::dynamic(Arc::clone(&ty), value);
        Ok(())
    }))
}

/// Dynamic source into a different dynamic destination.
fn compile_repack(c: &Compiler<'_>, from: &TypeRef, to: &TypeRef, methods: &[String]) -> Plan {
    let statically_satisfied = from.implements(methods);
    let methods = methods.to_vec();
    let deep_copy = c.options().deep_copy;
    let from_name = from.to_string();
    let to_name = to.to_string();
    let copies = RuntimeLookup::new(c, None);

    let flags = PlanFlags::aliasing(!deep_copy);
    Plan::new(flags, move |src, dst| {
        let boxed = match src {
            Value::Dynamic(None) => return Ok(()),
            Value::Dynamic(Some(boxed)) => boxed,
            other => return Err(ConvertError::mismatch(&from_name, other)),
        };
        if !statically_satisfied && !boxed.ty.implements(&methods) {
            return Err(ConvertError::UnsupportedDynamicValue {
                concrete: boxed.ty.to_string(),
                target: to_name.clone(),
            });
        }
        *dst = if deep_copy {
            Value::Dynamic(Some(Box::new(copies.copy(boxed)?)))
        } else {
            src.clone()
        };
        Ok(())
    })
}
