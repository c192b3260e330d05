// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled conversion plans.

use crate::error::{ConvertError, Result};
use crate::types::{TypeDescriptor, TypeId, TypeRef};
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Plan body: converts `src` into `dst`, which holds the destination zero value on entry.
pub type PlanFn = Arc<dyn Fn(&Value, &mut Value) -> Result<()> + Send + Sync>;

/// Cache key: the identities of the source and destination types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub from: TypeId,
    pub to: TypeId,
}

impl PlanKey {
    pub fn of(from: &TypeDescriptor, to: &TypeDescriptor) -> Self {
        Self {
            from: from.id(),
            to: to.id(),
        }
    }
}

/// What a plan's output may share with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanFlags {
    /// The output may reference heap storage of the input.
    pub produces_alias: bool,
    /// The plan is a user-registered converter.
    pub is_override: bool,
}

impl PlanFlags {
    pub const NONE: PlanFlags = PlanFlags {
        produces_alias: false,
        is_override: false,
    };

    pub fn aliasing(produces_alias: bool) -> Self {
        Self {
            produces_alias,
            is_override: false,
        }
    }
}

/// A compiled conversion plan.
#[derive(Clone)]
pub struct Plan {
    func: PlanFn,
    flags: PlanFlags,
}

impl Plan {
    pub fn new<F>(flags: PlanFlags, func: F) -> Self
    where
        F: Fn(&Value, &mut Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            flags,
        }
    }

    /// Raw copy: inline data is copied, heap storage is aliased.
    pub(crate) fn raw_copy(from: &TypeDescriptor) -> Self {
        Self::new(PlanFlags::aliasing(from.has_references()), |src, dst| {
            *dst = src.clone();
            Ok(())
        })
    }

    /// Plan that resolves, when called, to whatever `slot` has been filled with.
    ///
    /// The slot is held weakly; its owner is the scope the plan was compiled in.
    pub(crate) fn deferred(slot: &Arc<PlanSlot>) -> Self {
        let slot: Weak<PlanSlot> = Arc::downgrade(slot);
        Self::new(PlanFlags::NONE, move |src, dst| {
            let Some(slot) = slot.upgrade() else {
                return Err(ConvertError::Custom("scope dropped while a plan was in use".into()));
            };
            match slot.get() {
                Some(plan) => plan.run(src, dst),
                None => Err(ConvertError::invalid(&slot.from, &slot.to, slot.deep_copy)),
            }
        })
    }

    /// Run the plan.
    pub fn run(&self, src: &Value, dst: &mut Value) -> Result<()> {
        (self.func)(src, dst)
    }

    /// Run the plan into a fresh zero value of `to`.
    pub fn apply(&self, src: &Value, to: &TypeDescriptor) -> Result<Value> {
        let mut dst = Value::zero(to);
        self.run(src, &mut dst)?;
        Ok(dst)
    }

    pub fn flags(&self) -> PlanFlags {
        self.flags
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan").field("flags", &self.flags).finish()
    }
}

/// Placeholder for a plan still being compiled.
pub(crate) struct PlanSlot {
    plan: OnceLock<Plan>,
    from: String,
    to: String,
    deep_copy: bool,
}

impl PlanSlot {
    pub(crate) fn new(from: &TypeRef, to: &TypeRef, deep_copy: bool) -> Self {
        Self {
            plan: OnceLock::new(),
            from: from.to_string(),
            to: to.to_string(),
            deep_copy,
        }
    }

    pub(crate) fn fill(&self, plan: Plan) {
        let _ = self.plan.set(plan);
    }

    fn get(&self) -> Option<&Plan> {
        self.plan.get()
    }
}

/// Run `body` and restore the zero value of `to` in `dst` if it fails.
pub(crate) fn atomically<F>(to: &TypeDescriptor, dst: &mut Value, body: F) -> Result<()>
where
    F: FnOnce(&mut Value) -> Result<()>,
{
    let result = body(dst);
    if result.is_err() {
        *dst = Value::zero(to);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{registry, PrimitiveKind};

    #[test]
    fn test_deferred_plan_resolves_after_fill() {
        let int = registry::primitive(PrimitiveKind::I64);
        let slot = Arc::new(PlanSlot::new(&int, &int, false));
        let deferred = Plan::deferred(&slot);

        let mut dst = Value::I64(0);
        let err = deferred.run(&Value::I64(4), &mut dst).unwrap_err();
        assert!(err.is_compile_time());

        slot.fill(Plan::raw_copy(&int));
        deferred.run(&Value::I64(4), &mut dst).unwrap();
        assert_eq!(dst, Value::I64(4));

        drop(slot);
        let err = deferred.run(&Value::I64(4), &mut dst).unwrap_err();
        assert!(matches!(err, ConvertError::Custom(_)));
    }

    #[test]
    fn test_atomically_resets() {
        let list = crate::types::TypeDescriptor::list(registry::primitive(PrimitiveKind::I64));
        let mut dst = Value::zero(&list);
        let res = atomically(&list, &mut dst, |d| {
            *d = Value::list(vec![Value::I64(1)]);
            Err(ConvertError::NilIndirection)
        });
        assert!(res.is_err());
        assert!(dst.is_nil());
    }

    #[test]
    fn test_raw_copy_flags() {
        let int = registry::primitive(PrimitiveKind::I64);
        assert!(!Plan::raw_copy(&int).flags().produces_alias);
        let list = crate::types::TypeDescriptor::list(int);
        assert!(Plan::raw_copy(&list).flags().produces_alias);
    }
}
