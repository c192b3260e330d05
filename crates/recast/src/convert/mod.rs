// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plan compiler.
//!
//! Decision order for a pair `(from, to)`:
//!
//! 1. a user override registered in the scope for exactly this pair;
//! 2. a raw alias-or-copy when the pair is aliasable;
//! 3. a `String` method on the source when the destination is a string;
//! 4. unpacking a dynamic source, dereferencing a pointer source (unless it
//!    can be packed into a dynamic destination as is);
//! 5. the converter for the destination kind.
//!
//! Nested pairs are compiled through [`Compiler::plan`], which publishes each
//! result to the scope. A pair already being compiled in this session resolves
//! to a deferred plan, so cyclic type graphs compile once. The scope owns the
//! slots deferred plans resolve through, so dropping it frees the cycle.

mod array;
mod callable;
mod dynamic;
mod handle;
mod list;
mod map;
mod pointer;
mod record;
mod scalar;
mod string;

use crate::error::{ConvertError, Result};
use crate::layout;
use crate::plan::{Plan, PlanFlags, PlanKey, PlanSlot};
use crate::scope::{Override, Scope, ScopeOptions};
use crate::types::{PrimitiveKind, TypeKind, TypeRef};
use std::collections::HashMap;
use std::sync::Arc;

/// One compilation session.
pub(crate) struct Compiler<'s> {
    scope: &'s Scope,
    pending: HashMap<PlanKey, Arc<PlanSlot>>,
}

impl<'s> Compiler<'s> {
    pub(crate) fn new(scope: &'s Scope) -> Self {
        Self {
            scope,
            pending: HashMap::new(),
        }
    }

    pub(crate) fn scope(&self) -> &'s Scope {
        self.scope
    }

    pub(crate) fn options(&self) -> &ScopeOptions {
        self.scope.options()
    }

    pub(crate) fn invalid(&self, from: &TypeRef, to: &TypeRef) -> ConvertError {
        ConvertError::invalid(&from.to_string(), &to.to_string(), self.options().deep_copy)
    }

    /// Plan for a nested pair.
    pub(crate) fn plan(&mut self, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
        let key = PlanKey::of(from, to);
        if let Some(cached) = self.scope.lookup(&key) {
            log::trace!("[Compiler::plan] cache hit {} -> {}", from, to);
            return cached;
        }
        if let Some(slot) = self.pending.get(&key) {
            return Ok(Plan::deferred(slot));
        }

        let slot = Arc::new(PlanSlot::new(from, to, self.options().deep_copy));
        self.pending.insert(key, Arc::clone(&slot));
        let result = self.dispatch(from, to);
        self.pending.remove(&key);

        match &result {
            Ok(plan) => {
                slot.fill(plan.clone());
                log::debug!(
                    "[Compiler::plan] compiled {} -> {} (alias={}, override={})",
                    from,
                    to,
                    plan.flags().produces_alias,
                    plan.flags().is_override
                );
            }
            Err(e) => log::debug!("[Compiler::plan] no plan {} -> {}: {}", from, to, e),
        }
        // Deferred plans only hold the slot weakly.
        if Arc::weak_count(&slot) > 0 {
            self.scope.retain_slot(slot);
        }
        self.scope.publish(key, result.clone());
        result
    }

    fn dispatch(&mut self, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
        match self.scope.override_for(&PlanKey::of(from, to)) {
            Some(Override::Convert(f)) => {
                let f = Arc::clone(f);
                let flags = PlanFlags {
                    produces_alias: to.has_references(),
                    is_override: true,
                };
                return Ok(Plan::new(flags, move |src, dst| {
                    *dst = f(src)?;
                    Ok(())
                }));
            }
            Some(Override::Disabled) => return Err(self.invalid(from, to)),
            None => {}
        }

        if layout::is_aliasable(self.options(), from, to) {
            return Ok(Plan::raw_copy(from));
        }

        if to.primitive_kind() == Some(PrimitiveKind::String) {
            if let Some(plan) = string::compile_stringer(from, to) {
                return Ok(plan);
            }
        }

        match (from.kind(), to.kind()) {
            (TypeKind::Dynamic { .. }, TypeKind::Dynamic { .. }) => {}
            (TypeKind::Dynamic { .. }, _) => return dynamic::compile_unpack(self, from, to),
            (TypeKind::Pointer { .. }, TypeKind::Pointer { .. } | TypeKind::RawPointer) => {}
            // A pointer that satisfies the capabilities is packed as is.
            (TypeKind::Pointer { .. }, TypeKind::Dynamic { methods })
                if from.implements(methods) => {}
            (TypeKind::Pointer { .. }, _) => return pointer::compile_deref(self, from, to),
            _ => {}
        }

        match to.kind() {
            TypeKind::Primitive(PrimitiveKind::String) => string::compile(self, from, to),
            TypeKind::Primitive(kind) => scalar::compile(self, from, to, *kind),
            TypeKind::Array { elem, len } => array::compile(self, from, to, elem, *len),
            TypeKind::List { elem } => list::compile(self, from, to, elem),
            TypeKind::Map { key, value } => map::compile(self, from, to, key, value),
            TypeKind::Record(_) => record::compile(self, from, to),
            TypeKind::Pointer { .. } => pointer::compile(self, from, to),
            TypeKind::Dynamic { methods } => dynamic::compile_pack(self, from, to, methods),
            TypeKind::Callable(sig) => callable::compile(self, from, to, sig),
            TypeKind::Channel { .. } => handle::compile_channel(self, from, to),
            TypeKind::RawPointer => handle::compile_raw_pointer(self, from, to),
            TypeKind::Undefined => Err(self.invalid(from, to)),
        }
    }
}

/// Element kind used to view a string as a list: chars for `char`/`i32` elements, bytes otherwise.
pub(crate) fn string_view_kind(elem: &TypeRef) -> PrimitiveKind {
    match elem.primitive_kind() {
        Some(PrimitiveKind::Char | PrimitiveKind::I32) => PrimitiveKind::Char,
        _ => PrimitiveKind::U8,
    }
}
