// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded plan cache for dynamic-value unpacking.
//!
//! Each unpacking plan remembers the plans of the last few concrete types it
//! saw. Access never waits: under contention `get` misses and `put` drops the
//! entry, and the caller falls back to the scope's plan table.

use crate::plan::Plan;
use crate::types::TypeId;
use parking_lot::RwLock;

const CAPACITY: usize = 8;

#[derive(Default)]
struct Ring {
    entries: [Option<(TypeId, Plan)>; CAPACITY],
    next: usize,
}

#[derive(Default)]
pub(crate) struct UnpackCache {
    ring: RwLock<Ring>,
}

impl UnpackCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, ty: TypeId) -> Option<Plan> {
        let ring = self.ring.try_read()?;
        ring.entries
            .iter()
            .flatten()
            .find(|(id, _)| *id == ty)
            .map(|(_, plan)| plan.clone())
    }

    pub(crate) fn put(&self, ty: TypeId, plan: Plan) {
        let Some(mut ring) = self.ring.try_write() else {
            return;
        };
        let slot = ring.next;
        ring.entries[slot] = Some((ty, plan));
        ring.next = (slot + 1) % CAPACITY;
    }
}
