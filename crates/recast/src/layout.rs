// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout compatibility.
//!
//! Two descriptors are layout-compatible when a value of one can be used as a
//! value of the other without changing its representation. Compatible pairs
//! may be converted by a raw copy, which aliases any heap storage the value
//! holds.

use crate::fields::fold_name;
use crate::scope::ScopeOptions;
use crate::types::{FieldDescriptor, TypeDescriptor, TypeId, TypeKind};
use std::collections::HashSet;

/// Whether values of `from` can be reinterpreted as `to`.
pub fn is_layout_compatible(options: &ScopeOptions, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    Analyzer {
        allow_private: options.allow_private_fields,
        assumed: HashSet::new(),
    }
    .compatible(from, to)
}

/// Whether a plan for `from -> to` may be a raw alias-or-copy.
pub fn is_aliasable(options: &ScopeOptions, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    !options.deep_copy
        && (from == to || (!options.disable_zero_copy && is_layout_compatible(options, from, to)))
}

struct Analyzer {
    allow_private: bool,
    // Pairs under examination; assumed compatible so cyclic graphs terminate.
    assumed: HashSet<(TypeId, TypeId)>,
}

impl Analyzer {
    fn compatible(&mut self, a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
        if a == b {
            return true;
        }
        if !self.assumed.insert((a.id(), b.id())) {
            return true;
        }
        let result = self.compare_kinds(a, b);
        self.assumed.remove(&(a.id(), b.id()));
        result
    }

    fn compare_kinds(&mut self, a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
        match (a.kind(), b.kind()) {
            (TypeKind::Primitive(x), TypeKind::Primitive(y)) => x == y,
            (TypeKind::Array { elem: e1, len: l1 }, TypeKind::Array { elem: e2, len: l2 }) => {
                l1 == l2 && self.compatible(e1, e2)
            }
            (TypeKind::List { elem: e1 }, TypeKind::List { elem: e2 })
            | (TypeKind::Pointer { elem: e1 }, TypeKind::Pointer { elem: e2 }) => {
                self.compatible(e1, e2)
            }
            (TypeKind::Map { key: k1, value: v1 }, TypeKind::Map { key: k2, value: v2 }) => {
                self.compatible(k1, k2) && self.compatible(v1, v2)
            }
            (TypeKind::Record(f1), TypeKind::Record(f2)) => {
                f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2.iter())
                        .all(|(x, y)| self.field_compatible(x, y))
            }
            (TypeKind::Dynamic { methods: m1 }, TypeKind::Dynamic { methods: m2 }) => {
                m1.iter().all(|m| m2.contains(m)) && m2.iter().all(|m| m1.contains(m))
            }
            (TypeKind::Callable(s1), TypeKind::Callable(s2)) => {
                s1.params.len() == s2.params.len()
                    && s1.results.len() == s2.results.len()
                    && s1
                        .params
                        .iter()
                        .zip(s2.params.iter())
                        .chain(s1.results.iter().zip(s2.results.iter()))
                        .all(|(x, y)| self.compatible(x, y))
            }
            (TypeKind::Channel { elem: e1, dir: d1 }, TypeKind::Channel { elem: e2, dir: d2 }) => {
                d2.accepts(*d1) && self.compatible(e1, e2)
            }
            (TypeKind::RawPointer, TypeKind::RawPointer) => true,
            _ => false,
        }
    }

    fn field_compatible(&mut self, x: &FieldDescriptor, y: &FieldDescriptor) -> bool {
        if x.skipped || y.skipped {
            return false;
        }
        if !self.allow_private && (!x.exported || !y.exported) {
            return false;
        }
        let names_match = x.resolved_name() == y.resolved_name() || {
            let folded = fold_name(x.resolved_name());
            !folded.is_empty() && folded == fold_name(y.resolved_name())
        };
        names_match && self.compatible(&x.type_desc, &y.type_desc)
    }
}
