// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field matching.
//!
//! A record's fields are flattened into a [`FieldSet`]: embedded members are
//! replaced by their own fields (promotion), skipped and private fields are
//! dropped, and every surviving field gets an access path from the outer
//! record. Destination fields are then paired with source fields by alias,
//! raw name, or unique folded name, in that order.

use crate::types::{TypeDescriptor, TypeId, TypeRef};
use crate::value::{FieldPath, PathStep};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

/// Case and separator insensitive form of a name.
///
/// `_` and `-` are removed and every character is upper-cased, so
/// `user_id`, `UserID` and `user-Id` all fold to `USERID`.
pub fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// A flattened record field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Declared name.
    pub raw_name: String,
    /// Alias tag, if any.
    pub alias: Option<String>,
    /// `None` when another field of the set folds to the same name.
    pub folded_name: Option<String>,
    /// Steps from the outer record to this field.
    pub path: FieldPath,
    pub type_desc: TypeRef,
    pub required: bool,
}

impl FieldInfo {
    /// Alias when present, otherwise the declared name.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.raw_name)
    }

    /// Whether the field sits directly at a record position (no pointer crossing).
    pub fn is_inline(&self) -> bool {
        self.path.iter().all(|step| matches!(step, PathStep::Field(_)))
    }
}

/// How strongly a name matched a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrength {
    Folded = 1,
    RawName = 2,
    Resolved = 3,
}

/// The flattened fields of a record type plus name indexes.
#[derive(Debug, Default)]
pub struct FieldSet {
    pub fields: Vec<FieldInfo>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    by_raw: HashMap<String, usize>,
    by_folded: HashMap<String, usize>,
}

impl FieldSet {
    fn index(fields: Vec<FieldInfo>) -> Self {
        let mut set = FieldSet {
            fields,
            ..FieldSet::default()
        };
        for (i, field) in set.fields.iter().enumerate() {
            set.by_name.entry(field.name().to_string()).or_insert(i);
            set.by_raw.entry(field.raw_name.clone()).or_insert(i);
            if let Some(alias) = &field.alias {
                set.by_alias.entry(alias.clone()).or_insert(i);
            }
            if let Some(folded) = &field.folded_name {
                set.by_folded.insert(folded.clone(), i);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Source field for a destination field, by the matching precedence.
    pub fn find_source_for(&self, dest: &FieldInfo) -> Option<usize> {
        let name = dest.name();
        self.by_alias
            .get(name)
            .or_else(|| self.by_raw.get(name))
            .or_else(|| dest.folded_name.as_ref().and_then(|f| self.by_folded.get(f)))
            .copied()
    }

    /// Field addressed by a runtime key (map to record).
    pub fn lookup_key(&self, key: &str) -> Option<(usize, MatchStrength)> {
        if let Some(i) = self.by_name.get(key) {
            return Some((*i, MatchStrength::Resolved));
        }
        if let Some(i) = self.by_raw.get(key) {
            return Some((*i, MatchStrength::RawName));
        }
        self.by_folded
            .get(&fold_name(key))
            .map(|i| (*i, MatchStrength::Folded))
    }
}

/// Destination/source pairing for a record-to-record plan.
#[derive(Debug, Default)]
pub struct RecordMatch {
    /// `(destination index, source index)` into the respective field sets.
    pub pairs: Vec<(usize, usize)>,
    /// Required destination fields with no source.
    pub missing_required: Vec<usize>,
}

/// Pair every destination field with at most one source field.
pub fn match_records(dest: &FieldSet, source: &FieldSet) -> RecordMatch {
    let mut result = RecordMatch::default();
    for (d, field) in dest.fields.iter().enumerate() {
        match source.find_source_for(field) {
            Some(s) => result.pairs.push((d, s)),
            None if field.required => result.missing_required.push(d),
            None => log::trace!("[fields] no source for {}", field.name()),
        }
    }
    result
}

fn field_cache() -> &'static DashMap<(bool, TypeId), Arc<FieldSet>> {
    static FIELDS: OnceLock<DashMap<(bool, TypeId), Arc<FieldSet>>> = OnceLock::new();
    FIELDS.get_or_init(DashMap::new)
}

/// Flattened field set of a record type, memoized per `(allow_private, type)`.
pub fn field_set(ty: &TypeDescriptor, allow_private: bool) -> Arc<FieldSet> {
    let key = (allow_private, ty.id());
    if let Some(hit) = field_cache().get(&key) {
        return Arc::clone(hit.value());
    }
    let mut visited = HashSet::new();
    visited.insert(ty.id());
    let mut fields = collect(ty, &[], allow_private, &mut visited);
    assign_folded_names(&mut fields);
    let set = Arc::new(FieldSet::index(fields));
    field_cache().insert(key, Arc::clone(&set));
    set
}

fn collect(
    ty: &TypeDescriptor,
    prefix: &[PathStep],
    allow_private: bool,
    visited: &mut HashSet<TypeId>,
) -> Vec<FieldInfo> {
    let Some(declared) = ty.fields() else {
        return Vec::new();
    };
    let mut direct: Vec<FieldInfo> = Vec::new();
    let mut promoted: Vec<Vec<FieldInfo>> = Vec::new();

    for (i, field) in declared.iter().enumerate() {
        if field.skipped {
            continue;
        }
        let mut path = prefix.to_vec();
        path.push(PathStep::Field(i));

        if field.embedded {
            let (depth, inner) = field.type_desc.pointer_depth();
            if inner.is_record() && depth <= 1 && !visited.contains(&inner.id()) {
                if depth == 1 {
                    path.push(PathStep::Deref(Arc::clone(&inner)));
                }
                visited.insert(inner.id());
                promoted.push(collect(&inner, &path, allow_private, visited));
                visited.remove(&inner.id());
                continue;
            }
        }
        if !field.exported && !allow_private {
            continue;
        }
        direct.push(FieldInfo {
            raw_name: field.name.clone(),
            alias: field.alias.clone(),
            folded_name: None,
            path,
            type_desc: Arc::clone(&field.type_desc),
            required: field.required,
        });
    }

    let direct_names: HashSet<String> = direct.iter().map(|f| f.name().to_string()).collect();
    let mut promoted_counts: HashMap<String, usize> = HashMap::new();
    for group in &promoted {
        let names: HashSet<&str> = group.iter().map(FieldInfo::name).collect();
        for name in names {
            *promoted_counts.entry(name.to_string()).or_default() += 1;
        }
    }
    for field in promoted.into_iter().flatten() {
        let name = field.name();
        if direct_names.contains(name) {
            continue;
        }
        if promoted_counts.get(name).copied().unwrap_or(0) > 1 {
            log::debug!("[fields] ambiguous promoted field {} dropped from {}", name, ty);
            continue;
        }
        direct.push(field);
    }
    direct
}

fn assign_folded_names(fields: &mut [FieldInfo]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for field in fields.iter() {
        *counts.entry(fold_name(field.name())).or_default() += 1;
    }
    for field in fields.iter_mut() {
        let folded = fold_name(field.name());
        if !folded.is_empty() && counts.get(&folded) == Some(&1) {
            field.folded_name = Some(folded);
        }
    }
}
