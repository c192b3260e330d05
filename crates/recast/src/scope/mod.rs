// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion scopes.
//!
//! A [`Scope`] owns the policy flags, the user-registered overrides and the
//! compiled plan table. It is configured once through [`ScopeBuilder`] and is
//! immutable afterwards; the plan table is the only state that changes, and
//! only by insertion.
//!
//! # Example
//!
//! ```rust
//! use recast::{types::{registry, PrimitiveKind}, Scope, Value};
//!
//! let scope = Scope::builder().strict_nil_check().build();
//! let int = registry::primitive(PrimitiveKind::I64);
//! let string = registry::primitive(PrimitiveKind::String);
//! let out = scope.convert(&int, &string, &Value::I64(42)).unwrap();
//! assert_eq!(out, Value::from("42"));
//! ```

mod options;
mod unpack_cache;

pub use options::ScopeOptions;
pub(crate) use unpack_cache::UnpackCache;

use crate::convert::Compiler;
use crate::error::{ConvertError, Result};
use crate::plan::{Plan, PlanFlags, PlanKey, PlanSlot};
use crate::reflect::Reflect;
use crate::types::{TypeDescriptor, TypeRef};
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// User-supplied converter for one exact type pair.
pub type ConverterFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

pub(crate) enum Override {
    Convert(ConverterFn),
    Disabled,
}

/// Plan table hit/miss counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
}

pub(crate) struct ScopeInner {
    options: ScopeOptions,
    overrides: HashMap<PlanKey, Override>,
    plans: RwLock<HashMap<PlanKey, Result<Plan>>>,
    // Targets of deferred plans in cyclic type graphs.
    slots: Mutex<Vec<Arc<PlanSlot>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Configuration and plan cache under which conversions run.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

/// Non-owning scope handle held by plans that compile lazily at call time.
#[derive(Clone)]
pub(crate) struct WeakScope(Weak<ScopeInner>);

impl WeakScope {
    pub(crate) fn upgrade(&self) -> Result<Scope> {
        self.0
            .upgrade()
            .map(|inner| Scope { inner })
            .ok_or_else(|| ConvertError::Custom("scope dropped while a plan was in use".into()))
    }
}

impl Scope {
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::default()
    }

    /// Scope with the given flags and no overrides.
    pub fn new(options: ScopeOptions) -> Self {
        ScopeBuilder::default().options(options).build()
    }

    /// Process-wide scope with default options.
    pub fn global() -> &'static Scope {
        static GLOBAL: OnceLock<Scope> = OnceLock::new();
        GLOBAL.get_or_init(|| Scope::new(ScopeOptions::default()))
    }

    /// Process-wide deep-copy scope.
    pub fn global_deep_copy() -> &'static Scope {
        static DEEP: OnceLock<Scope> = OnceLock::new();
        DEEP.get_or_init(|| {
            Scope::new(ScopeOptions {
                deep_copy: true,
                ..ScopeOptions::default()
            })
        })
    }

    pub fn options(&self) -> &ScopeOptions {
        &self.inner.options
    }

    /// Plan for `from -> to`, compiling and caching it on first request.
    pub fn plan(&self, from: &TypeRef, to: &TypeRef) -> Result<Plan> {
        Compiler::new(self).plan(from, to)
    }

    /// Pre-resolved converter for repeated use.
    pub fn converter(&self, from: &TypeRef, to: &TypeRef) -> Result<Converter> {
        let plan = self.plan(from, to)?;
        Ok(Converter {
            plan,
            from: Arc::clone(from),
            to: Arc::clone(to),
        })
    }

    /// Convert one value.
    pub fn convert(&self, from: &TypeRef, to: &TypeRef, value: &Value) -> Result<Value> {
        self.plan(from, to)?.apply(value, to)
    }

    pub fn stats(&self) -> LookupStats {
        LookupStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached entries, failures included.
    pub fn cached_plans(&self) -> usize {
        self.inner.plans.read().len()
    }

    pub(crate) fn lookup(&self, key: &PlanKey) -> Option<Result<Plan>> {
        let hit = self.inner.plans.read().get(key).cloned();
        match &hit {
            Some(_) => self.inner.hits.fetch_add(1, Ordering::Relaxed),
            None => self.inner.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Store a compiled result. A concurrent compile of the same pair may overwrite it.
    pub(crate) fn publish(&self, key: PlanKey, result: Result<Plan>) {
        self.inner.plans.write().insert(key, result);
    }

    /// Keep a cycle slot alive for as long as the scope.
    pub(crate) fn retain_slot(&self, slot: Arc<PlanSlot>) {
        self.inner.slots.lock().push(slot);
    }

    pub(crate) fn override_for(&self, key: &PlanKey) -> Option<&Override> {
        self.inner.overrides.get(key)
    }

    pub(crate) fn downgrade(&self) -> WeakScope {
        WeakScope(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("options", &self.inner.options)
            .field("overrides", &self.inner.overrides.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Builder for [`Scope`].
#[derive(Default)]
pub struct ScopeBuilder {
    options: ScopeOptions,
    overrides: HashMap<PlanKey, Override>,
}

impl ScopeBuilder {
    /// Replace all policy flags.
    pub fn options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a converter for exactly `from -> to`. It wins over every built-in strategy.
    pub fn with_converter<F>(mut self, from: &TypeDescriptor, to: &TypeDescriptor, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.overrides
            .insert(PlanKey::of(from, to), Override::Convert(Arc::new(f)));
        self
    }

    /// Typed form of [`with_converter`](Self::with_converter) for [`Reflect`] types.
    pub fn register<F, T>(self, f: impl Fn(&F) -> Result<T> + Send + Sync + 'static) -> Self
    where
        F: Reflect,
        T: Reflect,
    {
        self.with_converter(&F::descriptor(), &T::descriptor(), move |value| {
            let input = F::from_value(value)?;
            Ok(f(&input)?.to_value())
        })
    }

    /// Make `from -> to` unconvertible in this scope.
    pub fn disable_pair(mut self, from: &TypeDescriptor, to: &TypeDescriptor) -> Self {
        self.overrides.insert(PlanKey::of(from, to), Override::Disabled);
        self
    }

    pub fn disable_zero_copy(mut self) -> Self {
        self.options.disable_zero_copy = true;
        self
    }

    pub fn deep_copy(mut self) -> Self {
        self.options.deep_copy = true;
        self
    }

    pub fn allow_private_fields(mut self) -> Self {
        self.options.allow_private_fields = true;
        self
    }

    pub fn strict_nil_check(mut self) -> Self {
        self.options.strict_nil_check = true;
        self
    }

    pub fn build(self) -> Scope {
        log::debug!(
            "[Scope] built with {:?}, {} override(s)",
            self.options,
            self.overrides.len()
        );
        Scope {
            inner: Arc::new(ScopeInner {
                options: self.options,
                overrides: self.overrides,
                plans: RwLock::new(HashMap::new()),
                slots: Mutex::new(Vec::new()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }
}

/// Plan bound to its types.
#[derive(Clone)]
pub struct Converter {
    plan: Plan,
    from: TypeRef,
    to: TypeRef,
}

impl Converter {
    pub fn convert(&self, value: &Value) -> Result<Value> {
        self.plan.apply(value, &self.to)
    }

    /// Convert into `dst`. `dst` is reset to zero first and stays zero on failure.
    pub fn convert_into(&self, value: &Value, dst: &mut Value) -> Result<()> {
        *dst = Value::zero(&self.to);
        self.plan.run(value, dst)
    }

    pub fn from_type(&self) -> &TypeRef {
        &self.from
    }

    pub fn to_type(&self) -> &TypeRef {
        &self.to
    }

    pub fn flags(&self) -> PlanFlags {
        self.plan.flags()
    }

    /// The output may share heap storage with the input.
    pub fn produces_alias(&self) -> bool {
        self.plan.flags().produces_alias
    }

    /// The plan is a registered override.
    pub fn is_override(&self) -> bool {
        self.plan.flags().is_override
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .field("flags", &self.plan.flags())
            .finish()
    }
}
