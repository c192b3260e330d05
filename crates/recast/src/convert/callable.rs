// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Callable adapters.
//!
//! The adapter converts its arguments to the source signature, calls the
//! source function and converts the results back. A destination signature
//! may declare one extra trailing error-like result; the adapter reports
//! conversion failures through it.

use super::Compiler;
use crate::error::{ConvertError, Result};
use crate::plan::{Plan, PlanFlags};
use crate::types::{registry, Signature, TypeKind, TypeRef};
use crate::value::{Func, Value};
use std::sync::Arc;

struct Adapter {
    args: Vec<(Plan, TypeRef)>,
    results: Vec<(Plan, TypeRef)>,
    error_slot: bool,
    name: String,
}

impl Adapter {
    fn call(&self, func: &Func, args: Vec<Value>) -> Vec<Value> {
        match self.try_call(func, args) {
            Ok(mut results) => {
                if self.error_slot {
                    results.push(Value::Dynamic(None));
                }
                results
            }
            Err(e) => self.failure(e),
        }
    }

    fn try_call(&self, func: &Func, args: Vec<Value>) -> Result<Vec<Value>> {
        if args.len() != self.args.len() {
            return Err(ConvertError::Custom(format!(
                "{} takes {} argument(s), got {}",
                self.name,
                self.args.len(),
                args.len()
            )));
        }
        let converted = args
            .iter()
            .zip(&self.args)
            .map(|(arg, (plan, ty))| plan.apply(arg, ty))
            .collect::<Result<Vec<_>>>()?;

        let raw = func.call(converted);
        if raw.len() != self.results.len() {
            return Err(ConvertError::Custom(format!(
                "{} returned {} result(s), expected {}",
                self.name,
                raw.len(),
                self.results.len()
            )));
        }
        raw.iter()
            .zip(&self.results)
            .map(|(value, (plan, ty))| plan.apply(value, ty))
            .collect()
    }

    fn failure(&self, error: ConvertError) -> Vec<Value> {
        let mut results: Vec<Value> = self.results.iter().map(|(_, ty)| Value::zero(ty)).collect();
        if self.error_slot {
            results.push(Value::dynamic(
                registry::conversion_error_type(),
                Value::from(error.to_string()),
            ));
        } else {
            log::warn!("[callable] {}: conversion failed with no error result: {}", self.name, error);
        }
        results
    }
}

pub(super) fn compile(
    c: &mut Compiler<'_>,
    from: &TypeRef,
    to: &TypeRef,
    sig: &Signature,
) -> Result<Plan> {
    let TypeKind::Callable(source) = from.kind() else {
        return Err(c.invalid(from, to));
    };
    if source.params.len() != sig.params.len() {
        return Err(c.invalid(from, to));
    }
    let error_slot = match sig.results.len().checked_sub(source.results.len()) {
        Some(0) => false,
        Some(1) => sig.results.last().is_some_and(|last| last.is_error_like()),
        _ => false,
    };
    if !error_slot && sig.results.len() != source.results.len() {
        return Err(c.invalid(from, to));
    }

    // Arguments flow from the destination signature into the source one.
    let mut args = Vec::with_capacity(sig.params.len());
    for (dest, src) in sig.params.iter().zip(&source.params) {
        args.push((c.plan(dest, src)?, Arc::clone(src)));
    }
    let mut results = Vec::with_capacity(source.results.len());
    for (src, dest) in source.results.iter().zip(&sig.results) {
        results.push((c.plan(src, dest)?, Arc::clone(dest)));
    }

    let adapter = Arc::new(Adapter {
        args,
        results,
        error_slot,
        name: from.to_string(),
    });
    Ok(Plan::new(PlanFlags::aliasing(true), move |src, dst| {
        match src {
            Value::Callable(None) => {}
            Value::Callable(Some(func)) => {
                let func = func.clone();
                let adapter = Arc::clone(&adapter);
                *dst = Value::callable(move |args| adapter.call(&func, args));
            }
            other => return Err(ConvertError::mismatch(&adapter.name, other)),
        }
        Ok(())
    }))
}
