// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion errors.
//!
//! Errors fall in two phases: a pair of types may have no plan at all
//! ([`ErrorPhase::Compile`]) or a plan may exist but reject a particular value
//! ([`ErrorPhase::Call`]). Compile errors are cached alongside plans, which is
//! why [`ConvertError`] is `Clone`.

use std::fmt;

/// When an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// No plan could be derived for the type pair.
    Compile,
    /// A plan exists but the value did not fit.
    Call,
}

/// Errors produced while compiling or running a conversion plan.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    // ========================================================================
    // Compile-time
    // ========================================================================
    /// No plan exists for this pair of types.
    InvalidConversion {
        from: String,
        to: String,
        deep_copy: bool,
    },
    /// A required destination field has no counterpart in a static source record.
    RequiredFieldUnmatched { type_name: String, field: String },

    // ========================================================================
    // Call-time
    // ========================================================================
    /// A non-absent destination was reached through a nil source indirection.
    NilIndirection,
    /// A required destination field was not present in the source map.
    RequiredFieldMissing { type_name: String, field: String },
    /// A primitive parse failed.
    LeafParse {
        from: String,
        to: String,
        input: String,
        reason: String,
    },
    /// The concrete type inside a dynamic value lacks methods the destination requires.
    UnsupportedDynamicValue { concrete: String, target: String },
    /// The value handed to a plan does not have the shape of its descriptor.
    ValueMismatch { expected: String, found: String },
    /// A user-registered converter failed.
    Custom(String),
}

impl ConvertError {
    pub(crate) fn invalid(from: &str, to: &str, deep_copy: bool) -> Self {
        Self::InvalidConversion {
            from: from.to_string(),
            to: to.to_string(),
            deep_copy,
        }
    }

    pub(crate) fn mismatch(expected: &str, found: &crate::Value) -> Self {
        Self::ValueMismatch {
            expected: expected.to_string(),
            found: found.variant_name().to_string(),
        }
    }

    /// Whether the error was raised while compiling or while converting a value.
    pub fn phase(&self) -> ErrorPhase {
        match self {
            Self::InvalidConversion { .. } | Self::RequiredFieldUnmatched { .. } => {
                ErrorPhase::Compile
            }
            _ => ErrorPhase::Call,
        }
    }

    /// True when the type pair itself is unsupported.
    pub fn is_compile_time(&self) -> bool {
        self.phase() == ErrorPhase::Compile
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConversion {
                from,
                deep_copy: true,
                ..
            } => write!(f, "invalid deep copy: can't deep copy type {}", from),
            Self::InvalidConversion { from, to, .. } => {
                write!(f, "invalid cast: can't cast type {} to {}", from, to)
            }
            Self::RequiredFieldUnmatched { type_name, field } => {
                write!(f, "required field {}.{} not match", type_name, field)
            }
            Self::NilIndirection => write!(f, "can't address nil pointer"),
            Self::RequiredFieldMissing { type_name, field } => {
                write!(f, "required field {}.{} missing", type_name, field)
            }
            Self::LeafParse {
                from,
                to,
                input,
                reason,
            } => write!(
                f,
                "can't parse {:?} ({}) as {}: {}",
                input, from, to, reason
            ),
            Self::UnsupportedDynamicValue { concrete, target } => {
                write!(f, "type {} does not implement {}", concrete, target)
            }
            Self::ValueMismatch { expected, found } => {
                write!(f, "value mismatch: expected {}, found {}", expected, found)
            }
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConvertError {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;
