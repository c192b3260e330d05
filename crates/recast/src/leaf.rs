// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive-to-primitive conversion.
//!
//! Contract:
//! - numbers convert to numbers with `as` semantics (wrapping narrowing,
//!   truncating float to int, saturating out-of-range floats);
//! - `bool` converts to numbers as `0`/`1`, numbers convert to `bool` as `!= 0`;
//! - `char` behaves as its code point; invalid code points become U+FFFD;
//! - strings are produced with `Display` (shortest round-trip for floats);
//! - strings parse as base-10 integers, `f64`, the boolean words accepted by
//!   [`parse_bool`], or exactly one character.

use crate::types::PrimitiveKind;
use crate::value::Value;
use std::sync::Arc;

/// Why a primitive conversion failed.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafError {
    /// The input is not a primitive value.
    Shape,
    /// The input string does not parse as the destination kind.
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    fn is_zero(self) -> bool {
        match self {
            Number::Signed(v) => v == 0,
            Number::Unsigned(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }
}

/// Numeric view of bools, integers, floats and chars.
pub(crate) fn number_of(value: &Value) -> Option<Number> {
    Some(match value {
        Value::Bool(v) => Number::Unsigned(u64::from(*v)),
        Value::I8(v) => Number::Signed(i64::from(*v)),
        Value::I16(v) => Number::Signed(i64::from(*v)),
        Value::I32(v) => Number::Signed(i64::from(*v)),
        Value::I64(v) => Number::Signed(*v),
        Value::U8(v) => Number::Unsigned(u64::from(*v)),
        Value::U16(v) => Number::Unsigned(u64::from(*v)),
        Value::U32(v) => Number::Unsigned(u64::from(*v)),
        Value::U64(v) => Number::Unsigned(*v),
        Value::Usize(v) => Number::Unsigned(*v as u64),
        Value::F32(v) => Number::Float(f64::from(*v)),
        Value::F64(v) => Number::Float(*v),
        Value::Char(c) => Number::Unsigned(u64::from(u32::from(*c))),
        _ => return None,
    })
}

macro_rules! cast_number {
    ($n:expr, $ty:ty) => {
        match $n {
            Number::Signed(v) => v as $ty,
            Number::Unsigned(v) => v as $ty,
            Number::Float(v) => v as $ty,
        }
    };
}

/// Build a non-string primitive of `kind` from a number.
pub(crate) fn from_number(kind: PrimitiveKind, n: Number) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(!n.is_zero()),
        PrimitiveKind::I8 => Value::I8(cast_number!(n, i8)),
        PrimitiveKind::I16 => Value::I16(cast_number!(n, i16)),
        PrimitiveKind::I32 => Value::I32(cast_number!(n, i32)),
        PrimitiveKind::I64 => Value::I64(cast_number!(n, i64)),
        PrimitiveKind::U8 => Value::U8(cast_number!(n, u8)),
        PrimitiveKind::U16 => Value::U16(cast_number!(n, u16)),
        PrimitiveKind::U32 => Value::U32(cast_number!(n, u32)),
        PrimitiveKind::U64 => Value::U64(cast_number!(n, u64)),
        PrimitiveKind::Usize => Value::Usize(cast_number!(n, usize)),
        PrimitiveKind::F32 => Value::F32(cast_number!(n, f32)),
        PrimitiveKind::F64 => Value::F64(cast_number!(n, f64)),
        PrimitiveKind::Char => Value::Char(
            char::from_u32(cast_number!(n, u32)).unwrap_or(char::REPLACEMENT_CHARACTER),
        ),
        PrimitiveKind::String => Value::String(Arc::from(format_number(n).as_str())),
    }
}

fn format_number(n: Number) -> String {
    match n {
        Number::Signed(v) => v.to_string(),
        Number::Unsigned(v) => v.to_string(),
        Number::Float(v) => v.to_string(),
    }
}

/// Textual form of a primitive value.
pub fn format(value: &Value) -> Option<String> {
    Some(match value {
        Value::String(s) => s.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Char(c) => c.to_string(),
        // f32 formats with its own shortest representation.
        Value::F32(v) => v.to_string(),
        other => format_number(number_of(other)?),
    })
}

/// Parse a boolean word.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse `s` as a primitive of `kind`.
pub fn parse(kind: PrimitiveKind, s: &str) -> Result<Value, LeafError> {
    let n = match kind {
        PrimitiveKind::String => return Ok(Value::from(s)),
        PrimitiveKind::Bool => {
            return parse_bool(s)
                .map(Value::Bool)
                .ok_or_else(|| LeafError::Parse("invalid syntax".to_string()))
        }
        PrimitiveKind::Char => {
            let mut chars = s.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(LeafError::Parse("expected exactly one character".to_string())),
            };
        }
        k if k.is_signed() => s
            .parse::<i64>()
            .map(Number::Signed)
            .map_err(|e| LeafError::Parse(e.to_string()))?,
        k if k.is_unsigned() => s
            .parse::<u64>()
            .map(Number::Unsigned)
            .map_err(|e| LeafError::Parse(e.to_string()))?,
        _ => s
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|e| LeafError::Parse(e.to_string()))?,
    };
    Ok(from_number(kind, n))
}

/// Convert a primitive value to a primitive of `to`.
pub fn convert(value: &Value, to: PrimitiveKind) -> Result<Value, LeafError> {
    match value {
        Value::String(s) => parse(to, s),
        _ if to == PrimitiveKind::String => format(value)
            .map(Value::from)
            .ok_or(LeafError::Shape),
        other => number_of(other)
            .map(|n| from_number(to, n))
            .ok_or(LeafError::Shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_narrowing_wraps() {
        assert_eq!(convert(&Value::I64(300), PrimitiveKind::U8), Ok(Value::U8(44)));
        assert_eq!(convert(&Value::I32(-1), PrimitiveKind::U16), Ok(Value::U16(u16::MAX)));
        assert_eq!(convert(&Value::F64(3.9), PrimitiveKind::I32), Ok(Value::I32(3)));
        assert_eq!(convert(&Value::U8(7), PrimitiveKind::F32), Ok(Value::F32(7.0)));
    }

    #[test]
    fn test_bool_bridge() {
        assert_eq!(convert(&Value::Bool(true), PrimitiveKind::I64), Ok(Value::I64(1)));
        assert_eq!(convert(&Value::F64(0.0), PrimitiveKind::Bool), Ok(Value::Bool(false)));
        assert_eq!(convert(&Value::from("True"), PrimitiveKind::Bool), Ok(Value::Bool(true)));
        assert!(matches!(
            convert(&Value::from("yes"), PrimitiveKind::Bool),
            Err(LeafError::Parse(_))
        ));
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(convert(&Value::I64(-42), PrimitiveKind::String), Ok(Value::from("-42")));
        assert_eq!(convert(&Value::F64(0.5), PrimitiveKind::String), Ok(Value::from("0.5")));
        assert_eq!(convert(&Value::Char('x'), PrimitiveKind::String), Ok(Value::from("x")));
        assert_eq!(convert(&Value::from("+17"), PrimitiveKind::I16), Ok(Value::I16(17)));
        assert_eq!(convert(&Value::from("2.5"), PrimitiveKind::F64), Ok(Value::F64(2.5)));
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            convert(&Value::from("not-a-number"), PrimitiveKind::I64),
            Err(LeafError::Parse(_))
        ));
        assert!(matches!(
            convert(&Value::from("-1"), PrimitiveKind::U32),
            Err(LeafError::Parse(_))
        ));
        assert!(matches!(
            convert(&Value::from("ab"), PrimitiveKind::Char),
            Err(LeafError::Parse(_))
        ));
    }

    #[test]
    fn test_char_code_points() {
        assert_eq!(convert(&Value::Char('A'), PrimitiveKind::U32), Ok(Value::U32(65)));
        assert_eq!(convert(&Value::I32(0x263A), PrimitiveKind::Char), Ok(Value::Char('☺')));
        assert_eq!(
            convert(&Value::I64(-1), PrimitiveKind::Char),
            Ok(Value::Char(char::REPLACEMENT_CHARACTER))
        );
    }

    #[test]
    fn test_int_string_round_trip() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let v = rng.i64(..);
            let s = convert(&Value::I64(v), PrimitiveKind::String).unwrap();
            assert_eq!(convert(&s, PrimitiveKind::I64), Ok(Value::I64(v)));
        }
    }

    #[test]
    fn test_non_primitive_shape() {
        assert_eq!(convert(&Value::List(None), PrimitiveKind::I64), Err(LeafError::Shape));
    }
}
