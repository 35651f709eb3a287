//! Harness value model.
//!
//! Floats are carried as raw bit patterns so NaN payloads and the sign of
//! zero survive the trip through the engine and back into a comparison.

use std::fmt;

/// A scalar value crossing the harness/engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    I32(i32),
    I64(i64),
    /// Raw f32 bits.
    F32(u32),
    /// Raw f64 bits.
    F64(u64),
}

impl Value {
    pub fn f32(v: f32) -> Self {
        Value::F32(v.to_bits())
    }

    pub fn f64(v: f64) -> Self {
        Value::F64(v.to_bits())
    }

    /// True iff this is a float whose bits decode to NaN.
    pub fn is_nan(&self) -> bool {
        match *self {
            Value::F32(bits) => f32::from_bits(bits).is_nan(),
            Value::F64(bits) => f64::from_bits(bits).is_nan(),
            _ => false,
        }
    }

    /// Strict same-value comparison: any NaN equals any NaN, +0.0 and
    /// -0.0 are distinct, integers compare exactly. Values of different
    /// types are never the same.
    pub fn same_value(&self, other: &Value) -> bool {
        match (*self, *other) {
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => {
                if f32::from_bits(a).is_nan() && f32::from_bits(b).is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::F64(a), Value::F64(b)) => {
                if f64::from_bits(a).is_nan() && f64::from_bits(b).is_nan() {
                    true
                } else {
                    a == b
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(bits) => {
                let v = f32::from_bits(bits);
                if v.is_nan() {
                    write!(f, "f32:nan(0x{bits:08x})")
                } else {
                    write!(f, "f32:{v} (0x{bits:08x})")
                }
            }
            Value::F64(bits) => {
                let v = f64::from_bits(bits);
                if v.is_nan() {
                    write!(f, "f64:nan(0x{bits:016x})")
                } else {
                    write!(f, "f64:{v} (0x{bits:016x})")
                }
            }
        }
    }
}

/// Render a result tuple for diagnostics.
pub fn format_values(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("[{}]", parts.join(", "))
}
