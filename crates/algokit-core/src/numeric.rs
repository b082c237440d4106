//! Numeric trait hierarchy for table values and kernels
//!
//! `Numeric` is the type foundation for compute primitives, which always
//! aggregate in `f64`. `TableValue` narrows it to the element types a numeric
//! table can store natively and convert between during block materialization.

use bytemuck::Pod;
use num_traits::{AsPrimitive, Float, Num};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Base trait for numeric types that can be used in computations
pub trait Numeric: Pod + Num + Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Check if value is finite (always true for integers)
    fn is_finite_value(&self) -> bool;

    /// Convert from f64 (for creating constants)
    fn from_f64(val: f64) -> Self;

    /// Convert to f64 (for operations that need f64)
    fn as_f64(&self) -> f64;
}

impl Numeric for f64 {
    fn is_finite_value(&self) -> bool {
        f64::is_finite(*self)
    }

    fn from_f64(val: f64) -> Self {
        val
    }

    fn as_f64(&self) -> f64 {
        *self
    }
}

impl Numeric for f32 {
    fn is_finite_value(&self) -> bool {
        f32::is_finite(*self)
    }

    fn from_f64(val: f64) -> Self {
        val as f32
    }

    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

impl Numeric for i32 {
    fn is_finite_value(&self) -> bool {
        true
    }

    fn from_f64(val: f64) -> Self {
        val as i32
    }

    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

/// Native element type of a table column or block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    F64,
    F32,
    I32,
}

impl DataType {
    /// Storage width in bytes
    pub fn size_of(self) -> usize {
        match self {
            DataType::F64 => 8,
            DataType::F32 | DataType::I32 => 4,
        }
    }

    pub fn is_floating_point(self) -> bool {
        !matches!(self, DataType::I32)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::F64 => "f64",
            DataType::F32 => "f32",
            DataType::I32 => "i32",
        };
        f.write_str(name)
    }
}

/// Element types a numeric table stores natively
///
/// Every `TableValue` converts to every other one with `as` semantics, which is
/// what block materialization uses when the requested type differs from the
/// native one.
pub trait TableValue:
    Numeric
    + Default
    + Serialize
    + DeserializeOwned
    + AsPrimitive<f64>
    + AsPrimitive<f32>
    + AsPrimitive<i32>
    + crate::primitives::SimdDispatch
{
    const DATA_TYPE: DataType;

    /// Cast from any other table value
    fn cast_from<S: TableValue>(value: S) -> Self;
}

impl TableValue for f64 {
    const DATA_TYPE: DataType = DataType::F64;

    #[inline]
    fn cast_from<S: TableValue>(value: S) -> Self {
        <S as AsPrimitive<f64>>::as_(value)
    }
}

impl TableValue for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    #[inline]
    fn cast_from<S: TableValue>(value: S) -> Self {
        <S as AsPrimitive<f32>>::as_(value)
    }
}

impl TableValue for i32 {
    const DATA_TYPE: DataType = DataType::I32;

    #[inline]
    fn cast_from<S: TableValue>(value: S) -> Self {
        <S as AsPrimitive<i32>>::as_(value)
    }
}

/// Floating point types algorithms compute in
pub trait FloatValue: TableValue + Float {}

impl FloatValue for f64 {}
impl FloatValue for f32 {}

/// Convert a slice element-wise into another table value type
pub fn convert_slice<S: TableValue, D: TableValue>(src: &[S], dst: &mut [D]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = D::cast_from(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_between_table_values() {
        assert_eq!(f64::cast_from(3i32), 3.0);
        assert_eq!(i32::cast_from(2.9f64), 2);
        assert_eq!(i32::cast_from(-2.9f32), -2);
        assert_eq!(f32::cast_from(0.5f64), 0.5f32);
        assert_eq!(i32::cast_from(f64::NAN), 0);
    }

    #[test]
    fn test_convert_slice() {
        let src = [1.5f64, -2.0, 7.25];
        let mut dst = [0f32; 3];
        convert_slice(&src, &mut dst);
        assert_eq!(dst, [1.5f32, -2.0, 7.25]);
    }

    #[test]
    fn test_data_type_metadata() {
        assert_eq!(<f64 as TableValue>::DATA_TYPE, DataType::F64);
        assert_eq!(DataType::F32.size_of(), 4);
        assert!(!DataType::I32.is_floating_point());
        assert_eq!(DataType::I32.to_string(), "i32");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(<i32 as Numeric>::from_f64(4.7), 4);
        assert_eq!(3.5f32.as_f64(), 3.5);
        assert!(!f64::INFINITY.is_finite_value());
        assert!(i32::MAX.is_finite_value());
    }
}
