//! Scalar backend and the reference implementations every backend falls back to

use crate::environment::CpuType;
use crate::numeric::Numeric;
use crate::primitives::ComputePrimitives;

/// Scalar backend, available on every CPU
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarBackend;

impl ScalarBackend {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Numeric> ComputePrimitives<T> for ScalarBackend {
    fn backend_name(&self) -> &'static str {
        "scalar"
    }

    fn cpu_type(&self) -> CpuType {
        CpuType::Scalar
    }
}

#[inline]
pub(crate) fn sum<T: Numeric>(data: &[T]) -> f64 {
    data.iter().map(Numeric::as_f64).sum()
}

#[inline]
pub(crate) fn sum_of_squares<T: Numeric>(data: &[T]) -> f64 {
    data.iter()
        .map(|x| {
            let v = x.as_f64();
            v * v
        })
        .sum()
}

#[inline]
pub(crate) fn accumulate_row<T: Numeric>(row: &[T], sums: &mut [f64], sum_squares: &mut [f64]) {
    debug_assert_eq!(row.len(), sums.len());
    debug_assert_eq!(row.len(), sum_squares.len());
    for ((x, s), q) in row.iter().zip(sums.iter_mut()).zip(sum_squares.iter_mut()) {
        let v = x.as_f64();
        *s += v;
        *q += v * v;
    }
}

#[inline]
pub(crate) fn accumulate_centered<T: Numeric>(row: &[T], means: &[f64], acc: &mut [f64]) {
    debug_assert_eq!(row.len(), means.len());
    debug_assert_eq!(row.len(), acc.len());
    for ((x, m), a) in row.iter().zip(means).zip(acc.iter_mut()) {
        let d = x.as_f64() - m;
        *a += d * d;
    }
}

#[inline]
pub(crate) fn update_min_max<T: Numeric>(row: &[T], min: &mut [T], max: &mut [T]) {
    debug_assert_eq!(row.len(), min.len());
    debug_assert_eq!(row.len(), max.len());
    for ((&x, lo), hi) in row.iter().zip(min.iter_mut()).zip(max.iter_mut()) {
        if x < *lo {
            *lo = x;
        }
        if x > *hi {
            *hi = x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_row_accumulation() {
        let backend = ScalarBackend::new();
        let mut sums = [0.0; 3];
        let mut squares = [0.0; 3];
        backend.accumulate_row(&[1i32, -2, 3], &mut sums, &mut squares);
        backend.accumulate_row(&[2i32, 2, 2], &mut sums, &mut squares);
        assert_eq!(sums, [3.0, 0.0, 5.0]);
        assert_eq!(squares, [5.0, 8.0, 13.0]);
    }

    #[test]
    fn test_scalar_min_max() {
        let backend = ScalarBackend::new();
        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        backend.update_min_max(&[3.0, -1.0], &mut lo, &mut hi);
        backend.update_min_max(&[-4.0, 5.0], &mut lo, &mut hi);
        assert_eq!(lo, [-4.0, -1.0]);
        assert_eq!(hi, [3.0, 5.0]);
    }

    #[test]
    fn test_scalar_sums() {
        let backend = ScalarBackend::new();
        let data = [1.0f32, 2.0, 3.0];
        assert_eq!(ComputePrimitives::<f32>::sum(&backend, &data), 6.0);
        assert_eq!(backend.sum_of_squares(&data), 14.0);
        assert_eq!(ComputePrimitives::<f32>::cpu_type(&backend), CpuType::Scalar);
    }
}
