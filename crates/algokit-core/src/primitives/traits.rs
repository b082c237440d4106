//! Unified generic compute primitives trait

use crate::environment::CpuType;
use crate::numeric::Numeric;

use super::backends::scalar as reference;

/// Low-level numeric operations a kernel is monomorphized over
///
/// One implementation exists per CPU variant (scalar, SSE2, AVX2, AVX-512).
/// Kernels take the backend as a type parameter, so the variant is fixed when
/// the kernel is instantiated and the hot loop carries no dispatch.
///
/// Row operations work on one row of a row-major block and update per-column
/// accumulators, which are always `f64`.
pub trait ComputePrimitives<T: Numeric = f64>: Clone + Send + Sync + 'static {
    /// Get the name of this backend
    fn backend_name(&self) -> &'static str;

    /// CPU variant this backend is compiled for
    fn cpu_type(&self) -> CpuType;

    /// Get the SIMD width (number of f64 lanes processed in parallel)
    fn simd_width(&self) -> usize {
        1
    }

    /// Sum all elements in a slice
    fn sum(&self, data: &[T]) -> f64 {
        reference::sum(data)
    }

    /// Compute sum of squares
    fn sum_of_squares(&self, data: &[T]) -> f64 {
        reference::sum_of_squares(data)
    }

    /// `sums[j] += row[j]`, `sum_squares[j] += row[j]^2`
    fn accumulate_row(&self, row: &[T], sums: &mut [f64], sum_squares: &mut [f64]) {
        reference::accumulate_row(row, sums, sum_squares)
    }

    /// `acc[j] += (row[j] - means[j])^2`
    fn accumulate_centered(&self, row: &[T], means: &[f64], acc: &mut [f64]) {
        reference::accumulate_centered(row, means, acc)
    }

    /// Element-wise running minimum and maximum
    fn update_min_max(&self, row: &[T], min: &mut [T], max: &mut [T]) {
        reference::update_min_max(row, min, max)
    }
}
