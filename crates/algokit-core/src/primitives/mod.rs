//! CPU-specialised computational primitives
//!
//! This module provides the numeric building blocks kernels are written
//! against, with one backend per CPU variant.
//!
//! # Architecture
//!
//! - Single unified `ComputePrimitives<T>` trait for all operations
//! - Concrete backend types: `ScalarBackend`, `SseBackend`, `Avx2Backend`, `Avx512Backend`
//! - Per-type specialisation through `KernelDispatch<B>`
//! - Backend choice is a type parameter of the kernel, resolved once when a
//!   container binds the kernel for the detected `CpuType`
//!
//! # Usage
//!
//! ```rust
//! use algokit_core::{ComputePrimitives, ScalarBackend};
//!
//! let backend = ScalarBackend::new();
//! let mut sums = vec![0.0; 2];
//! let mut squares = vec![0.0; 2];
//! backend.accumulate_row(&[1.0f64, 2.0], &mut sums, &mut squares);
//! assert_eq!(squares, vec![1.0, 4.0]);
//! ```

pub mod backends;
mod dispatch;
pub mod traits;

pub use backends::{Avx2Backend, Avx512Backend, ScalarBackend, SseBackend};
pub use dispatch::{KernelDispatch, SimdDispatch};
pub use traits::ComputePrimitives;

use crate::environment::CpuType;

/// Create a scalar backend (always available)
pub fn scalar_backend() -> ScalarBackend {
    ScalarBackend::new()
}

/// Get the best available backend name
pub fn best_backend_name() -> &'static str {
    CpuType::detect().name()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_major(n_rows: usize, n_cols: usize) -> Vec<f64> {
        (0..n_rows * n_cols)
            .map(|i| ((i * 37) % 23) as f64 - 11.5)
            .collect()
    }

    fn run<B: ComputePrimitives<f64>>(backend: &B, data: &[f64], n_cols: usize) -> Vec<f64> {
        let mut sums = vec![0.0; n_cols];
        let mut squares = vec![0.0; n_cols];
        let mut lo = vec![f64::INFINITY; n_cols];
        let mut hi = vec![f64::NEG_INFINITY; n_cols];
        for row in data.chunks(n_cols) {
            backend.accumulate_row(row, &mut sums, &mut squares);
            backend.update_min_max(row, &mut lo, &mut hi);
        }
        let means: Vec<f64> = sums.iter().map(|s| s / (data.len() / n_cols) as f64).collect();
        let mut centered = vec![0.0; n_cols];
        for row in data.chunks(n_cols) {
            backend.accumulate_centered(row, &means, &mut centered);
        }
        let mut out = vec![backend.sum(data), backend.sum_of_squares(data)];
        out.extend(sums);
        out.extend(squares);
        out.extend(lo);
        out.extend(hi);
        out.extend(centered);
        out
    }

    #[test]
    fn test_every_available_backend_matches_scalar() {
        for n_cols in [1, 2, 3, 4, 5, 8, 9, 17] {
            let data = row_major(13, n_cols);
            let expected = run(&ScalarBackend::new(), &data, n_cols);

            if let Ok(b) = SseBackend::try_new() {
                for (a, e) in run(&b, &data, n_cols).iter().zip(&expected) {
                    approx::assert_relative_eq!(*a, *e, epsilon = 1e-9);
                }
            }
            if let Ok(b) = Avx2Backend::try_new() {
                for (a, e) in run(&b, &data, n_cols).iter().zip(&expected) {
                    approx::assert_relative_eq!(*a, *e, epsilon = 1e-9);
                }
            }
            if let Ok(b) = Avx512Backend::try_new() {
                for (a, e) in run(&b, &data, n_cols).iter().zip(&expected) {
                    approx::assert_relative_eq!(*a, *e, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_unavailable_backend_reports_cpu() {
        if !Avx512Backend::is_available() {
            let status = Avx512Backend::try_new().unwrap_err();
            assert!(status.contains(crate::ErrorKind::CpuNotSupported));
        }
        assert_eq!(best_backend_name(), CpuType::detect().name());
    }
}
