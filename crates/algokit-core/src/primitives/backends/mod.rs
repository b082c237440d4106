//! Concrete backend types, one per CPU variant
//!
//! SIMD backends can only be constructed through `try_new`, which fails with
//! `CpuNotSupported` unless the variant is compiled in and detected on the
//! host. Holding a backend value is therefore proof that its instructions are
//! safe to execute.

/// Implement `ComputePrimitives` for a SIMD backend by forwarding to `KernelDispatch`
macro_rules! impl_simd_primitives {
    ($backend:ty, $name:expr, $cpu:expr, $width:expr) => {
        impl<T> $crate::primitives::ComputePrimitives<T> for $backend
        where
            T: $crate::primitives::KernelDispatch<$backend>,
        {
            fn backend_name(&self) -> &'static str {
                $name
            }

            fn cpu_type(&self) -> $crate::environment::CpuType {
                $cpu
            }

            fn simd_width(&self) -> usize {
                $width
            }

            fn sum(&self, data: &[T]) -> f64 {
                // Safety: the backend exists only after CPU detection succeeded
                unsafe { <T as $crate::primitives::KernelDispatch<$backend>>::sum(data) }
            }

            fn sum_of_squares(&self, data: &[T]) -> f64 {
                unsafe { <T as $crate::primitives::KernelDispatch<$backend>>::sum_of_squares(data) }
            }

            fn accumulate_row(&self, row: &[T], sums: &mut [f64], sum_squares: &mut [f64]) {
                unsafe {
                    <T as $crate::primitives::KernelDispatch<$backend>>::accumulate_row(
                        row,
                        sums,
                        sum_squares,
                    )
                }
            }

            fn accumulate_centered(&self, row: &[T], means: &[f64], acc: &mut [f64]) {
                unsafe {
                    <T as $crate::primitives::KernelDispatch<$backend>>::accumulate_centered(
                        row, means, acc,
                    )
                }
            }

            fn update_min_max(&self, row: &[T], min: &mut [T], max: &mut [T]) {
                unsafe {
                    <T as $crate::primitives::KernelDispatch<$backend>>::update_min_max(
                        row, min, max,
                    )
                }
            }
        }
    };
}

pub mod scalar;
mod avx2;
mod avx512;
mod sse;

pub use avx2::Avx2Backend;
pub use avx512::Avx512Backend;
pub use scalar::ScalarBackend;
pub use sse::SseBackend;
