//! Compile-time type dispatch for the SIMD backends
//!
//! `KernelDispatch<B>` is implemented per element type for every SIMD backend
//! `B`. Bodies default to the scalar reference; `f64` and `f32` override them
//! with intrinsics when the matching feature is compiled in.

use crate::numeric::Numeric;

use super::backends::scalar as reference;
use super::backends::{Avx2Backend, Avx512Backend, SseBackend};

/// Per-type implementations of the primitives for backend `B`
///
/// # Safety
/// Every method requires that the CPU supports the instruction set of `B`.
/// Backends guarantee this by only being constructible after detection.
pub trait KernelDispatch<B>: Numeric {
    unsafe fn sum(data: &[Self]) -> f64 {
        reference::sum(data)
    }

    unsafe fn sum_of_squares(data: &[Self]) -> f64 {
        reference::sum_of_squares(data)
    }

    unsafe fn accumulate_row(row: &[Self], sums: &mut [f64], sum_squares: &mut [f64]) {
        reference::accumulate_row(row, sums, sum_squares)
    }

    unsafe fn accumulate_centered(row: &[Self], means: &[f64], acc: &mut [f64]) {
        reference::accumulate_centered(row, means, acc)
    }

    unsafe fn update_min_max(row: &[Self], min: &mut [Self], max: &mut [Self]) {
        reference::update_min_max(row, min, max)
    }
}

/// Element types with an implementation for every SIMD backend
pub trait SimdDispatch:
    KernelDispatch<SseBackend> + KernelDispatch<Avx2Backend> + KernelDispatch<Avx512Backend>
{
}

impl<T> SimdDispatch for T where
    T: KernelDispatch<SseBackend> + KernelDispatch<Avx2Backend> + KernelDispatch<Avx512Backend>
{
}

// Integers have no vector path
impl KernelDispatch<SseBackend> for i32 {}
impl KernelDispatch<Avx2Backend> for i32 {}
impl KernelDispatch<Avx512Backend> for i32 {}
