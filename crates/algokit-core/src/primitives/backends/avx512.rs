//! AVX-512 backend
//!
//! The loops are the scalar reference compiled with `avx512f` enabled, which
//! lets the compiler vectorize them 8 lanes wide.

use crate::environment::CpuType;
use crate::error::Result;
use crate::primitives::KernelDispatch;

/// AVX-512 backend; constructing one proves the CPU supports AVX-512F
#[derive(Clone, Copy, Debug)]
pub struct Avx512Backend {
    _detected: (),
}

impl Avx512Backend {
    pub fn try_new() -> Result<Self> {
        CpuType::Avx512.ensure_supported()?;
        Ok(Self { _detected: () })
    }

    pub fn is_available() -> bool {
        CpuType::Avx512.is_supported()
    }
}

impl_simd_primitives!(Avx512Backend, "avx512", CpuType::Avx512, 8);

macro_rules! impl_avx512_dispatch {
    ($type:ty) => {
        impl KernelDispatch<Avx512Backend> for $type {
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            unsafe fn sum(data: &[$type]) -> f64 {
                ops::sum(data)
            }

            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            unsafe fn sum_of_squares(data: &[$type]) -> f64 {
                ops::sum_of_squares(data)
            }

            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            unsafe fn accumulate_row(row: &[$type], sums: &mut [f64], sum_squares: &mut [f64]) {
                ops::accumulate_row(row, sums, sum_squares)
            }

            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            unsafe fn accumulate_centered(row: &[$type], means: &[f64], acc: &mut [f64]) {
                ops::accumulate_centered(row, means, acc)
            }

            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            unsafe fn update_min_max(row: &[$type], min: &mut [$type], max: &mut [$type]) {
                ops::update_min_max(row, min, max)
            }
        }
    };
}

impl_avx512_dispatch!(f64);
impl_avx512_dispatch!(f32);

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
mod ops {
    use crate::numeric::Numeric;
    use crate::primitives::backends::scalar as reference;

    #[target_feature(enable = "avx512f")]
    pub unsafe fn sum<T: Numeric>(data: &[T]) -> f64 {
        reference::sum(data)
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn sum_of_squares<T: Numeric>(data: &[T]) -> f64 {
        reference::sum_of_squares(data)
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn accumulate_row<T: Numeric>(row: &[T], sums: &mut [f64], sum_squares: &mut [f64]) {
        reference::accumulate_row(row, sums, sum_squares)
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn accumulate_centered<T: Numeric>(row: &[T], means: &[f64], acc: &mut [f64]) {
        reference::accumulate_centered(row, means, acc)
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn update_min_max<T: Numeric>(row: &[T], min: &mut [T], max: &mut [T]) {
        reference::update_min_max(row, min, max)
    }
}
