//! SSE2 backend for older x86_64 processors

use crate::environment::CpuType;
use crate::error::Result;
use crate::primitives::KernelDispatch;

/// SSE2 backend; constructing one proves the CPU supports SSE2
#[derive(Clone, Copy, Debug)]
pub struct SseBackend {
    _detected: (),
}

impl SseBackend {
    pub fn try_new() -> Result<Self> {
        CpuType::Sse2.ensure_supported()?;
        Ok(Self { _detected: () })
    }

    pub fn is_available() -> bool {
        CpuType::Sse2.is_supported()
    }
}

impl_simd_primitives!(SseBackend, "sse2", CpuType::Sse2, 2);

impl KernelDispatch<SseBackend> for f64 {
    #[cfg(all(target_arch = "x86_64", feature = "sse"))]
    unsafe fn sum(data: &[f64]) -> f64 {
        ops::sum(data)
    }

    #[cfg(all(target_arch = "x86_64", feature = "sse"))]
    unsafe fn accumulate_row(row: &[f64], sums: &mut [f64], sum_squares: &mut [f64]) {
        ops::accumulate_row(row, sums, sum_squares)
    }

    #[cfg(all(target_arch = "x86_64", feature = "sse"))]
    unsafe fn accumulate_centered(row: &[f64], means: &[f64], acc: &mut [f64]) {
        ops::accumulate_centered(row, means, acc)
    }

    #[cfg(all(target_arch = "x86_64", feature = "sse"))]
    unsafe fn update_min_max(row: &[f64], min: &mut [f64], max: &mut [f64]) {
        ops::update_min_max(row, min, max)
    }
}

// TODO: f32 SSE path (4 lanes, widened through _mm_cvtps_pd)
impl KernelDispatch<SseBackend> for f32 {}

#[cfg(all(target_arch = "x86_64", feature = "sse"))]
mod ops {
    use std::arch::x86_64::*;

    #[target_feature(enable = "sse2")]
    pub unsafe fn sum(data: &[f64]) -> f64 {
        let chunks = data.len() / 2;
        let mut acc = _mm_setzero_pd();
        for i in 0..chunks {
            acc = _mm_add_pd(acc, _mm_loadu_pd(data.as_ptr().add(i * 2)));
        }
        let lanes = std::mem::transmute::<__m128d, [f64; 2]>(acc);
        let mut total = lanes[0] + lanes[1];
        for &x in &data[chunks * 2..] {
            total += x;
        }
        total
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn accumulate_row(row: &[f64], sums: &mut [f64], sum_squares: &mut [f64]) {
        let n = row.len().min(sums.len()).min(sum_squares.len());
        let chunks = n / 2;
        for i in 0..chunks {
            let offset = i * 2;
            let x = _mm_loadu_pd(row.as_ptr().add(offset));
            let s = _mm_loadu_pd(sums.as_ptr().add(offset));
            let q = _mm_loadu_pd(sum_squares.as_ptr().add(offset));
            _mm_storeu_pd(sums.as_mut_ptr().add(offset), _mm_add_pd(s, x));
            _mm_storeu_pd(
                sum_squares.as_mut_ptr().add(offset),
                _mm_add_pd(q, _mm_mul_pd(x, x)),
            );
        }
        for j in chunks * 2..n {
            sums[j] += row[j];
            sum_squares[j] += row[j] * row[j];
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn accumulate_centered(row: &[f64], means: &[f64], acc: &mut [f64]) {
        let n = row.len().min(means.len()).min(acc.len());
        let chunks = n / 2;
        for i in 0..chunks {
            let offset = i * 2;
            let d = _mm_sub_pd(
                _mm_loadu_pd(row.as_ptr().add(offset)),
                _mm_loadu_pd(means.as_ptr().add(offset)),
            );
            let a = _mm_loadu_pd(acc.as_ptr().add(offset));
            _mm_storeu_pd(acc.as_mut_ptr().add(offset), _mm_add_pd(a, _mm_mul_pd(d, d)));
        }
        for j in chunks * 2..n {
            let d = row[j] - means[j];
            acc[j] += d * d;
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn update_min_max(row: &[f64], min: &mut [f64], max: &mut [f64]) {
        let n = row.len().min(min.len()).min(max.len());
        let chunks = n / 2;
        for i in 0..chunks {
            let offset = i * 2;
            let x = _mm_loadu_pd(row.as_ptr().add(offset));
            let lo = _mm_loadu_pd(min.as_ptr().add(offset));
            let hi = _mm_loadu_pd(max.as_ptr().add(offset));
            _mm_storeu_pd(min.as_mut_ptr().add(offset), _mm_min_pd(x, lo));
            _mm_storeu_pd(max.as_mut_ptr().add(offset), _mm_max_pd(x, hi));
        }
        for j in chunks * 2..n {
            if row[j] < min[j] {
                min[j] = row[j];
            }
            if row[j] > max[j] {
                max[j] = row[j];
            }
        }
    }
}
