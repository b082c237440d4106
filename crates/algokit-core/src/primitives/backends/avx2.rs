//! AVX2 backend for x86_64 processors

use crate::environment::CpuType;
use crate::error::Result;
use crate::primitives::KernelDispatch;

/// AVX2 backend; constructing one proves the CPU supports AVX2
#[derive(Clone, Copy, Debug)]
pub struct Avx2Backend {
    _detected: (),
}

impl Avx2Backend {
    /// Create a new AVX2 backend, failing with `CpuNotSupported` when unavailable
    pub fn try_new() -> Result<Self> {
        CpuType::Avx2.ensure_supported()?;
        Ok(Self { _detected: () })
    }

    /// Check if AVX2 is available on this CPU
    pub fn is_available() -> bool {
        CpuType::Avx2.is_supported()
    }
}

impl_simd_primitives!(Avx2Backend, "avx2", CpuType::Avx2, 4);

impl KernelDispatch<Avx2Backend> for f64 {
    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn sum(data: &[f64]) -> f64 {
        f64_ops::sum(data)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn sum_of_squares(data: &[f64]) -> f64 {
        f64_ops::sum_of_squares(data)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn accumulate_row(row: &[f64], sums: &mut [f64], sum_squares: &mut [f64]) {
        f64_ops::accumulate_row(row, sums, sum_squares)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn accumulate_centered(row: &[f64], means: &[f64], acc: &mut [f64]) {
        f64_ops::accumulate_centered(row, means, acc)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn update_min_max(row: &[f64], min: &mut [f64], max: &mut [f64]) {
        f64_ops::update_min_max(row, min, max)
    }
}

impl KernelDispatch<Avx2Backend> for f32 {
    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn sum(data: &[f32]) -> f64 {
        f32_ops::sum(data)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn accumulate_row(row: &[f32], sums: &mut [f64], sum_squares: &mut [f64]) {
        f32_ops::accumulate_row(row, sums, sum_squares)
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    unsafe fn update_min_max(row: &[f32], min: &mut [f32], max: &mut [f32]) {
        f32_ops::update_min_max(row, min, max)
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod f64_ops {
    use std::arch::x86_64::*;

    #[inline]
    unsafe fn horizontal_sum(v: __m256d) -> f64 {
        let lanes = std::mem::transmute::<__m256d, [f64; 4]>(v);
        lanes[0] + lanes[1] + lanes[2] + lanes[3]
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn sum(data: &[f64]) -> f64 {
        let chunks = data.len() / 4;
        let mut acc = _mm256_setzero_pd();

        // Main loop - process 4 elements at a time
        for i in 0..chunks {
            let v = _mm256_loadu_pd(data.as_ptr().add(i * 4));
            acc = _mm256_add_pd(acc, v);
        }

        let mut total = horizontal_sum(acc);
        for &x in &data[chunks * 4..] {
            total += x;
        }
        total
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn sum_of_squares(data: &[f64]) -> f64 {
        let chunks = data.len() / 4;
        let mut acc = _mm256_setzero_pd();

        for i in 0..chunks {
            let v = _mm256_loadu_pd(data.as_ptr().add(i * 4));
            acc = _mm256_add_pd(acc, _mm256_mul_pd(v, v));
        }

        let mut total = horizontal_sum(acc);
        for &x in &data[chunks * 4..] {
            total += x * x;
        }
        total
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn accumulate_row(row: &[f64], sums: &mut [f64], sum_squares: &mut [f64]) {
        let n = row.len().min(sums.len()).min(sum_squares.len());
        let chunks = n / 4;

        for i in 0..chunks {
            let offset = i * 4;
            let x = _mm256_loadu_pd(row.as_ptr().add(offset));
            let s = _mm256_loadu_pd(sums.as_ptr().add(offset));
            let q = _mm256_loadu_pd(sum_squares.as_ptr().add(offset));
            _mm256_storeu_pd(sums.as_mut_ptr().add(offset), _mm256_add_pd(s, x));
            _mm256_storeu_pd(
                sum_squares.as_mut_ptr().add(offset),
                _mm256_add_pd(q, _mm256_mul_pd(x, x)),
            );
        }

        for j in chunks * 4..n {
            let v = row[j];
            sums[j] += v;
            sum_squares[j] += v * v;
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn accumulate_centered(row: &[f64], means: &[f64], acc: &mut [f64]) {
        let n = row.len().min(means.len()).min(acc.len());
        let chunks = n / 4;

        for i in 0..chunks {
            let offset = i * 4;
            let x = _mm256_loadu_pd(row.as_ptr().add(offset));
            let m = _mm256_loadu_pd(means.as_ptr().add(offset));
            let a = _mm256_loadu_pd(acc.as_ptr().add(offset));
            let d = _mm256_sub_pd(x, m);
            _mm256_storeu_pd(acc.as_mut_ptr().add(offset), _mm256_add_pd(a, _mm256_mul_pd(d, d)));
        }

        for j in chunks * 4..n {
            let d = row[j] - means[j];
            acc[j] += d * d;
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn update_min_max(row: &[f64], min: &mut [f64], max: &mut [f64]) {
        let n = row.len().min(min.len()).min(max.len());
        let chunks = n / 4;

        for i in 0..chunks {
            let offset = i * 4;
            let x = _mm256_loadu_pd(row.as_ptr().add(offset));
            let lo = _mm256_loadu_pd(min.as_ptr().add(offset));
            let hi = _mm256_loadu_pd(max.as_ptr().add(offset));
            // min_pd(x, lo) keeps lo unless x < lo, matching the scalar comparison
            _mm256_storeu_pd(min.as_mut_ptr().add(offset), _mm256_min_pd(x, lo));
            _mm256_storeu_pd(max.as_mut_ptr().add(offset), _mm256_max_pd(x, hi));
        }

        for j in chunks * 4..n {
            if row[j] < min[j] {
                min[j] = row[j];
            }
            if row[j] > max[j] {
                max[j] = row[j];
            }
        }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod f32_ops {
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2")]
    pub unsafe fn sum(data: &[f32]) -> f64 {
        let chunks = data.len() / 4;
        let mut acc = _mm256_setzero_pd();

        // Widen 4 floats to doubles per step so the aggregate stays in f64
        for i in 0..chunks {
            let v = _mm256_cvtps_pd(_mm_loadu_ps(data.as_ptr().add(i * 4)));
            acc = _mm256_add_pd(acc, v);
        }

        let lanes = std::mem::transmute::<__m256d, [f64; 4]>(acc);
        let mut total = lanes[0] + lanes[1] + lanes[2] + lanes[3];
        for &x in &data[chunks * 4..] {
            total += x as f64;
        }
        total
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn accumulate_row(row: &[f32], sums: &mut [f64], sum_squares: &mut [f64]) {
        let n = row.len().min(sums.len()).min(sum_squares.len());
        let chunks = n / 4;

        for i in 0..chunks {
            let offset = i * 4;
            let x = _mm256_cvtps_pd(_mm_loadu_ps(row.as_ptr().add(offset)));
            let s = _mm256_loadu_pd(sums.as_ptr().add(offset));
            let q = _mm256_loadu_pd(sum_squares.as_ptr().add(offset));
            _mm256_storeu_pd(sums.as_mut_ptr().add(offset), _mm256_add_pd(s, x));
            _mm256_storeu_pd(
                sum_squares.as_mut_ptr().add(offset),
                _mm256_add_pd(q, _mm256_mul_pd(x, x)),
            );
        }

        for j in chunks * 4..n {
            let v = row[j] as f64;
            sums[j] += v;
            sum_squares[j] += v * v;
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn update_min_max(row: &[f32], min: &mut [f32], max: &mut [f32]) {
        let n = row.len().min(min.len()).min(max.len());
        let chunks = n / 8;

        for i in 0..chunks {
            let offset = i * 8;
            let x = _mm256_loadu_ps(row.as_ptr().add(offset));
            let lo = _mm256_loadu_ps(min.as_ptr().add(offset));
            let hi = _mm256_loadu_ps(max.as_ptr().add(offset));
            _mm256_storeu_ps(min.as_mut_ptr().add(offset), _mm256_min_ps(x, lo));
            _mm256_storeu_ps(max.as_mut_ptr().add(offset), _mm256_max_ps(x, hi));
        }

        for j in chunks * 8..n {
            if row[j] < min[j] {
                min[j] = row[j];
            }
            if row[j] > max[j] {
                max[j] = row[j];
            }
        }
    }
}
