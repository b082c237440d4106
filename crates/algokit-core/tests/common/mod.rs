//! Shared utilities for integration tests

#![allow(dead_code)]

pub use approx::assert_relative_eq;

pub const EPSILON: f64 = 1e-10;

/// Row counts that exercise SIMD remainders
pub fn edge_case_lengths() -> Vec<usize> {
    vec![
        0,  // Empty
        1,  // Single element
        2,  // SSE width
        3,  // SSE width + 1
        4,  // AVX2 width
        5,  // AVX2 width + 1
        7,  // AVX2 width - 1 + remainder
        8,  // AVX512 width
        9,  // AVX512 width + 1
        16, // Power of 2
        17, // Power of 2 + 1
        31, // Prime
    ]
}

/// Generate test data with specific patterns
pub fn generate_test_data(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64 * 0.5 - 3.1).collect()
}

/// Assert two vectors are equal within tolerance
pub fn assert_vectors_equal(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (&a, &e) in actual.iter().zip(expected.iter()) {
        assert_relative_eq!(a, e, epsilon = EPSILON);
    }
}
