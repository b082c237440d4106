//! Pluggable pseudo-random engines
//!
//! Every engine produces a stream of 32-bit words and can be split into
//! independent streams for parallel workers:
//!
//! - **skip-ahead** advances the stream by `n` draws without producing them
//! - **leapfrog** turns the engine into stream `index` of `n_streams`
//!   interleaved sub-streams
//!
//! An engine that cannot split a stream one of these ways reports
//! `MethodNotSupported` instead of silently handing out correlated streams.
//!
//! Engines also save and load their raw state through a caller buffer of
//! fixed, engine-specific size. [`EngineRng`] adapts any engine to
//! [`rand::RngCore`] so `rand` and `rand_distr` distributions can draw from it.

mod chacha;
mod mcg59;
mod mt19937;

pub use chacha::ChaChaEngine;
pub use mcg59::Mcg59;
pub use mt19937::Mt19937;

use std::fmt;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use rand::RngCore;

/// Owned engine handle
pub type EnginePtr = Box<dyn Engine>;

/// A splittable pseudo-random generator
pub trait Engine: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Next 32-bit word of the stream
    fn next_u32(&mut self) -> u32;

    /// Uniform in `[0, 1)`, one draw
    fn uniform(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform in `[0, n)`, one draw
    fn uniform_index(&mut self, n: usize) -> usize {
        ((u128::from(self.next_u32()) * n as u128) >> 32) as usize
    }

    /// Advance the stream by `n` draws
    fn skip_ahead(&mut self, n: u64) -> Result<()>;

    /// Become sub-stream `index` of `n_streams` interleaved streams
    fn leapfrog(&mut self, index: usize, n_streams: usize) -> Result<()>;

    /// Size in bytes of the buffer `save_state` and `load_state` use
    fn state_size(&self) -> usize;

    fn save_state(&self, dest: &mut [u8]) -> Result<()>;

    fn load_state(&mut self, src: &[u8]) -> Result<()>;

    /// Deep copy, including the stream position
    fn clone_engine(&self) -> EnginePtr;
}

impl Clone for EnginePtr {
    fn clone(&self) -> Self {
        self.clone_engine()
    }
}

pub(crate) fn check_state_buffer(engine: &str, expected: usize, actual: usize) -> Result<()> {
    if actual < expected {
        return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
            .with_detail(ErrorDetail::Method, engine)
            .with_detail(ErrorDetail::ExpectedValue, expected)
            .with_detail(ErrorDetail::ActualValue, actual)
            .into());
    }
    Ok(())
}

pub(crate) fn not_supported(engine: &str, operation: &str) -> algokit_core::Status {
    Error::new(ErrorKind::MethodNotSupported)
        .with_detail(ErrorDetail::Method, operation)
        .with_detail(ErrorDetail::Message, format!("{engine} cannot split its stream this way"))
        .into()
}

pub(crate) fn check_leapfrog(index: usize, n_streams: usize) -> Result<()> {
    if n_streams == 0 || index >= n_streams {
        return Err(Error::incorrect_parameter("index")
            .with_detail(ErrorDetail::ExpectedValue, n_streams)
            .with_detail(ErrorDetail::ActualValue, index)
            .into());
    }
    Ok(())
}

/// [`rand::RngCore`] over an engine
///
/// Each `next_u32` is one engine draw; `next_u64` takes two, low word first.
pub struct EngineRng<'a> {
    engine: &'a mut dyn Engine,
}

impl<'a> EngineRng<'a> {
    pub fn new(engine: &'a mut dyn Engine) -> Self {
        Self { engine }
    }
}

impl RngCore for EngineRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.engine.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.engine.next_u32());
        let high = u64::from(self.engine.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.engine.next_u32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
