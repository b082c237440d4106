use algokit_core::Result;

use super::{check_leapfrog, check_state_buffer, Engine, EnginePtr};

/// 13^13
const MULTIPLIER: u64 = 302_875_106_592_253;
const MASK: u64 = (1 << 59) - 1;

/// Multiplicative congruential generator modulo 2^59
///
/// `x[n+1] = 13^13 * x[n] mod 2^59`; each draw returns the top 32 of the 59
/// state bits. Skip-ahead and leapfrog both cost `O(log n)` multiplications.
#[derive(Debug, Clone)]
pub struct Mcg59 {
    /// Next state to be returned
    state: u64,
    /// Stride multiplier, `13^13` raised to the leapfrog stream count
    multiplier: u64,
}

fn mul_mod(a: u64, b: u64) -> u64 {
    a.wrapping_mul(b) & MASK
}

fn pow_mod(mut base: u64, mut exponent: u64) -> u64 {
    let mut acc = 1u64;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = mul_mod(acc, base);
        }
        base = mul_mod(base, base);
        exponent >>= 1;
    }
    acc
}

impl Mcg59 {
    /// A zero seed is replaced by one
    pub fn new(seed: u64) -> Self {
        let seed = match seed & MASK {
            0 => 1,
            s => s,
        };
        Self {
            state: mul_mod(MULTIPLIER, seed),
            multiplier: MULTIPLIER,
        }
    }
}

impl Engine for Mcg59 {
    fn name(&self) -> &'static str {
        "mcg59"
    }

    fn next_u32(&mut self) -> u32 {
        let out = self.state;
        self.state = mul_mod(self.multiplier, self.state);
        (out >> 27) as u32
    }

    fn skip_ahead(&mut self, n: u64) -> Result<()> {
        self.state = mul_mod(pow_mod(self.multiplier, n), self.state);
        Ok(())
    }

    fn leapfrog(&mut self, index: usize, n_streams: usize) -> Result<()> {
        check_leapfrog(index, n_streams)?;
        self.state = mul_mod(pow_mod(self.multiplier, index as u64), self.state);
        self.multiplier = pow_mod(self.multiplier, n_streams as u64);
        Ok(())
    }

    fn state_size(&self) -> usize {
        16
    }

    fn save_state(&self, dest: &mut [u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), dest.len())?;
        dest[..8].copy_from_slice(&self.state.to_le_bytes());
        dest[8..16].copy_from_slice(&self.multiplier.to_le_bytes());
        Ok(())
    }

    fn load_state(&mut self, src: &[u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), src.len())?;
        let word = |range: std::ops::Range<usize>| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&src[range]);
            u64::from_le_bytes(bytes) & MASK
        };
        self.state = word(0..8);
        self.multiplier = word(8..16);
        Ok(())
    }

    fn clone_engine(&self) -> EnginePtr {
        Box::new(self.clone())
    }
}
