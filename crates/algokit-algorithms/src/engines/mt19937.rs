use algokit_core::{Error, ErrorDetail, ErrorKind, Result};

use super::{check_state_buffer, not_supported, Engine, EnginePtr};

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// 32-bit Mersenne Twister
///
/// Skip-ahead discards draws; leapfrog is not supported.
#[derive(Clone)]
pub struct Mt19937 {
    mt: [u32; N],
    index: usize,
}

impl Mt19937 {
    pub const DEFAULT_SEED: u32 = 5489;

    pub fn new(seed: u32) -> Self {
        let mut mt = [0u32; N];
        mt[0] = seed;
        for i in 1..N {
            let prev = mt[i - 1];
            mt[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self { mt, index: N }
    }

    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.mt[i] & UPPER_MASK) | (self.mt[(i + 1) % N] & LOWER_MASK);
            let mut next = self.mt[(i + M) % N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.mt[i] = next;
        }
        self.index = 0;
    }
}

impl Default for Mt19937 {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl std::fmt::Debug for Mt19937 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937").field("index", &self.index).finish_non_exhaustive()
    }
}

impl Engine for Mt19937 {
    fn name(&self) -> &'static str {
        "mt19937"
    }

    fn next_u32(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.mt[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    fn skip_ahead(&mut self, n: u64) -> Result<()> {
        let mut remaining = n;
        while remaining > 0 {
            if self.index >= N {
                self.twist();
            }
            let step = remaining.min((N - self.index) as u64);
            self.index += step as usize;
            remaining -= step;
        }
        Ok(())
    }

    fn leapfrog(&mut self, _index: usize, _n_streams: usize) -> Result<()> {
        Err(not_supported(self.name(), "leapfrog"))
    }

    fn state_size(&self) -> usize {
        (N + 1) * 4
    }

    fn save_state(&self, dest: &mut [u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), dest.len())?;
        let words = self.mt.iter().copied().chain(std::iter::once(self.index as u32));
        for (chunk, word) in dest.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }

    fn load_state(&mut self, src: &[u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), src.len())?;
        let mut words = src
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        let mut mt = [0u32; N];
        for slot in mt.iter_mut() {
            *slot = words.next().unwrap_or_default();
        }
        let index = words.next().unwrap_or_default() as usize;
        if index > N {
            return Err(Error::new(ErrorKind::Serialization)
                .with_detail(ErrorDetail::Method, self.name())
                .with_detail(ErrorDetail::Message, "state index past the end of the block")
                .into());
        }
        self.mt = mt;
        self.index = index;
        Ok(())
    }

    fn clone_engine(&self) -> EnginePtr {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_outputs() {
        let mut engine = Mt19937::default();
        assert_eq!(engine.next_u32(), 3_499_211_612);
        assert_eq!(engine.next_u32(), 581_869_302);

        let mut engine = Mt19937::default();
        engine.skip_ahead(9_999).unwrap();
        assert_eq!(engine.next_u32(), 4_123_659_995);
    }

    #[test]
    fn test_rejected_state_leaves_engine_untouched() {
        let mut engine = Mt19937::new(7);
        engine.next_u32();
        let mut saved = vec![0u8; engine.state_size()];
        engine.save_state(&mut saved).unwrap();

        let mut corrupt = vec![0xabu8; engine.state_size()];
        corrupt[N * 4..].copy_from_slice(&(N as u32 + 1).to_le_bytes());
        let err = engine.load_state(&corrupt).unwrap_err();
        assert!(err.contains(ErrorKind::Serialization));

        let mut reference = Mt19937::new(7);
        reference.load_state(&saved).unwrap();
        assert_eq!(engine.next_u32(), reference.next_u32());
    }

    #[test]
    fn test_leapfrog_not_supported() {
        let mut engine = Mt19937::new(1);
        let err = engine.leapfrog(0, 2).unwrap_err();
        assert!(err.contains(ErrorKind::MethodNotSupported));
    }
}
