use algokit_core::Result;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{check_state_buffer, not_supported, Engine, EnginePtr};

const SEED_BYTES: usize = 32;
const STATE_BYTES: usize = SEED_BYTES + 8 + 16;

/// ChaCha with 8 rounds
///
/// Skip-ahead moves the word position directly. Leapfrog is not supported.
#[derive(Debug, Clone)]
pub struct ChaChaEngine {
    rng: ChaCha8Rng,
}

impl ChaChaEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Select one of the 2^64 independent ChaCha streams, from its start
    pub fn with_stream(mut self, stream: u64) -> Self {
        self.rng.set_stream(stream);
        self.rng.set_word_pos(0);
        self
    }
}

impl Engine for ChaChaEngine {
    fn name(&self) -> &'static str {
        "chacha8"
    }

    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn skip_ahead(&mut self, n: u64) -> Result<()> {
        let position = self.rng.get_word_pos() + u128::from(n);
        self.rng.set_word_pos(position);
        Ok(())
    }

    fn leapfrog(&mut self, _index: usize, _n_streams: usize) -> Result<()> {
        Err(not_supported(self.name(), "leapfrog"))
    }

    fn state_size(&self) -> usize {
        STATE_BYTES
    }

    fn save_state(&self, dest: &mut [u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), dest.len())?;
        dest[..SEED_BYTES].copy_from_slice(&self.rng.get_seed());
        dest[SEED_BYTES..SEED_BYTES + 8].copy_from_slice(&self.rng.get_stream().to_le_bytes());
        dest[SEED_BYTES + 8..STATE_BYTES].copy_from_slice(&self.rng.get_word_pos().to_le_bytes());
        Ok(())
    }

    fn load_state(&mut self, src: &[u8]) -> Result<()> {
        check_state_buffer(self.name(), self.state_size(), src.len())?;
        let mut seed = [0u8; SEED_BYTES];
        seed.copy_from_slice(&src[..SEED_BYTES]);
        let mut stream = [0u8; 8];
        stream.copy_from_slice(&src[SEED_BYTES..SEED_BYTES + 8]);
        let mut position = [0u8; 16];
        position.copy_from_slice(&src[SEED_BYTES + 8..STATE_BYTES]);

        let mut rng = ChaCha8Rng::from_seed(seed);
        rng.set_stream(u64::from_le_bytes(stream));
        rng.set_word_pos(u128::from_le_bytes(position));
        self.rng = rng;
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
    fn test_matches_underlying_rng() {
        let mut engine = ChaChaEngine::new(9);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            assert_eq!(engine.next_u32(), rng.next_u32());
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = ChaChaEngine::new(9).with_stream(1);
        let mut b = ChaChaEngine::new(9).with_stream(2);
        let xs: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }
}
