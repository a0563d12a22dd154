use super::config::SeedConfig;
use crate::core::sequence::Sequence;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

pub type SearchRng = ChaCha8Rng;

/// Stream reserved for generating random start sequences.
pub const START_STREAM: u64 = 0;

/// Owns the seed for one design run and hands out independent random streams.
///
/// Stream 0 generates starts; stream `i + 1` drives search `i`. Concurrent
/// searches never share a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedScope {
    seed: u64,
    effective: u64,
}

impl SeedScope {
    pub fn new(config: &SeedConfig, target: &Sequence) -> Self {
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let drawn = rand::thread_rng().r#gen::<u64>();
                info!(seed = drawn, "No seed configured, drew one");
                drawn
            }
        };
        let effective = if config.bind_to_target {
            mix(seed, target.as_str().as_bytes())
        } else {
            seed
        };
        Self { seed, effective }
    }

    /// The user-facing seed, before mixing with the target.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self, stream: u64) -> SearchRng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.effective);
        rng.set_stream(stream);
        rng
    }

    pub fn start_stream(&self) -> SearchRng {
        self.stream(START_STREAM)
    }

    pub fn search_stream(&self, search: usize) -> SearchRng {
        self.stream(search as u64 + 1)
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn mix(seed: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(splitmix64(seed), |h, &b| splitmix64(h ^ u64::from(b)))
}
