// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Seeded Random Streams
// ─────────────────────────────────────────────────────────────────────
//! One explicitly seeded ChaCha8 stream per consumer.
//!
//! All randomness of a run derives from the configured seed, but each
//! consumer draws from its own ChaCha stream id so that, for example,
//! extended-mode noise never shifts the phase assignment. ChaCha output
//! is platform independent, which keeps runs reproducible across machines.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Phase offsets of the FPS strates.
pub const PHASE_STREAM: u64 = 0;
/// Extended-mode γ/E/O draws.
pub const NOISE_STREAM: u64 = 1;
/// Randomised default parameters (strates, Kuramoto ω).
pub const PARAM_STREAM: u64 = 2;
/// Kuramoto baseline initial phases.
pub const KURAMOTO_STREAM: u64 = 3;
/// Companion model input noise.
pub const COMPANION_STREAM: u64 = 4;

/// Build the generator for `(seed, stream)`.
pub fn seeded_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}
