//! Fragment-length / start-position sampling and point-mutation injection.
//!
//! Fragment lengths come from a normal distribution (Box–Muller transform)
//! with rejection so that every fragment both contains a full read at each
//! end and fits inside the transcript. Mutations are injected with a
//! geometric-skip walk, equivalent to an independent Bernoulli trial per
//! base but O(expected mutation count).

use crate::errors::{ReadsimError, Result};
use rand::Rng;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// One sampled fragment: its length and 0-based start on the transcript.
///
/// Invariants: `read_len < length < transcript_len` and
/// `start + length <= transcript_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentSample {
    /// Fragment length in bases
    pub length: usize,
    /// 0-based start position on the transcript
    pub start: usize,
}

/// Normal fragment-length model with rejection against transcript bounds.
#[derive(Debug, Clone)]
pub struct FragmentSampler {
    mean: f64,
    stddev: f64,
}

impl FragmentSampler {
    /// Creates a sampler with the given mean and standard deviation.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive or non-finite mean, or a negative
    /// or non-finite standard deviation.
    pub fn new(mean: f64, stddev: f64) -> Result<Self> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(ReadsimError::InvalidParameter {
                parameter: "fragment-length".to_string(),
                reason: format!("mean must be positive and finite, got {mean}"),
            });
        }
        if !stddev.is_finite() || stddev < 0.0 {
            return Err(ReadsimError::InvalidParameter {
                parameter: "fragment-stddev".to_string(),
                reason: format!("standard deviation must be non-negative and finite, got {stddev}"),
            });
        }
        Ok(Self { mean, stddev })
    }

    /// Mean fragment length.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Draws `n` coupled (length, start) pairs for one transcript.
    ///
    /// Each draw takes a Box–Muller normal variate, rounds it, and redraws
    /// while the length would not strictly contain a read
    /// (`length <= read_len`) or would not fit the transcript
    /// (`length >= transcript_len`). The start is then uniform over
    /// `[0, transcript_len - length)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadsimError::SamplingInvariant`] when rejection could
    /// never terminate: `read_len >= mean`, a transcript too short to hold
    /// any valid fragment, or a zero-stddev mean outside the valid window.
    /// Checked before any draw so a bad configuration fails instead of
    /// spinning forever.
    pub fn sample(
        &self,
        n: u64,
        transcript_id: &str,
        transcript_len: usize,
        read_len: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<FragmentSample>> {
        let invariant = |reason: String| ReadsimError::SamplingInvariant {
            transcript_id: transcript_id.to_string(),
            reason,
        };
        if read_len as f64 >= self.mean {
            return Err(invariant(format!(
                "read length {read_len} >= mean fragment length {}",
                self.mean
            )));
        }
        if transcript_len <= read_len + 1 {
            return Err(invariant(format!(
                "transcript length {transcript_len} too short for read length {read_len}"
            )));
        }
        if self.stddev == 0.0 {
            let fixed = self.mean.round() as usize;
            if fixed <= read_len || fixed >= transcript_len {
                return Err(invariant(format!(
                    "fixed fragment length {fixed} outside ({read_len}, {transcript_len})"
                )));
            }
        }

        let mut samples = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let length = loop {
                let value = self.mean + self.stddev * standard_normal(rng);
                let length = value.round();
                if length > read_len as f64 && length < transcript_len as f64 {
                    break length as usize;
                }
            };
            let start = rng.random_range(0..transcript_len - length);
            samples.push(FragmentSample { length, start });
        }
        Ok(samples)
    }
}

/// Standard normal variate via the Box–Muller transform.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1 = loop {
        let u: f64 = rng.random();
        if u > 0.0 {
            break u;
        }
    };
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Mutates bases in place under a per-base rate given in percent.
///
/// Returns the 0-based positions mutated, ascending. A rate `<= 0` is a
/// no-op; a rate `>= 100` mutates every position. Otherwise the gap to the
/// next mutated position is drawn geometrically
/// (`skip = floor(ln u / ln(1 - p))`), which matches independent per-base
/// Bernoulli trials without touching unmutated positions. A mutated base is
/// always replaced by a different base from {A, C, G, T}.
pub fn mutate_in_place(seq: &mut [u8], rate_percent: f64, rng: &mut impl Rng) -> Vec<usize> {
    if seq.is_empty() || rate_percent <= 0.0 {
        return Vec::new();
    }

    if rate_percent >= 100.0 {
        for base in seq.iter_mut() {
            *base = random_different_base(*base, rng);
        }
        return (0..seq.len()).collect();
    }

    let log1m_p = (1.0 - rate_percent / 100.0).ln();
    let mut positions = Vec::new();
    let mut i = 0usize;
    while i < seq.len() {
        let u: f64 = rng.random();
        // u == 0 gives an infinite skip; the saturating cast ends the walk
        let skip = (u.ln() / log1m_p) as usize;
        i = i.saturating_add(skip);
        if i >= seq.len() {
            break;
        }
        seq[i] = random_different_base(seq[i], rng);
        positions.push(i);
        i += 1;
    }
    positions
}

/// Uniform draw from {A, C, G, T}, redrawn while equal to the uppercased
/// original so the mutation always changes the base.
fn random_different_base(original: u8, rng: &mut impl Rng) -> u8 {
    let original = original.to_ascii_uppercase();
    loop {
        let base = BASES[rng.random_range(0..BASES.len())];
        if base != original {
            return base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_sample_bounds() {
        let sampler = FragmentSampler::new(200.0, 60.0).unwrap();
        let mut rng = rng(42);
        let transcript_len = 500;
        let read_len = 75;

        let samples = sampler.sample(5_000, "T1", transcript_len, read_len, &mut rng).unwrap();
        assert_eq!(samples.len(), 5_000);
        for sample in &samples {
            assert!(sample.length > read_len, "length {} <= read length", sample.length);
            assert!(sample.length < transcript_len, "length {} >= transcript", sample.length);
            assert!(sample.start + sample.length <= transcript_len);
        }
    }

    #[test]
    fn test_sample_mean_convergence() {
        let sampler = FragmentSampler::new(200.0, 20.0).unwrap();
        let mut rng = rng(7);

        let samples = sampler.sample(50_000, "T1", 10_000, 50, &mut rng).unwrap();
        let mean: f64 =
            samples.iter().map(|s| s.length as f64).sum::<f64>() / samples.len() as f64;
        // Barely any rejection with these bounds, so the sample mean should
        // sit close to the model mean.
        assert!((mean - 200.0).abs() < 1.0, "sample mean {mean} too far from 200");
    }

    #[test]
    fn test_sample_reproducible_with_seed() {
        let sampler = FragmentSampler::new(150.0, 30.0).unwrap();
        let a = sampler.sample(100, "T1", 400, 50, &mut rng(9)).unwrap();
        let b = sampler.sample(100, "T1", 400, 50, &mut rng(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_read_length_ge_mean_is_invariant_error() {
        let sampler = FragmentSampler::new(100.0, 10.0).unwrap();
        let err = sampler.sample(1, "T1", 1_000, 100, &mut rng(1)).unwrap_err();
        assert!(matches!(err, ReadsimError::SamplingInvariant { .. }));
        assert!(format!("{err}").contains("T1"));
    }

    #[test]
    fn test_short_transcript_is_invariant_error() {
        let sampler = FragmentSampler::new(100.0, 10.0).unwrap();
        for transcript_len in [0, 10, 50, 51] {
            let err = sampler.sample(1, "T1", transcript_len, 50, &mut rng(1)).unwrap_err();
            assert!(matches!(err, ReadsimError::SamplingInvariant { .. }));
        }
    }

    #[test]
    fn test_zero_stddev_outside_window_is_invariant_error() {
        // Fixed fragment length of 600 cannot fit a 500-base transcript
        let sampler = FragmentSampler::new(600.0, 0.0).unwrap();
        let err = sampler.sample(1, "T1", 500, 50, &mut rng(1)).unwrap_err();
        assert!(matches!(err, ReadsimError::SamplingInvariant { .. }));

        // In range, zero stddev produces the fixed length every time
        let sampler = FragmentSampler::new(100.0, 0.0).unwrap();
        let samples = sampler.sample(10, "T1", 500, 50, &mut rng(1)).unwrap();
        assert!(samples.iter().all(|s| s.length == 100));
    }

    #[test]
    fn test_invalid_model_parameters() {
        assert!(FragmentSampler::new(0.0, 10.0).is_err());
        assert!(FragmentSampler::new(-5.0, 10.0).is_err());
        assert!(FragmentSampler::new(f64::NAN, 10.0).is_err());
        assert!(FragmentSampler::new(100.0, -1.0).is_err());
        assert!(FragmentSampler::new(100.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_mutate_rate_zero_is_noop() {
        let mut rng = rng(3);
        let mut seq = b"ACGTACGTACGT".to_vec();
        let original = seq.clone();
        assert!(mutate_in_place(&mut seq, 0.0, &mut rng).is_empty());
        assert!(mutate_in_place(&mut seq, -1.0, &mut rng).is_empty());
        assert_eq!(seq, original);
    }

    #[test]
    fn test_mutate_rate_hundred_mutates_everything() {
        let mut rng = rng(3);
        let mut seq = b"ACGTACGTACGT".to_vec();
        let original = seq.clone();
        let positions = mutate_in_place(&mut seq, 100.0, &mut rng);
        assert_eq!(positions, (0..seq.len()).collect::<Vec<_>>());
        for (i, (&new, &old)) in seq.iter().zip(original.iter()).enumerate() {
            assert_ne!(new, old.to_ascii_uppercase(), "position {i} unchanged");
            assert!(BASES.contains(&new));
        }
    }

    #[test]
    fn test_mutate_positions_sorted_and_changed() {
        let mut rng = rng(11);
        let mut seq = vec![b'A'; 10_000];
        let positions = mutate_in_place(&mut seq, 25.0, &mut rng);

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "positions not ascending");
        for &pos in &positions {
            assert_ne!(seq[pos], b'A');
        }
        // Unmutated positions untouched
        let mutated: std::collections::HashSet<usize> = positions.iter().copied().collect();
        for (i, &base) in seq.iter().enumerate() {
            if !mutated.contains(&i) {
                assert_eq!(base, b'A');
            }
        }
    }

    #[test]
    fn test_mutate_rate_convergence() {
        let mut rng = rng(5);
        let mut total_bases = 0usize;
        let mut total_mutations = 0usize;
        for _ in 0..100 {
            let mut seq = vec![b'G'; 1_000];
            total_mutations += mutate_in_place(&mut seq, 10.0, &mut rng).len();
            total_bases += seq.len();
        }
        let observed = total_mutations as f64 / total_bases as f64;
        assert!(
            (observed - 0.10).abs() < 0.01,
            "observed mutation fraction {observed} outside 10% +/- 1%"
        );
    }

    #[test]
    fn test_mutate_lowercase_original_never_reproduced() {
        // A lowercase base must not be "mutated" to its own uppercase form
        let mut rng = rng(13);
        for _ in 0..200 {
            let mut seq = vec![b'c'; 64];
            let positions = mutate_in_place(&mut seq, 100.0, &mut rng);
            assert_eq!(positions.len(), 64);
            assert!(seq.iter().all(|&b| b != b'C' && b != b'c'));
        }
    }

    #[test]
    fn test_mutate_empty_sequence() {
        let mut rng = rng(1);
        let mut seq: Vec<u8> = Vec::new();
        assert!(mutate_in_place(&mut seq, 50.0, &mut rng).is_empty());
    }
}
