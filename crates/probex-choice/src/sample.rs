//! Sampling primitives for code under exploration.
//!
//! Outside a search these behave like ordinary random draws. They share the
//! validation of [`ChoicePoint`](crate::ChoicePoint), so a model that runs
//! here will also be accepted by the explorer.

use crate::{check_probabilities, ChoiceError};
use rand::Rng;

/// Draw an alternative index from explicit probabilities.
pub fn choose<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> Result<usize, ChoiceError> {
    check_probabilities(probabilities)?;

    let draw = rng.gen::<f64>();
    let mut sum = 0.0;
    let mut last_nonzero = 0;
    for (index, &p) in probabilities.iter().enumerate() {
        if p == 0.0 {
            continue;
        }
        sum += p;
        last_nonzero = index;
        if draw < sum {
            return Ok(index);
        }
    }
    // sum fell short of the draw by rounding
    Ok(last_nonzero)
}

/// Draw uniformly from `0..n`.
pub fn uniform<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Result<u32, ChoiceError> {
    if n == 0 {
        return Err(ChoiceError::ZeroAlternatives);
    }
    Ok(rng.gen_range(0..n))
}

/// Flip a fair coin: 0 or 1.
pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    u32::from(rng.gen_bool(0.5))
}

/// Roll a fair die: 0 through 5.
pub fn die<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_choose_never_returns_zero_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let i = choose(&[0.0, 0.7, 0.0, 0.3, 0.0], &mut rng).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn test_choose_frequencies() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut counts = [0u32; 3];
        for _ in 0..30_000 {
            counts[choose(&[0.2, 0.3, 0.5], &mut rng).unwrap()] += 1;
        }
        let freq: Vec<f64> = counts.iter().map(|&c| f64::from(c) / 30_000.0).collect();
        assert!((freq[0] - 0.2).abs() < 0.02);
        assert!((freq[1] - 0.3).abs() < 0.02);
        assert!((freq[2] - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_choose_rejects_bad_vector() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(choose(&[0.5, 0.49], &mut rng).is_err());
    }

    #[test]
    fn test_uniform_coin_and_die_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(uniform(0, &mut rng), Err(ChoiceError::ZeroAlternatives));
        let mut seen = [false; 6];
        for _ in 0..600 {
            assert!(uniform(3, &mut rng).unwrap() < 3);
            assert!(coin(&mut rng) <= 1);
            seen[die(&mut rng) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
