//! Acceptance criteria.

use rand::{Rng, RngCore};

use super::AcceptanceFunction;

/// Metropolis criterion.
///
/// An improvement or tie is always accepted. A worse candidate is accepted
/// with probability `exp((new - old) / temperature)`, compared against a
/// uniform draw on `[0, 1)`. At temperature 0 only non-worsening moves pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAcceptance;

impl StandardAcceptance {
    /// Probability of accepting the move.
    pub fn probability(old_score: f64, new_score: f64, temperature: f64) -> f64 {
        if new_score >= old_score {
            1.0
        } else if temperature <= 0.0 {
            0.0
        } else {
            ((new_score - old_score) / temperature).exp()
        }
    }
}

impl AcceptanceFunction for StandardAcceptance {
    fn accept(
        &self,
        old_score: f64,
        new_score: f64,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> bool {
        if new_score >= old_score {
            return true;
        }
        rng.random::<f64>() < Self::probability(old_score, new_score, temperature)
    }
}

/// Accepts strict improvements only.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAcceptance;

impl AcceptanceFunction for GreedyAcceptance {
    fn accept(
        &self,
        old_score: f64,
        new_score: f64,
        _temperature: f64,
        _rng: &mut dyn RngCore,
    ) -> bool {
        new_score > old_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_improvements_always_pass() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(StandardAcceptance.accept(1.0, 2.0, 0.0, &mut rng));
            assert!(StandardAcceptance.accept(1.0, 1.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn test_zero_temperature_rejects_worse() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(!StandardAcceptance.accept(2.0, 1.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn test_acceptance_rate_matches_probability() {
        let mut rng = SmallRng::seed_from_u64(3);
        let p = StandardAcceptance::probability(0.0, -1.0, 1.0);
        assert!((p - (-1.0f64).exp()).abs() < 1e-12);

        let trials = 20_000;
        let accepted = (0..trials)
            .filter(|_| StandardAcceptance.accept(0.0, -1.0, 1.0, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!((rate - p).abs() < 0.02, "rate {rate} vs {p}");
    }

    #[test]
    fn test_greedy() {
        let mut rng = SmallRng::seed_from_u64(4);
        assert!(GreedyAcceptance.accept(1.0, 1.5, 100.0, &mut rng));
        assert!(!GreedyAcceptance.accept(1.0, 1.0, 100.0, &mut rng));
        assert!(!GreedyAcceptance.accept(1.0, 0.5, 100.0, &mut rng));
    }
}
