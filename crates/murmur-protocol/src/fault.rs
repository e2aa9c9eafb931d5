//! Randomized fault injection.
//!
//! A [`FaultInjector`] is a pure decision source applied independently to
//! every outgoing message: it draws a delivery outcome (deliver now, delay
//! one or two rounds, or drop) and optionally corrupts knowledge payloads
//! with multiplicative Gaussian noise. All draws come from one explicitly
//! seeded generator, so a run is reproducible from its seed alone.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use crate::error::{Error, Result};
use crate::knowledge::Knowledge;
use crate::message::Delay;

/// Multiplicative noise is clamped to +/- this fraction of the value.
pub const NOISE_CLAMP: f64 = 0.1;

/// Relative frequency of the three delivery delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayWeights {
    pub immediate: f64,
    pub short: f64,
    pub long: f64,
}

impl DelayWeights {
    /// Every message delivered immediately.
    pub const NONE: Self = Self {
        immediate: 1.0,
        short: 0.0,
        long: 0.0,
    };

    /// The gossip protocol's standard mix: ~90% immediate, the rest split
    /// between one- and two-round delays.
    pub const GOSSIP: Self = Self {
        immediate: 0.90,
        short: 0.05,
        long: 0.05,
    };

    fn validate(&self) -> Result<()> {
        let parts = [self.immediate, self.short, self.long];
        let sum: f64 = parts.iter().sum();
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || sum <= 0.0 {
            return Err(Error::InvalidDelayWeights {
                immediate: self.immediate,
                short: self.short,
                long: self.long,
            });
        }
        Ok(())
    }
}

impl Default for DelayWeights {
    fn default() -> Self {
        Self::NONE
    }
}

/// Full fault configuration for one simulation run.
///
/// The default profile injects nothing at all; [`FaultProfile::gossip`]
/// enables the standard delay mix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaultProfile {
    /// Delay-outcome weights for the discrete gossip protocol.
    pub delay: DelayWeights,
    /// Probability that a message (or a voting link) is lost outright.
    pub drop_probability: f64,
    /// Standard deviation of the injected Gaussian noise.
    pub noise_sigma: f64,
}

impl FaultProfile {
    /// The standard gossip mix with no drops and no noise.
    #[must_use]
    pub fn gossip() -> Self {
        Self {
            delay: DelayWeights::GOSSIP,
            ..Self::default()
        }
    }

    /// Set the delay-outcome weights.
    #[must_use]
    pub fn with_delay_weights(mut self, delay: DelayWeights) -> Self {
        self.delay = delay;
        self
    }

    /// Set the drop probability.
    #[must_use]
    pub fn with_drop_probability(mut self, p: f64) -> Self {
        self.drop_probability = p;
        self
    }

    /// Set the noise standard deviation.
    #[must_use]
    pub fn with_noise_sigma(mut self, sigma: f64) -> Self {
        self.noise_sigma = sigma;
        self
    }

    /// Whether this profile can never alter a message.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.drop_probability == 0.0
            && self.noise_sigma == 0.0
            && self.delay.short == 0.0
            && self.delay.long == 0.0
    }

    fn validate(&self) -> Result<()> {
        self.delay.validate()?;
        if !self.drop_probability.is_finite() || !(0.0..=1.0).contains(&self.drop_probability) {
            return Err(Error::InvalidDropProbability(self.drop_probability));
        }
        if !self.noise_sigma.is_finite() || self.noise_sigma < 0.0 {
            return Err(Error::InvalidNoiseSigma(self.noise_sigma));
        }
        Ok(())
    }
}

/// Outcome of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Deliver with the drawn delay.
    Deliver(Delay),
    /// The message is lost; the attempt is still charged.
    Drop,
}

/// Seeded decision source for delivery outcomes and payload noise.
#[derive(Debug)]
pub struct FaultInjector {
    profile: FaultProfile,
    rng: ChaCha8Rng,
    delay_dist: WeightedIndex<f64>,
    noise: Option<Normal<f64>>,
}

impl FaultInjector {
    /// Build an injector from a validated profile and an explicit seed.
    pub fn new(profile: FaultProfile, seed: u64) -> Result<Self> {
        profile.validate()?;
        let delay_dist = WeightedIndex::new([
            profile.delay.immediate,
            profile.delay.short,
            profile.delay.long,
        ])
        .map_err(|_| Error::InvalidDelayWeights {
            immediate: profile.delay.immediate,
            short: profile.delay.short,
            long: profile.delay.long,
        })?;
        let noise = if profile.noise_sigma > 0.0 {
            Some(
                Normal::new(0.0, profile.noise_sigma)
                    .map_err(|_| Error::InvalidNoiseSigma(profile.noise_sigma))?,
            )
        } else {
            None
        };
        Ok(Self {
            profile,
            rng: ChaCha8Rng::seed_from_u64(seed),
            delay_dist,
            noise,
        })
    }

    /// The profile this injector was built from.
    #[must_use]
    pub fn profile(&self) -> &FaultProfile {
        &self.profile
    }

    /// Draw the outcome for one send attempt.
    pub fn send_outcome(&mut self) -> SendOutcome {
        if !self.link_up() {
            return SendOutcome::Drop;
        }
        let delay = match self.delay_dist.sample(&mut self.rng) {
            0 => Delay::Immediate,
            1 => Delay::Short,
            _ => Delay::Long,
        };
        SendOutcome::Deliver(delay)
    }

    /// Whether a link survives this step (used directly by the continuous
    /// voting dynamics; the gossip path goes through [`Self::send_outcome`]).
    pub fn link_up(&mut self) -> bool {
        self.profile.drop_probability == 0.0 || !self.rng.gen_bool(self.profile.drop_probability)
    }

    /// Apply multiplicative noise to every numeric leaf of a payload.
    ///
    /// Each leaf is independently scaled by `1 + clamp(N(0, sigma), +/-0.1)`.
    /// With sigma zero the payload is untouched.
    pub fn corrupt(&mut self, knowledge: &mut Knowledge) {
        let Some(noise) = self.noise else {
            return;
        };
        match knowledge {
            Knowledge::Exact(map) => {
                for value in map.values_mut() {
                    *value *= 1.0 + Self::clamped(noise.sample(&mut self.rng));
                }
            }
            Knowledge::Observed(map) => {
                for observations in map.values_mut() {
                    for value in observations.iter_mut() {
                        *value *= 1.0 + Self::clamped(noise.sample(&mut self.rng));
                    }
                }
            }
        }
    }

    /// Additive measurement noise for the continuous voting dynamics.
    pub fn measure(&mut self, value: f64) -> f64 {
        match self.noise {
            Some(noise) => value + noise.sample(&mut self.rng),
            None => value,
        }
    }

    /// Uniform history delay in `0..=max` for the voting dynamics.
    pub fn history_delay(&mut self, max: usize) -> usize {
        if max == 0 {
            0
        } else {
            self.rng.gen_range(0..=max)
        }
    }

    fn clamped(sample: f64) -> f64 {
        sample.clamp(-NOISE_CLAMP, NOISE_CLAMP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::ValueMode;
    use crate::message::NodeId;

    #[test]
    fn zero_profile_is_a_noop() {
        let profile = FaultProfile::default();
        assert!(profile.is_noop());

        let mut faults = FaultInjector::new(profile, 1).unwrap();
        for _ in 0..100 {
            assert_eq!(faults.send_outcome(), SendOutcome::Deliver(Delay::Immediate));
        }

        let mut knowledge = Knowledge::new(ValueMode::Exact, NodeId(0), 3.5);
        let before = knowledge.clone();
        faults.corrupt(&mut knowledge);
        assert_eq!(knowledge, before);
        assert_eq!(faults.measure(3.5), 3.5);
    }

    #[test]
    fn same_seed_reproduces_outcomes() {
        let profile = FaultProfile::gossip().with_drop_probability(0.2);
        let mut a = FaultInjector::new(profile, 42).unwrap();
        let mut b = FaultInjector::new(profile, 42).unwrap();
        for _ in 0..200 {
            assert_eq!(a.send_outcome(), b.send_outcome());
        }
    }

    #[test]
    fn gossip_mix_produces_all_delays() {
        let mut faults = FaultInjector::new(FaultProfile::gossip(), 7).unwrap();
        let mut seen = [0usize; 3];
        for _ in 0..2000 {
            match faults.send_outcome() {
                SendOutcome::Deliver(Delay::Immediate) => seen[0] += 1,
                SendOutcome::Deliver(Delay::Short) => seen[1] += 1,
                SendOutcome::Deliver(Delay::Long) => seen[2] += 1,
                SendOutcome::Drop => panic!("gossip profile has no drops"),
            }
        }
        assert!(seen.iter().all(|&count| count > 0));
        // Immediate dominates by an order of magnitude.
        assert!(seen[0] > 5 * (seen[1] + seen[2]));
    }

    #[test]
    fn certain_drop_loses_everything() {
        let profile = FaultProfile::default().with_drop_probability(1.0);
        let mut faults = FaultInjector::new(profile, 3).unwrap();
        for _ in 0..50 {
            assert_eq!(faults.send_outcome(), SendOutcome::Drop);
        }
    }

    #[test]
    fn corruption_is_clamped() {
        // Huge sigma: the clamp must still bound the factor.
        let profile = FaultProfile::default().with_noise_sigma(100.0);
        let mut faults = FaultInjector::new(profile, 11).unwrap();

        let mut knowledge = Knowledge::new(ValueMode::Exact, NodeId(0), 10.0);
        knowledge.merge(&Knowledge::new(ValueMode::Exact, NodeId(1), -10.0));
        faults.corrupt(&mut knowledge);

        for id in [NodeId(0), NodeId(1)] {
            let value = knowledge.value_of(id).unwrap();
            assert!(value.abs() >= 10.0 * (1.0 - NOISE_CLAMP) - 1e-12);
            assert!(value.abs() <= 10.0 * (1.0 + NOISE_CLAMP) + 1e-12);
        }
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        let negative = FaultProfile::default().with_delay_weights(DelayWeights {
            immediate: -1.0,
            short: 0.0,
            long: 0.0,
        });
        assert!(matches!(
            FaultInjector::new(negative, 0),
            Err(Error::InvalidDelayWeights { .. })
        ));

        let bad_drop = FaultProfile::default().with_drop_probability(1.5);
        assert_eq!(
            FaultInjector::new(bad_drop, 0).err(),
            Some(Error::InvalidDropProbability(1.5))
        );

        let bad_sigma = FaultProfile::default().with_noise_sigma(-0.1);
        assert_eq!(
            FaultInjector::new(bad_sigma, 0).err(),
            Some(Error::InvalidNoiseSigma(-0.1))
        );
    }

    #[test]
    fn history_delay_is_bounded() {
        let mut faults = FaultInjector::new(FaultProfile::default(), 5).unwrap();
        for _ in 0..100 {
            assert!(faults.history_delay(2) <= 2);
        }
        assert_eq!(faults.history_delay(0), 0);
    }
}
