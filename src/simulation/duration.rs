//! Duration sources for arrivals and service
//!
//! The kernel only needs "give me one positive duration". How that duration is
//! distributed is up to the source; fitting distributions to observed data is
//! not done here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::ConfigError;
use super::types::SimTime;

/// Largest shape [`Erlang::with_cov`] will pick. Sampling costs one
/// exponential draw per phase, so this caps the work per sample.
pub const MAX_ERLANG_SHAPE: u32 = 400;

/// Samples one positive duration per call, scaled by `scale`
pub trait DurationSource {
    fn sample(&mut self, scale: f64) -> SimTime;

    /// Events per unit time this source is configured for, if it has one
    fn rate(&self) -> Option<f64> {
        None
    }
}

impl<F> DurationSource for F
where
    F: FnMut(f64) -> SimTime,
{
    fn sample(&mut self, scale: f64) -> SimTime {
        self(scale)
    }
}

/// Always returns the same duration
#[derive(Debug, Clone)]
pub struct Constant {
    pub duration: SimTime,
}

impl Constant {
    pub fn new(duration: SimTime) -> Self {
        Self { duration }
    }
}

impl DurationSource for Constant {
    fn sample(&mut self, scale: f64) -> SimTime {
        self.duration * scale
    }

    fn rate(&self) -> Option<f64> {
        Some(1.0 / self.duration)
    }
}

/// Draw one exponential variate with the given mean.
/// The uniform draw excludes zero so the result is strictly positive.
fn exponential_variate(rng: &mut StdRng, mean: f64) -> f64 {
    let u: f64 = rng.random_range(f64::EPSILON..1.0);
    -mean * u.ln()
}

/// Exponentially distributed durations (memoryless arrivals)
#[derive(Debug, Clone)]
pub struct Exponential {
    mean: SimTime,
    rng: StdRng,
}

impl Exponential {
    pub fn new(mean: SimTime, seed: u64) -> Self {
        Self {
            mean,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_rate(rate: f64, seed: u64) -> Self {
        Self::new(1.0 / rate, seed)
    }
}

impl DurationSource for Exponential {
    fn sample(&mut self, scale: f64) -> SimTime {
        exponential_variate(&mut self.rng, self.mean) * scale
    }

    fn rate(&self) -> Option<f64> {
        Some(1.0 / self.mean)
    }
}

/// Erlang distributed durations: `shape` exponential phases in series.
///
/// The coefficient of variation is `1 / sqrt(shape)`, which makes this a
/// convenient stand-in for the lower-variance service times of real trains.
#[derive(Debug, Clone)]
pub struct Erlang {
    shape: u32,
    mean: SimTime,
    rng: StdRng,
}

impl Erlang {
    pub fn new(shape: u32, mean: SimTime, seed: u64) -> Self {
        Self {
            shape: shape.max(1),
            mean,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Smallest shape whose coefficient of variation does not exceed `cov`.
    ///
    /// Fails if `cov` is not positive or would need more than
    /// [`MAX_ERLANG_SHAPE`] phases (any `cov` below 0.05).
    pub fn with_cov(cov: f64, mean: SimTime, seed: u64) -> Result<Self, ConfigError> {
        if !(cov.is_finite() && cov > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "coefficient of variation",
                value: cov,
            });
        }
        let shape = (1.0 / (cov * cov)).ceil();
        if shape > f64::from(MAX_ERLANG_SHAPE) {
            return Err(ConfigError::CovTooSmall {
                cov,
                max: MAX_ERLANG_SHAPE,
            });
        }
        Ok(Self::new(shape as u32, mean, seed))
    }

    pub fn shape(&self) -> u32 {
        self.shape
    }
}

impl DurationSource for Erlang {
    fn sample(&mut self, scale: f64) -> SimTime {
        let phase_mean = self.mean / f64::from(self.shape);
        let total: f64 = (0..self.shape)
            .map(|_| exponential_variate(&mut self.rng, phase_mean))
            .sum();
        total * scale
    }

    fn rate(&self) -> Option<f64> {
        Some(1.0 / self.mean)
    }
}
