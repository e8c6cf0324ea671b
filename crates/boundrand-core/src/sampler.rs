//! Bounded random integer sampling.
//!
//! A sample below `bound` is produced by drawing `width` bits, where `width`
//! is the bit length of `bound` rounded up to a whole number of entropy
//! words, and reducing the resulting candidate into range. Under
//! [`ReductionPolicy::Rejection`] candidates at or above
//! `floor(2^width / bound) * bound` are discarded and redrawn, which makes
//! every residue equally likely. Each draw is accepted with probability
//! above one half, so the expected number of draws is below two. After
//! [`MAX_DRAWS`] unfair candidates in a row the source is treated as broken.

use std::sync::Mutex;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;
use tracing::{debug, instrument, trace, warn};

use crate::config::{BoundKind, ReductionPolicy, SamplerConfig};
use crate::entropy::EntropySource;
use crate::error::SamplingError;
use crate::os::process_source;

/// Draws per sample before rejection sampling gives up. A healthy source
/// exhausts this with probability below `2^-128`.
pub const MAX_DRAWS: u32 = 128;

/// Draws uniformly distributed integers below a caller-supplied bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedRandomInteger {
    config: SamplerConfig,
}

impl BoundedRandomInteger {
    /// Create a sampler with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Configuration` if the configuration is invalid.
    pub fn new(config: SamplerConfig) -> Result<Self, SamplingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a sampler configured from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Configuration` if a variable is invalid.
    pub fn from_env() -> Result<Self, SamplingError> {
        Self::new(SamplerConfig::from_env()?)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw a non-negative integer below `bound` (or up to and including it
    /// when configured with [`BoundKind::Inclusive`]).
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::InvalidArgument` if `bound` is out of range for
    /// the configured [`BoundKind`], `SamplingError::UninitializedEntropySource`
    /// if `source` is not seeded, or any error raised by the source.
    #[instrument(level = "debug", skip_all, fields(bound_bits = bound.bits()))]
    pub fn sample<S>(&self, bound: &BigInt, source: &mut S) -> Result<BigUint, SamplingError>
    where
        S: EntropySource + ?Sized,
    {
        let exclusive = self.exclusive_bound(bound)?;
        self.sample_below(&exclusive, source)
    }

    /// Draw an integer in `[low, high)` (or `[low, high]` when configured with
    /// [`BoundKind::Inclusive`]).
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::InvalidArgument` if the range is empty, plus
    /// any error [`BoundedRandomInteger::sample`] can return.
    #[instrument(level = "debug", skip_all)]
    pub fn sample_range<S>(
        &self,
        low: &BigInt,
        high: &BigInt,
        source: &mut S,
    ) -> Result<BigInt, SamplingError>
    where
        S: EntropySource + ?Sized,
    {
        let width = match self.config.bound_kind {
            BoundKind::Exclusive => high - low,
            BoundKind::Inclusive => high - low + 1,
        };
        if width.sign() != Sign::Plus {
            return Err(SamplingError::InvalidArgument(format!(
                "empty range: low {low}, high {high} ({:?} upper bound)",
                self.config.bound_kind
            )));
        }

        let offset = self.sample_below(width.magnitude(), source)?;
        Ok(low + BigInt::from(offset))
    }

    /// Like [`BoundedRandomInteger::sample`], for a source shared between
    /// threads. The source stays locked for the whole call, so redraws from
    /// one caller never interleave with another's.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Infrastructure` if the mutex is poisoned, plus
    /// any error [`BoundedRandomInteger::sample`] can return.
    pub fn sample_shared<S>(
        &self,
        bound: &BigInt,
        source: &Mutex<S>,
    ) -> Result<BigUint, SamplingError>
    where
        S: EntropySource + ?Sized,
    {
        let mut guard = source.lock().map_err(|e| {
            SamplingError::Infrastructure(format!("entropy source mutex poisoned: {e}"))
        })?;
        self.sample(bound, &mut *guard)
    }

    fn exclusive_bound(self, bound: &BigInt) -> Result<BigUint, SamplingError> {
        match (self.config.bound_kind, bound.sign()) {
            (BoundKind::Exclusive, Sign::Plus) => Ok(bound.magnitude().clone()),
            (BoundKind::Exclusive, _) => Err(SamplingError::InvalidArgument(format!(
                "bound must be positive, got {bound}"
            ))),
            (BoundKind::Inclusive, Sign::Minus) => Err(SamplingError::InvalidArgument(format!(
                "inclusive bound must be non-negative, got {bound}"
            ))),
            (BoundKind::Inclusive, _) => Ok(bound.magnitude().clone() + 1u32),
        }
    }

    fn sample_below<S>(self, bound: &BigUint, source: &mut S) -> Result<BigUint, SamplingError>
    where
        S: EntropySource + ?Sized,
    {
        if !source.is_ready() {
            return Err(SamplingError::UninitializedEntropySource);
        }

        let width = draw_width(bound, self.config.word_bits);
        debug!(width, policy = %self.config.policy, "drawing candidate");

        match self.config.policy {
            ReductionPolicy::Modular => Ok(source.draw_bits(width)?.to_biguint() % bound),
            ReductionPolicy::Rejection => {
                let limit = rejection_limit(bound, width);
                for draw in 1..=MAX_DRAWS {
                    let candidate = source.draw_bits(width)?.to_biguint();
                    if candidate < limit {
                        if draw > 1 {
                            debug!(draws = draw, "candidate accepted after redraws");
                        }
                        return Ok(candidate % bound);
                    }
                    trace!(draws = draw, "candidate outside fair range, redrawing");
                }
                warn!(draws = MAX_DRAWS, "entropy source produced no fair candidate");
                Err(SamplingError::Infrastructure(format!(
                    "entropy source produced no fair candidate after {MAX_DRAWS} draws"
                )))
            }
        }
    }
}

/// Bit length of `bound` rounded up to a multiple of `word_bits`.
///
/// A `word_bits` of zero is treated as one.
#[must_use]
pub fn draw_width(bound: &BigUint, word_bits: u32) -> u64 {
    let word = u64::from(word_bits.max(1));
    bound.bits().max(1).div_ceil(word) * word
}

/// Exclusive upper limit of accepted candidates: the largest multiple of
/// `bound` not exceeding `2^width`.
#[must_use]
pub fn rejection_limit(bound: &BigUint, width: u64) -> BigUint {
    let space = BigUint::one() << width;
    (&space / bound) * bound
}

/// Draw a non-negative integer strictly below `bound` with the default
/// configuration: exclusive bound, rejection sampling, 32-bit words.
///
/// # Errors
///
/// Returns `SamplingError::InvalidArgument` if `bound <= 0`,
/// `SamplingError::UninitializedEntropySource` if `source` is not seeded, or
/// any error raised by the source.
pub fn sample<S>(bound: &BigInt, source: &mut S) -> Result<BigUint, SamplingError>
where
    S: EntropySource + ?Sized,
{
    BoundedRandomInteger::default().sample(bound, source)
}

/// Draw below `bound` from the process-wide source with the default
/// configuration.
///
/// # Errors
///
/// Returns `SamplingError::UninitializedEntropySource` unless
/// [`initialize_process_source`](crate::os::initialize_process_source) has
/// succeeded, plus any error [`sample`] can return.
pub fn sample_from_process_source(bound: &BigInt) -> Result<BigUint, SamplingError> {
    BoundedRandomInteger::default().sample_shared(bound, process_source())
}
