//! Sampler configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SamplingError;

/// Environment variable selecting the [`ReductionPolicy`].
pub const POLICY_VAR: &str = "BOUNDRAND_POLICY";
/// Environment variable selecting the [`BoundKind`].
pub const BOUND_KIND_VAR: &str = "BOUNDRAND_BOUND_KIND";
/// Environment variable selecting the entropy word size in bits.
pub const WORD_BITS_VAR: &str = "BOUNDRAND_WORD_BITS";

/// Default entropy word size.
pub const DEFAULT_WORD_BITS: u32 = 32;
/// Word sizes a sampler may be configured with.
pub const SUPPORTED_WORD_BITS: [u32; 4] = [8, 16, 32, 64];

/// How a drawn candidate is mapped into `[0, bound)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionPolicy {
    /// Redraw candidates at or above the largest multiple of the bound that
    /// fits in the draw width. Exactly uniform.
    #[default]
    Rejection,
    /// Reduce every candidate with `candidate mod bound`.
    ///
    /// Unless the bound is a power of two this favors smaller residues: each
    /// residue below `2^width mod bound` is reachable one extra time.
    Modular,
}

impl FromStr for ReductionPolicy {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rejection" => Ok(Self::Rejection),
            "modular" => Ok(Self::Modular),
            other => Err(SamplingError::Configuration(format!(
                "unknown reduction policy '{other}', expected 'rejection' or 'modular'"
            ))),
        }
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejection => f.write_str("rejection"),
            Self::Modular => f.write_str("modular"),
        }
    }
}

/// Whether the caller's bound is itself a possible sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundKind {
    /// Samples satisfy `0 <= v < bound`; the bound must be positive.
    #[default]
    Exclusive,
    /// Samples satisfy `0 <= v <= bound`; the bound must be non-negative.
    Inclusive,
}

impl FromStr for BoundKind {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(Self::Exclusive),
            "inclusive" => Ok(Self::Inclusive),
            other => Err(SamplingError::Configuration(format!(
                "unknown bound kind '{other}', expected 'exclusive' or 'inclusive'"
            ))),
        }
    }
}

/// Configuration for [`BoundedRandomInteger`](crate::sampler::BoundedRandomInteger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Candidate reduction policy.
    pub policy: ReductionPolicy,
    /// Interpretation of the upper bound.
    pub bound_kind: BoundKind,
    /// Draw widths are rounded up to a multiple of this many bits.
    pub word_bits: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            policy: ReductionPolicy::default(),
            bound_kind: BoundKind::default(),
            word_bits: DEFAULT_WORD_BITS,
        }
    }
}

impl SamplerConfig {
    /// Read configuration from the process environment, using defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Configuration` if a variable is set to an
    /// unrecognized value.
    pub fn from_env() -> Result<Self, SamplingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, using defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Configuration` if a value is unrecognized.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SamplingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(policy) = lookup(POLICY_VAR) {
            config.policy = policy.parse()?;
        }
        if let Some(kind) = lookup(BOUND_KIND_VAR) {
            config.bound_kind = kind.parse()?;
        }
        if let Some(word_bits) = lookup(WORD_BITS_VAR) {
            config.word_bits = word_bits.trim().parse().map_err(|e| {
                SamplingError::Configuration(format!("{WORD_BITS_VAR} must be an integer: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Configuration` if `word_bits` is not one of
    /// [`SUPPORTED_WORD_BITS`].
    pub fn validate(&self) -> Result<(), SamplingError> {
        if !SUPPORTED_WORD_BITS.contains(&self.word_bits) {
            return Err(SamplingError::Configuration(format!(
                "word size must be one of {SUPPORTED_WORD_BITS:?} bits, got {}",
                self.word_bits
            )));
        }
        Ok(())
    }
}
