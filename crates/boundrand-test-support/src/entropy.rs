//! Test entropy — deterministic `EntropySource` implementations for tests.

use boundrand_core::entropy::{BitString, EntropySource, byte_len};
use boundrand_core::error::SamplingError;

/// A source that serves values from a predetermined sequence of 32-bit
/// words. Each draw consumes `ceil(bits / 32)` words, most significant
/// first, and keeps the low `bits` bits. Panics if the sequence is
/// exhausted. Used in tests that need specific candidates (e.g. to force a
/// rejection-sampling redraw).
#[derive(Debug)]
pub struct SequenceEntropySource {
    words: Vec<u32>,
    index: usize,
}

impl SequenceEntropySource {
    /// Create a new `SequenceEntropySource` with the given words.
    #[must_use]
    pub fn new(words: Vec<u32>) -> Self {
        Self { words, index: 0 }
    }

    /// Number of words not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.words.len() - self.index
    }
}

impl EntropySource for SequenceEntropySource {
    fn is_ready(&self) -> bool {
        true
    }

    fn draw_bits(&mut self, bits: u64) -> Result<BitString, SamplingError> {
        let len = byte_len(bits)?;
        let word_count = len.div_ceil(4);

        let mut concatenated = Vec::with_capacity(word_count * 4);
        for _ in 0..word_count {
            let word = self.words[self.index];
            self.index += 1;
            concatenated.extend_from_slice(&word.to_be_bytes());
        }

        let bytes = concatenated.split_off(concatenated.len() - len);
        BitString::from_be_bytes(bytes, bits)
    }
}

/// A source that replays the same byte pattern from its start on every
/// draw, repeating the pattern as needed to fill the request. Two draws of
/// the same width always return identical bits.
#[derive(Debug, Clone)]
pub struct ReplayEntropySource {
    pattern: Vec<u8>,
}

impl ReplayEntropySource {
    /// Create a new replay source.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is empty.
    #[must_use]
    pub fn new(pattern: Vec<u8>) -> Self {
        assert!(!pattern.is_empty(), "replay pattern must not be empty");
        Self { pattern }
    }
}

impl EntropySource for ReplayEntropySource {
    fn is_ready(&self) -> bool {
        true
    }

    fn draw_bits(&mut self, bits: u64) -> Result<BitString, SamplingError> {
        let len = byte_len(bits)?;
        let bytes = self.pattern.iter().copied().cycle().take(len).collect();
        BitString::from_be_bytes(bytes, bits)
    }
}

/// A source that has never been seeded. Reports itself not ready and counts
/// any draw attempted anyway, so tests can assert that none happened.
#[derive(Debug, Default)]
pub struct UnseededEntropySource {
    draw_attempts: usize,
}

impl UnseededEntropySource {
    /// Create a new unseeded source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `draw_bits` was called.
    #[must_use]
    pub fn draw_attempts(&self) -> usize {
        self.draw_attempts
    }
}

impl EntropySource for UnseededEntropySource {
    fn is_ready(&self) -> bool {
        false
    }

    fn draw_bits(&mut self, _bits: u64) -> Result<BitString, SamplingError> {
        self.draw_attempts += 1;
        Err(SamplingError::UninitializedEntropySource)
    }
}

/// A ready source whose every draw fails with an infrastructure error.
/// Useful for testing error propagation.
#[derive(Debug)]
pub struct FailingEntropySource;

impl EntropySource for FailingEntropySource {
    fn is_ready(&self) -> bool {
        true
    }

    fn draw_bits(&mut self, _bits: u64) -> Result<BitString, SamplingError> {
        Err(SamplingError::Infrastructure("entropy device unavailable".into()))
    }
}

/// Wraps another source and records the width of every draw requested.
#[derive(Debug)]
pub struct RecordingEntropySource<S> {
    inner: S,
    widths: Vec<u64>,
}

impl<S: EntropySource> RecordingEntropySource<S> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            widths: Vec::new(),
        }
    }

    /// Widths of all draws so far, in order.
    #[must_use]
    pub fn widths(&self) -> &[u64] {
        &self.widths
    }

    /// Unwrap the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EntropySource> EntropySource for RecordingEntropySource<S> {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn draw_bits(&mut self, bits: u64) -> Result<BitString, SamplingError> {
        self.widths.push(bits);
        self.inner.draw_bits(bits)
    }
}
