//! Entropy source abstraction.
//!
//! In production this wraps an OS-seeded CSPRNG. In tests a replayed or
//! scripted implementation is injected.

use std::fmt;

use num_bigint::BigUint;

use crate::error::SamplingError;

/// Abstraction over a cryptographically secure generator of random bits.
pub trait EntropySource: Send {
    /// Returns `true` once the source has been seeded and may be drawn from.
    fn is_ready(&self) -> bool;

    /// Draws exactly `bits` random bits.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::UninitializedEntropySource` if the source has
    /// not been seeded, or `SamplingError::Infrastructure` if the underlying
    /// generator fails.
    fn draw_bits(&mut self, bits: u64) -> Result<BitString, SamplingError>;
}

/// A big-endian sequence of exactly `len` bits.
///
/// Bits are stored left-padded in whole bytes; the unused high bits of the
/// first byte are always zero.
#[derive(Clone, PartialEq, Eq)]
pub struct BitString {
    bytes: Vec<u8>,
    len: u64,
}

impl BitString {
    /// Builds a bit string of `len` bits from big-endian `bytes`.
    ///
    /// `bytes` must hold exactly `ceil(len / 8)` bytes. Any bits above
    /// position `len` are cleared.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::InvalidArgument` if the byte count does not
    /// match `len`.
    pub fn from_be_bytes(mut bytes: Vec<u8>, len: u64) -> Result<Self, SamplingError> {
        let expected = byte_len(len)?;
        if bytes.len() != expected {
            return Err(SamplingError::InvalidArgument(format!(
                "{len}-bit string needs {expected} bytes, got {}",
                bytes.len()
            )));
        }

        if let Some(first) = bytes.first_mut() {
            *first &= 0xff_u8 >> ((8 - len % 8) % 8);
        }

        Ok(Self { bytes, len })
    }

    /// Number of bits in the string.
    #[must_use]
    pub fn len_bits(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the string holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The underlying big-endian bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Interprets the bits as a big-endian unsigned integer.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.bytes)
    }
}

// Drawn bits are secret material; only the width is printed.
impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitString").field("len", &self.len).finish_non_exhaustive()
    }
}

/// Number of whole bytes needed to hold `bits` bits.
///
/// # Errors
///
/// Returns `SamplingError::InvalidArgument` if the byte count does not fit in
/// `usize` on this platform.
pub fn byte_len(bits: u64) -> Result<usize, SamplingError> {
    usize::try_from(bits.div_ceil(8)).map_err(|_| {
        SamplingError::InvalidArgument(format!("{bits}-bit draw exceeds addressable memory"))
    })
}
