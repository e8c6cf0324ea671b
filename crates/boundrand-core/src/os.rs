//! Operating-system backed entropy source and the process-wide instance.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::entropy::{BitString, EntropySource, byte_len};
use crate::error::SamplingError;

/// Production entropy source: a ChaCha-based CSPRNG seeded from the OS.
///
/// A freshly constructed source is unseeded and refuses to produce output
/// until [`OsEntropySource::seed_from_os`] succeeds.
#[derive(Default)]
pub struct OsEntropySource {
    rng: Option<StdRng>,
}

impl OsEntropySource {
    /// Create an unseeded source.
    #[must_use]
    pub fn unseeded() -> Self {
        Self { rng: None }
    }

    /// Create a source seeded from operating-system entropy.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Infrastructure` if the OS generator fails.
    pub fn seeded_from_os() -> Result<Self, SamplingError> {
        let mut source = Self::unseeded();
        source.seed_from_os()?;
        Ok(source)
    }

    /// Create a source from an explicit 256-bit seed.
    ///
    /// The seed must itself be uniformly random; a fixed seed makes the
    /// output reproducible.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Some(StdRng::from_seed(seed)),
        }
    }

    /// Seed (or reseed) this source from operating-system entropy.
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::Infrastructure` if the OS generator fails.
    pub fn seed_from_os(&mut self) -> Result<(), SamplingError> {
        let rng = StdRng::try_from_os_rng().map_err(|e| {
            SamplingError::Infrastructure(format!("operating system entropy unavailable: {e}"))
        })?;
        self.rng = Some(rng);
        debug!("entropy source seeded from operating system");
        Ok(())
    }
}

impl EntropySource for OsEntropySource {
    fn is_ready(&self) -> bool {
        self.rng.is_some()
    }

    fn draw_bits(&mut self, bits: u64) -> Result<BitString, SamplingError> {
        let rng = self
            .rng
            .as_mut()
            .ok_or(SamplingError::UninitializedEntropySource)?;

        let mut bytes = vec![0u8; byte_len(bits)?];
        rng.fill_bytes(&mut bytes);
        BitString::from_be_bytes(bytes, bits)
    }
}

// Generator state is secret; only readiness is printed.
impl fmt::Debug for OsEntropySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsEntropySource")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

static PROCESS_SOURCE: OnceLock<Mutex<OsEntropySource>> = OnceLock::new();

/// The process-wide entropy source.
///
/// It is created unseeded on first access and stays unseeded until
/// [`initialize_process_source`] is called.
pub fn process_source() -> &'static Mutex<OsEntropySource> {
    PROCESS_SOURCE.get_or_init(|| Mutex::new(OsEntropySource::unseeded()))
}

/// Seed the process-wide source from the OS. Calling it again is a no-op.
///
/// # Errors
///
/// Returns `SamplingError::Infrastructure` if the mutex is poisoned or the
/// OS generator fails.
pub fn initialize_process_source() -> Result<(), SamplingError> {
    let mut source = process_source().lock().map_err(|e| {
        SamplingError::Infrastructure(format!("entropy source mutex poisoned: {e}"))
    })?;

    if source.is_ready() {
        return Ok(());
    }

    source.seed_from_os()?;
    info!("process-wide entropy source initialized");
    Ok(())
}
