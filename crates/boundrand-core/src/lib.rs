//! Boundrand Core — uniform bounded random integers.
//!
//! Draws arbitrary-precision integers in `[0, bound)` from a cryptographic
//! [`EntropySource`](entropy::EntropySource). Sources must be explicitly
//! seeded; querying an unseeded source is an error rather than a warning.

pub mod config;
pub mod entropy;
pub mod error;
pub mod os;
pub mod sampler;

pub use config::{BoundKind, ReductionPolicy, SamplerConfig};
pub use entropy::{BitString, EntropySource};
pub use error::SamplingError;
pub use os::{OsEntropySource, initialize_process_source, process_source};
pub use sampler::{BoundedRandomInteger, sample, sample_from_process_source};
