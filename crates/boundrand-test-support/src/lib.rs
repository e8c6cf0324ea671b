//! Shared deterministic entropy sources for boundrand tests.

mod entropy;

pub use entropy::{
    FailingEntropySource, RecordingEntropySource, ReplayEntropySource, SequenceEntropySource,
    UnseededEntropySource,
};
