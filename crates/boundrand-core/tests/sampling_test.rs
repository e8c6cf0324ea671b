//! Integration tests for bounded sampling against the shared test sources.

use std::sync::{Arc, Mutex};
use std::thread;

use boundrand_core::{
    BoundKind, BoundedRandomInteger, EntropySource, OsEntropySource, ReductionPolicy,
    SamplerConfig, SamplingError, sample,
};
use boundrand_test_support::{
    FailingEntropySource, RecordingEntropySource, ReplayEntropySource, SequenceEntropySource,
    UnseededEntropySource,
};
use boundrand_core::sampler::MAX_DRAWS;
use num_bigint::{BigInt, BigUint};

fn sampler(policy: ReductionPolicy, word_bits: u32) -> BoundedRandomInteger {
    BoundedRandomInteger::new(SamplerConfig {
        policy,
        bound_kind: BoundKind::Exclusive,
        word_bits,
    })
    .unwrap()
}

#[test]
fn test_samples_stay_below_bound() {
    let mut source = OsEntropySource::from_seed([3; 32]);

    for bound in [1_u64, 2, 3, 7, 10, 255, 256, 257, 1_000_003, u64::MAX] {
        let bound = BigInt::from(bound);
        for _ in 0..200 {
            let value = BigInt::from(sample(&bound, &mut source).unwrap());
            assert!(value < bound, "{value} is not below {bound}");
        }
    }
}

#[test]
fn test_bound_of_one_always_yields_zero() {
    let mut source = OsEntropySource::from_seed([5; 32]);

    for _ in 0..100 {
        assert_eq!(sample(&BigInt::from(1), &mut source).unwrap(), BigUint::ZERO);
    }
}

#[test]
fn test_zero_bound_is_invalid_argument() {
    let mut source = OsEntropySource::from_seed([0; 32]);

    let result = sample(&BigInt::from(0), &mut source);

    assert!(matches!(result, Err(SamplingError::InvalidArgument(_))));
}

#[test]
fn test_negative_bound_is_invalid_argument() {
    let mut source = OsEntropySource::from_seed([0; 32]);

    let result = sample(&BigInt::from(-5), &mut source);

    match result.unwrap_err() {
        SamplingError::InvalidArgument(msg) => assert_eq!(msg, "bound must be positive, got -5"),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[test]
fn test_unseeded_source_fails_without_drawing() {
    let mut source = UnseededEntropySource::new();

    let result = sample(&BigInt::from(10), &mut source);

    assert!(matches!(
        result,
        Err(SamplingError::UninitializedEntropySource)
    ));
    assert_eq!(source.draw_attempts(), 0);
}

#[test]
fn test_unseeded_os_source_fails() {
    let mut source = OsEntropySource::unseeded();

    let result = sample(&BigInt::from(10), &mut source);

    assert!(matches!(
        result,
        Err(SamplingError::UninitializedEntropySource)
    ));
}

#[test]
fn test_source_failure_propagates() {
    let result = sample(&BigInt::from(10), &mut FailingEntropySource);

    match result.unwrap_err() {
        SamplingError::Infrastructure(msg) => assert_eq!(msg, "entropy device unavailable"),
        other => panic!("expected Infrastructure, got {other:?}"),
    }
}

#[test]
fn test_replayed_bits_give_the_same_sample() {
    let mut source = ReplayEntropySource::new(vec![0x12, 0x34, 0x56, 0x78]);
    let bound = BigInt::from(1000);

    let first = sample(&bound, &mut source).unwrap();
    let second = sample(&bound, &mut source).unwrap();

    // 0x12345678 = 305_419_896, below the 32-bit fair limit for 1000.
    assert_eq!(first, BigUint::from(896_u32));
    assert_eq!(first, second);
}

#[test]
fn test_replayed_unfair_bits_fail_instead_of_hanging() {
    let mut source = ReplayEntropySource::new(vec![0xff]);
    let bound = BigInt::from(10);

    for _ in 0..2 {
        match sample(&bound, &mut source).unwrap_err() {
            SamplingError::Infrastructure(msg) => assert_eq!(
                msg,
                format!("entropy source produced no fair candidate after {MAX_DRAWS} draws")
            ),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }
}

#[test]
fn test_same_seed_gives_same_samples() {
    let bound = BigInt::from(1_000_000_007_u64);
    let mut a = OsEntropySource::from_seed([11; 32]);
    let mut b = OsEntropySource::from_seed([11; 32]);

    for _ in 0..50 {
        assert_eq!(
            sample(&bound, &mut a).unwrap(),
            sample(&bound, &mut b).unwrap()
        );
    }
}

#[test]
fn test_draw_width_is_rounded_to_words() {
    let mut source = RecordingEntropySource::new(OsEntropySource::from_seed([8; 32]));

    sample(&BigInt::from(10), &mut source).unwrap();
    sample(&(BigInt::from(1) << 32), &mut source).unwrap();
    sample(&(BigInt::from(1) << 255), &mut source).unwrap();

    assert_eq!(source.widths(), &[32, 64, 256]);
}

#[test]
fn test_word_size_is_configurable() {
    let sampler = sampler(ReductionPolicy::Rejection, 8);
    let mut source = RecordingEntropySource::new(OsEntropySource::from_seed([8; 32]));

    sampler.sample(&BigInt::from(300), &mut source).unwrap();

    assert_eq!(source.widths(), &[16]);
}

#[test]
fn test_large_bound_uses_full_width() {
    let bound: BigInt = (BigInt::from(1) << 255) + 12_345;
    let mut source = RecordingEntropySource::new(OsEntropySource::from_seed([21; 32]));

    let mut saw_high_value = false;
    for _ in 0..64 {
        let value = BigInt::from(sample(&bound, &mut source).unwrap());
        assert!(value < bound);
        saw_high_value |= value.bits() > 200;
    }

    assert!(source.widths().iter().all(|&w| w == 256));
    assert!(saw_high_value, "no sample used the upper words of the draw");
}

#[test]
fn test_bound_beyond_word_multiple_grows_draw() {
    let bound: BigInt = BigInt::from(1) << 256;
    let mut source = RecordingEntropySource::new(OsEntropySource::from_seed([22; 32]));

    let value = BigInt::from(sample(&bound, &mut source).unwrap());

    assert!(value < bound);
    assert_eq!(source.widths(), &[288]);
}

#[test]
fn test_rejection_consumes_unfair_candidates() {
    // Limit for bound 10 at 32 bits is 4_294_967_290.
    let mut source = SequenceEntropySource::new(vec![u32::MAX, 4_294_967_290, 4_294_967_289]);

    let value = sample(&BigInt::from(10), &mut source).unwrap();

    assert_eq!(value, BigUint::from(9_u32));
    assert_eq!(source.remaining(), 0);
}

#[test]
fn test_rejection_is_exactly_uniform_over_all_candidates() {
    // Every 8-bit candidate once, unfair ones (200..=255) first.
    let words: Vec<u32> = (0..=255).rev().collect();
    let mut source = SequenceEntropySource::new(words);
    let sampler = sampler(ReductionPolicy::Rejection, 8);
    let bound = BigInt::from(100);

    let mut counts = [0_u32; 100];
    for _ in 0..200 {
        let value = sampler.sample(&bound, &mut source).unwrap();
        let index = usize::try_from(value).unwrap();
        counts[index] += 1;
    }

    assert!(counts.iter().all(|&c| c == 2), "counts: {counts:?}");
    assert_eq!(source.remaining(), 0);
}

#[test]
fn test_modular_policy_favors_small_residues() {
    let words: Vec<u32> = (0..=255).collect();
    let mut source = SequenceEntropySource::new(words);
    let sampler = sampler(ReductionPolicy::Modular, 8);
    let bound = BigInt::from(100);

    let mut counts = [0_u32; 100];
    for _ in 0..256 {
        let value = sampler.sample(&bound, &mut source).unwrap();
        let index = usize::try_from(value).unwrap();
        counts[index] += 1;
    }

    // 256 mod 100 = 56 residues are reachable three times.
    assert!(counts[..56].iter().all(|&c| c == 3));
    assert!(counts[56..].iter().all(|&c| c == 2));
}

#[test]
fn test_sample_range_stays_within_bounds() {
    let sampler = BoundedRandomInteger::default();
    let mut source = OsEntropySource::from_seed([4; 32]);
    let low = BigInt::from(-1_000);
    let high = BigInt::from(1_000);

    for _ in 0..500 {
        let value = sampler.sample_range(&low, &high, &mut source).unwrap();
        assert!(value >= low && value < high, "{value} outside [{low}, {high})");
    }
}

#[test]
fn test_inclusive_range_reaches_upper_end() {
    let sampler = BoundedRandomInteger::new(SamplerConfig {
        bound_kind: BoundKind::Inclusive,
        ..SamplerConfig::default()
    })
    .unwrap();
    let mut source = OsEntropySource::from_seed([6; 32]);

    let mut seen = [false; 3];
    for _ in 0..300 {
        let value = sampler
            .sample_range(&BigInt::from(1), &BigInt::from(3), &mut source)
            .unwrap();
        let index = usize::try_from(value - 1).unwrap();
        seen[index] = true;
    }

    assert_eq!(seen, [true, true, true]);
}

#[test]
fn test_shared_source_serves_concurrent_callers() {
    let shared: Arc<Mutex<dyn EntropySource + Send>> =
        Arc::new(Mutex::new(OsEntropySource::from_seed([17; 32])));
    let bound = BigInt::from(1_000_000_u32);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let bound = bound.clone();
            thread::spawn(move || {
                let sampler = BoundedRandomInteger::default();
                (0..500)
                    .map(|_| sampler.sample_shared(&bound, &*shared).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    assert_eq!(all.len(), 4_000);
    assert!(all.iter().all(|v| BigInt::from(v.clone()) < bound));
}

#[test]
fn test_poisoned_shared_source_is_reported() {
    let shared = Arc::new(Mutex::new(OsEntropySource::from_seed([2; 32])));

    let poisoner = Arc::clone(&shared);
    let _ = thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("poison the entropy mutex");
    })
    .join();

    let result = BoundedRandomInteger::default().sample_shared(&BigInt::from(10), &*shared);

    match result.unwrap_err() {
        SamplingError::Infrastructure(msg) => assert!(msg.contains("poisoned")),
        other => panic!("expected Infrastructure, got {other:?}"),
    }
}
