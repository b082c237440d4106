//! Engine stream splitting and the `rand` adapter

use algokit_algorithms::engines::{Engine, EnginePtr, EngineRng};
use algokit_algorithms::{ChaChaEngine, Mcg59, Mt19937};
use algokit_core::ErrorKind;
use proptest::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

fn engine(kind: u8, seed: u32) -> EnginePtr {
    match kind % 3 {
        0 => Box::new(Mt19937::new(seed)),
        1 => Box::new(Mcg59::new(u64::from(seed))),
        _ => Box::new(ChaChaEngine::new(u64::from(seed))),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_skip_then_draw_equals_draw_all(kind in 0u8..3, seed in any::<u32>(), n in 0u64..2000, m in 1usize..40) {
        let mut skipped = engine(kind, seed);
        let mut drawn = engine(kind, seed);
        skipped.skip_ahead(n).unwrap();
        for _ in 0..n {
            drawn.next_u32();
        }
        let tail: Vec<u32> = (0..m).map(|_| drawn.next_u32()).collect();
        let after_skip: Vec<u32> = (0..m).map(|_| skipped.next_u32()).collect();
        prop_assert_eq!(after_skip, tail);
    }

    #[test]
    fn prop_leapfrog_streams_partition_the_sequence(seed in any::<u32>(), n_streams in 1usize..6, len in 1usize..30) {
        let mut base = Mcg59::new(u64::from(seed));
        let sequence: Vec<u32> = (0..n_streams * len).map(|_| base.next_u32()).collect();
        for index in 0..n_streams {
            let mut stream = Mcg59::new(u64::from(seed));
            stream.leapfrog(index, n_streams).unwrap();
            for j in 0..len {
                prop_assert_eq!(stream.next_u32(), sequence[j * n_streams + index]);
            }
        }
    }
}

#[test]
fn test_unsupported_leapfrog_is_reported() {
    for mut engine in [engine(0, 1), engine(2, 1)] {
        let err = engine.leapfrog(1, 4).unwrap_err();
        assert!(err.contains(ErrorKind::MethodNotSupported), "{}", engine.name());
    }
}

#[test]
fn test_clone_is_deep() {
    let mut original = engine(1, 99);
    original.next_u32();
    let mut copy = original.clone();
    assert_eq!(copy.next_u32(), original.next_u32());
    copy.next_u32();
    assert_ne!(copy.next_u32(), original.next_u32());
}

#[test]
fn test_distributions_over_engines() {
    for kind in 0..3 {
        let mut engine = engine(kind, 2024);
        let mut rng = EngineRng::new(engine.as_mut());

        let uniform = Uniform::new(-1.0, 1.0);
        let normal = Normal::new(10.0, 2.0).unwrap();
        let n = 20_000;
        let mut uniform_sum = 0.0;
        let mut normal_sum = 0.0;
        for _ in 0..n {
            let u: f64 = uniform.sample(&mut rng);
            assert!((-1.0..1.0).contains(&u));
            uniform_sum += u;
            normal_sum += normal.sample(&mut rng);
        }
        assert!((uniform_sum / n as f64).abs() < 0.05);
        assert!((normal_sum / n as f64 - 10.0).abs() < 0.1);

        let die = rng.gen_range(1..=6);
        assert!((1..=6).contains(&die));
    }
}
