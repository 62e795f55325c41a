mod common;

#[cfg(not(feature = "shuttle"))]
mod threads {
    use procsync::{unit, SharedRegister};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn concurrent_applies_lose_no_updates() {
        const UNITS: i32 = 8;
        const APPLIES: i32 = 1_000;
        let register = SharedRegister::new(0);

        let units: Vec<_> = (0..UNITS)
            .map(|i| {
                let register = register.clone();
                unit::spawn(format!("adder-{i}"), move || {
                    for _ in 0..APPLIES {
                        register.apply(i);
                    }
                })
            })
            .collect();
        for unit in units {
            unit.join().unwrap();
        }

        let expected: i32 = (0..UNITS).map(|i| i * APPLIES).sum();
        assert_eq!(expected, register.read());
    }

    #[test]
    fn random_deltas_sum_up() {
        let register = SharedRegister::new(0_i64);

        let units: Vec<_> = (0..4)
            .map(|i| {
                let register = register.clone();
                unit::spawn(format!("random-{i}"), move || {
                    let mut rng = SmallRng::seed_from_u64(i);
                    let mut applied = 0;
                    for _ in 0..1_000 {
                        let delta = rng.gen_range(-100..=100);
                        register.apply(delta);
                        applied += delta;
                    }
                    applied
                })
            })
            .collect();
        let expected: i64 = units.into_iter().map(|unit| unit.join().unwrap()).sum();

        assert_eq!(expected, register.read());
    }

    #[test]
    fn concurrent_applies_wrap_around() {
        let initial = i32::MAX - 100;
        let register = SharedRegister::new(initial);

        let units: Vec<_> = (0..4)
            .map(|i| {
                let register = register.clone();
                unit::spawn(format!("adder-{i}"), move || {
                    for _ in 0..100 {
                        register.apply(1);
                    }
                })
            })
            .collect();
        for unit in units {
            unit.join().unwrap();
        }

        assert_eq!(initial.wrapping_add(400), register.read());
    }

    #[test]
    fn deposits_and_withdrawals_always_balance() {
        for _ in 0..10 {
            let balance = SharedRegister::new(10_000);
            let deposits = {
                let balance = balance.clone();
                unit::spawn("deposit", move || {
                    for _ in 0..500 {
                        let mut value = balance.lock();
                        *value += 10;
                    }
                })
            };
            let withdrawals = {
                let balance = balance.clone();
                unit::spawn("withdraw", move || {
                    for _ in 0..500 {
                        let mut value = balance.lock();
                        *value -= 5;
                    }
                })
            };
            deposits.join().unwrap();
            withdrawals.join().unwrap();
            assert_eq!(10_000 + 500 * 10 - 500 * 5, balance.read());
        }
    }
}

#[cfg(feature = "shuttle")]
mod model {
    use std::sync::Arc;

    use procsync::{unit, SharedRegister};
    use procsync_utils::specifications::CounterSpecification;
    use shuttle::rand::thread_rng;

    use super::common::{
        assert_linearizable, RecordingRegister, NUM_ITERATIONS, NUM_OPERATIONS, NUM_PREEMPTIONS,
        NUM_UNITS,
    };

    #[test]
    fn applies_and_reads_are_linearizable() {
        shuttle::check_pct(
            || {
                let register = Arc::new(RecordingRegister::new());
                let units: Vec<_> = (0..NUM_UNITS)
                    .map(|i| {
                        let register = register.clone();
                        unit::spawn(format!("unit-{i}"), move || {
                            let mut rng = thread_rng();
                            for _ in 0..NUM_OPERATIONS {
                                register.perform_random_operation(i, &mut rng);
                            }
                        })
                    })
                    .collect();
                for unit in units {
                    unit.join().unwrap();
                }
                assert_linearizable::<CounterSpecification<0>>(register.history());
            },
            NUM_ITERATIONS,
            NUM_PREEMPTIONS,
        );
    }

    #[test]
    fn deposits_and_withdrawals_always_balance() {
        shuttle::check_random(
            || {
                let balance = SharedRegister::new(10_000);
                let deposits = {
                    let balance = balance.clone();
                    unit::spawn("deposit", move || (0..50).for_each(|_| balance.apply(10)))
                };
                let withdrawals = {
                    let balance = balance.clone();
                    unit::spawn("withdraw", move || (0..50).for_each(|_| balance.apply(-5)))
                };
                deposits.join().unwrap();
                withdrawals.join().unwrap();
                assert_eq!(10_000 + 50 * 10 - 50 * 5, balance.read());
            },
            NUM_ITERATIONS,
        );
    }
}
