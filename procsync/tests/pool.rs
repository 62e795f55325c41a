mod common;

fn square(x: u64) -> u64 {
    x * x
}

#[cfg(not(feature = "shuttle"))]
mod threads {
    use std::time::Duration;

    use procsync::{Error, PoolConfig, PoolState, SharedRegister, WorkerPool};

    use super::square;

    #[test]
    fn three_workers_square_four_numbers_in_order() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(vec![1, 4, 9, 16], pool.map(square, [1, 2, 3, 4]).unwrap());
    }

    #[test]
    fn results_follow_submission_order_when_tasks_finish_out_of_order() {
        let pool = WorkerPool::new(4).unwrap();
        let results = pool
            .map(
                |ms: u64| {
                    std::thread::sleep(Duration::from_millis(ms));
                    ms
                },
                [40, 30, 20, 10, 0],
            )
            .unwrap();
        assert_eq!(vec![40, 30, 20, 10, 0], results);
    }

    #[test]
    fn failing_task_does_not_affect_the_others() {
        let pool = WorkerPool::new(2).unwrap();
        let batch = pool
            .submit(
                |x: i32| {
                    assert!(x != 3, "refusing {x}");
                    x * 10
                },
                1..=5,
            )
            .unwrap();
        let results = pool.collect(batch);

        assert_eq!(5, results.len());
        for (i, result) in results.into_iter().enumerate() {
            match (i, result) {
                (2, Err(Error::TaskFailure { index, message })) => {
                    assert_eq!(2, index);
                    assert_eq!("refusing 3", message);
                }
                (i, Ok(value)) => assert_eq!((i as i32 + 1) * 10, value),
                (i, other) => panic!("unexpected result for task {i}: {other:?}"),
            }
        }

        // The pool keeps working after a task fails.
        assert_eq!(vec![4], pool.map(square, [2]).unwrap());
    }

    #[test]
    fn tasks_share_a_register() {
        let pool = WorkerPool::with_config(PoolConfig::new(3).with_name("bank")).unwrap();
        let balance = SharedRegister::new(10_000);
        let deltas = std::iter::repeat(10)
            .take(500)
            .chain(std::iter::repeat(-5).take(500));

        let handle = balance.clone();
        pool.map(move |delta: i32| handle.apply(delta), deltas)
            .unwrap();

        assert_eq!(12_500, balance.read());
    }

    #[test]
    fn batches_from_several_submissions_are_kept_apart() {
        let pool = WorkerPool::new(2).unwrap();
        let squares = pool.submit(square, [1, 2, 3]).unwrap();
        let doubled = pool.submit(|x: u64| x * 2, [1, 2, 3]).unwrap();
        assert_eq!(
            vec![2, 4, 6],
            pool.collect(doubled).into_iter().collect::<procsync::Result<Vec<_>>>().unwrap()
        );
        assert_eq!(
            vec![1, 4, 9],
            pool.collect(squares).into_iter().collect::<procsync::Result<Vec<_>>>().unwrap()
        );
    }

    #[test]
    fn stopped_pool_rejects_work() {
        let mut pool = WorkerPool::new(2).unwrap();
        pool.map(square, [1]).unwrap();
        pool.shutdown();
        assert_eq!(PoolState::Stopped, pool.state());
        assert!(matches!(pool.map(square, [1]), Err(Error::QueueClosed)));
    }
}

#[cfg(feature = "shuttle")]
mod model {
    use procsync::WorkerPool;

    use super::common::NUM_ITERATIONS;
    use super::square;

    #[test]
    fn three_workers_square_four_numbers_in_order() {
        shuttle::check_random(
            || {
                let pool = WorkerPool::new(3).unwrap();
                assert_eq!(vec![1, 4, 9, 16], pool.map(square, [1, 2, 3, 4]).unwrap());
            },
            NUM_ITERATIONS,
        );
    }

    #[test]
    fn queued_tasks_finish_before_shutdown_returns() {
        shuttle::check_random(
            || {
                let mut pool = WorkerPool::new(2).unwrap();
                let batch = pool.submit(square, [5, 6, 7]).unwrap();
                pool.shutdown();
                let results: Vec<u64> = pool
                    .collect(batch)
                    .into_iter()
                    .collect::<procsync::Result<_>>()
                    .unwrap();
                assert_eq!(vec![25, 36, 49], results);
            },
            NUM_ITERATIONS,
        );
    }
}
